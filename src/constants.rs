pub const API_VERSION: &str = "1.0";

pub mod pagination {

    pub const DEFAULT_PAGE: u64 = 1;

    pub const DEFAULT_PER_PAGE: u64 = 10;

    pub const MAX_PER_PAGE: u64 = 100;
}

pub mod auth {

    pub const API_KEY_HEX_LEN: usize = 64;

    /// Characters of an API key kept visible when listing keys.
    pub const API_KEY_VISIBLE_PREFIX: usize = 8;

    pub const MIN_PASSWORD_LEN: usize = 6;
}

pub mod limits {

    pub const USERNAME_MIN: usize = 3;

    pub const USERNAME_MAX: usize = 80;

    pub const EMAIL_MAX: usize = 120;

    pub const PRODUCT_NAME_MAX: usize = 100;

    pub const CATEGORY_MAX: usize = 50;

    pub const API_KEY_NAME_MAX: usize = 100;

    /// Longest lifetime, in days, a new API key may request.
    pub const API_KEY_MAX_TTL_DAYS: u32 = 3650;

    pub const MAX_BULK_ITEMS: usize = 500;
}
