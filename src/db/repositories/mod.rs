pub mod api_key;
pub mod product;
pub mod user;
