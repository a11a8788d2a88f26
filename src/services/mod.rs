pub mod rate_limit;
pub use rate_limit::{CounterStore, MemoryCounterStore, RateDecision, RateLimiter, RateScope};

pub mod token;
pub use token::{Claims, TokenError, TokenSigner};

pub mod seed;

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthMethod, AuthService, AuthSession, Identity};
pub use auth_service_impl::SeaOrmAuthService;

pub mod user_service;
pub mod user_service_impl;
pub use user_service::{UserError, UserService};
pub use user_service_impl::SeaOrmUserService;

pub mod product_service;
pub mod product_service_impl;
pub use product_service::{BulkCreateReport, BulkItemError, ProductError, ProductService};
pub use product_service_impl::SeaOrmProductService;

pub mod system_service;
pub mod system_service_impl;
pub use system_service::{CatalogStats, HealthReport, SystemError, SystemService};
pub use system_service_impl::SeaOrmSystemService;
