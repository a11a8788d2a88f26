pub use super::api_keys::Entity as ApiKeys;
pub use super::products::Entity as Products;
pub use super::users::Entity as Users;
