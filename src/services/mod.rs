pub mod catalog;
pub mod identity;
pub mod lists;

pub use catalog::{CatalogClient, CatalogProxies};
pub use identity::{IdentityResolver, SessionTokens};
pub use lists::ListService;
