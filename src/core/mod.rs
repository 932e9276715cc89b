pub mod auth;
pub mod backend;
pub mod customer;
pub mod erp_client;
pub mod proxy;
pub mod session_gate;

pub use crate::domain::model::{Customer, Project};
pub use crate::domain::ports::{ConfigProvider, PortalBackend};
pub use crate::utils::error::Result;
