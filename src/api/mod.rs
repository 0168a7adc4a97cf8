//! Typed wrappers over the admin REST resources.
//!
//! Everything here goes through [`crate::client::ApiClient`], so session
//! concerns (bearer headers, 401 refresh) never leak into this layer.

pub mod dashboard;
pub mod models;
pub mod reports;
pub mod users;

pub use dashboard::DashboardApi;
pub use models::{
    Account, AccountStatus, DashboardStats, Dataset, Incident, IncidentStatus, NewAccount,
};
pub use reports::ReportsApi;
pub use users::UsersApi;
