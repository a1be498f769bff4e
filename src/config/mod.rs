mod accounts;
mod provision;

pub use accounts::{Login, ServiceAccounts};
pub use provision::{Backend, ProvisionConfig};
