pub mod config;
pub mod types;

pub use config::{AccountsConfig, ComputeAccount, ContainerServiceAccount};
pub use types::*;
