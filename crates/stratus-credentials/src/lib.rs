//! stratus-credentials — credentials for compute accounts and the
//! container-service accounts layered on them.
//!
//! # Architecture
//!
//! ```text
//! CredentialsContext
//!   ├── CompositeCredentialsRepository   (name, provider) → credentials
//!   │     ├── CredentialsRepository<ComputeCredentials>
//!   │     └── CredentialsRepository<ContainerServiceCredentials>
//!   ├── AccountMapper                    compute name ⇄ container-service name
//!   └── ContainerServiceCredentialsParser
//!         └── dyn ComputeCredentialsParser (role assumption)
//! ```
//!
//! Registries are built empty first, the mapper is built over them, and only
//! then is the parser wired to both. Nothing in the registries points back
//! at the mapper or parser.

pub mod context;
pub mod credentials;
pub mod error;
pub mod mapper;
pub mod parser;
pub mod repository;

pub use context::{CredentialsContext, LoadFailure, LoadReport};
pub use credentials::*;
pub use error::{CredentialsError, CredentialsResult, ParseError};
pub use mapper::{AccountMapper, Mappings};
pub use parser::{
    ComputeCredentialsParser, ContainerServiceAccountBuilder, ContainerServiceCredentialsParser,
    DefaultComputeCredentialsParser,
};
pub use repository::{CompositeCredentialsRepository, CredentialsRepository};
