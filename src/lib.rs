pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::ReqwestBrowser;
pub use config::{cli::LocalStorage, toml_config::ServiceConfig};
pub use core::{mapper::ColorMapper, session::KeggSession};
pub use domain::model::{MapRequest, RetrievalOutcome};
pub use utils::error::{MapperError, Result};
