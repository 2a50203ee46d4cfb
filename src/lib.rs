pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;
pub use config::ServiceConfig;

pub use app::Server;
pub use crate::core::{
    admission::AdmissionController,
    batch::{run_batch, BatchEngine},
    fetch::HttpFetcher,
};
pub use domain::model::{BatchRequest, BatchSettings, FetchOutcome, ResultSet};
pub use utils::error::{FetchError, LinkError, Result};
