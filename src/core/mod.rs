pub mod admission;
pub mod aggregate;
pub mod batch;
pub mod coordinator;
pub mod feeder;
pub mod fetch;
pub mod worker;

pub use crate::domain::model::{BatchRequest, BatchSettings, FetchOutcome, ResultSet};
pub use crate::domain::ports::{ConfigProvider, Fetcher};
pub use crate::utils::error::{FetchError, Result};
