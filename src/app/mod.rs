// App layer: the HTTP surface over the batch pipeline.

pub mod handler;
pub mod middleware;
pub mod server;

pub use server::{AppState, Server};
