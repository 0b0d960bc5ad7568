pub mod bootstrap;
pub mod config;
pub mod connection;
pub mod error;
pub mod model;
pub mod package;
pub mod project;
pub mod scheduler;
pub mod server;
mod utils;

pub use bootstrap::Services;
pub use error::PublisherError;
pub use package::Package;
pub use project::{Project, ProjectHandle};
