pub mod router;
mod routes;

pub use router::{PublisherState, publisher_router};
