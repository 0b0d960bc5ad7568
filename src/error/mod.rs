mod publisher;

pub use publisher::PublisherError;
