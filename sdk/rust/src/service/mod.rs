//! Transport for the external keyless services.

pub mod http;

pub use http::{ServiceClient, ServiceClientBuilder};
