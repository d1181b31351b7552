//! Network transport used by the remote clients.

mod error;
mod http;

pub use error::TransportError;
pub use http::HttpTransportClient;
