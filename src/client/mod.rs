//! Client construction, configuration, and the request plumbing shared by
//! all services.

mod config;
mod http;
mod listings;
mod pages;

pub use config::{ApiStyle, ClientConfig};
pub use http::MintClient;
pub use pages::PageStream;

pub(crate) use http::ClientInner;
