//! CTFd catalog access: the `CatalogApi` seam, wire types, and the reqwest client.

mod api;
mod error;
pub mod wire;

#[cfg(feature = "http")]
pub mod http;

pub use api::CatalogApi;
pub use error::ClientError;

#[cfg(feature = "http")]
pub use http::{Auth, CtfdClient};
#[cfg(feature = "http")]
pub use reqwest::Url;
