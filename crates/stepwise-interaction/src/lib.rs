//! HTTP clients for the Stepwise backend.

pub mod assistant_backend;
pub mod catalog_source;
pub mod http;
pub mod sse;

pub use assistant_backend::HttpAssistantBackend;
pub use catalog_source::HttpCatalogSource;
pub use http::ApiClient;
pub use sse::SseDecoder;
