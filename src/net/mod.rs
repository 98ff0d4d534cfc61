//! Network layer: request/response values, scope resolution and fetch backends

mod fetcher;
pub mod http;
pub mod message;
mod origin;

pub use fetcher::Network;
pub use http::HttpNetwork;
pub use message::{CacheMode, Method, Request, RequestKey, RequestMode, Response};
pub use origin::AppOrigin;
