//! HTTP plumbing: the public and authenticated clients, their error type and
//! the typed backend API built on top of them.

pub mod api;
pub mod errors;
pub mod http;

pub use api::{MarketApi, WriteAck};
pub use errors::{ApiError, ApiResult};
pub use http::{AuthedClient, PublicClient};
