//! Handler adapters
//!
//! Map inbound HTTP-shaped requests onto the cache store and the summary
//! proxy, independent of any web framework. The hosting layer converts its
//! own request type into a [`HandlerRequest`] and writes back the
//! [`HandlerResponse`].

pub mod cache;
pub mod cors;
pub mod protocol;
pub mod summary;

pub use cache::CacheHandlers;
pub use cors::CorsPolicy;
pub use protocol::{HandlerRequest, HandlerResponse, Method};
pub use summary::SummaryHandler;
