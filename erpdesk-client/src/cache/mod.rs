//! Tagged query cache.
//!
//! Queries declare the tags their result provides; mutations declare the
//! tags they invalidate. Each distinct query value is cached under its own
//! key, so a different page or search term never evicts another.

mod store;
mod tags;

pub use store::QueryCache;
pub use tags::{CacheTag, TagKind};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::transport::ApiRequest;

/// A cacheable read. The value itself is the cache key's parameter set.
pub trait Query: Serialize + Send + Sync {
    /// Endpoint name, the prefix of every cache key for this query.
    const NAME: &'static str;

    type Output: DeserializeOwned + Send;

    /// The request that fetches this query.
    ///
    /// # Errors
    /// Fails when the request body cannot be encoded.
    fn request(&self) -> Result<ApiRequest, ApiError>;

    /// Tags the fetched result provides.
    fn provides(&self, output: &Self::Output) -> Vec<CacheTag>;
}

/// A write that invalidates cached queries when it succeeds.
pub trait Mutation: Send + Sync {
    type Output: DeserializeOwned + Send;

    /// The request performing this mutation.
    ///
    /// # Errors
    /// Fails when the request body cannot be encoded.
    fn request(&self) -> Result<ApiRequest, ApiError>;

    /// Tags whose cached queries become stale on success.
    fn invalidates(&self) -> Vec<CacheTag>;
}
