//! Key-Value cache store for hotel ad rotation.
//!
//! The rotation engine never holds state in process. Everything durable lives
//! behind [`CacheStore`], a small Redis-shaped API (strings, hashes, sets,
//! counters, pipelines). [`InMemoryStore`] implements it for tests and local
//! tooling.
//!
//! # Example
//!
//! ```rust,ignore
//! use hotelads_cache::{keys, CacheStore, InMemoryStore, Pipeline};
//!
//! let store = InMemoryStore::new();
//!
//! let id = store.incr(keys::CONTEXT_ID_GENERATOR).await?;
//! store.hset(keys::CONTEXT_ZIPCODES, &id.to_string(), "10001").await?;
//!
//! let replies = store
//!     .execute(
//!         Pipeline::atomic()
//!             .delete(keys::free_hotels(id))
//!             .sadd(keys::context_hotels(id), ["1", "2", "3", "4"]),
//!     )
//!     .await?;
//! ```

mod error;
pub mod keys;
mod memory;
mod pipeline;
mod store;

pub use error::{CacheError, CacheResult};
pub use memory::InMemoryStore;
pub use pipeline::{Command, Pipeline, Reply};
pub use store::{CacheStore, CacheStoreExt};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{keys, CacheError, CacheResult, CacheStore, CacheStoreExt, Pipeline, Reply};
}
