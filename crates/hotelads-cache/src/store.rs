//! Cache store backend trait.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::{CacheResult, Command, Pipeline, Reply};

/// Key-Value store backend.
///
/// Backends only have to implement [`execute`](CacheStore::execute); every
/// single-command method defaults to a one-command pipeline. Each individual
/// command must be atomic with respect to concurrent callers (`incr` never
/// hands out the same value twice, `spop` never returns the same member to
/// two callers).
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Run a batch of commands and return one reply per command, in order.
    ///
    /// If a command fails the remaining commands are not run and
    /// [`CacheError::PipelineAborted`](crate::CacheError::PipelineAborted) is
    /// returned.
    async fn execute(&self, pipeline: Pipeline) -> CacheResult<Vec<Reply>>;

    /// Get a string value.
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        single(self, Command::Get { key: key.into() })
            .await?
            .into_string()
    }

    /// Set a string value.
    async fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        single(
            self,
            Command::Set {
                key: key.into(),
                value: value.into(),
            },
        )
        .await
        .map(|_| ())
    }

    /// Check if a key exists.
    async fn exists(&self, key: &str) -> CacheResult<bool> {
        single(self, Command::Exists { key: key.into() })
            .await?
            .into_bool()
    }

    /// Delete a key. Returns whether it existed.
    async fn delete(&self, key: &str) -> CacheResult<bool> {
        single(self, Command::Delete { key: key.into() })
            .await?
            .into_bool()
    }

    /// Atomically increment a counter and return the new value.
    async fn incr(&self, key: &str) -> CacheResult<i64> {
        single(self, Command::Incr { key: key.into() })
            .await?
            .into_int()
    }

    /// Get a hash field.
    async fn hget(&self, key: &str, field: &str) -> CacheResult<Option<String>> {
        single(
            self,
            Command::HGet {
                key: key.into(),
                field: field.into(),
            },
        )
        .await?
        .into_string()
    }

    /// Set a hash field.
    async fn hset(&self, key: &str, field: &str, value: &str) -> CacheResult<()> {
        single(
            self,
            Command::HSet {
                key: key.into(),
                field: field.into(),
                value: value.into(),
            },
        )
        .await
        .map(|_| ())
    }

    /// Check if a hash field exists.
    async fn hexists(&self, key: &str, field: &str) -> CacheResult<bool> {
        single(
            self,
            Command::HExists {
                key: key.into(),
                field: field.into(),
            },
        )
        .await?
        .into_bool()
    }

    /// Add members to a set. Returns how many were new.
    async fn sadd(&self, key: &str, members: &[String]) -> CacheResult<u64> {
        single(
            self,
            Command::SAdd {
                key: key.into(),
                members: members.to_vec(),
            },
        )
        .await?
        .into_int()
        .map(|n| n as u64)
    }

    /// Remove members from a set. Returns how many were present.
    async fn srem(&self, key: &str, members: &[String]) -> CacheResult<u64> {
        single(
            self,
            Command::SRem {
                key: key.into(),
                members: members.to_vec(),
            },
        )
        .await?
        .into_int()
        .map(|n| n as u64)
    }

    /// Remove and return an arbitrary member of a set.
    async fn spop(&self, key: &str) -> CacheResult<Option<String>> {
        single(self, Command::SPop { key: key.into() })
            .await?
            .into_string()
    }

    /// All members of a set, in no particular order.
    async fn smembers(&self, key: &str) -> CacheResult<Vec<String>> {
        single(self, Command::SMembers { key: key.into() })
            .await?
            .into_list()
    }

    /// Rotate a slot through a pool, as one atomic step.
    ///
    /// The slot's current member goes back into `pool`, then a member is
    /// popped from `pool` into the slot. An empty pool is first refilled from
    /// `candidates`. Returns the new member, or `None` when there are no
    /// candidates. On Redis this is a server-side script.
    async fn rotate_slot(
        &self,
        slot: &str,
        pool: &str,
        candidates: &str,
    ) -> CacheResult<Option<String>> {
        single(
            self,
            Command::RotateSlot {
                slot: slot.into(),
                pool: pool.into(),
                candidates: candidates.into(),
            },
        )
        .await?
        .into_string()
    }
}

async fn single<S: CacheStore + ?Sized>(store: &S, command: Command) -> CacheResult<Reply> {
    let mut replies = store.execute(Pipeline::new().push(command)).await?;
    replies
        .pop()
        .ok_or_else(|| crate::CacheError::UnexpectedReply("empty reply".to_string()))
}

/// JSON helpers for hash fields.
#[async_trait]
pub trait CacheStoreExt: CacheStore {
    /// Get a hash field and deserialize it from JSON.
    async fn hget_json<T: DeserializeOwned + Send>(
        &self,
        key: &str,
        field: &str,
    ) -> CacheResult<Option<T>> {
        match self.hget(key, field).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Serialize a value to JSON and store it in a hash field.
    async fn hset_json<T: Serialize + Sync>(
        &self,
        key: &str,
        field: &str,
        value: &T,
    ) -> CacheResult<()> {
        let raw = serde_json::to_string(value)?;
        self.hset(key, field, &raw).await
    }
}

impl<S: CacheStore + ?Sized> CacheStoreExt for S {}
