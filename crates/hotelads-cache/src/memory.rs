//! In-memory cache store (for development/testing).

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::SeedableRng;
use tokio::sync::Mutex;

use crate::{CacheError, CacheResult, CacheStore, Command, Pipeline, Reply};

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Hash(HashMap<String, String>),
    Set(BTreeSet<String>),
}

struct Inner {
    data: HashMap<String, Value>,
    rng: StdRng,
}

/// In-memory [`CacheStore`].
///
/// Every pipeline runs under one lock, so all pipelines are atomic here even
/// when not asked to be. Sets are ordered internally so that `spop` is fully
/// determined by the seed passed to [`with_seed`](InMemoryStore::with_seed).
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    /// Create an empty store with an entropy-seeded `spop`.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Create an empty store with a reproducible `spop` order.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            inner: Mutex::new(Inner {
                data: HashMap::new(),
                rng,
            }),
        }
    }

    /// All keys currently stored, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let inner = self.inner.lock().await;
        let mut keys: Vec<String> = inner.data.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Remove everything.
    pub async fn clear(&self) {
        self.inner.lock().await.data.clear();
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for InMemoryStore {
    async fn execute(&self, pipeline: Pipeline) -> CacheResult<Vec<Reply>> {
        let mut inner = self.inner.lock().await;
        let commands = pipeline.into_commands();
        let total = commands.len();
        let mut replies = Vec::with_capacity(total);

        for (completed, command) in commands.into_iter().enumerate() {
            match inner.apply(command) {
                Ok(reply) => replies.push(reply),
                Err(e) => {
                    return Err(CacheError::PipelineAborted {
                        completed,
                        total,
                        source: Box::new(e),
                    })
                }
            }
        }

        Ok(replies)
    }
}

impl Inner {
    fn apply(&mut self, command: Command) -> CacheResult<Reply> {
        match command {
            Command::Get { key } => match self.data.get(&key) {
                None => Ok(Reply::Nil),
                Some(Value::Str(s)) => Ok(Reply::Bulk(s.clone())),
                Some(_) => Err(CacheError::WrongType(key)),
            },
            Command::Set { key, value } => {
                self.data.insert(key, Value::Str(value));
                Ok(Reply::Ok)
            }
            Command::Exists { key } => Ok(Reply::Int(self.data.contains_key(&key) as i64)),
            Command::Delete { key } => Ok(Reply::Int(self.data.remove(&key).is_some() as i64)),
            Command::Incr { key } => {
                let next = match self.data.get(&key) {
                    None => 1,
                    Some(Value::Str(s)) => s
                        .parse::<i64>()
                        .ok()
                        .and_then(|n| n.checked_add(1))
                        .ok_or_else(|| CacheError::NotAnInteger(key.clone()))?,
                    Some(_) => return Err(CacheError::WrongType(key)),
                };
                self.data.insert(key, Value::Str(next.to_string()));
                Ok(Reply::Int(next))
            }
            Command::HGet { key, field } => match self.data.get(&key) {
                None => Ok(Reply::Nil),
                Some(Value::Hash(h)) => Ok(h.get(&field).cloned().map_or(Reply::Nil, Reply::Bulk)),
                Some(_) => Err(CacheError::WrongType(key)),
            },
            Command::HSet { key, field, value } => {
                let entry = self
                    .data
                    .entry(key.clone())
                    .or_insert_with(|| Value::Hash(HashMap::new()));
                match entry {
                    Value::Hash(h) => {
                        let created = h.insert(field, value).is_none();
                        Ok(Reply::Int(created as i64))
                    }
                    _ => Err(CacheError::WrongType(key)),
                }
            }
            Command::HExists { key, field } => match self.data.get(&key) {
                None => Ok(Reply::Int(0)),
                Some(Value::Hash(h)) => Ok(Reply::Int(h.contains_key(&field) as i64)),
                Some(_) => Err(CacheError::WrongType(key)),
            },
            Command::SAdd { key, members } => {
                if members.is_empty() {
                    return Ok(Reply::Int(0));
                }
                let entry = self
                    .data
                    .entry(key.clone())
                    .or_insert_with(|| Value::Set(BTreeSet::new()));
                match entry {
                    Value::Set(set) => {
                        let added = members.into_iter().filter(|m| set.insert(m.clone())).count();
                        Ok(Reply::Int(added as i64))
                    }
                    _ => Err(CacheError::WrongType(key)),
                }
            }
            Command::SRem { key, members } => {
                let (removed, now_empty) = match self.data.get_mut(&key) {
                    None => return Ok(Reply::Int(0)),
                    Some(Value::Set(set)) => {
                        let removed = members.iter().filter(|m| set.remove(*m)).count();
                        (removed, set.is_empty())
                    }
                    Some(_) => return Err(CacheError::WrongType(key)),
                };
                if now_empty {
                    self.data.remove(&key);
                }
                Ok(Reply::Int(removed as i64))
            }
            Command::SPop { key } => {
                let (popped, now_empty) = match self.data.get_mut(&key) {
                    None => return Ok(Reply::Nil),
                    Some(Value::Set(set)) => {
                        let picked = set.iter().choose(&mut self.rng).cloned();
                        if let Some(ref member) = picked {
                            set.remove(member);
                        }
                        (picked, set.is_empty())
                    }
                    Some(_) => return Err(CacheError::WrongType(key)),
                };
                // Empty sets do not exist.
                if now_empty {
                    self.data.remove(&key);
                }
                Ok(popped.map_or(Reply::Nil, Reply::Bulk))
            }
            Command::SMembers { key } => match self.data.get(&key) {
                None => Ok(Reply::Multi(Vec::new())),
                Some(Value::Set(set)) => Ok(Reply::Multi(set.iter().cloned().collect())),
                Some(_) => Err(CacheError::WrongType(key)),
            },
            Command::RotateSlot {
                slot,
                pool,
                candidates,
            } => {
                if let Reply::Bulk(current) = self.apply(Command::Get { key: slot.clone() })? {
                    self.apply(Command::SAdd {
                        key: pool.clone(),
                        members: vec![current],
                    })?;
                }
                let mut next = self.apply(Command::SPop { key: pool.clone() })?;
                if next == Reply::Nil {
                    let members = self.apply(Command::SMembers { key: candidates })?.into_list()?;
                    if members.is_empty() {
                        return Ok(Reply::Nil);
                    }
                    self.apply(Command::SAdd {
                        key: pool.clone(),
                        members,
                    })?;
                    next = self.apply(Command::SPop { key: pool })?;
                }
                if let Reply::Bulk(member) = &next {
                    self.data.insert(slot, Value::Str(member.clone()));
                }
                Ok(next)
            }
        }
    }
}
