//! Batched commands and their replies.

use crate::{CacheError, CacheResult};

/// A single store command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Get { key: String },
    Set { key: String, value: String },
    Exists { key: String },
    Delete { key: String },
    Incr { key: String },
    HGet { key: String, field: String },
    HSet { key: String, field: String, value: String },
    HExists { key: String, field: String },
    SAdd { key: String, members: Vec<String> },
    SRem { key: String, members: Vec<String> },
    SPop { key: String },
    SMembers { key: String },
    /// Return the value at `slot` to the `pool` set, pop a new member into
    /// `slot`, and refill `pool` from `candidates` if it is empty. Replies
    /// with the new member, or nil when `candidates` is empty too.
    RotateSlot {
        slot: String,
        pool: String,
        candidates: String,
    },
}

/// Reply to a single command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Missing value.
    Nil,
    /// Status acknowledgement.
    Ok,
    /// Integer reply (counts, booleans, counters).
    Int(i64),
    /// Single string value.
    Bulk(String),
    /// Multiple string values.
    Multi(Vec<String>),
}

impl Reply {
    /// Interpret as an optional string.
    pub fn into_string(self) -> CacheResult<Option<String>> {
        match self {
            Reply::Nil => Ok(None),
            Reply::Bulk(s) => Ok(Some(s)),
            other => Err(CacheError::UnexpectedReply(format!("{:?}", other))),
        }
    }

    /// Interpret as an integer.
    pub fn into_int(self) -> CacheResult<i64> {
        match self {
            Reply::Int(n) => Ok(n),
            other => Err(CacheError::UnexpectedReply(format!("{:?}", other))),
        }
    }

    /// Interpret as a boolean (integer `0`/`1`).
    pub fn into_bool(self) -> CacheResult<bool> {
        self.into_int().map(|n| n != 0)
    }

    /// Interpret as a list of strings.
    pub fn into_list(self) -> CacheResult<Vec<String>> {
        match self {
            Reply::Nil => Ok(Vec::new()),
            Reply::Multi(items) => Ok(items),
            other => Err(CacheError::UnexpectedReply(format!("{:?}", other))),
        }
    }
}

/// An ordered batch of commands sent in one round-trip.
///
/// A plain pipeline is an optimization, not a transaction: other clients may
/// interleave with it. An [`atomic`](Pipeline::atomic) pipeline asks the
/// backend to run it as one indivisible unit (MULTI/EXEC on Redis).
///
/// # Example
///
/// ```rust
/// use hotelads_cache::Pipeline;
///
/// let pipe = Pipeline::atomic()
///     .delete("free_hotels_1")
///     .sadd("rec_context_hotels_1", ["10", "11"]);
/// assert_eq!(pipe.len(), 2);
/// assert!(pipe.is_atomic());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    commands: Vec<Command>,
    atomic: bool,
}

impl Pipeline {
    /// Create an empty non-transactional pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty transactional pipeline.
    pub fn atomic() -> Self {
        Self {
            commands: Vec::new(),
            atomic: true,
        }
    }

    pub fn is_atomic(&self) -> bool {
        self.atomic
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Consume and return the queued commands.
    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }

    /// Queue an arbitrary command.
    pub fn push(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    pub fn get(self, key: impl Into<String>) -> Self {
        self.push(Command::Get { key: key.into() })
    }

    pub fn set(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(Command::Set {
            key: key.into(),
            value: value.into(),
        })
    }

    pub fn exists(self, key: impl Into<String>) -> Self {
        self.push(Command::Exists { key: key.into() })
    }

    pub fn delete(self, key: impl Into<String>) -> Self {
        self.push(Command::Delete { key: key.into() })
    }

    pub fn incr(self, key: impl Into<String>) -> Self {
        self.push(Command::Incr { key: key.into() })
    }

    pub fn hget(self, key: impl Into<String>, field: impl Into<String>) -> Self {
        self.push(Command::HGet {
            key: key.into(),
            field: field.into(),
        })
    }

    pub fn hset(
        self,
        key: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.push(Command::HSet {
            key: key.into(),
            field: field.into(),
            value: value.into(),
        })
    }

    pub fn hexists(self, key: impl Into<String>, field: impl Into<String>) -> Self {
        self.push(Command::HExists {
            key: key.into(),
            field: field.into(),
        })
    }

    pub fn sadd<I, S>(self, key: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(Command::SAdd {
            key: key.into(),
            members: members.into_iter().map(Into::into).collect(),
        })
    }

    pub fn srem<I, S>(self, key: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(Command::SRem {
            key: key.into(),
            members: members.into_iter().map(Into::into).collect(),
        })
    }

    pub fn spop(self, key: impl Into<String>) -> Self {
        self.push(Command::SPop { key: key.into() })
    }

    pub fn smembers(self, key: impl Into<String>) -> Self {
        self.push(Command::SMembers { key: key.into() })
    }

    pub fn rotate_slot(
        self,
        slot: impl Into<String>,
        pool: impl Into<String>,
        candidates: impl Into<String>,
    ) -> Self {
        self.push(Command::RotateSlot {
            slot: slot.into(),
            pool: pool.into(),
            candidates: candidates.into(),
        })
    }
}
