pub mod commands;
pub mod persist;

use std::collections::HashMap;

use crate::digest::Digest;
use crate::error::{Error, Result};

/// A value slot as seen at this module's boundary. The host engine keeps
/// other value kinds in the same keyspace; they surface here as
/// [`Value::Bytes`] so type mismatches are a real, observable path.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Digest(Digest),
    Bytes(Vec<u8>),
}

/// The storage-engine handle the digest commands run against: an owned
/// map from keys to typed value slots. Constructed explicitly and passed
/// by `&mut`; there is no process-wide instance. One caller context
/// mutates a keyspace at a time; cross-key concurrency control belongs
/// to the host engine.
#[derive(Debug, Default)]
pub struct Keyspace {
    slots: HashMap<String, Value>,
}

impl Keyspace {
    pub fn new() -> Keyspace {
        Keyspace::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    /// Store a non-digest value, standing in for the host engine's other
    /// types.
    pub fn set_bytes(&mut self, key: &str, bytes: Vec<u8>) {
        self.slots.insert(key.to_string(), Value::Bytes(bytes));
    }

    /// Drop a key and whatever it holds. Returns whether it existed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.slots.remove(key).is_some()
    }

    pub(crate) fn slot(&self, key: &str) -> Option<&Value> {
        self.slots.get(key)
    }

    pub(crate) fn insert_digest(&mut self, key: &str, digest: Digest) {
        self.slots.insert(key.to_string(), Value::Digest(digest));
    }

    /// Mutable access to the digest at `key`, distinguishing a missing
    /// key from a mistyped one.
    pub(crate) fn digest_mut(&mut self, key: &str) -> Result<&mut Digest> {
        match self.slots.get_mut(key) {
            None => Err(Error::NoSuchKey {
                key: key.to_string(),
            }),
            Some(Value::Digest(d)) => Ok(d),
            Some(_) => Err(Error::WrongType {
                key: key.to_string(),
            }),
        }
    }

}
