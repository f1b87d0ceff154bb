//! Keyed storage for annotated sequences

use crate::chunk::ChunkUnit;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// The record a store holds: `{ id?, diff: [unit, ...] }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedDiff {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub diff: Vec<ChunkUnit>,
}

/// A store of annotated sequences addressed by a store-issued id.
///
/// `create` is called once for a sequence that has never been saved;
/// every later save of that sequence goes through `update`.
pub trait Store {
    /// Save a new sequence and return the id it is now known by
    fn create(&mut self, diff: &[ChunkUnit]) -> Result<String>;

    fn update(&mut self, id: &str, diff: &[ChunkUnit]) -> Result<()>;

    fn load(&mut self, id: &str) -> Result<Vec<ChunkUnit>>;
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn create(&mut self, diff: &[ChunkUnit]) -> Result<String> {
        (**self).create(diff)
    }

    fn update(&mut self, id: &str, diff: &[ChunkUnit]) -> Result<()> {
        (**self).update(id, diff)
    }

    fn load(&mut self, id: &str) -> Result<Vec<ChunkUnit>> {
        (**self).load(id)
    }
}
