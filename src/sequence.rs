//! The annotated sequence: chunk units in narrative order
//!
//! Units are created once from a diff and afterwards only reordered and
//! described. Nothing here talks to storage; `Session` schedules saves
//! after each mutation.

use crate::chunk::{expand, ChunkUnit, FilePair};
use crate::diff::parse;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotatedSequence {
    id: Option<String>,
    units: Vec<ChunkUnit>,
}

impl AnnotatedSequence {
    /// An unsaved sequence built from raw diff text
    pub fn from_raw(raw: &str) -> Self {
        Self {
            id: None,
            units: expand(parse(raw)),
        }
    }

    /// A sequence already held by a store under `id`
    pub fn with_id(id: impl Into<String>, units: Vec<ChunkUnit>) -> Self {
        Self {
            id: Some(id.into()),
            units,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Record the id issued by the store. The first id sticks.
    pub(crate) fn assign_id(&mut self, id: String) {
        if self.id.is_none() {
            self.id = Some(id);
        }
    }

    pub fn units(&self) -> &[ChunkUnit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Replace the whole content with the chunks of `raw`, keeping the id.
    ///
    /// Returns the number of units produced; zero means the text held no
    /// recognisable hunks.
    pub fn set_from_raw(&mut self, raw: &str) -> usize {
        self.units = expand(parse(raw));
        self.units.len()
    }

    /// Move the unit at `old_position` to `new_position`, shifting the rest.
    pub fn reorder(&mut self, old_position: usize, new_position: usize) -> Result<()> {
        let len = self.units.len();
        for position in [old_position, new_position] {
            if position >= len {
                return Err(Error::PositionOutOfRange { position, len });
            }
        }

        let unit = self.units.remove(old_position);
        self.units.insert(new_position, unit);
        Ok(())
    }

    pub fn position_of(&self, file_pair: &FilePair, chunk_index: usize) -> Option<usize> {
        self.units
            .iter()
            .position(|u| u.matches(file_pair, chunk_index))
    }

    pub fn set_description(
        &mut self,
        file_pair: &FilePair,
        chunk_index: usize,
        text: &str,
    ) -> Result<()> {
        let position = self
            .position_of(file_pair, chunk_index)
            .ok_or_else(|| Error::IdentityNotFound {
                from: file_pair.from.clone(),
                to: file_pair.to.clone(),
                chunk_index,
            })?;

        self.units[position].description = text.to_string();
        Ok(())
    }
}
