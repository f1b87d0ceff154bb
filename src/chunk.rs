//! Chunk units: one independently orderable, annotatable wrapper per hunk

use crate::diff::{FileDiff, RawChunk, DEV_NULL};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The (source path, destination path) of one file's change
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilePair {
    pub from: String,
    pub to: String,
}

impl FilePair {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Short label for display: a single path unless the file was renamed
    pub fn label(&self) -> String {
        if self.from == self.to || self.from == DEV_NULL {
            self.to.clone()
        } else if self.to == DEV_NULL {
            self.from.clone()
        } else {
            format!("{} → {}", self.from, self.to)
        }
    }
}

impl fmt::Display for FilePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// One hunk of a diff plus the user's description of it.
///
/// `(file_pair.from, file_pair.to, chunk_index)` identifies the unit for the
/// lifetime of a sequence. `chunk_index` is the hunk's position within its
/// file, not its position in the narrative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkUnit {
    #[serde(flatten)]
    pub file_pair: FilePair,
    /// Always exactly one hunk; kept as a list for renderers that take a
    /// file's hunk list
    pub chunks: Vec<RawChunk>,
    pub chunk_index: usize,
    #[serde(default)]
    pub description: String,
}

impl ChunkUnit {
    pub fn matches(&self, file_pair: &FilePair, chunk_index: usize) -> bool {
        self.chunk_index == chunk_index && self.file_pair == *file_pair
    }

    pub fn identity(&self) -> (&str, &str, usize) {
        (&self.file_pair.from, &self.file_pair.to, self.chunk_index)
    }

    pub fn raw_chunk(&self) -> Option<&RawChunk> {
        self.chunks.first()
    }
}

/// Flatten file records into one unit per hunk, files first, then hunks in
/// file order.
///
/// When the same file pair appears in more than one record (a concatenated
/// multi-commit patch), its `chunk_index` keeps counting from the earlier
/// records so identities stay unique.
pub fn expand(records: Vec<FileDiff>) -> Vec<ChunkUnit> {
    let mut next_index: HashMap<FilePair, usize> = HashMap::new();
    let mut units = Vec::new();

    for record in records {
        let file_pair = FilePair::new(record.from, record.to);
        let counter = next_index.entry(file_pair.clone()).or_insert(0);
        for chunk in record.chunks {
            units.push(ChunkUnit {
                file_pair: file_pair.clone(),
                chunks: vec![chunk],
                chunk_index: *counter,
                description: String::new(),
            });
            *counter += 1;
        }
    }

    units
}
