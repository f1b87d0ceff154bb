//! literate-diff - turn a unified diff into an annotated, reorderable narrative
//!
//! A diff is parsed into files and hunks, each hunk becomes a `ChunkUnit`
//! that can be moved and described on its own, and the resulting sequence is
//! saved under a shareable id through a `Store`.

pub mod chunk;
pub mod debounce;
pub mod diff;
pub mod error;
pub mod remote;
pub mod sequence;
pub mod session;
pub mod share;
pub mod source;
pub mod storage;
pub mod store;

pub use chunk::{expand, ChunkUnit, FilePair};
pub use diff::{parse, FileDiff, RawChunk};
pub use error::{Error, Result};
pub use sequence::AnnotatedSequence;
pub use session::Session;
pub use store::{PersistedDiff, Store};
