//! Session controller: one owner of an annotated sequence
//!
//! Every mutation is applied synchronously and then schedules a debounced
//! save. The front-end calls `tick()` from its event loop to run saves that
//! have come due and `flush()` before it exits. A failed save leaves the
//! local state as it is and is not retried until the next mutation.

use crate::chunk::FilePair;
use crate::debounce::{Clock, Debouncer};
use crate::error::Result;
use crate::sequence::AnnotatedSequence;
use crate::share;
use crate::source::{DiffFetcher, SourceAcquirer};
use crate::store::Store;
use log::{debug, info, warn};
use std::time::Duration;

pub struct Session<S, C> {
    sequence: AnnotatedSequence,
    store: S,
    clock: C,
    debouncer: Debouncer,
}

impl<S: Store, C: Clock> Session<S, C> {
    /// A session with an empty, never-saved sequence
    pub fn new(store: S, clock: C, window: Duration) -> Self {
        Self {
            sequence: AnnotatedSequence::default(),
            store,
            clock,
            debouncer: Debouncer::new(window),
        }
    }

    /// Resume the sequence stored under `id`
    pub fn open(mut store: S, clock: C, window: Duration, id: &str) -> Result<Self> {
        let units = store.load(id)?;
        info!("loaded diff {} with {} chunks", id, units.len());

        Ok(Self {
            sequence: AnnotatedSequence::with_id(id, units),
            store,
            clock,
            debouncer: Debouncer::new(window),
        })
    }

    pub fn sequence(&self) -> &AnnotatedSequence {
        &self.sequence
    }

    pub fn id(&self) -> Option<&str> {
        self.sequence.id()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn share_path(&self, prefix: &str) -> Option<String> {
        self.id().map(|id| share::share_path(prefix, id))
    }

    pub fn has_pending_save(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Replace the content with the chunks of `raw`. An already-saved
    /// sequence keeps its id, so the next save overwrites it.
    pub fn set_from_raw(&mut self, raw: &str) -> usize {
        let count = self.sequence.set_from_raw(raw);
        if count == 0 {
            warn!("diff text contained no hunks");
        }
        self.schedule_save();
        count
    }

    pub fn reorder(&mut self, old_position: usize, new_position: usize) -> Result<()> {
        self.sequence.reorder(old_position, new_position)?;
        self.schedule_save();
        Ok(())
    }

    pub fn set_description(
        &mut self,
        file_pair: &FilePair,
        chunk_index: usize,
        text: &str,
    ) -> Result<()> {
        self.sequence.set_description(file_pair, chunk_index, text)?;
        self.schedule_save();
        Ok(())
    }

    /// Fetch a pull request's diff and load it. On failure nothing changes.
    pub fn load_pull_request<F: DiffFetcher>(
        &mut self,
        acquirer: &SourceAcquirer<F>,
        url: &str,
    ) -> Result<usize> {
        let raw = acquirer.from_pull_request_url(url)?;
        Ok(self.set_from_raw(&raw))
    }

    /// Run the pending save if its window has elapsed. Returns whether a
    /// save was attempted.
    pub fn tick(&mut self) -> Result<bool> {
        if !self.debouncer.take_due(self.clock.now()) {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Run the pending save now, whatever its deadline
    pub fn flush(&mut self) -> Result<bool> {
        if !self.debouncer.take_pending() {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    fn schedule_save(&mut self) {
        if self.debouncer.trigger(self.clock.now()) {
            debug!("save scheduled in {:?}", self.debouncer.window());
        }
    }

    fn save(&mut self) -> Result<()> {
        let units = self.sequence.units();

        match self.sequence.id() {
            Some(id) => {
                let id = id.to_string();
                self.store.update(&id, units)?;
                debug!("saved diff {} ({} chunks)", id, units.len());
            }
            None => {
                let id = self.store.create(units)?;
                info!("created diff {}", id);
                self.sequence.assign_id(id);
            }
        }

        Ok(())
    }
}
