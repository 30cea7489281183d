//! Skip-queue records
//!
//! A [`SkipEntry`] pins down everything needed to fast-forward a list later:
//! a captured copy of the list (branch caches included) and the index it was
//! started from. Replaying builds a fresh runner, so the old instance never
//! goes through end-of-list processing mid-skip.

use crate::runtime::runner::Runner;
use crate::types::list::{ActionList, ListSource};

#[derive(Debug, Clone)]
pub struct SkipEntry {
    list: ActionList,
    /// Source asset id when the list was instantiated from one
    asset: Option<String>,
    start_index: usize,
}

impl SkipEntry {
    /// Record a list at queue time, before it runs.
    pub fn capture(list: &ActionList, start_index: usize) -> Self {
        let asset = match &list.source {
            ListSource::Asset { id } => Some(id.clone()),
            ListSource::Embedded => None,
        };
        let mut captured = list.clone();
        captured.reset();
        Self {
            list: captured,
            asset,
            start_index,
        }
    }

    pub fn list_id(&self) -> &str {
        &self.list.id
    }

    pub fn asset_id(&self) -> Option<&str> {
        self.asset.as_deref()
    }

    pub fn start_index(&self) -> usize {
        self.start_index
    }

    /// Refresh the captured copy from a live instance so the branch caches
    /// recorded during its run carry over into the replay.
    pub fn sync(&mut self, live: &ActionList) {
        let mut captured = live.clone();
        captured.reset();
        self.list = captured;
    }

    /// Re-invoke normally from the recorded index.
    pub fn resume_runner(&self, now: f64) -> Runner {
        let mut runner = Runner::new(self.list.clone());
        runner.interact(self.start_index, now);
        runner
    }

    /// Re-invoke in skip mode from the recorded index.
    pub fn skip_runner(&self, now: f64) -> Runner {
        let mut runner = Runner::new(self.list.clone());
        runner.skip_from(self.start_index, now);
        runner
    }
}
