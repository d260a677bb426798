//! End-of-run report: append-only outcomes plus a tally by status.

use crate::models::{SyncOutcome, SyncStatus};

/// Accumulates one outcome per processed descriptor. Append-only; prior
/// entries are never touched.
#[derive(Debug, Default)]
pub struct RunReport {
    outcomes: Vec<SyncOutcome>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: SyncOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[SyncOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Tally the recorded outcomes by status.
    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for outcome in &self.outcomes {
            match outcome.status {
                SyncStatus::Applied => summary.applied += 1,
                SyncStatus::SkippedUnchanged => summary.unchanged += 1,
                SyncStatus::NotFound => summary.not_found += 1,
                SyncStatus::Ambiguous => summary.ambiguous += 1,
                SyncStatus::SeasonNotFound => summary.season_not_found += 1,
                SyncStatus::FetchFailed => summary.fetch_failed += 1,
                SyncStatus::TransformFailed => summary.transform_failed += 1,
                SyncStatus::CacheWriteFailed => summary.cache_write_failed += 1,
                SyncStatus::UploadFailed => summary.upload_failed += 1,
                SyncStatus::Cancelled => summary.cancelled += 1,
            }
        }
        summary
    }
}

/// Counts by status for the final tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub applied: u32,
    pub unchanged: u32,
    pub not_found: u32,
    pub ambiguous: u32,
    pub season_not_found: u32,
    pub fetch_failed: u32,
    pub transform_failed: u32,
    pub cache_write_failed: u32,
    pub upload_failed: u32,
    pub cancelled: u32,
}

impl Summary {
    pub fn total(&self) -> u32 {
        self.applied
            + self.unchanged
            + self.not_found
            + self.ambiguous
            + self.season_not_found
            + self.fetch_failed
            + self.transform_failed
            + self.cache_write_failed
            + self.upload_failed
            + self.cancelled
    }

    /// Everything that is neither applied nor a deliberate skip.
    pub fn failed(&self) -> u32 {
        self.total() - self.applied - self.unchanged - self.cancelled
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "applied {}, unchanged {}, not found {}, ambiguous {}, season not found {}, \
             fetch failed {}, transform failed {}, cache write failed {}, upload failed {}, \
             cancelled {}",
            self.applied,
            self.unchanged,
            self.not_found,
            self.ambiguous,
            self.season_not_found,
            self.fetch_failed,
            self.transform_failed,
            self.cache_write_failed,
            self.upload_failed,
            self.cancelled,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaKind, PosterDescriptor};

    fn outcome(status: SyncStatus) -> SyncOutcome {
        SyncOutcome::new(
            PosterDescriptor {
                title: "Inception".into(),
                year: Some(2010),
                kind: MediaKind::Movie,
                season: None,
                episode: None,
                image_url: "http://example/poster".into(),
            },
            status,
            "detail",
        )
    }

    #[test]
    fn summary_counts_by_status() {
        let mut report = RunReport::new();
        report.record(outcome(SyncStatus::Applied));
        report.record(outcome(SyncStatus::Applied));
        report.record(outcome(SyncStatus::SkippedUnchanged));
        report.record(outcome(SyncStatus::NotFound));
        report.record(outcome(SyncStatus::SeasonNotFound));
        report.record(outcome(SyncStatus::UploadFailed));

        let summary = report.summary();
        assert_eq!(summary.applied, 2);
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.not_found, 1);
        assert_eq!(summary.season_not_found, 1);
        assert_eq!(summary.upload_failed, 1);
        assert_eq!(summary.total(), 6);
        assert_eq!(summary.failed(), 3);
        assert_eq!(report.len(), 6);
    }

    #[test]
    fn outcomes_keep_insertion_order() {
        let mut report = RunReport::new();
        report.record(outcome(SyncStatus::Applied));
        report.record(outcome(SyncStatus::NotFound));
        let statuses: Vec<_> = report.outcomes().iter().map(|o| o.status).collect();
        assert_eq!(statuses, vec![SyncStatus::Applied, SyncStatus::NotFound]);
    }
}
