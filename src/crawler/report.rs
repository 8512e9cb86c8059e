use crate::state::PassKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one pass, appended to the pass journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    pub pass: PassKind,

    pub started_at: DateTime<Utc>,

    /// `None` while the pass is still running
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,

    /// Regions a session was opened in
    #[serde(default)]
    pub regions_visited: u64,

    /// Regions that could not be reached or read; retried on the next run
    #[serde(default)]
    pub regions_skipped: u64,

    /// Regions with nothing missing, skipped before connecting
    #[serde(default)]
    pub regions_up_to_date: u64,

    /// Units stored: new ids, title records or thumbnails
    #[serde(default)]
    pub acquired: u64,

    /// Units that failed or came back empty; retried on the next run
    #[serde(default)]
    pub failed: u64,

    /// Units that could not be attempted, such as ids without a title name
    #[serde(default)]
    pub skipped: u64,
}

impl PassReport {
    pub fn start(pass: PassKind) -> Self {
        Self {
            pass,
            started_at: Utc::now(),
            finished_at: None,
            regions_visited: 0,
            regions_skipped: 0,
            regions_up_to_date: 0,
            acquired: 0,
            failed: 0,
            skipped: 0,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    pub fn elapsed(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|finished| finished - self.started_at)
    }
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pass: {} regions visited, {} skipped, {} up to date; {} acquired, {} failed, {} skipped",
            self.pass,
            self.regions_visited,
            self.regions_skipped,
            self.regions_up_to_date,
            self.acquired,
            self.failed,
            self.skipped
        )?;
        if let Some(elapsed) = self.elapsed() {
            write!(f, " in {}s", elapsed.num_seconds())?;
        }
        Ok(())
    }
}
