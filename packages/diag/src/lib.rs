#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Structured diagnostic sink for the data pipeline.
//!
//! Record-level failures (an incident with an unparseable location, a
//! failed live fetch) are not errors that should abort a pipeline stage,
//! but they must not vanish into log output either. Every stage reports
//! them to a [`DiagnosticSink`] so that dropped-record counts are
//! observable programmatically, not just greppable.

use std::sync::Mutex;

use strum_macros::{AsRefStr, Display, EnumString};

/// Pipeline stage that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    /// Historical crime CSV indexing.
    HistoricalIndex,
    /// Live street-crime API fetch.
    LiveFetch,
    /// Boundary document loading.
    BoundaryLoad,
}

/// A single diagnostic event emitted by a pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// One record was dropped (bad coordinates, missing field, etc.).
    DroppedRecord {
        /// Stage that dropped the record.
        stage: Stage,
        /// What was wrong with the record.
        detail: String,
    },
    /// A remote fetch failed at the document level.
    FetchFailure {
        /// Stage whose fetch failed.
        stage: Stage,
        /// Underlying error description.
        message: String,
    },
}

/// Receiver for pipeline diagnostics.
///
/// Implementations must be cheap to call from hot per-record loops.
pub trait DiagnosticSink: Send + Sync {
    /// Records one diagnostic event.
    fn record(&self, diagnostic: Diagnostic);
}

/// Sink that forwards every diagnostic to the `log` facade.
///
/// Used in production; dropped records log at `warn`, fetch failures at
/// `error`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn record(&self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::DroppedRecord { stage, detail } => {
                log::warn!("{stage}: dropped record: {detail}");
            }
            Diagnostic::FetchFailure { stage, message } => {
                log::error!("{stage}: fetch failed: {message}");
            }
        }
    }
}

/// Sink that accumulates events in memory for inspection.
///
/// Used in tests and startup summaries to assert on drop counts.
#[derive(Debug, Default)]
pub struct CountingSink {
    events: Mutex<Vec<Diagnostic>>,
}

impl CountingSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every recorded event, in arrival order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn events(&self) -> Vec<Diagnostic> {
        self.events.lock().unwrap().clone()
    }

    /// Counts dropped records attributed to `stage`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn dropped(&self, stage: Stage) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, Diagnostic::DroppedRecord { stage: s, .. } if *s == stage))
            .count()
    }

    /// Counts fetch failures attributed to `stage`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn fetch_failures(&self, stage: Stage) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, Diagnostic::FetchFailure { stage: s, .. } if *s == stage))
            .count()
    }
}

impl DiagnosticSink for CountingSink {
    fn record(&self, diagnostic: Diagnostic) {
        self.events.lock().unwrap().push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counting_sink_tallies_per_stage() {
        let sink = CountingSink::new();
        sink.record(Diagnostic::DroppedRecord {
            stage: Stage::HistoricalIndex,
            detail: "bad location".to_string(),
        });
        sink.record(Diagnostic::DroppedRecord {
            stage: Stage::LiveFetch,
            detail: "bad location".to_string(),
        });
        sink.record(Diagnostic::FetchFailure {
            stage: Stage::LiveFetch,
            message: "HTTP 502".to_string(),
        });

        assert_eq!(sink.dropped(Stage::HistoricalIndex), 1);
        assert_eq!(sink.dropped(Stage::LiveFetch), 1);
        assert_eq!(sink.fetch_failures(Stage::LiveFetch), 1);
        assert_eq!(sink.fetch_failures(Stage::BoundaryLoad), 0);
        assert_eq!(sink.events().len(), 3);
    }
}
