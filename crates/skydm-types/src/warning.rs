//! Recoverable conditions and the sink they are delivered to.
//!
//! Expansion and changelog computation tolerate partial failure: a missing
//! file for one version degrades the result instead of aborting the run.
//! Each such degradation is described by a [`Warning`] and handed to a
//! [`WarningSink`] that the caller injects into the engine.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

/// A recoverable condition reported instead of an error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Warning {
    /// One or both files of a version pair do not exist, so no diff was
    /// computed for that pair.
    MissingFiles {
        older: String,
        older_exists: bool,
        newer: String,
        newer_exists: bool,
    },
    /// Fewer versions have backing files than were requested.
    IncompleteChangelog {
        product: String,
        requested: usize,
        existing: usize,
    },
    /// No concrete file backing could be determined for a version, so a
    /// placeholder object was produced.
    PlaceholderFallback {
        product: String,
        version: String,
        reason: String,
    },
}

impl Warning {
    /// Short machine-readable label for the warning category.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingFiles { .. } => "missing_files",
            Self::IncompleteChangelog { .. } => "incomplete_changelog",
            Self::PlaceholderFallback { .. } => "placeholder_fallback",
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFiles {
                older,
                older_exists,
                newer,
                newer_exists,
            } => write!(
                f,
                "one or more files does not exist; cannot compute changelog for this \
                 changeset. Version {older}: exists={older_exists}; \
                 Version {newer}: exists={newer_exists}"
            ),
            Self::IncompleteChangelog {
                product,
                requested,
                existing,
            } => write!(
                f,
                "only {existing} of {requested} files exist for product {product}; \
                 changelog will be incomplete"
            ),
            Self::PlaceholderFallback {
                product,
                version,
                reason,
            } => write!(
                f,
                "cannot expand product {product} at version {version}: {reason}; \
                 defaulting to a placeholder object"
            ),
        }
    }
}

/// Destination for [`Warning`]s.
///
/// Engines receive a sink at construction instead of writing to a global
/// logger, so tests can observe exactly which warnings were raised.
pub trait WarningSink: Send + Sync {
    /// Deliver a single warning.
    fn warn(&self, warning: Warning);
}

impl<W: WarningSink + ?Sized> WarningSink for Arc<W> {
    fn warn(&self, warning: Warning) {
        (**self).warn(warning)
    }
}

impl<W: WarningSink + ?Sized> WarningSink for &W {
    fn warn(&self, warning: Warning) {
        (**self).warn(warning)
    }
}

/// Forwards every warning to `tracing::warn!`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingWarnings;

impl WarningSink for TracingWarnings {
    fn warn(&self, warning: Warning) {
        tracing::warn!(kind = warning.kind(), "{warning}");
    }
}

/// Collects warnings in memory.
///
/// Intended for tests and for callers that want to present warnings
/// alongside a result. Optionally forwards each warning to `tracing` too.
#[derive(Debug, Default)]
pub struct RecordingWarnings {
    warnings: Mutex<Vec<Warning>>,
    forward: bool,
}

impl RecordingWarnings {
    /// Create an empty recorder that does not log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recorder that also forwards each warning to `tracing`.
    pub fn forwarding() -> Self {
        Self {
            warnings: Mutex::new(Vec::new()),
            forward: true,
        }
    }

    /// Snapshot of all warnings recorded so far, in arrival order.
    pub fn warnings(&self) -> Vec<Warning> {
        self.warnings.lock().expect("lock poisoned").clone()
    }

    /// Number of warnings recorded.
    pub fn len(&self) -> usize {
        self.warnings.lock().expect("lock poisoned").len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain and return all recorded warnings.
    pub fn take(&self) -> Vec<Warning> {
        std::mem::take(&mut *self.warnings.lock().expect("lock poisoned"))
    }
}

impl WarningSink for RecordingWarnings {
    fn warn(&self, warning: Warning) {
        if self.forward {
            TracingWarnings.warn(warning.clone());
        }
        self.warnings.lock().expect("lock poisoned").push(warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn missing() -> Warning {
        Warning::MissingFiles {
            older: "v1".into(),
            older_exists: true,
            newer: "v2".into(),
            newer_exists: false,
        }
    }

    #[test]
    fn recorder_keeps_arrival_order() {
        let sink = RecordingWarnings::new();
        sink.warn(missing());
        sink.warn(Warning::IncompleteChangelog {
            product: "cube".into(),
            requested: 3,
            existing: 2,
        });

        let got = sink.warnings();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].kind(), "missing_files");
        assert_eq!(got[1].kind(), "incomplete_changelog");
    }

    #[test]
    fn take_drains_the_recorder() {
        let sink = RecordingWarnings::new();
        sink.warn(missing());
        assert_eq!(sink.take().len(), 1);
        assert!(sink.is_empty());
    }

    #[test]
    fn display_names_versions() {
        let text = missing().to_string();
        assert!(text.contains("Version v1: exists=true"));
        assert!(text.contains("Version v2: exists=false"));
    }

    #[test]
    fn shared_sink_through_arc() {
        let sink = Arc::new(RecordingWarnings::new());
        let dyn_sink: Arc<dyn WarningSink> = sink.clone();
        dyn_sink.warn(missing());
        assert_eq!(sink.len(), 1);
    }

    #[traced_test]
    #[test]
    fn tracing_sink_emits_warning() {
        TracingWarnings.warn(missing());
        assert!(logs_contain("cannot compute changelog"));
        assert!(logs_contain("missing_files"));
    }
}
