//! Logging facilities for Controlled Table.
//!
//! All crates in the workspace log through the `tracing` facade and never
//! install a subscriber themselves. Hosts pick a subscriber and filter by the
//! targets below:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("controlled_table::store=debug,controlled_table::editor=trace")
//!     .init();
//! ```

/// Span names used for tracing.
pub mod span_names {
    /// View-model projection span.
    pub const PROJECTION: &str = "controlled_table::projection";
    /// Commit protocol span.
    pub const COMMIT: &str = "controlled_table::commit";
    /// Full data replacement span.
    pub const REGENERATE: &str = "controlled_table::regenerate";
}

/// Target names for log filtering.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "controlled_table_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "controlled_table_core::signal";
    /// Property and binding target.
    pub const PROPERTY: &str = "controlled_table_core::property";
    /// Row store and commit protocol target.
    pub const STORE: &str = "controlled_table::store";
    /// Column schema construction target.
    pub const SCHEMA: &str = "controlled_table::schema";
    /// Change log target.
    pub const CHANGE_LOG: &str = "controlled_table::change_log";
    /// View-model builder target.
    pub const VIEW_MODEL: &str = "controlled_table::view_model";
    /// Controlled state bridge target.
    pub const BRIDGE: &str = "controlled_table::bridge";
    /// Cell edit controller target.
    pub const EDITOR: &str = "controlled_table::editor";
    /// Host wiring target.
    pub const TABLE: &str = "controlled_table::table";
    /// Configuration loading target.
    pub const CONFIG: &str = "controlled_table::config";
}

/// A guard that keeps a performance span entered for its lifetime.
///
/// ```
/// use controlled_table_core::PerfSpan;
///
/// {
///     let _span = PerfSpan::new("rebuild_rows");
///     // work measured by the subscriber's span timings
/// }
/// ```
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Enter a new performance span named after `operation`.
    pub fn new(operation: &'static str) -> Self {
        let span = tracing::debug_span!(target: "controlled_table::perf", "perf", operation);
        Self {
            _span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_are_namespaced() {
        for target in [
            targets::STORE,
            targets::SCHEMA,
            targets::CHANGE_LOG,
            targets::VIEW_MODEL,
            targets::BRIDGE,
            targets::EDITOR,
            targets::TABLE,
            targets::CONFIG,
        ] {
            assert!(target.starts_with("controlled_table::"), "{target}");
        }
        assert!(targets::SIGNAL.starts_with(targets::CORE));
    }

    #[test]
    fn test_perf_span_without_subscriber() {
        let _span = PerfSpan::new("test_operation");
    }
}
