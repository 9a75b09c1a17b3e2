#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared CLI utilities for the patrol planner.
//!
//! Provides an `indicatif` progress bar behind the hotspot crate's
//! [`ProgressCallback`] trait, plus [`init_logger`], which routes `log`
//! output through `indicatif-log-bridge` so log lines never tear a bar.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use patrol_planner_hotspot::progress::ProgressCallback;

pub use indicatif::MultiProgress;

/// An `indicatif` [`ProgressBar`] that implements [`ProgressCallback`].
pub struct IndicatifProgress {
    bar: ProgressBar,
    /// Style to switch to once `set_total()` provides a known length.
    bar_style: ProgressStyle,
}

impl IndicatifProgress {
    /// Creates a bar for per-day clustering.
    ///
    /// Starts as a spinner and becomes a full bar with percentage and ETA
    /// once [`ProgressCallback::set_total()`] reports the number of days.
    #[must_use]
    pub fn days_bar(multi: &MultiProgress, message: &str) -> Arc<dyn ProgressCallback> {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(100));
        Arc::new(Self::new(bar, message))
    }

    fn new(bar: ProgressBar, message: &str) -> Self {
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());

        let bar_style = ProgressStyle::with_template(
            "  {msg} {wide_bar:.cyan/dim} {pos}/{len} {percent}% [{eta}]",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");

        Self { bar, bar_style }
    }
}

impl ProgressCallback for IndicatifProgress {
    fn set_total(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
        self.bar.set_style(self.bar_style.clone());
    }

    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    fn finish(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }
}

/// Environment variable holding the log filter, in `env_logger` syntax.
/// Falls back to `RUST_LOG` when unset.
pub const LOG_ENV: &str = "PATROL_PLANNER_LOG";

/// Builds the terminal logger: `info` and above unless `filters` says
/// otherwise.
fn build_logger(filters: Option<&str>) -> pretty_env_logger::env_logger::Logger {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(LevelFilter::Info);
    if let Some(filters) = filters {
        builder.parse_filters(filters);
    }
    builder.build()
}

/// Installs the global logger behind an `indicatif-log-bridge` wrapper and
/// returns the [`MultiProgress`] every progress bar must be added to.
///
/// A second call in the same process keeps the first logger and only hands
/// back a fresh [`MultiProgress`].
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let filters = std::env::var(LOG_ENV)
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok();
    let logger = build_logger(filters.as_deref());
    let level = logger.filter();

    match indicatif_log_bridge::LogWrapper::new(multi.clone(), logger).try_init() {
        Ok(()) => log::set_max_level(level),
        Err(e) => log::debug!("Keeping existing logger: {e}"),
    }

    multi
}
