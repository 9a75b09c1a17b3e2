#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Density-based hotspot detection.
//!
//! The pipeline runs leaf-first: [`prepare`] cleans raw incidents into
//! points, [`cluster`] partitions them with DBSCAN, [`aggregate`] collapses
//! each cluster into a [`Hotspot`](patrol_planner_hotspot_models::Hotspot),
//! and [`stability`] matches hotspots across days to find the ones that
//! persist. [`detect`] chains the stages behind a single
//! [`DetectionConfig`](config::DetectionConfig).
//!
//! Every stage is a pure function over its inputs. The only state that
//! outlives a call is the [`StabilityTracker`](stability::StabilityTracker),
//! which the caller owns.

pub mod aggregate;
pub mod cluster;
pub mod config;
pub mod detect;
pub mod prepare;
pub mod progress;
pub mod stability;

use thiserror::Error;

/// Errors that can occur during hotspot detection.
#[derive(Debug, Error)]
pub enum HotspotError {
    /// A tuning parameter is outside its valid range.
    #[error("Invalid parameter `{name}`: {message}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    /// No valid coordinates remained for a stage that needs at least one.
    #[error("No valid incident coordinates available for {stage}")]
    EmptyInput {
        /// Stage that required input.
        stage: &'static str,
    },
}

impl HotspotError {
    pub(crate) fn invalid(name: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            message: message.into(),
        }
    }
}
