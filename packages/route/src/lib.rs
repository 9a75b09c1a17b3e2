#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Greedy patrol route allocation.
//!
//! Assigns prioritized stops to a fleet of officers in a single
//! deterministic pass. Every route starts and ends at a shared depot and
//! respects a distance cap and a shift-length cap; stops that no officer
//! can absorb are reported as unassigned rather than bending a cap.

pub mod allocate;
pub mod config;

use thiserror::Error;

/// Errors that can occur during route allocation.
#[derive(Debug, Error)]
pub enum RouteError {
    /// A constraint or input is outside its valid range.
    #[error("Invalid parameter `{name}`: {message}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// Description of what went wrong.
        message: String,
    },
}

impl RouteError {
    pub(crate) fn invalid(name: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            message: message.into(),
        }
    }
}
