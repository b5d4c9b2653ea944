//! Host integration for the tale scheduler.
//!
//! The core crate knows nothing about wall-clock time or configuration
//! files. This crate supplies both:
//! - [`clock`] turns raw frame times into scaled [`tale_core::TimeStep`]s
//! - [`director`] drives a [`tale_core::Scheduler`] and recovers from failing actions
//! - [`config`] loads [`RuntimeConfig`] from TOML and `TALE_*` environment variables
pub mod clock;
pub mod config;
pub mod director;
pub mod error;

pub use clock::FrameClock;
pub use config::{ConfigLoader, DirectorConfig, RecoveryPolicy, RuntimeConfig};
pub use director::{Director, FrameOutcome, RunSummary};
pub use error::{Result, RuntimeError};
