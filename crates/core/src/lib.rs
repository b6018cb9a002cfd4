//! Core of the fetcharr media acquisition manager: quality presets and
//! release scoring, indexer search, the trust gate, delay profiles, the
//! grab decision engine, download tracking and the import pipeline.

pub mod acquisition;
pub mod config;
pub mod delay;
pub mod download;
pub mod downloader;
pub mod import;
pub mod indexer;
pub mod library;
pub mod metrics;
pub mod quality;
pub mod scheduler;
pub mod scoring;
pub mod testing;
pub mod trust;

pub use acquisition::{AcquisitionError, Decision, GrabDecisionEngine, PassSummary};
pub use config::{load_config, Config, ConfigError, SanitizedConfig};
pub use scheduler::{Scheduler, TaskKind, TaskStatus};
