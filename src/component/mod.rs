//! 功能元件模組
//!
//! 每個子模組實現一個獨立的功能，包含主要邏輯和專用工具

pub mod batch_runner;
pub mod job_dispatcher;
pub mod snapshot_planner;

pub use batch_runner::{BatchError, BatchRunner, BatchSummary};
pub use job_dispatcher::{FfmpegRunner, JobDispatcher, JobReport, JobRequest};
