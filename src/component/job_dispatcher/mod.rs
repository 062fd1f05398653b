//! 工作派送元件
//!
//! 將截圖、剪輯、縮圖與 HLS 編碼工作轉換為 ffmpeg 呼叫並執行

mod engine_command;
mod engine_runner;
mod hls_ladder;
mod job;
mod main;
mod progress;

pub use engine_command::{EngineInvocation, InvocationMode};
pub use engine_runner::{EngineRunner, FfmpegRunner};
pub use hls_ladder::{Representation, auto_representations};
pub use job::{
    HLS_SUFFIX, JobDescriptor, JobKind, JobRequest, SPLICE_SUFFIX, THUMBNAIL_SUFFIX,
    check_same_format, hls_output_path, spliced_output_path, thumbnail_output_path,
};
pub use main::{DEFAULT_HLS_SEGMENT_SECS, JobDispatcher, JobReport};
pub use progress::{ConsoleProgress, LogProgress, ProgressParser, ProgressReporter, ProgressUpdate};
