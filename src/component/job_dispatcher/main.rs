use super::engine_runner::EngineRunner;
use super::hls_ladder::auto_representations;
use super::job::{
    JobDescriptor, JobKind, JobRequest, check_same_format, hls_output_path, spliced_output_path,
    thumbnail_output_path,
};
use super::progress::{ConsoleProgress, LogProgress, ProgressReporter};
use crate::component::snapshot_planner::{NamingTemplate, TailCheck, check_tail, plan, resolve};
use crate::error::ExtractError;
use crate::tools::{StreamProbe, ensure_directory_exists, format_duration, format_elapsed};
use log::info;
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub const DEFAULT_HLS_SEGMENT_SECS: u32 = 10;

/// 單一工作的執行結果
#[derive(Debug, Clone, PartialEq)]
pub struct JobReport {
    pub kind: JobKind,
    pub output: PathBuf,
    pub elapsed: Duration,
    /// 只有截圖工作會檢查最後一張的時間點
    pub tail: Option<TailCheck>,
}

/// 將工作轉換為引擎呼叫並執行
///
/// 流程：探測長度 → 解析範圍 → 推算截圖數量 → 產生檔名樣板 → 呼叫 ffmpeg
pub struct JobDispatcher<P, R> {
    probe: P,
    runner: R,
    verbose: bool,
    hls_segment_secs: u32,
}

impl<P: StreamProbe, R: EngineRunner> JobDispatcher<P, R> {
    pub const fn new(probe: P, runner: R) -> Self {
        Self {
            probe,
            runner,
            verbose: false,
            hls_segment_secs: DEFAULT_HLS_SEGMENT_SECS,
        }
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn with_hls_segment_secs(mut self, seconds: u32) -> Self {
        self.hls_segment_secs = seconds.max(1);
        self
    }

    pub const fn probe(&self) -> &P {
        &self.probe
    }

    pub const fn runner(&self) -> &R {
        &self.runner
    }

    /// 規劃並執行工作，耗時包含探測影片的時間
    pub fn run(&self, request: &JobRequest) -> Result<JobReport, ExtractError> {
        let started = Instant::now();
        info!("==== {} ====", request.kind());
        let descriptor = self.prepare(request)?;
        self.execute_since(&descriptor, started)
    }

    /// 規劃工作，不會呼叫引擎
    pub fn prepare(&self, request: &JobRequest) -> Result<JobDescriptor, ExtractError> {
        match request {
            JobRequest::Snapshot {
                input,
                position,
                rate,
                count,
                out_dir,
            } => {
                let duration = self.probe.duration(input)?;
                info!("影片長度: {}", format_duration(duration.as_secs()));

                let window = resolve(duration, position);
                let plan = plan(&window, *count, *rate, duration);
                let naming = NamingTemplate::for_count(plan.count);

                Ok(JobDescriptor::Snapshot {
                    input: input.clone(),
                    duration,
                    window,
                    plan,
                    naming,
                    out_dir: out_dir.clone(),
                })
            }
            JobRequest::Splice {
                input,
                position,
                out_dir,
                out_path,
            } => {
                let out_path = out_path
                    .clone()
                    .unwrap_or_else(|| spliced_output_path(input, out_dir));
                check_same_format(input, &out_path)?;

                let duration = self.probe.duration(input)?;
                info!("影片長度: {}", format_duration(duration.as_secs()));

                Ok(JobDescriptor::Splice {
                    input: input.clone(),
                    duration,
                    window: resolve(duration, position),
                    out_path,
                })
            }
            JobRequest::Thumbnail { input, out_dir } => Ok(JobDescriptor::Thumbnail {
                input: input.clone(),
                out_path: thumbnail_output_path(input, out_dir),
            }),
            JobRequest::HlsEncode { input, out_dir } => {
                let (duration, layout) = self.probe.inspect(input)?;
                info!(
                    "影片長度: {}, 解析度 {}x{}",
                    format_duration(duration.as_secs()),
                    layout.width,
                    layout.height
                );

                Ok(JobDescriptor::HlsEncode {
                    input: input.clone(),
                    duration,
                    representations: auto_representations(&layout),
                    has_audio: layout.has_audio,
                    segment_secs: self.hls_segment_secs,
                    out_path: hls_output_path(input, out_dir),
                })
            }
        }
    }

    pub fn execute(&self, descriptor: &JobDescriptor) -> Result<JobReport, ExtractError> {
        self.execute_since(descriptor, Instant::now())
    }

    fn execute_since(
        &self,
        descriptor: &JobDescriptor,
        started: Instant,
    ) -> Result<JobReport, ExtractError> {
        ensure_directory_exists(descriptor.output_dir())?;

        let tail = match descriptor {
            JobDescriptor::Snapshot {
                duration,
                window,
                plan,
                ..
            } => {
                let tail = check_tail(window, plan, *duration);
                tail.log();
                Some(tail)
            }
            _ => None,
        };

        let reporter = self.progress_reporter(descriptor);
        self.runner.run(&descriptor.invocation(), reporter.as_deref())?;

        let elapsed = started.elapsed();
        info!("耗時: {}", format_elapsed(elapsed));

        Ok(JobReport {
            kind: descriptor.kind(),
            output: descriptor.output().to_path_buf(),
            elapsed,
            tail,
        })
    }

    fn progress_reporter(&self, descriptor: &JobDescriptor) -> Option<Box<dyn ProgressReporter>> {
        if !self.verbose {
            return None;
        }

        let total = descriptor.progress_total()?;
        match descriptor {
            JobDescriptor::HlsEncode { .. } => Some(Box::new(ConsoleProgress::new(total))),
            _ => Some(Box::new(LogProgress::new(total))),
        }
    }
}
