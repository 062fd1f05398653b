use super::engine_command::EngineInvocation;
use super::progress::{ProgressParser, ProgressReporter};
use crate::error::ExtractError;
use log::{debug, info};
use std::io::{BufRead, BufReader};
use std::process::{ChildStderr, Stdio};
use std::thread::{self, JoinHandle};

/// 執行一次外部引擎呼叫
pub trait EngineRunner {
    fn run(
        &self,
        invocation: &EngineInvocation,
        progress: Option<&dyn ProgressReporter>,
    ) -> Result<(), ExtractError>;
}

/// 以子程序執行 ffmpeg，主執行緒阻塞直到結束
pub struct FfmpegRunner {
    program: String,
    verbose: bool,
}

impl FfmpegRunner {
    #[must_use]
    pub fn new(program: impl Into<String>, verbose: bool) -> Self {
        Self {
            program: program.into(),
            verbose,
        }
    }

    /// 在背景收集 stderr，verbose 時逐行輸出到 log
    fn spawn_stderr_reader(stderr: Option<ChildStderr>, verbose: bool) -> JoinHandle<String> {
        thread::spawn(move || {
            let Some(stderr) = stderr else {
                return String::new();
            };

            let mut collected = String::new();
            for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                if verbose {
                    info!("[ffmpeg] {line}");
                }
                collected.push_str(&line);
                collected.push('\n');
            }
            collected
        })
    }
}

impl EngineRunner for FfmpegRunner {
    fn run(
        &self,
        invocation: &EngineInvocation,
        progress: Option<&dyn ProgressReporter>,
    ) -> Result<(), ExtractError> {
        let mut command = invocation.build_command(&self.program, progress.is_some());
        command.stdin(Stdio::null());
        command.stdout(if progress.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        command.stderr(Stdio::piped());

        debug!("執行 {} {:?}", self.program, invocation.to_args());

        let mut child = command.spawn().map_err(|e| ExtractError::EngineLaunch {
            program: self.program.clone(),
            source: e,
        })?;

        let stderr_reader = Self::spawn_stderr_reader(child.stderr.take(), self.verbose);

        if let (Some(stdout), Some(reporter)) = (child.stdout.take(), progress) {
            let mut parser = ProgressParser::default();
            for line in BufReader::new(stdout).lines().map_while(Result::ok) {
                if let Some(update) = parser.feed(&line) {
                    reporter.on_progress(&update);
                }
            }
            reporter.on_finish();
        }

        let status = child.wait()?;
        let diagnostics = stderr_reader.join().unwrap_or_default();

        if !status.success() {
            return Err(ExtractError::EngineFailure {
                status: status.to_string(),
                diagnostics: diagnostics.trim().to_string(),
            });
        }

        Ok(())
    }
}
