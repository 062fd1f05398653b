use super::manifest::{JobManifest, ManifestDefaults};
use crate::component::job_dispatcher::{
    EngineRunner, JobDispatcher, JobKind, JobReport, JobRequest,
};
use crate::error::ExtractError;
use crate::tools::{StreamProbe, VideoFileInfo};
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// 批次中第一個失敗的工作，之後的工作不會執行
#[derive(Debug, Error)]
#[error("第 {} 個工作（{kind}）失敗: {source}", .index + 1)]
pub struct BatchError {
    pub index: usize,
    pub kind: JobKind,
    #[source]
    pub source: ExtractError,
    /// 失敗前已完成的工作
    pub completed: Vec<JobReport>,
}

#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub reports: Vec<JobReport>,
    pub total: usize,
    /// 收到中斷訊號而提前結束
    pub interrupted: bool,
}

impl BatchSummary {
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.total - self.reports.len()
    }
}

/// 依序執行多個工作
pub struct BatchRunner<'a, P, R> {
    dispatcher: &'a JobDispatcher<P, R>,
    shutdown_signal: Arc<AtomicBool>,
}

impl<'a, P: StreamProbe, R: EngineRunner> BatchRunner<'a, P, R> {
    pub const fn new(
        dispatcher: &'a JobDispatcher<P, R>,
        shutdown_signal: Arc<AtomicBool>,
    ) -> Self {
        Self {
            dispatcher,
            shutdown_signal,
        }
    }

    /// 開始前清除旗標，只有批次執行期間收到的中斷才會生效
    pub fn run(&self, requests: &[JobRequest]) -> Result<BatchSummary, BatchError> {
        self.shutdown_signal.store(false, Ordering::SeqCst);

        let mut summary = BatchSummary {
            total: requests.len(),
            ..BatchSummary::default()
        };

        for (index, request) in requests.iter().enumerate() {
            if self.shutdown_signal.load(Ordering::SeqCst) {
                warn!("收到中斷訊號，停止批次處理");
                summary.interrupted = true;
                break;
            }

            info!(
                "[{}/{}] {}: {}",
                index + 1,
                requests.len(),
                request.kind(),
                request.input().display()
            );

            match self.dispatcher.run(request) {
                Ok(report) => summary.reports.push(report),
                Err(source) => {
                    return Err(BatchError {
                        index,
                        kind: request.kind(),
                        source,
                        completed: summary.reports,
                    });
                }
            }
        }

        info!("批次完成: {}/{}", summary.reports.len(), summary.total);
        Ok(summary)
    }
}

/// 先轉換全部工作，任何一個無效就不執行
pub fn manifest_requests(
    manifest: JobManifest,
    defaults: &ManifestDefaults,
) -> Result<Vec<JobRequest>, ExtractError> {
    manifest
        .jobs
        .into_iter()
        .map(|job| job.into_request(defaults))
        .collect()
}

/// 資料夾中每部影片各產生一個縮圖工作
#[must_use]
pub fn thumbnail_requests(videos: &[VideoFileInfo], out_dir: &Path) -> Vec<JobRequest> {
    videos
        .iter()
        .map(|video| JobRequest::Thumbnail {
            input: video.path.clone(),
            out_dir: out_dir.to_path_buf(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::batch_runner::manifest::{ManifestJob, ManifestJobKind};
    use crate::component::job_dispatcher::{EngineInvocation, ProgressReporter};
    use crate::component::snapshot_planner::PositionUnit;
    use crate::tools::{DurationProbe, MediaDuration, StreamLayout};
    use std::cell::RefCell;
    use std::path::PathBuf;
    use tempfile::tempdir;

    struct FixedProbe;

    impl DurationProbe for FixedProbe {
        fn duration(&self, _input: &Path) -> Result<MediaDuration, ExtractError> {
            Ok(MediaDuration::from_secs(60.0).unwrap())
        }
    }

    impl StreamProbe for FixedProbe {
        fn streams(&self, _input: &Path) -> Result<StreamLayout, ExtractError> {
            Ok(StreamLayout {
                width: 1280,
                height: 720,
                has_audio: true,
            })
        }
    }

    /// 記錄每次呼叫，輸入檔名含 `broken` 時回傳失敗
    #[derive(Default)]
    struct RecordingRunner {
        calls: RefCell<Vec<EngineInvocation>>,
        /// 執行工作時模擬使用者按下 Ctrl-C
        interrupt: Option<Arc<AtomicBool>>,
    }

    impl RecordingRunner {
        fn interrupting(signal: &Arc<AtomicBool>) -> Self {
            Self {
                interrupt: Some(Arc::clone(signal)),
                ..Self::default()
            }
        }
    }

    impl EngineRunner for RecordingRunner {
        fn run(
            &self,
            invocation: &EngineInvocation,
            _progress: Option<&dyn ProgressReporter>,
        ) -> Result<(), ExtractError> {
            self.calls.borrow_mut().push(invocation.clone());
            if let Some(signal) = &self.interrupt {
                signal.store(true, Ordering::SeqCst);
            }
            if invocation.input.to_string_lossy().contains("broken") {
                return Err(ExtractError::EngineFailure {
                    status: "exit status: 1".to_string(),
                    diagnostics: "Invalid data found when processing input".to_string(),
                });
            }
            Ok(())
        }
    }

    fn thumbnail(input: &str, out_dir: &Path) -> JobRequest {
        JobRequest::Thumbnail {
            input: PathBuf::from(input),
            out_dir: out_dir.to_path_buf(),
        }
    }

    #[test]
    fn test_runs_all_jobs_in_order() {
        let dir = tempdir().unwrap();
        let dispatcher = JobDispatcher::new(FixedProbe, RecordingRunner::default());
        let runner = BatchRunner::new(&dispatcher, Arc::new(AtomicBool::new(false)));

        let requests = [
            thumbnail("a.mp4", dir.path()),
            thumbnail("b.mp4", dir.path()),
        ];
        let summary = runner.run(&requests).unwrap();

        assert_eq!(summary.reports.len(), 2);
        assert_eq!(summary.skipped(), 0);
        assert!(!summary.interrupted);
        assert_eq!(summary.reports[1].output, dir.path().join("b-thumbnail.jpg"));
        assert_eq!(dispatcher.runner().calls.borrow().len(), 2);
    }

    #[test]
    fn test_first_failure_halts_batch() {
        let dir = tempdir().unwrap();
        let dispatcher = JobDispatcher::new(FixedProbe, RecordingRunner::default());
        let runner = BatchRunner::new(&dispatcher, Arc::new(AtomicBool::new(false)));

        let requests = [
            thumbnail("a.mp4", dir.path()),
            thumbnail("broken.mp4", dir.path()),
            thumbnail("c.mp4", dir.path()),
        ];
        let err = runner.run(&requests).unwrap_err();

        assert_eq!(err.index, 1);
        assert_eq!(err.kind, JobKind::Thumbnail);
        assert_eq!(err.completed.len(), 1);
        assert!(matches!(err.source, ExtractError::EngineFailure { .. }));
        assert_eq!(dispatcher.runner().calls.borrow().len(), 2);
        assert!(err.to_string().starts_with("第 2 個工作"));
    }

    #[test]
    fn test_shutdown_signal_stops_before_next_job() {
        let dir = tempdir().unwrap();
        let signal = Arc::new(AtomicBool::new(false));
        let dispatcher = JobDispatcher::new(FixedProbe, RecordingRunner::interrupting(&signal));
        let runner = BatchRunner::new(&dispatcher, Arc::clone(&signal));

        let requests = [
            thumbnail("a.mp4", dir.path()),
            thumbnail("b.mp4", dir.path()),
            thumbnail("c.mp4", dir.path()),
        ];
        let summary = runner.run(&requests).unwrap();

        assert!(summary.interrupted);
        assert_eq!(summary.reports.len(), 1);
        assert_eq!(summary.skipped(), 2);
        assert_eq!(dispatcher.runner().calls.borrow().len(), 1);
    }

    #[test]
    fn test_next_batch_runs_after_interrupted_one() {
        let dir = tempdir().unwrap();
        let signal = Arc::new(AtomicBool::new(false));

        let first = JobDispatcher::new(FixedProbe, RecordingRunner::interrupting(&signal));
        let summary = BatchRunner::new(&first, Arc::clone(&signal))
            .run(&[thumbnail("a.mp4", dir.path()), thumbnail("b.mp4", dir.path())])
            .unwrap();
        assert!(summary.interrupted);
        assert!(signal.load(Ordering::SeqCst));

        let second = JobDispatcher::new(FixedProbe, RecordingRunner::default());
        let summary = BatchRunner::new(&second, Arc::clone(&signal))
            .run(&[thumbnail("c.mp4", dir.path())])
            .unwrap();

        assert!(!summary.interrupted);
        assert_eq!(summary.reports.len(), 1);
        assert_eq!(second.runner().calls.borrow().len(), 1);
    }

    #[test]
    fn test_signal_before_batch_is_ignored() {
        let dir = tempdir().unwrap();
        let dispatcher = JobDispatcher::new(FixedProbe, RecordingRunner::default());
        let runner = BatchRunner::new(&dispatcher, Arc::new(AtomicBool::new(true)));

        let summary = runner.run(&[thumbnail("a.mp4", dir.path())]).unwrap();

        assert!(!summary.interrupted);
        assert_eq!(summary.skipped(), 0);
    }

    #[test]
    fn test_manifest_requests_fail_fast() {
        let defaults = ManifestDefaults {
            out_dir: PathBuf::from("out"),
            unit: PositionUnit::Percent,
            rate: 1.0,
        };
        let job = |kind, unit: Option<&str>| ManifestJob {
            kind,
            input: PathBuf::from("a.mp4"),
            out_dir: None,
            unit: unit.map(str::to_string),
            start: None,
            stop: None,
            rate: None,
            count: None,
            out_path: None,
        };

        let valid = JobManifest {
            jobs: vec![
                job(ManifestJobKind::Snapshot, None),
                job(ManifestJobKind::Hls, None),
            ],
        };
        assert_eq!(manifest_requests(valid, &defaults).unwrap().len(), 2);

        let invalid = JobManifest {
            jobs: vec![
                job(ManifestJobKind::Thumbnail, None),
                job(ManifestJobKind::Snapshot, Some("minutes")),
            ],
        };
        assert!(matches!(
            manifest_requests(invalid, &defaults),
            Err(ExtractError::InvalidUnit(_))
        ));
    }

    #[test]
    fn test_thumbnail_requests_for_folder() {
        let videos = vec![
            VideoFileInfo {
                path: PathBuf::from("/videos/a.mp4"),
                size: 10,
            },
            VideoFileInfo {
                path: PathBuf::from("/videos/sub/b.mkv"),
                size: 20,
            },
        ];

        let requests = thumbnail_requests(&videos, Path::new("thumbs"));
        assert_eq!(
            requests,
            vec![
                JobRequest::Thumbnail {
                    input: PathBuf::from("/videos/a.mp4"),
                    out_dir: PathBuf::from("thumbs"),
                },
                JobRequest::Thumbnail {
                    input: PathBuf::from("/videos/sub/b.mkv"),
                    out_dir: PathBuf::from("thumbs"),
                },
            ]
        );
    }
}
