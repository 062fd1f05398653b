use super::engine_command::{EngineInvocation, InvocationMode};
use super::hls_ladder::Representation;
use crate::component::snapshot_planner::{
    NamingTemplate, OutputRate, PositionSpec, RenderCount, RenderPlan, SeekWindow,
};
use crate::error::ExtractError;
use crate::tools::MediaDuration;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SPLICE_SUFFIX: &str = "-spliced";
pub const THUMBNAIL_SUFFIX: &str = "-thumbnail";
pub const HLS_SUFFIX: &str = "-converted";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Snapshot,
    Splice,
    Thumbnail,
    HlsEncode,
}

impl JobKind {
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Snapshot => "影片截圖",
            Self::Splice => "影片剪輯",
            Self::Thumbnail => "影片縮圖",
            Self::HlsEncode => "HLS 串流編碼",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// 呼叫端提出的工作
#[derive(Debug, Clone, PartialEq)]
pub enum JobRequest {
    Snapshot {
        input: PathBuf,
        position: PositionSpec,
        rate: OutputRate,
        count: RenderCount,
        out_dir: PathBuf,
    },
    Splice {
        input: PathBuf,
        position: PositionSpec,
        out_dir: PathBuf,
        /// 未指定時為 `<out_dir>/<stem>-spliced.<ext>`
        out_path: Option<PathBuf>,
    },
    Thumbnail {
        input: PathBuf,
        out_dir: PathBuf,
    },
    HlsEncode {
        input: PathBuf,
        out_dir: PathBuf,
    },
}

impl JobRequest {
    #[must_use]
    pub const fn kind(&self) -> JobKind {
        match self {
            Self::Snapshot { .. } => JobKind::Snapshot,
            Self::Splice { .. } => JobKind::Splice,
            Self::Thumbnail { .. } => JobKind::Thumbnail,
            Self::HlsEncode { .. } => JobKind::HlsEncode,
        }
    }

    #[must_use]
    pub fn input(&self) -> &Path {
        match self {
            Self::Snapshot { input, .. }
            | Self::Splice { input, .. }
            | Self::Thumbnail { input, .. }
            | Self::HlsEncode { input, .. } => input,
        }
    }
}

/// 規劃完成、可直接交給引擎執行的工作
#[derive(Debug, Clone, PartialEq)]
pub enum JobDescriptor {
    Snapshot {
        input: PathBuf,
        duration: MediaDuration,
        window: SeekWindow,
        plan: RenderPlan,
        naming: NamingTemplate,
        out_dir: PathBuf,
    },
    Splice {
        input: PathBuf,
        duration: MediaDuration,
        window: SeekWindow,
        out_path: PathBuf,
    },
    Thumbnail {
        input: PathBuf,
        out_path: PathBuf,
    },
    HlsEncode {
        input: PathBuf,
        duration: MediaDuration,
        representations: Vec<Representation>,
        has_audio: bool,
        segment_secs: u32,
        out_path: PathBuf,
    },
}

impl JobDescriptor {
    #[must_use]
    pub const fn kind(&self) -> JobKind {
        match self {
            Self::Snapshot { .. } => JobKind::Snapshot,
            Self::Splice { .. } => JobKind::Splice,
            Self::Thumbnail { .. } => JobKind::Thumbnail,
            Self::HlsEncode { .. } => JobKind::HlsEncode,
        }
    }

    /// 截圖為輸出資料夾，其餘為輸出檔案（HLS 為主播放清單）
    #[must_use]
    pub fn output(&self) -> &Path {
        match self {
            Self::Snapshot { out_dir, .. } => out_dir,
            Self::Splice { out_path, .. }
            | Self::Thumbnail { out_path, .. }
            | Self::HlsEncode { out_path, .. } => out_path,
        }
    }

    /// 需要事先建立的資料夾
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        match self {
            Self::Snapshot { out_dir, .. } => out_dir,
            _ => self.output().parent().unwrap_or(Path::new(".")),
        }
    }

    /// ffmpeg 輸出的總長度，用於換算進度；縮圖沒有進度
    #[must_use]
    pub fn progress_total(&self) -> Option<Duration> {
        let seconds = match self {
            Self::Snapshot {
                duration, window, ..
            }
            | Self::Splice {
                duration, window, ..
            } => window.span_secs(*duration),
            Self::HlsEncode { duration, .. } => duration.as_secs(),
            Self::Thumbnail { .. } => return None,
        };
        Some(Duration::from_secs_f64(seconds))
    }

    #[must_use]
    pub fn invocation(&self) -> EngineInvocation {
        match self {
            Self::Snapshot {
                input,
                window,
                plan,
                naming,
                out_dir,
                ..
            } => {
                // `-r:v` 會讓前兩張截圖重複，改用 fps 濾鏡
                EngineInvocation::new(
                    input,
                    &out_dir.join(&naming.pattern),
                    InvocationMode::Structured,
                )
                .input_options(window.input_options())
                .output_option("-frames:v", plan.count.to_string())
                .output_option("-f", "image2")
                .output_option("-vf", format!("fps={}", plan.rate))
            }
            Self::Splice {
                input,
                window,
                out_path,
                ..
            } => EngineInvocation::new(input, out_path, InvocationMode::Structured)
                .input_options(window.input_options()),
            Self::Thumbnail { input, out_path } => {
                EngineInvocation::new(input, out_path, InvocationMode::Bare)
                    .output_option("-vf", "thumbnail")
                    .output_option("-frames:v", "1")
            }
            Self::HlsEncode {
                input,
                representations,
                has_audio,
                segment_secs,
                out_path,
                ..
            } => hls_invocation(input, representations, *has_audio, *segment_secs, out_path),
        }
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| "output".to_string(), |s| s.to_string_lossy().to_string())
}

fn dotted_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

#[must_use]
pub fn spliced_output_path(input: &Path, out_dir: &Path) -> PathBuf {
    out_dir.join(format!(
        "{}{SPLICE_SUFFIX}{}",
        file_stem(input),
        dotted_extension(input)
    ))
}

#[must_use]
pub fn thumbnail_output_path(input: &Path, out_dir: &Path) -> PathBuf {
    out_dir.join(format!("{}{THUMBNAIL_SUFFIX}.jpg", file_stem(input)))
}

#[must_use]
pub fn hls_output_path(input: &Path, out_dir: &Path) -> PathBuf {
    out_dir.join(format!("{}{HLS_SUFFIX}.m3u8", file_stem(input)))
}

/// 剪輯只重新封裝，輸出副檔名必須與輸入完全相同
pub fn check_same_format(input: &Path, output: &Path) -> Result<(), ExtractError> {
    let input_ext = dotted_extension(input);
    let output_ext = dotted_extension(output);
    if input_ext == output_ext {
        Ok(())
    } else {
        Err(ExtractError::FormatMismatch {
            input: input_ext,
            output: output_ext,
        })
    }
}

fn hls_invocation(
    input: &Path,
    representations: &[Representation],
    has_audio: bool,
    segment_secs: u32,
    out_path: &Path,
) -> EngineInvocation {
    let out_dir = out_path.parent().unwrap_or(Path::new("."));
    let stem = file_stem(out_path);
    let variant_playlist = out_dir.join(format!("{stem}_%v.m3u8"));
    let segment_pattern = out_dir.join(format!("{stem}_%v_%04d.ts"));
    let master_name = out_path
        .file_name()
        .map_or_else(|| format!("{stem}.m3u8"), |n| n.to_string_lossy().to_string());

    let mut invocation = EngineInvocation::new(input, &variant_playlist, InvocationMode::Structured)
        .output_option("-c:v", "libx264");
    if has_audio {
        invocation = invocation.output_option("-c:a", "aac");
    }

    for _ in representations {
        invocation = invocation.output_option("-map", "0:v:0");
        if has_audio {
            invocation = invocation.output_option("-map", "0:a:0");
        }
    }

    let mut stream_map = Vec::with_capacity(representations.len());
    for (i, rep) in representations.iter().enumerate() {
        invocation = invocation
            .output_option(&format!("-s:v:{i}"), format!("{}x{}", rep.width, rep.height))
            .output_option(&format!("-b:v:{i}"), format!("{}k", rep.video_kbps));
        if has_audio {
            invocation =
                invocation.output_option(&format!("-b:a:{i}"), format!("{}k", rep.audio_kbps));
            stream_map.push(format!("v:{i},a:{i},name:{}", rep.name()));
        } else {
            stream_map.push(format!("v:{i},name:{}", rep.name()));
        }
    }

    invocation
        .output_option("-f", "hls")
        .output_option("-hls_time", segment_secs.to_string())
        .output_option("-hls_playlist_type", "vod")
        .output_option(
            "-hls_segment_filename",
            segment_pattern.to_string_lossy().to_string(),
        )
        .output_option("-master_pl_name", master_name)
        .output_option("-var_stream_map", stream_map.join(" "))
}
