use crate::error::ExtractError;
use log::debug;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::LazyLock;

/// 影片長度（秒），每個工作只探測一次
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct MediaDuration(f64);

impl MediaDuration {
    /// 長度必須是大於 0 的有限數
    #[must_use]
    pub fn from_secs(seconds: f64) -> Option<Self> {
        (seconds.is_finite() && seconds > 0.0).then_some(Self(seconds))
    }

    #[must_use]
    pub const fn as_secs(self) -> f64 {
        self.0
    }
}

/// 影片串流配置（HLS 需要來源解析度）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamLayout {
    pub width: u32,
    pub height: u32,
    pub has_audio: bool,
}

pub trait DurationProbe {
    fn duration(&self, path: &Path) -> Result<MediaDuration, ExtractError>;
}

pub trait StreamProbe: DurationProbe {
    fn streams(&self, path: &Path) -> Result<StreamLayout, ExtractError>;

    /// 同時取得長度與串流配置，實作可以只執行一次外部程式
    fn inspect(&self, path: &Path) -> Result<(MediaDuration, StreamLayout), ExtractError> {
        Ok((self.duration(path)?, self.streams(path)?))
    }
}

impl<T: DurationProbe + ?Sized> DurationProbe for Box<T> {
    fn duration(&self, path: &Path) -> Result<MediaDuration, ExtractError> {
        (**self).duration(path)
    }
}

impl<T: StreamProbe + ?Sized> StreamProbe for Box<T> {
    fn streams(&self, path: &Path) -> Result<StreamLayout, ExtractError> {
        (**self).streams(path)
    }

    fn inspect(&self, path: &Path) -> Result<(MediaDuration, StreamLayout), ExtractError> {
        (**self).inspect(path)
    }
}

fn unavailable(path: &Path, reason: impl Into<String>) -> ExtractError {
    ExtractError::DurationUnavailable {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn launch_error(program: &str, source: std::io::Error) -> ExtractError {
    ExtractError::EngineLaunch {
        program: program.to_string(),
        source,
    }
}

// ---------------------------------------------------------------------------
// ffprobe JSON
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct FfprobeOutput {
    format: Option<FormatInfo>,
    streams: Option<Vec<StreamInfo>>,
}

#[derive(Deserialize)]
struct FormatInfo {
    duration: Option<String>,
}

#[derive(Deserialize)]
struct StreamInfo {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

/// 使用 ffprobe 的 JSON 輸出探測影片
pub struct FfprobeProbe {
    program: String,
}

impl FfprobeProbe {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, path: &Path) -> Result<FfprobeOutput, ExtractError> {
        let output = Command::new(&self.program)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .map_err(|e| launch_error(&self.program, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(unavailable(path, format!("ffprobe 執行失敗: {}", stderr.trim())));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(&stdout)
            .map_err(|e| unavailable(path, format!("無法解析 ffprobe 輸出: {e}")))
    }
}

fn ffprobe_duration(path: &Path, probe: &FfprobeOutput) -> Result<MediaDuration, ExtractError> {
    let video_stream_duration = probe.streams.as_ref().and_then(|streams| {
        streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .and_then(|s| s.duration.as_ref())
    });

    // 優先從 format 取得，其次從視訊串流
    probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .or(video_stream_duration)
        .and_then(|d| d.parse::<f64>().ok())
        .and_then(MediaDuration::from_secs)
        .ok_or_else(|| unavailable(path, "ffprobe 輸出中沒有長度資訊"))
}

fn ffprobe_layout(path: &Path, probe: &FfprobeOutput) -> Result<StreamLayout, ExtractError> {
    let streams = probe.streams.as_deref().unwrap_or_default();

    let (width, height) = streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .and_then(|s| s.width.zip(s.height))
        .ok_or_else(|| ExtractError::NoVideoStream(path.to_path_buf()))?;

    let has_audio = streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(StreamLayout {
        width,
        height,
        has_audio,
    })
}

impl DurationProbe for FfprobeProbe {
    fn duration(&self, path: &Path) -> Result<MediaDuration, ExtractError> {
        let probe = self.run(path)?;
        ffprobe_duration(path, &probe)
    }
}

impl StreamProbe for FfprobeProbe {
    fn streams(&self, path: &Path) -> Result<StreamLayout, ExtractError> {
        let probe = self.run(path)?;
        ffprobe_layout(path, &probe)
    }

    fn inspect(&self, path: &Path) -> Result<(MediaDuration, StreamLayout), ExtractError> {
        let probe = self.run(path)?;
        Ok((ffprobe_duration(path, &probe)?, ffprobe_layout(path, &probe)?))
    }
}

// ---------------------------------------------------------------------------
// ffmpeg 診斷文字
// ---------------------------------------------------------------------------

static DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Duration:\s*(\d+):(\d+):(\d+)\.(\d+)").expect("Invalid regex")
});

static VIDEO_SIZE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Stream #\d+:\d+.*: Video: .*?\b(\d{2,5})x(\d{2,5})\b").expect("Invalid regex")
});

static AUDIO_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Stream #\d+:\d+.*: Audio: ").expect("Invalid regex"));

/// 從 ffmpeg 的診斷文字解析 `Duration: H:MM:SS.cc`
#[must_use]
pub fn parse_banner_duration(banner: &str) -> Option<f64> {
    let caps = DURATION_REGEX.captures(banner)?;
    let field = |i: usize| caps.get(i).map(|m| m.as_str());

    let hours: u64 = field(1)?.parse().ok()?;
    let minutes: u64 = field(2)?.parse().ok()?;
    let seconds: u64 = field(3)?.parse().ok()?;
    let fraction = field(4)?;
    let fraction_value = fraction.parse::<u64>().ok()? as f64 / 10f64.powi(fraction.len() as i32);

    Some((hours * 3600 + minutes * 60 + seconds) as f64 + fraction_value)
}

/// 從 ffmpeg 的診斷文字解析第一個視訊串流的解析度與是否有音訊
#[must_use]
pub fn parse_banner_streams(banner: &str) -> Option<StreamLayout> {
    let caps = VIDEO_SIZE_REGEX.captures(banner)?;
    let width = caps.get(1)?.as_str().parse().ok()?;
    let height = caps.get(2)?.as_str().parse().ok()?;

    Some(StreamLayout {
        width,
        height,
        has_audio: AUDIO_REGEX.is_match(banner),
    })
}

/// 執行 `ffmpeg -i` 並解析其 stderr 的探測器
pub struct FfmpegBannerProbe {
    program: String,
}

impl FfmpegBannerProbe {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn banner(&self, path: &Path) -> Result<String, ExtractError> {
        // 沒有指定輸出時 ffmpeg 必定以非零結束，只需要 stderr
        let output = Command::new(&self.program)
            .arg("-hide_banner")
            .arg("-i")
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| launch_error(&self.program, e))?;

        Ok(String::from_utf8_lossy(&output.stderr).into_owned())
    }
}

fn banner_duration(path: &Path, banner: &str) -> Result<MediaDuration, ExtractError> {
    parse_banner_duration(banner)
        .and_then(MediaDuration::from_secs)
        .ok_or_else(|| unavailable(path, "診斷輸出中找不到 Duration 標記"))
}

fn banner_layout(path: &Path, banner: &str) -> Result<StreamLayout, ExtractError> {
    parse_banner_streams(banner).ok_or_else(|| ExtractError::NoVideoStream(path.to_path_buf()))
}

impl DurationProbe for FfmpegBannerProbe {
    fn duration(&self, path: &Path) -> Result<MediaDuration, ExtractError> {
        let banner = self.banner(path)?;
        debug!("ffmpeg 探測輸出 {}:\n{banner}", path.display());
        banner_duration(path, &banner)
    }
}

impl StreamProbe for FfmpegBannerProbe {
    fn streams(&self, path: &Path) -> Result<StreamLayout, ExtractError> {
        let banner = self.banner(path)?;
        banner_layout(path, &banner)
    }

    fn inspect(&self, path: &Path) -> Result<(MediaDuration, StreamLayout), ExtractError> {
        let banner = self.banner(path)?;
        Ok((banner_duration(path, &banner)?, banner_layout(path, &banner)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANNER: &str = "\
Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'MathIncompleteness.mp4':
  Metadata:
    major_brand     : isom
  Duration: 00:08:20.50, start: 0.000000, bitrate: 1205 kb/s
  Stream #0:0[0x1](und): Video: h264 (High) (avc1 / 0x31637661), yuv420p(progressive), 1920x1080 [SAR 1:1 DAR 16:9], 1071 kb/s, 30 fps, 30 tbr, 15360 tbn (default)
  Stream #0:1[0x2](und): Audio: aac (LC) (mp4a / 0x6134706D), 44100 Hz, stereo, fltp, 128 kb/s (default)
At least one output file must be specified";

    #[test]
    fn test_parse_banner_duration() {
        let duration = parse_banner_duration(BANNER).unwrap();
        assert!((duration - 500.5).abs() < 1e-9);
    }

    #[test]
    fn test_parse_banner_duration_hours() {
        let duration = parse_banner_duration("  Duration: 01:02:03.07, start: 0").unwrap();
        assert!((duration - 3723.07).abs() < 1e-9);
    }

    #[test]
    fn test_parse_banner_duration_missing() {
        assert!(parse_banner_duration("  Duration: N/A, bitrate: N/A").is_none());
        assert!(parse_banner_duration("").is_none());
    }

    #[test]
    fn test_parse_banner_streams() {
        let layout = parse_banner_streams(BANNER).unwrap();
        assert_eq!(layout.width, 1920);
        assert_eq!(layout.height, 1080);
        assert!(layout.has_audio);
    }

    #[test]
    fn test_parse_banner_streams_without_audio() {
        let banner = "  Stream #0:0: Video: vp9 (Profile 0), yuv420p(tv), 640x360, SAR 1:1 DAR 16:9, 25 fps";
        let layout = parse_banner_streams(banner).unwrap();
        assert_eq!((layout.width, layout.height), (640, 360));
        assert!(!layout.has_audio);
    }

    #[test]
    fn test_banner_duration_and_layout_from_one_output() {
        let path = Path::new("MathIncompleteness.mp4");
        assert!((banner_duration(path, BANNER).unwrap().as_secs() - 500.5).abs() < 1e-9);
        assert_eq!(banner_layout(path, BANNER).unwrap().width, 1920);

        let audio_only = "  Duration: 00:00:12.00, start: 0\n  Stream #0:0: Audio: mp3";
        assert!(banner_duration(path, audio_only).is_ok());
        assert!(matches!(
            banner_layout(path, audio_only),
            Err(ExtractError::NoVideoStream(_))
        ));
    }

    #[test]
    fn test_media_duration_rejects_non_positive() {
        assert!(MediaDuration::from_secs(0.0).is_none());
        assert!(MediaDuration::from_secs(-1.0).is_none());
        assert!(MediaDuration::from_secs(f64::NAN).is_none());
        assert!(MediaDuration::from_secs(12.5).is_some());
    }

    #[test]
    fn test_ffprobe_json_prefers_format_duration() {
        let json = r#"{
            "streams": [
                {"codec_type": "video", "width": 1280, "height": 720, "duration": "59.9"},
                {"codec_type": "audio"}
            ],
            "format": {"duration": "60.000000"}
        }"#;
        let probe: FfprobeOutput = serde_json::from_str(json).unwrap();
        let path = Path::new("/videos/a.mp4");

        let duration = ffprobe_duration(path, &probe).unwrap();
        assert!((duration.as_secs() - 60.0).abs() < 1e-9);

        let layout = ffprobe_layout(path, &probe).unwrap();
        assert_eq!(
            layout,
            StreamLayout {
                width: 1280,
                height: 720,
                has_audio: true
            }
        );
    }

    #[test]
    fn test_ffprobe_json_falls_back_to_stream_duration() {
        let json = r#"{"streams": [{"codec_type": "video", "width": 640, "height": 360, "duration": "12.5"}], "format": {}}"#;
        let probe: FfprobeOutput = serde_json::from_str(json).unwrap();
        let duration = ffprobe_duration(Path::new("a.webm"), &probe).unwrap();
        assert!((duration.as_secs() - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_ffprobe_json_without_duration() {
        let json = r#"{"streams": [{"codec_type": "audio"}], "format": {}}"#;
        let probe: FfprobeOutput = serde_json::from_str(json).unwrap();
        let path = Path::new("a.mp3");

        assert!(matches!(
            ffprobe_duration(path, &probe),
            Err(ExtractError::DurationUnavailable { .. })
        ));
        assert!(matches!(
            ffprobe_layout(path, &probe),
            Err(ExtractError::NoVideoStream(_))
        ));
    }
}
