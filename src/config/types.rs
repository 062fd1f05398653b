use crate::component::snapshot_planner::PositionUnit;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_RECENT_PATHS: usize = 10;

/// 取得影片長度與串流資訊的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeMethod {
    /// `ffprobe -print_format json`
    #[default]
    Ffprobe,
    /// 解析 `ffmpeg -i` 的 banner 輸出，不需要 ffprobe
    FfmpegBanner,
}

impl fmt::Display for ProbeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ffprobe => write!(f, "ffprobe"),
            Self::FfmpegBanner => write!(f, "ffmpeg banner"),
        }
    }
}

fn default_video_extensions() -> Vec<String> {
    [
        ".mp4", ".mkv", ".mov", ".avi", ".wmv", ".flv", ".webm", ".m4v", ".ts", ".mpg",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub probe_method: ProbeMethod,
    pub output_dir: String,
    pub default_unit: PositionUnit,
    /// 每秒來源影片的截圖張數
    pub default_out_fps: f64,
    pub hls_segment_secs: u32,
    /// 輸出 ffmpeg 訊息與進度
    pub verbose: bool,
    pub video_extensions: Vec<String>,
    pub recent_paths: Vec<String>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            probe_method: ProbeMethod::default(),
            output_dir: "out".to_string(),
            default_unit: PositionUnit::default(),
            default_out_fps: 1.0,
            hls_segment_secs: 10,
            verbose: false,
            video_extensions: default_video_extensions(),
            recent_paths: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub settings: UserSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_use_defaults() {
        let settings: UserSettings =
            serde_json::from_str(r#"{"probe_method": "ffmpeg_banner", "verbose": true}"#).unwrap();

        assert_eq!(settings.probe_method, ProbeMethod::FfmpegBanner);
        assert!(settings.verbose);
        assert_eq!(settings.ffmpeg_path, "ffmpeg");
        assert_eq!(settings.default_unit, PositionUnit::Percent);
        assert_eq!(settings.hls_segment_secs, 10);
        assert!(settings.video_extensions.contains(&".mkv".to_string()));
    }

    #[test]
    fn test_settings_round_trip_through_json() {
        let mut settings = UserSettings::default();
        settings.default_unit = PositionUnit::Seconds;
        settings.recent_paths.push("/videos".to_string());

        let json = serde_json::to_string_pretty(&settings).unwrap();
        assert!(json.contains(r#""default_unit": "seconds""#));

        let back: UserSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }
}
