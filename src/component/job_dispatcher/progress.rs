use crate::tools::format_hms;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::time::Duration;

/// ffmpeg `-progress` 輸出的一筆進度
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    pub out_time: Duration,
    pub speed: Option<f64>,
    pub finished: bool,
}

/// 進度回報只是參考資訊，不影響工作流程
pub trait ProgressReporter {
    fn on_progress(&self, update: &ProgressUpdate);

    fn on_finish(&self) {}
}

/// 逐行解析 `key=value`，遇到 `progress=` 時產生一筆進度
#[derive(Debug, Default)]
pub struct ProgressParser {
    out_time: Duration,
    speed: Option<f64>,
}

impl ProgressParser {
    pub fn feed(&mut self, line: &str) -> Option<ProgressUpdate> {
        let (key, value) = line.trim().split_once('=')?;
        match key {
            // out_time_ms 與 out_time_us 的單位都是微秒
            "out_time_us" | "out_time_ms" | "out_time" => {
                if let Some(v) = parse_out_time_ms(value) {
                    self.out_time = Duration::from_millis(v);
                }
                None
            }
            "speed" => {
                self.speed = parse_speed(value);
                None
            }
            "progress" => Some(ProgressUpdate {
                out_time: self.out_time,
                speed: self.speed,
                finished: value == "end",
            }),
            _ => None,
        }
    }
}

fn parse_out_time_ms(raw: &str) -> Option<u64> {
    if let Ok(us) = raw.parse::<u64>() {
        return Some(us / 1000);
    }

    // 後備：解析 out_time=HH:MM:SS.micro
    let parts: Vec<&str> = raw.split(':').collect();
    if parts.len() == 3 {
        let h = parts[0].parse::<u64>().ok()?;
        let m = parts[1].parse::<u64>().ok()?;
        let s_part = parts[2];
        let (s, frac) = if let Some((sec, micro)) = s_part.split_once('.') {
            (sec.parse::<u64>().ok()?, micro.parse::<u64>().unwrap_or(0))
        } else {
            (s_part.parse::<u64>().ok()?, 0)
        };
        return Some(((h * 3600 + m * 60 + s) * 1000) + (frac / 1000));
    }
    None
}

fn parse_speed(raw: &str) -> Option<f64> {
    raw.trim().trim_end_matches('x').parse::<f64>().ok()
}

fn percent_of(update: &ProgressUpdate, total: Duration) -> f64 {
    if total.is_zero() {
        return 0.0;
    }
    (update.out_time.as_secs_f64() / total.as_secs_f64() * 100.0).min(100.0)
}

/// 終端機進度條（HLS 轉檔使用）
pub struct ConsoleProgress {
    bar: ProgressBar,
    total: Duration,
}

impl ConsoleProgress {
    #[must_use]
    pub fn new(total: Duration) -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} 轉檔中 ({pos}%) [{bar:40.cyan/blue}] 剩餘 {eta} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("#>-"),
        );
        Self { bar, total }
    }
}

impl ProgressReporter for ConsoleProgress {
    fn on_progress(&self, update: &ProgressUpdate) {
        self.bar.set_position(percent_of(update, self.total).round() as u64);
        if let Some(speed) = update.speed {
            self.bar.set_message(format!("{speed:.2}x"));
        }
    }

    fn on_finish(&self) {
        self.bar.finish_with_message("完成");
    }
}

/// 以 log 記錄進度（截圖與剪輯使用）
pub struct LogProgress {
    total: Duration,
}

impl LogProgress {
    #[must_use]
    pub const fn new(total: Duration) -> Self {
        Self { total }
    }
}

impl ProgressReporter for LogProgress {
    fn on_progress(&self, update: &ProgressUpdate) {
        let speed = update
            .speed
            .map_or_else(|| "--".to_string(), |s| format!("{s:.2}x"));
        info!(
            "進度 {:5.1}% {} / {} speed:{}",
            percent_of(update, self.total),
            format_hms(update.out_time.as_secs_f64()),
            format_hms(self.total.as_secs_f64()),
            speed
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_out_time_ms() {
        assert_eq!(parse_out_time_ms("12500000"), Some(12_500));
        assert_eq!(parse_out_time_ms("00:01:02.500000"), Some(62_500));
        assert_eq!(parse_out_time_ms("N/A"), None);
    }

    #[test]
    fn test_parse_speed() {
        assert_eq!(parse_speed("1.5x"), Some(1.5));
        assert_eq!(parse_speed(" 2x"), Some(2.0));
        assert_eq!(parse_speed("N/A"), None);
    }

    #[test]
    fn test_parser_emits_on_progress_key() {
        let mut parser = ProgressParser::default();
        let block = [
            "frame=120",
            "out_time_us=4000000",
            "out_time=00:00:04.000000",
            "speed=2.01x",
        ];
        for line in block {
            assert!(parser.feed(line).is_none());
        }

        let update = parser.feed("progress=continue").unwrap();
        assert_eq!(update.out_time, Duration::from_secs(4));
        assert_eq!(update.speed, Some(2.01));
        assert!(!update.finished);

        parser.feed("out_time_us=9000000");
        let last = parser.feed("progress=end").unwrap();
        assert_eq!(last.out_time, Duration::from_secs(9));
        assert!(last.finished);
    }

    #[test]
    fn test_parser_ignores_garbage() {
        let mut parser = ProgressParser::default();
        assert!(parser.feed("").is_none());
        assert!(parser.feed("no equals sign").is_none());
        assert!(parser.feed("bitrate=N/A").is_none());
    }

    #[test]
    fn test_percent_is_capped() {
        let update = ProgressUpdate {
            out_time: Duration::from_secs(70),
            speed: None,
            finished: false,
        };
        assert!((percent_of(&update, Duration::from_secs(60)) - 100.0).abs() < f64::EPSILON);
        assert!(percent_of(&update, Duration::ZERO).abs() < f64::EPSILON);
    }
}
