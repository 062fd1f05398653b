use crate::error::ExtractError;
use crate::tools::{MediaDuration, format_hms};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 起點夾限時與影片結尾保留的最小距離（秒），確保至少有一小段可解碼
pub const END_MARGIN_SECS: f64 = 0.1;

/// 位置數值的單位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionUnit {
    /// 影片長度的比例（0.0 ~ 1.0）
    #[default]
    Percent,
    /// 絕對秒數
    Seconds,
}

impl PositionUnit {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Percent => "percent",
            Self::Seconds => "seconds",
        }
    }
}

impl fmt::Display for PositionUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PositionUnit {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "percent" => Ok(Self::Percent),
            "seconds" => Ok(Self::Seconds),
            _ => Err(ExtractError::InvalidUnit(s.to_string())),
        }
    }
}

/// 使用者輸入的位置設定
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSpec {
    pub unit: PositionUnit,
    pub start: f64,
    /// `None` 代表執行到影片結尾
    pub stop: Option<f64>,
}

impl PositionSpec {
    /// 負數的終點（舊版的 `-1`）一律視為「到結尾」
    #[must_use]
    pub fn new(unit: PositionUnit, start: f64, stop: Option<f64>) -> Self {
        Self {
            unit,
            start,
            stop: stop.filter(|s| *s >= 0.0),
        }
    }

    /// 整部影片
    #[must_use]
    pub fn whole(unit: PositionUnit) -> Self {
        Self::new(unit, 0.0, None)
    }
}

/// 精確到毫秒的時間點
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    millis: u64,
}

impl Timestamp {
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    /// 四捨五入到毫秒，負數視為 0
    #[must_use]
    pub fn from_secs(seconds: f64) -> Self {
        Self {
            millis: (seconds * 1000.0).round() as u64,
        }
    }

    #[must_use]
    pub const fn millis(self) -> u64 {
        self.millis
    }

    #[must_use]
    pub fn as_secs(self) -> f64 {
        self.millis as f64 / 1000.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.millis / 1000, self.millis % 1000)
    }
}

/// 解析後的擷取範圍
///
/// `start` 存在時必定大於 0；`end` 存在時必定大於有效起點且小於影片長度。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeekWindow {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
}

impl SeekWindow {
    pub const UNBOUNDED: Self = Self {
        start: None,
        end: None,
    };

    /// 有效起點（未設定時為 0）
    #[must_use]
    pub fn start_secs(&self) -> f64 {
        self.start.map_or(0.0, Timestamp::as_secs)
    }

    #[must_use]
    pub fn end_secs(&self) -> Option<f64> {
        self.end.map(Timestamp::as_secs)
    }

    /// 範圍長度（秒），未設定終點時算到影片結尾
    #[must_use]
    pub fn span_secs(&self, duration: MediaDuration) -> f64 {
        (self.end_secs().unwrap_or(duration.as_secs()) - self.start_secs()).max(0.0)
    }

    /// 放在 `-i` 之前的裁切參數
    #[must_use]
    pub fn input_options(&self) -> Vec<(String, String)> {
        let mut options = Vec::new();
        if let Some(start) = self.start {
            options.push(("-ss".to_string(), start.to_string()));
        }
        if let Some(end) = self.end {
            options.push(("-to".to_string(), end.to_string()));
        }
        options
    }
}

/// 夾限後的起點上限（毫秒），保證換算回秒數後不超過 `duration - END_MARGIN_SECS`
fn start_cap_millis(duration: f64) -> u64 {
    let limit = duration - END_MARGIN_SECS;
    let cap = Timestamp::from_secs(limit);
    if cap.as_secs() > limit {
        cap.millis().saturating_sub(1)
    } else {
        cap.millis()
    }
}

/// 將相對位置轉換為影片上的絕對擷取範圍
///
/// 超出範圍的數值一律夾限，不會失敗。終點不合法（不大於起點、或超出影片）時
/// 直接捨棄，視為執行到結尾。
#[must_use]
pub fn resolve(duration: MediaDuration, position: &PositionSpec) -> SeekWindow {
    let duration = duration.as_secs();

    let (start_raw, stop_raw) = match position.unit {
        PositionUnit::Percent => {
            let start_raw = (position.start * duration)
                .min(duration - END_MARGIN_SECS)
                .max(0.0);
            let stop_raw = position
                .stop
                .filter(|stop| *stop < 1.0 && *stop > position.start)
                .map(|stop| stop * duration);
            (start_raw, stop_raw)
        }
        PositionUnit::Seconds => {
            let start_raw = position.start.min(duration - END_MARGIN_SECS).max(0.0);
            let stop_raw = position
                .stop
                .filter(|stop| *stop < duration && *stop > start_raw);
            (start_raw, stop_raw)
        }
    };

    let start_millis = Timestamp::from_secs(start_raw)
        .millis()
        .min(start_cap_millis(duration));
    let start = (start_millis > 0).then_some(Timestamp::from_millis(start_millis));

    let end = stop_raw
        .map(|stop| Timestamp::from_secs(stop.min(duration).max(start_raw)))
        .filter(|end| end.millis() > start_millis && end.as_secs() < duration);

    if let Some(start) = start {
        info!("指定起點: {}", format_hms(start.as_secs()));
    }
    if let Some(end) = end {
        info!("指定終點: {}", format_hms(end.as_secs()));
    }

    SeekWindow { start, end }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn duration(seconds: f64) -> MediaDuration {
        MediaDuration::from_secs(seconds).unwrap()
    }

    #[test]
    fn test_position_unit_parse() {
        assert_eq!("percent".parse::<PositionUnit>().unwrap(), PositionUnit::Percent);
        assert_eq!(" Seconds ".parse::<PositionUnit>().unwrap(), PositionUnit::Seconds);
        assert!(matches!(
            "frames".parse::<PositionUnit>(),
            Err(ExtractError::InvalidUnit(unit)) if unit == "frames"
        ));
    }

    #[test]
    fn test_legacy_stop_sentinel_is_unbounded() {
        let spec = PositionSpec::new(PositionUnit::Percent, 0.5, Some(-1.0));
        assert_eq!(spec.stop, None);
        assert_eq!(resolve(duration(500.0), &spec).end, None);
    }

    #[test]
    fn test_seconds_window() {
        let spec = PositionSpec::new(PositionUnit::Seconds, 400.0, Some(460.0));
        let window = resolve(duration(500.0), &spec);

        assert_eq!(window.start, Some(Timestamp::from_millis(400_000)));
        assert_eq!(window.end, Some(Timestamp::from_millis(460_000)));
        assert_eq!(
            window.input_options(),
            vec![
                ("-ss".to_string(), "400.000".to_string()),
                ("-to".to_string(), "460.000".to_string()),
            ]
        );
    }

    #[test]
    fn test_percent_start_near_end() {
        let spec = PositionSpec::new(PositionUnit::Percent, 0.999, None);
        let window = resolve(duration(500.0), &spec);

        assert_eq!(window.start, Some(Timestamp::from_millis(499_500)));
        assert_eq!(window.end, None);
    }

    #[test]
    fn test_percent_start_clamped_to_margin() {
        let spec = PositionSpec::new(PositionUnit::Percent, 1.5, None);
        let window = resolve(duration(500.0), &spec);
        assert_eq!(window.start, Some(Timestamp::from_millis(499_900)));
    }

    #[test]
    fn test_zero_start_is_absent() {
        let window = resolve(duration(60.0), &PositionSpec::whole(PositionUnit::Seconds));
        assert_eq!(window, SeekWindow::UNBOUNDED);

        let negative = PositionSpec::new(PositionUnit::Seconds, -12.0, None);
        assert_eq!(resolve(duration(60.0), &negative).start, None);

        // 小於半毫秒的起點四捨五入為 0
        let tiny = PositionSpec::new(PositionUnit::Percent, 0.0004, None);
        assert_eq!(resolve(duration(1.0), &tiny).start, None);
    }

    #[test]
    fn test_seconds_stop_at_or_past_duration_is_dropped() {
        for stop in [500.0, 500.1, 10_000.0] {
            let spec = PositionSpec::new(PositionUnit::Seconds, 100.0, Some(stop));
            assert_eq!(resolve(duration(500.0), &spec).end, None, "stop={stop}");
        }
    }

    #[test]
    fn test_percent_stop_at_or_past_one_is_dropped() {
        let spec = PositionSpec::new(PositionUnit::Percent, 0.2, Some(1.0));
        assert_eq!(resolve(duration(500.0), &spec).end, None);
    }

    #[test]
    fn test_stop_not_after_start_is_dropped() {
        let seconds = PositionSpec::new(PositionUnit::Seconds, 200.0, Some(150.0));
        assert_eq!(resolve(duration(500.0), &seconds).end, None);

        let equal = PositionSpec::new(PositionUnit::Seconds, 200.0, Some(200.0));
        assert_eq!(resolve(duration(500.0), &equal).end, None);

        let percent = PositionSpec::new(PositionUnit::Percent, 0.6, Some(0.4));
        assert_eq!(resolve(duration(500.0), &percent).end, None);
    }

    #[test]
    fn test_percent_window() {
        let spec = PositionSpec::new(PositionUnit::Percent, 0.25, Some(0.5));
        let window = resolve(duration(60.0), &spec);
        assert_eq!(window.start, Some(Timestamp::from_millis(15_000)));
        assert_eq!(window.end, Some(Timestamp::from_millis(30_000)));
    }

    #[test]
    fn test_end_only_window() {
        let spec = PositionSpec::new(PositionUnit::Seconds, 0.0, Some(42.5));
        let window = resolve(duration(60.0), &spec);
        assert_eq!(window.start, None);
        assert_eq!(window.end, Some(Timestamp::from_millis(42_500)));
        assert_eq!(
            window.input_options(),
            vec![("-to".to_string(), "42.500".to_string())]
        );
    }

    #[test]
    fn test_offsets_rounded_to_millis() {
        let spec = PositionSpec::new(PositionUnit::Seconds, 12.345_67, Some(20.000_4));
        let window = resolve(duration(60.0), &spec);
        assert_eq!(window.start.unwrap().to_string(), "12.346");
        assert_eq!(window.end.unwrap().to_string(), "20.000");
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let spec = PositionSpec::new(PositionUnit::Percent, 0.333_333, Some(0.777_777));
        let first = resolve(duration(123.456), &spec);
        let second = resolve(duration(123.456), &spec);
        assert_eq!(first, second);
    }

    #[test]
    fn test_percent_start_always_within_margin() {
        for &total in &[0.5, 3.3, 60.0, 500.0, 500.0006, 7322.25] {
            for step in 0..=1000 {
                let start = f64::from(step) / 1000.0;
                let spec = PositionSpec::new(PositionUnit::Percent, start, None);
                let window = resolve(duration(total), &spec);

                if let Some(offset) = window.start {
                    let secs = offset.as_secs();
                    assert!(secs > 0.0, "duration={total} start={start}");
                    assert!(
                        secs <= total - END_MARGIN_SECS,
                        "duration={total} start={start} offset={secs}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_window_invariants_hold() {
        let total = 90.0;
        for start_step in 0..=20 {
            for stop_step in 0..=20 {
                let start = f64::from(start_step) * 5.0;
                let stop = f64::from(stop_step) * 5.0;
                let spec = PositionSpec::new(PositionUnit::Seconds, start, Some(stop));
                let window = resolve(duration(total), &spec);

                if let Some(end) = window.end_secs() {
                    assert!(end > window.start_secs());
                    assert!(end < total);
                }
            }
        }
    }
}
