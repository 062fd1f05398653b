use super::range_resolver::SeekWindow;
use crate::error::ExtractError;
use crate::tools::{MediaDuration, format_duration};
use log::{info, warn};
use std::fmt;

/// 輸出速率（每秒來源影片產生幾張截圖），必定大於 0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct OutputRate(f64);

impl OutputRate {
    pub fn new(per_second: f64) -> Result<Self, ExtractError> {
        if per_second.is_finite() && per_second > 0.0 {
            Ok(Self(per_second))
        } else {
            Err(ExtractError::InvalidRate(per_second))
        }
    }

    #[must_use]
    pub const fn per_second(self) -> f64 {
        self.0
    }
}

impl fmt::Display for OutputRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 截圖數量：自動推算或由呼叫端指定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderCount {
    #[default]
    Auto,
    Exact(i64),
}

impl RenderCount {
    /// 舊版介面以 `-1` 代表自動
    #[must_use]
    pub const fn from_legacy(value: i64) -> Self {
        if value == -1 {
            Self::Auto
        } else {
            Self::Exact(value)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPlan {
    pub count: u32,
    pub rate: OutputRate,
}

/// 計算截圖數量
///
/// 自動模式以 `span / rate` 四捨六入五成雙，`span` 依序取：
/// 起訖皆有時的區間長度、只有起點時到結尾的長度、只有終點時的終點、整部影片。
/// 指定數量時小於 1 的值一律提升為 1。
#[must_use]
pub fn plan(
    window: &SeekWindow,
    count: RenderCount,
    rate: OutputRate,
    duration: MediaDuration,
) -> RenderPlan {
    let count = match count {
        RenderCount::Exact(n) => n.clamp(1, i64::from(u32::MAX)) as u32,
        RenderCount::Auto => {
            let span = match (window.start, window.end) {
                (Some(start), Some(end)) => end.as_secs() - start.as_secs(),
                (Some(start), None) => duration.as_secs() - start.as_secs(),
                (None, Some(end)) => end.as_secs(),
                (None, None) => duration.as_secs(),
            };
            (span / rate.per_second()).round_ties_even().max(1.0) as u32
        }
    };

    RenderPlan { count, rate }
}

/// 最後一張截圖時間點的檢查結果，僅供提示，不會阻止執行
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TailCheck {
    WithinBounds { last: f64 },
    PastDuration { last: f64, duration: f64 },
    PastWindowEnd { last: f64, end: f64 },
}

impl TailCheck {
    #[must_use]
    pub const fn is_within_bounds(&self) -> bool {
        matches!(self, Self::WithinBounds { .. })
    }

    pub fn log(&self) {
        match *self {
            Self::WithinBounds { last } => {
                info!("預估最後一張截圖: {}", format_duration(last));
            }
            Self::PastDuration { last, duration } => {
                warn!("最後一張截圖 {last}s 超出影片長度 {duration}s");
            }
            Self::PastWindowEnd { last, end } => {
                warn!("最後一張截圖 {last}s 超出工作的截斷範圍 {end}s");
            }
        }
    }
}

/// 估算最後一張截圖的時間點（`count / rate + 起點`）並與影片長度、終點比對
#[must_use]
pub fn check_tail(window: &SeekWindow, plan: &RenderPlan, duration: MediaDuration) -> TailCheck {
    let last = f64::from(plan.count) / plan.rate.per_second() + window.start_secs();

    if last > duration.as_secs() {
        return TailCheck::PastDuration {
            last,
            duration: duration.as_secs(),
        };
    }

    match window.end_secs() {
        Some(end) if last > end => TailCheck::PastWindowEnd { last, end },
        _ => TailCheck::WithinBounds { last },
    }
}
