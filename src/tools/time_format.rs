use std::time::Duration;

/// 將秒數無條件捨去為整秒，格式化為 `H:MM:SS`
#[must_use]
pub fn format_hms(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    format!("{h}:{m:02}:{s:02}")
}

/// 格式化影片長度，有小數時附上微秒（`H:MM:SS.ffffff`）
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let micros = ((seconds - seconds.floor()) * 1_000_000.0).round() as u64;
    if micros == 0 || micros >= 1_000_000 {
        return format_hms(seconds.round());
    }
    format!("{}.{micros:06}", format_hms(seconds))
}

/// 工作耗時，保留一位小數
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.1}s", elapsed.as_secs_f64())
}
