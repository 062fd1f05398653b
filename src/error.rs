//! 擷取工作的錯誤分類
//!
//! 所有錯誤都只會中止目前的工作，不做自動重試。

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// 位置單位不是 `percent` 或 `seconds`
    #[error("無效的位置單位: {0}（只接受 percent 或 seconds）")]
    InvalidUnit(String),

    /// 無法從影片取得長度
    #[error("無法取得影片長度 {}: {reason}", path.display())]
    DurationUnavailable { path: PathBuf, reason: String },

    /// 剪輯輸出的容器格式與輸入不同
    #[error("輸入格式 {input} 與輸出格式 {output} 不一致")]
    FormatMismatch { input: String, output: String },

    /// 輸出速率必須是大於 0 的有限數
    #[error("輸出速率必須大於 0，收到 {0}")]
    InvalidRate(f64),

    /// 影片沒有視訊串流
    #[error("找不到視訊串流: {}", .0.display())]
    NoVideoStream(PathBuf),

    /// 無法啟動外部程式
    #[error("無法執行 {program}: {source}")]
    EngineLaunch {
        program: String,
        #[source]
        source: io::Error,
    },

    /// 外部引擎回傳非零結束碼，附帶原始診斷輸出
    #[error("ffmpeg 執行失敗 ({status}): {diagnostics}")]
    EngineFailure { status: String, diagnostics: String },

    #[error("I/O 錯誤: {0}")]
    Io(#[from] io::Error),
}
