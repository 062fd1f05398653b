//! 截圖規劃
//!
//! 將相對位置轉換為擷取範圍，再推算截圖數量與檔名樣板：
//! A. 解析擷取範圍（range_resolver）
//! B. 推算截圖數量並檢查最後一張的時間點（render_planner）
//! C. 產生補零檔名樣板（naming_scheme）

mod naming_scheme;
mod range_resolver;
mod render_planner;

pub use naming_scheme::{NamingTemplate, SNAPSHOT_EXTENSION, SNAPSHOT_PREFIX};
pub use range_resolver::{
    END_MARGIN_SECS, PositionSpec, PositionUnit, SeekWindow, Timestamp, resolve,
};
pub use render_planner::{OutputRate, RenderCount, RenderPlan, TailCheck, check_tail, plan};
