use crate::component::job_dispatcher::JobRequest;
use crate::component::snapshot_planner::{OutputRate, PositionSpec, PositionUnit, RenderCount};
use crate::error::ExtractError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 批次工作檔：`{ "jobs": [ ... ] }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobManifest {
    pub jobs: Vec<ManifestJob>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestJobKind {
    Snapshot,
    Splice,
    Thumbnail,
    Hls,
}

/// 工作檔中的單一工作，未填的欄位使用設定檔的預設值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestJob {
    pub kind: ManifestJobKind,
    pub input: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    /// `-1` 與未填皆為自動
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_path: Option<PathBuf>,
}

/// 轉換工作時使用的預設值
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestDefaults {
    pub out_dir: PathBuf,
    pub unit: PositionUnit,
    pub rate: f64,
}

impl ManifestJob {
    fn position(&self, defaults: &ManifestDefaults) -> Result<PositionSpec, ExtractError> {
        let unit = match &self.unit {
            Some(text) => text.parse()?,
            None => defaults.unit,
        };
        Ok(PositionSpec::new(unit, self.start.unwrap_or(0.0), self.stop))
    }

    pub fn into_request(self, defaults: &ManifestDefaults) -> Result<JobRequest, ExtractError> {
        let out_dir = self
            .out_dir
            .clone()
            .unwrap_or_else(|| defaults.out_dir.clone());

        let request = match self.kind {
            ManifestJobKind::Snapshot => JobRequest::Snapshot {
                position: self.position(defaults)?,
                rate: OutputRate::new(self.rate.unwrap_or(defaults.rate))?,
                count: self.count.map_or(RenderCount::Auto, RenderCount::from_legacy),
                input: self.input,
                out_dir,
            },
            ManifestJobKind::Splice => JobRequest::Splice {
                position: self.position(defaults)?,
                input: self.input,
                out_dir,
                out_path: self.out_path,
            },
            ManifestJobKind::Thumbnail => JobRequest::Thumbnail {
                input: self.input,
                out_dir,
            },
            ManifestJobKind::Hls => JobRequest::HlsEncode {
                input: self.input,
                out_dir,
            },
        };

        Ok(request)
    }
}

pub fn load_manifest(path: &Path) -> Result<JobManifest> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("無法讀取工作檔: {}", path.display()))?;

    serde_json::from_str(&content).with_context(|| format!("無法解析工作檔: {}", path.display()))
}
