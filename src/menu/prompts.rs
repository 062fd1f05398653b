use crate::component::snapshot_planner::{PositionSpec, PositionUnit, RenderCount};
use crate::config::UserSettings;
use anyhow::{Result, bail};
use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use std::path::{Path, PathBuf};

/// 從最近使用的路徑中選擇或輸入新路徑，ESC 回傳 `None`
pub fn prompt_path(settings: &UserSettings, prompt: &str) -> Result<Option<String>> {
    let recent_paths = &settings.recent_paths;

    if recent_paths.is_empty() {
        let path: String = Input::new().with_prompt(prompt).interact_text()?;
        return Ok(Some(path.trim().to_string()));
    }

    let mut options: Vec<String> = recent_paths
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let indicator = if Path::new(p).exists() { "✓" } else { "✗" };
            format!("{} [{}] {}", i + 1, indicator, p)
        })
        .collect();
    options.push("輸入新路徑...".to_string());

    println!("{}", style("(按 ESC 返回主選單)").dim());

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("請選擇路徑")
        .items(&options)
        .default(0)
        .interact_opt()?;

    match selection {
        None => Ok(None),
        Some(idx) if idx < recent_paths.len() => Ok(Some(recent_paths[idx].clone())),
        Some(_) => {
            let path: String = Input::new().with_prompt(prompt).interact_text()?;
            Ok(Some(path.trim().to_string()))
        }
    }
}

pub fn prompt_output_dir(settings: &UserSettings) -> Result<PathBuf> {
    let dir: String = Input::new()
        .with_prompt("輸出資料夾")
        .default(settings.output_dir.clone())
        .interact_text()?;
    Ok(PathBuf::from(dir.trim()))
}

pub fn prompt_unit(default: PositionUnit) -> Result<Option<PositionUnit>> {
    let units = [PositionUnit::Percent, PositionUnit::Seconds];
    let items = ["比例 (percent, 0.0 ~ 1.0)", "秒數 (seconds)"];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("位置單位")
        .items(&items)
        .default(units.iter().position(|&u| u == default).unwrap_or(0))
        .interact_opt()?;

    Ok(selection.map(|idx| units[idx]))
}

/// 起點與終點，終點留空代表到影片結尾
pub fn prompt_position(unit: PositionUnit) -> Result<PositionSpec> {
    let start: f64 = Input::new()
        .with_prompt(format!("起點 ({unit})"))
        .default(0.0)
        .interact_text()?;

    let stop: String = Input::new()
        .with_prompt(format!("終點 ({unit}，留空到結尾)"))
        .allow_empty(true)
        .interact_text()?;

    Ok(PositionSpec::new(unit, start, parse_optional_number(&stop)?))
}

pub fn prompt_rate(default: f64) -> Result<f64> {
    let rate: f64 = Input::new()
        .with_prompt("每秒截圖張數")
        .default(default)
        .interact_text()?;
    Ok(rate)
}

pub fn prompt_count() -> Result<RenderCount> {
    let count: i64 = Input::new()
        .with_prompt("截圖張數 (-1 為自動)")
        .default(-1)
        .interact_text()?;
    Ok(RenderCount::from_legacy(count))
}

fn parse_optional_number(text: &str) -> Result<Option<f64>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    match text.parse::<f64>() {
        Ok(value) => Ok(Some(value)),
        Err(_) => bail!("不是有效的數字: {text}"),
    }
}
