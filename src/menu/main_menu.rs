use crate::component::snapshot_planner::PositionUnit;
use crate::config::save::save_settings;
use crate::config::{Config, ProbeMethod};
use crate::menu::handlers::{
    run_batch_manifest, run_folder_thumbnails, run_hls_encode, run_snapshot, run_splice,
    run_thumbnail,
};
use anyhow::Result;
use console::{Term, style};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub fn show_main_menu(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &mut Config,
) -> Result<bool> {
    term.clear_screen()?;

    println!("{}", style("=== 影片擷取工具 ===").cyan().bold());
    println!("{}", style("(按 ESC 離開)").dim());

    let options = [
        "影片截圖",
        "影片剪輯",
        "影片縮圖",
        "HLS 串流編碼",
        "批次工作檔",
        "資料夾批次縮圖",
        "設定",
        "離開",
    ];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("請選擇功能")
        .items(&options)
        .default(0)
        .interact_on_opt(term)?;

    match selection {
        Some(0) => run_snapshot(term, config)?,
        Some(1) => run_splice(term, config)?,
        Some(2) => run_thumbnail(term, config)?,
        Some(3) => run_hls_encode(term, config)?,
        Some(4) => run_batch_manifest(term, shutdown_signal, config)?,
        Some(5) => run_folder_thumbnails(term, shutdown_signal, config)?,
        Some(6) => show_settings_menu(term, config)?,
        Some(7) | None => return Ok(false),
        _ => unreachable!(),
    }

    Ok(true)
}

fn saved(value: impl std::fmt::Display) {
    println!("\n{} {}", style("設定已儲存:").green(), value);
    std::thread::sleep(std::time::Duration::from_secs(1));
}

/// 設定選單
fn show_settings_menu(term: &Term, config: &mut Config) -> Result<()> {
    loop {
        term.clear_screen()?;

        println!("{}", style("=== 設定 ===").cyan().bold());
        println!("{}", style("(按 ESC 返回)").dim());

        let settings = &config.settings;
        let options = vec![
            format!("影片資訊來源: {}", settings.probe_method),
            format!("預設位置單位: {}", settings.default_unit),
            format!("預設每秒截圖張數: {}", settings.default_out_fps),
            format!("預設輸出資料夾: {}", settings.output_dir),
            format!("HLS 片段長度: {} 秒", settings.hls_segment_secs),
            format!("ffmpeg 路徑: {}", settings.ffmpeg_path),
            format!("顯示 ffmpeg 輸出: {}", if settings.verbose { "開" } else { "關" }),
            "返回".to_string(),
        ];

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("請選擇要修改的設定")
            .items(&options)
            .default(0)
            .interact_on_opt(term)?;

        match selection {
            Some(0) => select_probe_method(term, config)?,
            Some(1) => select_default_unit(term, config)?,
            Some(2) => {
                let rate: f64 = Input::new()
                    .with_prompt("每秒截圖張數")
                    .default(config.settings.default_out_fps)
                    .validate_with(|v: &f64| {
                        if v.is_finite() && *v > 0.0 {
                            Ok(())
                        } else {
                            Err("必須大於 0")
                        }
                    })
                    .interact_text()?;
                config.settings.default_out_fps = rate;
                save_settings(&config.settings)?;
                saved(rate);
            }
            Some(3) => {
                let dir: String = Input::new()
                    .with_prompt("輸出資料夾")
                    .default(config.settings.output_dir.clone())
                    .interact_text()?;
                config.settings.output_dir = dir.trim().to_string();
                save_settings(&config.settings)?;
                saved(&config.settings.output_dir);
            }
            Some(4) => {
                let seconds: u32 = Input::new()
                    .with_prompt("HLS 片段長度（秒）")
                    .default(config.settings.hls_segment_secs)
                    .interact_text()?;
                config.settings.hls_segment_secs = seconds.max(1);
                save_settings(&config.settings)?;
                saved(config.settings.hls_segment_secs);
            }
            Some(5) => {
                let program: String = Input::new()
                    .with_prompt("ffmpeg 路徑")
                    .default(config.settings.ffmpeg_path.clone())
                    .interact_text()?;
                config.settings.ffmpeg_path = program.trim().to_string();
                save_settings(&config.settings)?;
                saved(&config.settings.ffmpeg_path);
            }
            Some(6) => {
                config.settings.verbose = !config.settings.verbose;
                save_settings(&config.settings)?;
                saved(if config.settings.verbose { "開" } else { "關" });
            }
            Some(7) | None => break,
            _ => unreachable!(),
        }
    }

    Ok(())
}

fn select_probe_method(term: &Term, config: &mut Config) -> Result<()> {
    let methods = [ProbeMethod::Ffprobe, ProbeMethod::FfmpegBanner];
    let items: Vec<String> = methods.iter().map(ToString::to_string).collect();

    let default_index = methods
        .iter()
        .position(|&m| m == config.settings.probe_method)
        .unwrap_or(0);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("影片資訊來源")
        .items(&items)
        .default(default_index)
        .interact_on_opt(term)?;

    let Some(selection) = selection else {
        return Ok(());
    };

    let selected = methods[selection];
    if selected != config.settings.probe_method {
        config.settings.probe_method = selected;
        save_settings(&config.settings)?;
        saved(selected);
    }

    Ok(())
}

fn select_default_unit(term: &Term, config: &mut Config) -> Result<()> {
    let units = [PositionUnit::Percent, PositionUnit::Seconds];
    let items: Vec<String> = units.iter().map(ToString::to_string).collect();

    let default_index = units
        .iter()
        .position(|&u| u == config.settings.default_unit)
        .unwrap_or(0);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("預設位置單位")
        .items(&items)
        .default(default_index)
        .interact_on_opt(term)?;

    let Some(selection) = selection else {
        return Ok(());
    };

    let selected = units[selection];
    if selected != config.settings.default_unit {
        config.settings.default_unit = selected;
        save_settings(&config.settings)?;
        saved(selected);
    }

    Ok(())
}
