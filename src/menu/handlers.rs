use super::prompts::{
    prompt_count, prompt_output_dir, prompt_path, prompt_position, prompt_rate, prompt_unit,
};
use crate::component::batch_runner::{
    BatchRunner, ManifestDefaults, load_manifest, manifest_requests, thumbnail_requests,
};
use crate::component::job_dispatcher::{FfmpegRunner, JobDispatcher, JobReport, JobRequest};
use crate::component::snapshot_planner::OutputRate;
use crate::config::save::{add_recent_path, save_settings};
use crate::config::{Config, ProbeMethod, UserSettings};
use crate::pause;
use crate::tools::{
    FfmpegBannerProbe, FfprobeProbe, StreamProbe, format_elapsed, scan_video_files,
    validate_directory_exists, validate_file_exists,
};
use anyhow::Result;
use console::{Term, style};
use log::warn;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

type Dispatcher = JobDispatcher<Box<dyn StreamProbe>, FfmpegRunner>;

/// 依設定建立派送器
#[must_use]
pub fn build_dispatcher(settings: &UserSettings) -> Dispatcher {
    let probe: Box<dyn StreamProbe> = match settings.probe_method {
        ProbeMethod::Ffprobe => Box::new(FfprobeProbe::new(settings.ffprobe_path.clone())),
        ProbeMethod::FfmpegBanner => Box::new(FfmpegBannerProbe::new(settings.ffmpeg_path.clone())),
    };
    let runner = FfmpegRunner::new(settings.ffmpeg_path.clone(), settings.verbose);

    JobDispatcher::new(probe, runner)
        .with_verbose(settings.verbose)
        .with_hls_segment_secs(settings.hls_segment_secs)
}

fn remember_path(config: &mut Config, path: &str) {
    add_recent_path(&mut config.settings, path);
    if let Err(e) = save_settings(&config.settings) {
        warn!("無法儲存路徑歷史: {e}");
    }
}

/// 選擇輸入影片，ESC 回傳 `None`
fn select_input_file(config: &mut Config) -> Result<Option<PathBuf>> {
    let Some(input) = prompt_path(&config.settings, "請輸入影片路徑")? else {
        return Ok(None);
    };
    let path = PathBuf::from(&input);
    validate_file_exists(&path)?;
    remember_path(config, &input);
    Ok(Some(path))
}

fn print_report(report: &JobReport) {
    println!(
        "\n{} {} -> {} ({})",
        style("完成:").green().bold(),
        report.kind,
        report.output.display(),
        format_elapsed(report.elapsed)
    );
    if let Some(tail) = report.tail
        && !tail.is_within_bounds()
    {
        println!("{}", style("最後一張截圖超出範圍，請檢查截圖數量").yellow());
    }
}

fn dispatch(config: &Config, request: &JobRequest) {
    match build_dispatcher(&config.settings).run(request) {
        Ok(report) => print_report(&report),
        Err(e) => eprintln!("{} {}", style("錯誤:").red().bold(), e),
    }
}

fn snapshot_request(config: &mut Config) -> Result<Option<JobRequest>> {
    let Some(input) = select_input_file(config)? else {
        return Ok(None);
    };
    let Some(unit) = prompt_unit(config.settings.default_unit)? else {
        return Ok(None);
    };
    let position = prompt_position(unit)?;
    let rate = OutputRate::new(prompt_rate(config.settings.default_out_fps)?)?;
    let count = prompt_count()?;
    let out_dir = prompt_output_dir(&config.settings)?;

    Ok(Some(JobRequest::Snapshot {
        input,
        position,
        rate,
        count,
        out_dir,
    }))
}

fn splice_request(config: &mut Config) -> Result<Option<JobRequest>> {
    let Some(input) = select_input_file(config)? else {
        return Ok(None);
    };
    let Some(unit) = prompt_unit(config.settings.default_unit)? else {
        return Ok(None);
    };
    let position = prompt_position(unit)?;
    let out_dir = prompt_output_dir(&config.settings)?;

    Ok(Some(JobRequest::Splice {
        input,
        position,
        out_dir,
        out_path: None,
    }))
}

pub fn run_snapshot(term: &Term, config: &mut Config) -> Result<()> {
    println!("{}", style("=== 影片截圖 ===").cyan().bold());

    match snapshot_request(config) {
        Ok(Some(request)) => dispatch(config, &request),
        Ok(None) => return Ok(()),
        Err(e) => eprintln!("{} {}", style("錯誤:").red().bold(), e),
    }

    pause(term)
}

pub fn run_splice(term: &Term, config: &mut Config) -> Result<()> {
    println!("{}", style("=== 影片剪輯 ===").cyan().bold());

    match splice_request(config) {
        Ok(Some(request)) => dispatch(config, &request),
        Ok(None) => return Ok(()),
        Err(e) => eprintln!("{} {}", style("錯誤:").red().bold(), e),
    }

    pause(term)
}

pub fn run_thumbnail(term: &Term, config: &mut Config) -> Result<()> {
    println!("{}", style("=== 影片縮圖 ===").cyan().bold());

    let request = select_input_file(config).and_then(|input| {
        input
            .map(|input| {
                Ok(JobRequest::Thumbnail {
                    input,
                    out_dir: prompt_output_dir(&config.settings)?,
                })
            })
            .transpose()
    });

    match request {
        Ok(Some(request)) => dispatch(config, &request),
        Ok(None) => return Ok(()),
        Err(e) => eprintln!("{} {}", style("錯誤:").red().bold(), e),
    }

    pause(term)
}

pub fn run_hls_encode(term: &Term, config: &mut Config) -> Result<()> {
    println!("{}", style("=== HLS 串流編碼 ===").cyan().bold());

    let request = select_input_file(config).and_then(|input| {
        input
            .map(|input| {
                Ok(JobRequest::HlsEncode {
                    input,
                    out_dir: prompt_output_dir(&config.settings)?,
                })
            })
            .transpose()
    });

    match request {
        Ok(Some(request)) => dispatch(config, &request),
        Ok(None) => return Ok(()),
        Err(e) => eprintln!("{} {}", style("錯誤:").red().bold(), e),
    }

    pause(term)
}

fn run_requests(
    config: &Config,
    shutdown_signal: &Arc<AtomicBool>,
    requests: &[JobRequest],
) -> Result<()> {
    let dispatcher = build_dispatcher(&config.settings);
    let runner = BatchRunner::new(&dispatcher, Arc::clone(shutdown_signal));

    match runner.run(requests) {
        Ok(summary) => {
            println!(
                "\n{} {}/{}",
                style("批次完成:").green().bold(),
                summary.reports.len(),
                summary.total
            );
            if summary.interrupted {
                println!(
                    "{}",
                    style(format!("已中斷，略過 {} 個工作", summary.skipped())).yellow()
                );
            }
        }
        Err(e) => {
            eprintln!("{} {}", style("錯誤:").red().bold(), e);
            println!("{}", style(format!("已完成 {} 個工作", e.completed.len())).dim());
        }
    }

    Ok(())
}

fn manifest_defaults(settings: &UserSettings) -> ManifestDefaults {
    ManifestDefaults {
        out_dir: PathBuf::from(&settings.output_dir),
        unit: settings.default_unit,
        rate: settings.default_out_fps,
    }
}

fn batch_manifest(config: &mut Config, shutdown_signal: &Arc<AtomicBool>) -> Result<()> {
    let Some(input) = prompt_path(&config.settings, "請輸入工作檔路徑 (JSON)")? else {
        return Ok(());
    };
    let path = Path::new(&input);
    validate_file_exists(path)?;
    remember_path(config, &input);

    let manifest = load_manifest(path)?;
    let requests = manifest_requests(manifest, &manifest_defaults(&config.settings))?;
    println!("{}", style(format!("共 {} 個工作", requests.len())).dim());

    run_requests(config, shutdown_signal, &requests)
}

fn folder_thumbnails(config: &mut Config, shutdown_signal: &Arc<AtomicBool>) -> Result<()> {
    let Some(input) = prompt_path(&config.settings, "請輸入影片資料夾路徑")? else {
        return Ok(());
    };
    let directory = PathBuf::from(&input);
    validate_directory_exists(&directory)?;
    remember_path(config, &input);

    println!("{}", style("掃描影片中...").dim());
    let videos = scan_video_files(&directory, &config.settings.video_extensions)?;
    if videos.is_empty() {
        println!("{}", style("找不到任何影片").yellow());
        return Ok(());
    }
    println!("{}", style(format!("找到 {} 部影片", videos.len())).dim());

    let out_dir = prompt_output_dir(&config.settings)?;
    run_requests(
        config,
        shutdown_signal,
        &thumbnail_requests(&videos, &out_dir),
    )
}

pub fn run_batch_manifest(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &mut Config,
) -> Result<()> {
    println!("{}", style("=== 批次工作檔 ===").cyan().bold());

    if let Err(e) = batch_manifest(config, shutdown_signal) {
        eprintln!("{} {:#}", style("錯誤:").red().bold(), e);
    }

    pause(term)
}

pub fn run_folder_thumbnails(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &mut Config,
) -> Result<()> {
    println!("{}", style("=== 資料夾批次縮圖 ===").cyan().bold());

    if let Err(e) = folder_thumbnails(config, shutdown_signal) {
        eprintln!("{} {:#}", style("錯誤:").red().bold(), e);
    }

    pause(term)
}
