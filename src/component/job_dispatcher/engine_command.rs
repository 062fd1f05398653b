use std::path::{Path, PathBuf};
use std::process::Command;

/// 呼叫方式：一般工作帶上固定的全域參數，縮圖則以最精簡的指令直接執行
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationMode {
    Structured,
    Bare,
}

/// 一次 ffmpeg 呼叫的完整描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInvocation {
    pub input: PathBuf,
    /// 放在 `-i` 之前（例如 `-ss`、`-to`）
    pub input_options: Vec<(String, String)>,
    /// 放在輸出路徑之前（例如 `-frames:v`、`-vf`）
    pub output_options: Vec<(String, String)>,
    pub output: PathBuf,
    pub overwrite: bool,
    pub mode: InvocationMode,
}

impl EngineInvocation {
    #[must_use]
    pub fn new(input: &Path, output: &Path, mode: InvocationMode) -> Self {
        Self {
            input: input.to_path_buf(),
            input_options: Vec::new(),
            output_options: Vec::new(),
            output: output.to_path_buf(),
            overwrite: true,
            mode,
        }
    }

    #[must_use]
    pub fn input_options(mut self, options: Vec<(String, String)>) -> Self {
        self.input_options.extend(options);
        self
    }

    #[must_use]
    pub fn output_option(mut self, key: &str, value: impl Into<String>) -> Self {
        self.output_options.push((key.to_string(), value.into()));
        self
    }

    /// 依序組合參數：全域旗標、輸入端參數、`-i`、輸出端參數、輸出路徑
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.mode == InvocationMode::Structured {
            args.extend(["-hide_banner".to_string(), "-nostdin".to_string()]);
        }
        if self.overwrite {
            args.push("-y".to_string());
        }

        for (key, value) in &self.input_options {
            args.push(key.clone());
            args.push(value.clone());
        }

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        for (key, value) in &self.output_options {
            args.push(key.clone());
            args.push(value.clone());
        }

        args.push(self.output.to_string_lossy().to_string());
        args
    }

    /// 建立指令；需要進度時由 stdout 輸出 `-progress` 的 key=value 行
    ///
    /// 子程序放在獨立的 process group，終端機的 Ctrl-C 不會中斷執行中的工作
    #[must_use]
    pub fn build_command(&self, program: &str, with_progress: bool) -> Command {
        let mut cmd = Command::new(program);

        if with_progress && self.mode == InvocationMode::Structured {
            cmd.args(["-progress", "pipe:1", "-nostats"]);
        }
        cmd.args(self.to_args());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        cmd
    }
}
