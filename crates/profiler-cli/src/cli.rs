use clap::Parser;
use profiler_core::{CaptureMode, ProfilerConfig};
use serde::Deserialize;
use std::path::PathBuf;

/// Run a Game Boy ROM under the profiler and write a Speedscope-compatible trace.
#[derive(Debug, Parser)]
#[command(name = "gb-flamegraph", version, about)]
pub struct Args {
    /// Path to the ROM file.
    pub rom: PathBuf,

    /// Linker memory-map file, for resolving PC samples to function names.
    /// If omitted, only the five interrupt vectors are symbolized.
    #[arg(long)]
    pub map: Option<PathBuf>,

    /// JSON array of `{frame, button, action}` input events.
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// TOML config file, merged under any flags given on the command line.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Where to write the Speedscope trace JSON.
    #[arg(long, default_value = "trace.json")]
    pub out: PathBuf,

    /// Directory framebuffer captures are written into.
    #[arg(long, default_value = "captures")]
    pub capture_dir: PathBuf,

    #[arg(long)]
    pub start_frame: Option<u64>,

    #[arg(long)]
    pub frames: Option<u64>,

    #[arg(long, value_enum)]
    pub capture_mode: Option<CliCaptureMode>,

    #[arg(long = "disable-interrupt")]
    pub disabled_interrupts: Vec<u8>,

    #[arg(long)]
    pub verbose: bool,

    /// Dump the resolved Symbol Map and Region Table, then exit without running.
    #[arg(long)]
    pub list_frames: bool,

    /// Run the profiler twice and fail if the two traces differ.
    #[arg(long)]
    pub verify_determinism: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CliCaptureMode {
    All,
    Exit,
    None,
}

impl From<CliCaptureMode> for CaptureMode {
    fn from(mode: CliCaptureMode) -> Self {
        match mode {
            CliCaptureMode::All => CaptureMode::All,
            CliCaptureMode::Exit => CaptureMode::Exit,
            CliCaptureMode::None => CaptureMode::None,
        }
    }
}

/// Mirrors `ProfilerConfig` but with every field optional, so a TOML sidecar
/// only needs to specify what it wants to override.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub start_frame: Option<u64>,
    pub frames: Option<u64>,
    pub capture_mode: Option<CliCaptureMode>,
    #[serde(default)]
    pub disabled_interrupts: Vec<u8>,
    pub verbose: Option<bool>,
}

/// CLI flags win over the config file, which wins over these defaults.
pub fn resolve_config(args: &Args, file: Option<ConfigFile>) -> ProfilerConfig {
    let file = file.unwrap_or_default();
    let disabled_interrupts = if !args.disabled_interrupts.is_empty() {
        args.disabled_interrupts.clone()
    } else {
        file.disabled_interrupts
    };
    ProfilerConfig {
        start_frame: args.start_frame.or(file.start_frame).unwrap_or(0),
        frames: args.frames.or(file.frames).unwrap_or(60),
        capture_mode: args
            .capture_mode
            .or(file.capture_mode)
            .map(CaptureMode::from)
            .unwrap_or(CaptureMode::All),
        disabled_interrupts,
        verbose: args.verbose || file.verbose.unwrap_or(false),
    }
}
