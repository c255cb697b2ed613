// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Result};
use log::{error, warn, info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::Write;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use subslice::app_config::{self, Config, ConfigOverrides};
use subslice::app_controller::{Controller, SliceJob};
use subslice::audio::AudioFormat;

/// CLI Wrapper for AudioFormat to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliAudioFormat {
    Mp3,
    Wav,
    Flac,
    Ogg,
    Opus,
    M4a,
    Aac,
}

impl From<CliAudioFormat> for AudioFormat {
    fn from(cli_format: CliAudioFormat) -> Self {
        match cli_format {
            CliAudioFormat::Mp3 => AudioFormat::Mp3,
            CliAudioFormat::Wav => AudioFormat::Wav,
            CliAudioFormat::Flac => AudioFormat::Flac,
            CliAudioFormat::Ogg => AudioFormat::Ogg,
            CliAudioFormat::Opus => AudioFormat::Opus,
            CliAudioFormat::M4a => AudioFormat::M4a,
            CliAudioFormat::Aac => AudioFormat::Aac,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for subslice
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// subslice - cut an audio track into one clip per subtitle cue
///
/// Reads an SRT file and the matching audio track, and writes `{id}.{format}`
/// plus `{id}.txt` for every cue into a new output directory.
#[derive(Parser, Debug)]
#[command(name = "subslice")]
#[command(version)]
#[command(about = "Slice audio into per-subtitle clips")]
#[command(long_about = "subslice cuts an audio track into one clip per subtitle cue, padding each clip
with half of the silence (capped) shared with its neighbours.

EXAMPLES:
    subslice -a talk.mp3 -s talk.srt -o clips            # Slice an mp3 using default config
    subslice -a talk.wav -s talk.srt -o clips -f wav     # Read and write wav
    subslice -a talk.mp3 -s talk.srt -o clips -j 4       # Encode four clips at a time
    subslice -a talk.mp3 -s talk.srt -o clips --terminators '.!?'
    subslice completions bash > subslice.bash            # Generate bash completions

CONFIGURATION:
    Settings are read from conf.json by default. You can specify a different
    file with --config-path. If the file does not exist, defaults are used.
    Command line options take precedence over the file.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Audio file to slice
    #[arg(short, long, value_name = "PATH")]
    audio_file_path: Option<PathBuf>,

    /// SRT subtitle file aligned with the audio
    #[arg(short, long, value_name = "PATH")]
    srt_file_path: Option<PathBuf>,

    /// Output directory, must not exist yet
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Audio format of the source and of the clips
    #[arg(short = 'f', long, value_enum)]
    audio_format: Option<CliAudioFormat>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Number of clips encoded concurrently
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Largest silence between cues shared as padding, in milliseconds
    #[arg(long)]
    max_gap_ms: Option<u64>,

    /// Characters that end a sentence, e.g. '.!?'
    #[arg(long)]
    terminators: Option<String>,

    /// Remove the output directory if slicing fails partway
    #[arg(long)]
    cleanup_on_failure: bool,
}

// @struct: Custom logger implementation, filtered by log::max_level()
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and tag for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "ERROR"),
            Level::Warn => ("1;33", "WARN "),
            Level::Info => ("1;32", "INFO "),
            Level::Debug => ("1;36", "DEBUG"),
            Level::Trace => ("1;35", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, tag) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", color, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // The level is updated after loading the config
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "subslice", &mut std::io::stdout());
        return Ok(());
    }

    if let Err(e) = run_slice(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run_slice(options: CommandLineOptions) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let job = SliceJob {
        audio_file: options.audio_file_path.clone()
            .ok_or_else(|| anyhow!("--audio-file-path is required"))?,
        subtitle_file: options.srt_file_path.clone()
            .ok_or_else(|| anyhow!("--srt-file-path is required"))?,
        output_dir: options.output_dir.clone()
            .ok_or_else(|| anyhow!("--output-dir is required"))?,
    };

    let config_path = &options.config_path;
    let mut config = if Path::new(config_path).exists() {
        Config::from_file(config_path)?
    } else {
        if config_path != "conf.json" {
            warn!("Config file not found at '{}', using defaults.", config_path);
        }
        Config::default()
    };

    config.apply_overrides(&ConfigOverrides {
        audio_format: options.audio_format.clone().map(Into::into),
        max_gap_ms: options.max_gap_ms,
        sentence_terminators: options.terminators.as_deref().map(|t| t.chars().collect()),
        concurrent_exports: options.jobs,
        cleanup_on_failure: options.cleanup_on_failure,
        log_level: options.log_level.clone().map(Into::into),
    });

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    let controller = Controller::with_config(config)?;
    let summary = controller.run(&job).await?;

    info!("Success: {} clip(s) in {}", summary.cues_exported, job.output_dir.display());

    Ok(())
}
