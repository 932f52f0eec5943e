// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info};
use std::io::Write;
use std::path::PathBuf;

use gstl::app_config::{Config, LogLevel};
use gstl::app_controller::Controller;
use gstl::providers::ProviderKind;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split the input file into safe, review and skipped tiers
    Classify(CommonArgs),

    /// Translate pending records, resuming from the checkpoint if present
    Translate(TranslateArgs),

    /// Merge translated records back into the original dataset
    Merge(MergeArgs),

    /// Generate shell completions for gstl
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
struct CommonArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Input dataset (JSON array of records)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Source language code or name (e.g. 'en', 'English')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code or name (e.g. 'vi', 'Vietnamese')
    #[arg(short, long)]
    target_language: Option<String>,
}

#[derive(Args, Debug)]
struct TranslateArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Translated dataset path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<ProviderKind>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// API keys, one worker per key
    #[arg(long, env = "GSTL_API_KEYS", value_delimiter = ',', hide_env_values = true)]
    api_keys: Vec<String>,
}

#[derive(Args, Debug)]
struct MergeArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Translated file to merge into the original
    #[arg(long)]
    translated: Option<PathBuf>,

    /// Merged dataset path
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// GSTL - Game String Table Localizer
///
/// Classifies, protects and batch-translates the strings of a game's string
/// table using one AI worker per API key.
#[derive(Parser, Debug)]
#[command(name = "gstl")]
#[command(version)]
#[command(about = "AI-powered game string table translation tool")]
#[command(long_about = "GSTL classifies string table records, translates the safe ones with AI providers and merges them back.

EXAMPLES:
    gstl classify -i strings.json                  # Write the three classification tiers
    gstl translate -t vi                           # Translate into Vietnamese with conf.json
    GSTL_API_KEYS=k1,k2 gstl translate             # Two workers, one per key
    gstl translate -p openai -m gpt-4o-mini        # Use a specific provider and model
    gstl merge --translated out.json -o final.json # Merge translations into the original
    gstl completions bash > gstl.bash              # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

INTERRUPTING:
    Ctrl+C during translation saves a checkpoint. Running translate again resumes it.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI colour prefix for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let emoji = Self::get_emoji_for_level(record.level());
            let color = Self::get_color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", color, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the max level filters
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    // Parse command line arguments using clap
    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "gstl", &mut std::io::stdout());
            Ok(())
        }
        Commands::Classify(args) => {
            let config = load_config(&args)?;
            let controller = Controller::with_config(config)?;
            controller.classify()?;
            Ok(())
        }
        Commands::Translate(args) => {
            let mut config = load_config(&args.common)?;
            apply_translate_overrides(&mut config, &args);
            let controller = Controller::with_config(config)?;
            controller.translate().await?;
            Ok(())
        }
        Commands::Merge(args) => {
            let mut config = load_config(&args.common)?;
            if let Some(translated) = &args.translated {
                config.merge.translated_file = translated.clone();
            }
            if let Some(output) = &args.output {
                config.merge.final_output_file = output.clone();
            }
            let controller = Controller::with_config(config)?;
            let report = controller.merge()?;
            info!(
                "Merged {} of {} records into {:?}",
                report.updated_records,
                report.total_records,
                controller.final_output_path()
            );
            Ok(())
        }
    }
}

/// Load or create configuration and apply the shared CLI overrides
fn load_config(options: &CommonArgs) -> Result<Config> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let level: LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(&options.config_path)?;

    if let Some(input) = &options.input {
        config.input_file = input.clone();
        config.merge.original_file = input.clone();
    }
    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    // Validate the configuration after loading and overriding
    config.validate().context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    Ok(config)
}

fn apply_translate_overrides(config: &mut Config, args: &TranslateArgs) {
    if let Some(output) = &args.output {
        config.output_file = output.clone();
    }
    if let Some(provider) = args.provider {
        config.translation.provider = provider;
    }
    if let Some(model) = &args.model {
        config.translation.model = model.clone();
    }
    if !args.api_keys.is_empty() {
        config.translation.api_keys = args.api_keys.clone();
    }
}
