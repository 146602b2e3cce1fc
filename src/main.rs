use clap::{Parser, Subcommand};
use pitch2midi::features::{discover_feature_files, recording_name};
use pitch2midi::{validate_input, Config, PitchToMidi};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Pitch-to-MIDI Transcription System
#[derive(Parser)]
#[command(name = "pitch2midi")]
#[command(about = "Convert monophonic pitch tracks into MIDI note events")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transcribe a feature file, or every features.json below a directory
    Analyze {
        /// Feature file (JSON) or directory of recordings
        input: PathBuf,

        /// Output directory for results (default: next to each feature file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Custom configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write QA plots
        #[arg(long)]
        qa: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Quiet output
        #[arg(short, long)]
        quiet: bool,
    },
    /// Validate configuration file
    ValidateConfig {
        /// Configuration file to validate
        config: PathBuf,
    },
    /// Show default configuration
    ShowConfig,
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        log::LevelFilter::Warn
    } else if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_target(false)
        .init();
}

/// Where results for one feature file go
fn output_dir_for(input: &Path, output: Option<&Path>, batch: bool) -> PathBuf {
    match output {
        Some(dir) if batch => dir.join(recording_name(input)),
        Some(dir) => dir.to_path_buf(),
        None => input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    }
}

/// Output directories for a batch. Recordings whose directories share a
/// name get a numeric suffix instead of overwriting each other.
fn plan_output_dirs(inputs: &[PathBuf], output: Option<&Path>, batch: bool) -> Vec<PathBuf> {
    let mut used = HashSet::new();
    inputs
        .iter()
        .map(|input| {
            let dir = output_dir_for(input, output, batch);
            if used.insert(dir.clone()) {
                return dir;
            }

            let name = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let mut suffix = 2;
            let mut candidate = dir.with_file_name(format!("{}_{}", name, suffix));
            while !used.insert(candidate.clone()) {
                suffix += 1;
                candidate = dir.with_file_name(format!("{}_{}", name, suffix));
            }
            log::warn!(
                "Output directory {} already used, writing {} to {}",
                dir.display(),
                input.display(),
                candidate.display()
            );
            candidate
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            output,
            config,
            qa,
            verbose,
            quiet,
        } => {
            if verbose && quiet {
                anyhow::bail!("Cannot specify both --verbose and --quiet");
            }
            init_logging(verbose, quiet);

            // Load configuration
            let mut config = if let Some(config_path) = config {
                pitch2midi::config::load_config(config_path)?
            } else {
                Config::default()
            };
            config.qa.generate_plots |= qa;

            let batch = input.is_dir();
            let inputs = if batch {
                discover_feature_files(&input)?
            } else {
                vec![input.clone()]
            };
            if inputs.is_empty() {
                anyhow::bail!("No feature files found under {}", input.display());
            }

            let processor = PitchToMidi::new(config);

            let out_dirs = plan_output_dirs(&inputs, output.as_deref(), batch);

            for (path, out_dir) in inputs.iter().zip(&out_dirs) {
                log::info!("Processing {}", path.display());

                // Validate input
                validate_input(path, processor.config())?;

                let midi_path = processor.process(path, out_dir)?;

                log::info!("MIDI file saved to {}", midi_path.display());
            }
        }
        Commands::ValidateConfig { config } => {
            let config = pitch2midi::config::load_config(config)?;
            println!("Configuration is valid");
            if let Ok(json) = serde_json::to_string_pretty(&config) {
                println!("{}", json);
            }
        }
        Commands::ShowConfig => {
            let config = Config::default();
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
    }

    Ok(())
}
