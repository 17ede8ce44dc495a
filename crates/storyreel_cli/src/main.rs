use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use storyreel_core::config::ConfigManager;
use storyreel_core::logging::{init_tracing, LogConfig, LogLevel, RunLoggerBuilder};
use storyreel_core::models::{Brief, Stage};
use storyreel_core::orchestrator::{
    create_standard_controller, Context, PipelineError, RunState, RunStore,
};

mod services;

fn main() -> anyhow::Result<()> {
    init_tracing(LogLevel::Info);

    let cli = Cli::parse();
    let config = ConfigManager::new(&cli.config);

    match cli.command {
        Commands::Run { brief, run_id } => {
            let run_id = run_id.unwrap_or_else(generate_run_id);
            cmd_run(config, &brief, &run_id)
        }
        Commands::Resume { run_id, brief } => cmd_resume(config, &run_id, &brief),
        Commands::Status { run_id } => cmd_status(config, &run_id),
        Commands::InitConfig { force } => cmd_init_config(config, force),
    }
}

fn cmd_run(mut config: ConfigManager, brief_path: &Path, run_id: &str) -> anyhow::Result<()> {
    config.load_or_create().context("loading configuration")?;
    config.ensure_dirs_exist().context("creating output directories")?;

    let brief = load_brief(brief_path)?;
    execute_run(&config, brief, run_id)
}

fn cmd_resume(mut config: ConfigManager, run_id: &str, brief_path: &Path) -> anyhow::Result<()> {
    config.load_or_create().context("loading configuration")?;
    config.ensure_dirs_exist().context("creating output directories")?;

    let run_dir = config.output_dir().join(run_id);
    if !RunStore::new(&run_dir).exists() {
        anyhow::bail!("No persisted state found for run '{run_id}'");
    }

    let brief = load_brief(brief_path)?;
    execute_run(&config, brief, run_id)
}

/// Wire up a run and drive it to completion.
///
/// Completed stages recorded in the run's `run.json` are skipped, so a
/// fresh run and a resumed one go through the same path.
fn execute_run(config: &ConfigManager, brief: Brief, run_id: &str) -> anyhow::Result<()> {
    validate_brief(&brief, run_id)?;

    let settings = config.settings().clone();
    let run_dir = config.output_dir().join(run_id);

    let logger = RunLoggerBuilder::new(run_id, &run_dir)
        .config(LogConfig::from_settings(&settings.logging))
        .callback(Box::new(|line| println!("{line}")))
        .build()
        .context("creating run logger")?;

    let services = services::local_services(&brief, &settings)?;
    let ctx = Context::new(brief, settings, run_id, run_dir.clone(), Arc::new(logger), services)
        .with_progress_callback(Box::new(|stage, percent, message| {
            tracing::debug!(stage, percent, "{message}");
        }));

    let store = RunStore::new(&run_dir);
    let controller = create_standard_controller();

    let mut state = RunState::default();
    let run = controller.run(&ctx, &mut state, &store)?;

    if let Some(video) = run.asset("video") {
        println!("Video: {}", video.display());
    }
    Ok(())
}

fn cmd_status(mut config: ConfigManager, run_id: &str) -> anyhow::Result<()> {
    // Default settings are fine when no config file exists yet.
    if config.path().exists() {
        config.load().context("loading configuration")?;
    }

    let run_dir = config.output_dir().join(run_id);
    let run = RunStore::new(&run_dir)
        .load()
        .with_context(|| format!("no persisted state for run '{run_id}'"))?;

    println!("Run:     {}", run.run_id);
    println!("Created: {}", run.created_at);
    match run.next_stage() {
        Some(stage) => println!("Next:    {stage}"),
        None => println!("Next:    (all stages done)"),
    }
    println!();
    for stage in Stage::all() {
        println!("  {:<10} {}", stage.name(), run.status(*stage));
    }
    if let Some(error) = &run.last_error {
        println!();
        println!("Last error: {error}");
    }
    if let Some(video) = run.asset("video") {
        println!();
        println!("Video: {}", video.display());
    }
    Ok(())
}

fn cmd_init_config(config: ConfigManager, force: bool) -> anyhow::Result<()> {
    if config.path().exists() && !force {
        anyhow::bail!(
            "{} already exists (pass --force to overwrite)",
            config.path().display()
        );
    }
    config.save().context("writing configuration file")?;
    println!("Wrote {}", config.path().display());
    Ok(())
}

/// Load a brief from TOML or JSON, chosen by file extension.
fn load_brief(path: &Path) -> anyhow::Result<Brief> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading brief {}", path.display()))?;

    let mut brief: Brief = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?,
        _ => toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?,
    };

    // Source hints and the music path are written relative to the brief file.
    if let Some(base) = path.parent() {
        resolve_brief_paths(&mut brief, base);
    }
    Ok(brief)
}

fn resolve_brief_paths(brief: &mut Brief, base: &Path) {
    for source in brief.sources.values_mut() {
        if source.is_relative() {
            *source = base.join(&*source);
        }
    }
    if let Some(music) = &mut brief.music {
        if music.path.is_relative() {
            music.path = base.join(&music.path);
        }
    }
}

/// The local collaborators read their inputs from source hints, so a run
/// cannot start without them. Checked up front rather than failing three
/// stages in.
fn validate_brief(brief: &Brief, run_id: &str) -> Result<(), PipelineError> {
    for hint in ["script", "narration", "words"] {
        let path = brief.source(hint).ok_or_else(|| {
            PipelineError::validation_failed(
                run_id,
                format!("Brief is missing the '{hint}' source hint"),
            )
        })?;
        if !path.exists() {
            return Err(PipelineError::validation_failed(
                run_id,
                format!("Source '{}' does not exist: {}", hint, path.display()),
            ));
        }
    }
    Ok(())
}

fn generate_run_id() -> String {
    format!("run_{}", chrono::Local::now().format("%Y%m%d_%H%M%S"))
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Turn a narrated brief into a captioned video", long_about = None)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, default_value = ".config/storyreel.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full pipeline for a brief.
    Run {
        /// Path to the brief file (TOML, or JSON with a .json extension).
        brief: PathBuf,
        /// Run identifier; defaults to a timestamped one.
        #[arg(long)]
        run_id: Option<String>,
    },
    /// Pick an interrupted run back up, skipping completed stages.
    Resume {
        /// Identifier of the run to resume.
        run_id: String,
        /// Path to the brief file the run was started with.
        brief: PathBuf,
    },
    /// Show the persisted state of a run.
    Status {
        /// Identifier of the run to inspect.
        run_id: String,
    },
    /// Write a commented default configuration file.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}
