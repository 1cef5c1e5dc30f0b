// Binary entry point: interactive shell plus a few one-shot commands.
use anyhow::{Context, Result};
use chrono::Local;
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::rc::Rc;
use taskflow::cli;
use taskflow::config::Config;
use taskflow::context::{AppContext, SharedContext, StandardContext};
use taskflow::controller::TaskController;
use taskflow::model::SortStrategy;
use taskflow::reminder::{ReminderTracker, missed_reminders};
use taskflow::shell::{Shell, install_autosave};
use taskflow::storage::LocalStorage;

fn init_logging(ctx: &dyn AppContext, config: &Config) -> Result<()> {
    let path = ctx.get_log_file_path()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();
    WriteLogger::init(config.log_level_filter(), log_config, file)
        .context("Failed to initialise logging")?;
    Ok(())
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        cli::print_help("taskflow");
        return Ok(());
    }

    let mut override_root: Option<PathBuf> = None;
    let mut sort_override: Option<String> = None;
    let mut subcommand: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--root" | "-r" => {
                if i + 1 < args.len() {
                    override_root = Some(args[i + 1].clone().into());
                    i += 1;
                }
            }
            "--sort" | "-s" => {
                if i + 1 < args.len() {
                    sort_override = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            arg if !arg.starts_with('-') && subcommand.is_none() => {
                subcommand = Some(arg.to_string());
            }
            _ => { /* Ignore unknown flags */ }
        }
        i += 1;
    }

    let ctx: SharedContext = Rc::new(StandardContext::new(override_root));
    let mut config = match Config::load_or_default(ctx.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: {:#}. Using default settings.", e);
            Config::default()
        }
    };
    if let Some(name) = sort_override {
        config.default_sort = name
            .parse::<SortStrategy>()
            .map_err(|_| anyhow::anyhow!("Unknown sort order '{}'", name))?;
    }
    if let Err(e) = init_logging(ctx.as_ref(), &config) {
        eprintln!("Warning: {:#}", e);
    }
    log::info!("Starting taskflow v{}", env!("CARGO_PKG_VERSION"));

    match subcommand.as_deref() {
        Some("export") => {
            let tasks = LocalStorage::load(ctx.as_ref())?;
            println!("{}", LocalStorage::to_json(&tasks)?);
            Ok(())
        }
        Some("list") => {
            let controller = TaskController::from_storage(ctx.as_ref(), &config)?;
            for task in controller.store.query() {
                println!("{}", cli::format_task_line(&task.borrow()));
            }
            Ok(())
        }
        Some(other) => {
            cli::print_help("taskflow");
            Err(anyhow::anyhow!("Unknown command '{}'", other))
        }
        None => run_shell(ctx, config),
    }
}

fn run_shell(ctx: SharedContext, config: Config) -> Result<()> {
    let controller = TaskController::from_storage(ctx.as_ref(), &config)?;
    let now = Local::now().naive_local();

    let missed = missed_reminders(&controller.store, now);
    if !missed.is_empty() {
        println!("Missed reminders:");
        for reminder in &missed {
            println!("  {}", reminder.message());
        }
    }
    // Already reported above; the shell only announces new ones.
    let mut tracker = ReminderTracker::new();
    tracker.mark_all_seen(&controller.store, now);

    if config.autosave {
        install_autosave(&controller.store, ctx.clone());
    }

    let mut shell = Shell::new(controller.clone(), config.clone(), Some(ctx.clone()))
        .with_tracker(tracker);
    let stdin = std::io::stdin();
    shell.run(stdin.lock(), std::io::stdout())?;

    if !config.autosave {
        LocalStorage::save(ctx.as_ref(), &controller.store.snapshot_tasks())?;
    }
    log::info!("Exiting");
    Ok(())
}
