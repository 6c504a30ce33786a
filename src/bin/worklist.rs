//! worklist CLI — work through a Postgres-hosted worklist from a terminal.

use std::io::{BufRead, Write};

use clap::{Parser, Subcommand, ValueEnum};
use secrecy::ExposeSecret;
use worklist_rs::config::Config;
use worklist_rs::engine::{ItemResult, SessionState, TraversalEngine};
use worklist_rs::model::mode::{protocolling_mode, reporting_mode, transcription_mode};
use worklist_rs::model::{Classifier, ItemRef, StepStatus, WorklistItem};
use worklist_rs::preferences::{FilePreferences, PreferenceStore};
use worklist_rs::source::pg::PgWorklistSource;
use worklist_rs::source::{WorklistContext, WorklistSource};
use worklist_rs::telemetry::{TelemetryConfig, init_telemetry};

#[derive(Parser)]
#[command(name = "worklist", about = "Continuous worklist traversal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Work through a worklist one item at a time
    Walk {
        /// Worklist to traverse
        worklist: String,
        /// Folder label shown in the status line
        #[arg(long)]
        folder: Option<String>,
        /// Which workflow decides the session mode
        #[arg(long, value_enum, default_value_t = Workflow::Reporting)]
        workflow: Workflow,
        /// Only items entered during downtime
        #[arg(long)]
        downtime: bool,
        /// Staff id used to claim items
        #[arg(long, default_value = "cli")]
        staff: String,
    },
    /// Show the approximate number of available items
    Count {
        worklist: String,
        #[arg(long)]
        downtime: bool,
    },
    /// Add an item to a worklist
    Add {
        worklist: String,
        /// Procedure step type (e.g. interpretation, verification)
        procedure_step: String,
        /// JSON attributes
        #[arg(long)]
        attributes: Option<String>,
        #[arg(long)]
        downtime: bool,
    },
    /// Show or change the auto-advance preference
    Prefs {
        #[arg(long)]
        auto_advance: Option<bool>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Workflow {
    Reporting,
    Transcription,
    Protocolling,
}

impl Workflow {
    fn classifier(self) -> Classifier {
        match self {
            Workflow::Reporting => reporting_mode,
            Workflow::Transcription => transcription_mode,
            Workflow::Protocolling => protocolling_mode,
        }
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    let runtime = tokio::runtime::Runtime::new()?;
    let _guard = {
        let _enter = runtime.enter();
        init_telemetry(TelemetryConfig {
            endpoint: config.otel_endpoint.clone(),
            service_name: "worklist".to_string(),
            log_level: config.log_level.clone(),
        })?
    };

    match cli.command {
        Command::Walk {
            worklist,
            folder,
            workflow,
            downtime,
            staff,
        } => {
            let source = connect(&config, &runtime)?;
            let folder = folder.unwrap_or_else(|| worklist.clone());
            let context = WorklistContext::new(folder, worklist).downtime_recovery(downtime);
            cmd_walk(&config, source, context, workflow, &staff)
        }
        Command::Count { worklist, downtime } => {
            let mut source = connect(&config, &runtime)?;
            let context = WorklistContext::new(&worklist, &worklist).downtime_recovery(downtime);
            println!("{}", source.count(&context)?);
            Ok(())
        }
        Command::Add {
            worklist,
            procedure_step,
            attributes,
            downtime,
        } => {
            let source = connect(&config, &runtime)?;
            let attributes: serde_json::Value = match attributes {
                Some(json) => serde_json::from_str(&json)?,
                None => serde_json::json!({}),
            };
            let item = WorklistItem::new(worklist, procedure_step)
                .status(StepStatus::Scheduled)
                .scheduled_at(chrono::Utc::now())
                .attributes(attributes);
            let item_ref = source.insert_item(&item, downtime)?;
            println!("Added: {item_ref} to {}", item.worklist);
            Ok(())
        }
        Command::Prefs { auto_advance } => cmd_prefs(&config, auto_advance),
    }
}

fn connect(
    config: &Config,
    runtime: &tokio::runtime::Runtime,
) -> anyhow::Result<PgWorklistSource> {
    let source = PgWorklistSource::connect(
        config.database_url.expose_secret(),
        runtime.handle().clone(),
    )?;
    source.migrate()?;
    Ok(source)
}

fn cmd_prefs(config: &Config, auto_advance: Option<bool>) -> anyhow::Result<()> {
    let mut prefs = FilePreferences::load(&config.preferences_path)?;
    if let Some(enabled) = auto_advance {
        prefs.set_auto_advance(enabled)?;
    }
    println!(
        "auto_advance = {} ({})",
        prefs.auto_advance(),
        prefs.path().display()
    );
    Ok(())
}

fn cmd_walk(
    config: &Config,
    source: PgWorklistSource,
    context: WorklistContext,
    workflow: Workflow,
    staff: &str,
) -> anyhow::Result<()> {
    let mut source = source;
    let first = source.stream(&context, 0, 1)?.into_iter().next();
    let Some(first) = first else {
        println!("Nothing to do in {}.", context.folder);
        return Ok(());
    };

    let prefs = FilePreferences::load(&config.preferences_path)?;
    let mut engine = TraversalEngine::new(
        source,
        Some(context),
        prefs,
        workflow.classifier(),
        config.prefetch_capacity,
    )?;
    engine.on_change(print_status);
    engine.initialize(Some(first))?;

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    let mut claimed: Option<ItemRef> = None;
    while engine.state() == SessionState::Active {
        let current_is_claimed = match (engine.current(), claimed) {
            (Some(item), Some(held)) => item.item_ref.same_entity(&held),
            _ => false,
        };
        if !current_is_claimed {
            claimed = claim_current(&mut engine, staff)?;
            if claimed.is_none() {
                break;
            }
        }

        print!("[c]omplete [s]kip [x] invalid [a]uto-advance [q]uit > ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };

        let outcome = match line?.trim() {
            "c" => complete_current(&mut engine),
            "s" if engine.can_skip() => skip_current(&mut engine),
            "s" => {
                println!("Skipping is off for this session.");
                Ok(())
            }
            "x" => engine.proceed_to_next(ItemResult::Invalid, false),
            "a" => {
                let enabled = !engine.auto_advance();
                engine.set_auto_advance(enabled).map(|()| {
                    println!("Auto-advance {}.", if enabled { "on" } else { "off" });
                })
            }
            "q" => {
                release_current(&engine)?;
                break;
            }
            other => {
                println!("Unknown command: {other}");
                Ok(())
            }
        };
        if let Err(e) = outcome {
            eprintln!("error: {e}");
            // A skip may have released the claim before failing; reclaiming
            // an item we already hold is harmless.
            claimed = None;
        }
    }

    println!(
        "Done. Completed {}, skipped {}.",
        engine.completed_count(),
        engine.skipped_count()
    );
    Ok(())
}

type Session = TraversalEngine<PgWorklistSource, FilePreferences>;

fn complete_current(engine: &mut Session) -> worklist_rs::error::Result<()> {
    if let Some(item) = engine.current() {
        engine.source().complete_item(&item.item_ref)?;
    }
    engine.proceed_to_next(ItemResult::Completed, false)
}

fn skip_current(engine: &mut Session) -> worklist_rs::error::Result<()> {
    release_current(engine)?;
    engine.proceed_to_next(ItemResult::Skipped, false)
}

/// Give the claim back when the session's mode asks for it.
fn release_current(engine: &Session) -> worklist_rs::error::Result<()> {
    match engine.current() {
        Some(item) if engine.should_unclaim() => engine.source().release_item(&item.item_ref),
        _ => Ok(()),
    }
}

/// Claim the current item, moving on if somebody else got to it first.
/// Returns the claimed reference, or `None` once the session runs out.
fn claim_current(engine: &mut Session, staff: &str) -> anyhow::Result<Option<ItemRef>> {
    while let Some(item) = engine.current() {
        let item_ref = item.item_ref;
        if engine.source().claim_item(&item_ref, staff)? {
            return Ok(Some(item_ref));
        }
        println!("{item_ref} was claimed elsewhere, moving on.");
        engine.proceed_to_next(ItemResult::Invalid, false)?;
    }
    Ok(None)
}

fn print_status(engine: &Session) {
    if engine.status_text_visible() {
        println!("{}", engine.status_text());
    }
    match engine.current() {
        Some(item) => println!(
            "Current: {} {} ({})",
            item.item_ref, item.procedure_step, item.status
        ),
        None => println!("No more items."),
    }
}
