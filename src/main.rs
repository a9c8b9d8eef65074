use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use sowcrew::api::{serve, AppState};
use sowcrew::config::DEFAULT_CONFIG_FILE;
use sowcrew::definitions::{write_default_team, TeamRegistry};
use sowcrew::document::{DocumentExtractor, ExtensionExtractor};
use sowcrew::engine::{
    AnalysisReport, AssignmentCoordinator, ExecutorConfig, LlmTaskExecutor, RunContext,
    SowAnalyzer,
};
use sowcrew::providers::{build_llm_provider, ProviderPurpose};
use sowcrew::review::{confirm, format_agent_details, format_task_distribution};
use sowcrew::storage::{load_task_set, save_run_record, save_task_set, InMemoryRunStore};
use sowcrew::{Config, SowError, TaskSet, TeamMember};

#[derive(Parser)]
#[command(name = "sowcrew")]
#[command(about = "Turn a Statement of Work into per-role tasks and run them through an agent crew", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (defaults to ./sowcrew.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the config, docs and logs directories and a sample team file
    Init,
    /// Generate the task distribution for a SOW document
    Analyze {
        #[arg(help = "SOW document path")]
        document: PathBuf,
        /// Save the task distribution as JSON
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Analyze a SOW, review the tasks, then execute them
    Run {
        #[arg(help = "SOW document path")]
        document: PathBuf,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
        /// Where to write the result record
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Execute a previously saved task distribution
    Execute {
        #[arg(long)]
        tasks: PathBuf,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Serve the HTTP API
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        match e.downcast_ref::<SowError>() {
            Some(err) => eprintln!("Error: {}", err.display_with_hint()),
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Init => init(&config)?,
        Commands::Analyze { document, output } => {
            let mut team = load_team(&config)?;
            let report = analyze(&config, &mut team, &document).await?;
            println!("{}", format_task_distribution(&report.tasks));
            if let Some(path) = output {
                save_task_set(&path, &report.tasks).await?;
                println!("Task distribution saved to {}", path.display());
            }
        }
        Commands::Run {
            document,
            yes,
            output,
        } => {
            let mut team = load_team(&config)?;
            let report = analyze(&config, &mut team, &document).await?;
            println!("{}", format_task_distribution(&report.tasks));

            let proceed = yes || {
                let stdin = std::io::stdin();
                confirm(&mut stdin.lock(), &mut std::io::stdout(), "Proceed with task execution?")?
            };
            if !proceed {
                println!("Execution cancelled. Review the SOW or team configuration and try again.");
                return Ok(());
            }
            execute(&config, team.members(), &report.tasks, output).await?;
        }
        Commands::Execute { tasks, output } => {
            let mut team = load_team(&config)?;
            let tasks = load_task_set(&tasks).await?.aligned_to(team.members());
            team.attach_tasks(&tasks);
            println!("{}", format_task_distribution(&tasks));
            execute(&config, team.members(), &tasks, output).await?;
        }
        Commands::Serve { port } => {
            let team = load_team(&config)?;
            let port = port.unwrap_or(config.server.port);
            let execution = build_llm_provider(&config, ProviderPurpose::Execution)?;
            let state = AppState {
                generation: build_llm_provider(&config, ProviderPurpose::Generation)?,
                executor: Arc::new(LlmTaskExecutor::new(
                    execution,
                    ExecutorConfig::from_limits(config.execution),
                )),
                team: Arc::new(team),
                store: Arc::new(InMemoryRunStore::with_limit(config.server.max_runs)),
                extractor: Arc::new(ExtensionExtractor),
                config: Arc::new(config),
            };
            serve(state, port).await?;
        }
    }

    Ok(())
}

fn init(config: &Config) -> Result<()> {
    for dir in [&config.paths.docs_dir, &config.paths.logs_dir] {
        std::fs::create_dir_all(dir)?;
    }

    if write_default_team(&config.paths.team_file)? {
        println!("Created sample team file at {}", config.paths.team_file.display());
    } else {
        println!("Team file already exists at {}", config.paths.team_file.display());
    }

    let config_path = Path::new(DEFAULT_CONFIG_FILE);
    if !config_path.exists() {
        std::fs::write(config_path, toml::to_string_pretty(config)?)?;
        println!("Created {}", config_path.display());
    }

    println!("Place SOW documents in {}", config.paths.docs_dir.display());
    Ok(())
}

fn load_team(config: &Config) -> Result<TeamRegistry> {
    Ok(TeamRegistry::load(&config.paths.team_file)?)
}

/// Falls back to the docs directory for bare file names.
fn resolve_document(config: &Config, document: &Path) -> PathBuf {
    if document.exists() {
        return document.to_path_buf();
    }
    let in_docs = config.paths.docs_dir.join(document);
    if in_docs.exists() {
        in_docs
    } else {
        document.to_path_buf()
    }
}

/// Analyzes the document and attaches the generated tasks to the team.
async fn analyze(config: &Config, team: &mut TeamRegistry, document: &Path) -> Result<AnalysisReport> {
    let path = resolve_document(config, document);
    let text = ExtensionExtractor.extract(&path).await?;

    let provider = build_llm_provider(config, ProviderPurpose::Generation)?;
    let analyzer = SowAnalyzer::from_config(config, provider)?;
    let context = RunContext::new(team.roles());

    let report = analyzer.analyze(&text, team.members(), &context).await?;
    for failure in &report.failures {
        log::warn!("Chunk {} was skipped: {}", failure.chunk, failure.error);
    }
    team.attach_tasks(&report.tasks);
    Ok(report)
}

async fn execute(
    config: &Config,
    members: &[TeamMember],
    tasks: &TaskSet,
    output: Option<PathBuf>,
) -> Result<()> {
    let provider = build_llm_provider(config, ProviderPurpose::Execution)?;
    let executor = LlmTaskExecutor::new(provider, ExecutorConfig::from_limits(config.execution));
    let context = RunContext::new(members.iter().map(|m| m.role.clone()));

    let record = AssignmentCoordinator::run_team(members, tasks, &executor, &context).await?;

    println!("{}", format_agent_details(&record));
    println!("Execution Result:\n{}", record.execution_result);

    let path = output.unwrap_or_else(|| config.paths.output_file.clone());
    save_run_record(&path, &record).await?;
    println!("\nResults saved to {}", path.display());
    Ok(())
}
