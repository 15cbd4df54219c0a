use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tabmind_core::config::{ConfigLoader, TabmindConfig};
use tabmind_core::core_types::UserInput;
use tabmind_core::errors::AssistantError;
use tabmind_core::sink::TurnState;
use tabmind_core::Session;
use tokio::io::{AsyncBufReadExt, BufReader};

mod terminal;

use terminal::{print_revealed, TerminalSink};

const DEFAULT_CONFIG: &str = "tabmind.yaml";
const LOG_LEVEL_ENV: &str = "TABMIND_LOG_LEVEL";

#[derive(Parser, Debug)]
#[clap(name = "tabmind", author, version, about = "New-tab assistant in the terminal")]
struct Cli {
    #[clap(
        long,
        short,
        help = "Configuration file (defaults to ./tabmind.yaml, then the user config directory)"
    )]
    config: Option<PathBuf>,

    #[clap(long, short, help = "Log level; overrides logging.level from the config")]
    log_level: Option<String>,

    #[clap(long, help = "Answer a single question, print the reply and exit")]
    task: Option<String>,

    #[clap(long, help = "Print replies at once instead of revealing them")]
    no_reveal: bool,

    #[clap(long, default_value_t = 12, help = "Milliseconds per revealed character")]
    reveal_ms: u64,

    #[clap(long, default_value = "tabmind.log", help = "File that receives log output")]
    log_file: PathBuf,
}

fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    let local = PathBuf::from(DEFAULT_CONFIG);
    if local.exists() {
        return local;
    }
    dirs::config_dir()
        .map(|dir| dir.join("tabmind").join(DEFAULT_CONFIG))
        .filter(|path| path.exists())
        .unwrap_or(local)
}

/// The logger itself passes every record; `log::set_max_level` decides what
/// is emitted, so the level can change once the config is read.
fn init_logging(level: LevelFilter, log_file: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;

    env_logger::Builder::new()
        .filter_level(LevelFilter::Trace)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    log::set_max_level(level);
    Ok(())
}

fn parse_level(level: &str) -> LevelFilter {
    level.parse().unwrap_or(LevelFilter::Info)
}

/// Level used while the config is still being loaded.
fn startup_level(cli_level: Option<&str>, env_level: Option<String>) -> LevelFilter {
    match (cli_level, env_level) {
        (Some(level), _) => parse_level(level),
        (None, Some(level)) => parse_level(&level),
        (None, None) => LevelFilter::Info,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let early_level = startup_level(cli.log_level.as_deref(), std::env::var(LOG_LEVEL_ENV).ok());
    init_logging(early_level, &cli.log_file)?;

    let config_path = resolve_config_path(cli.config.clone());
    let config: TabmindConfig = if cli.config.is_some() {
        ConfigLoader::from_file(&config_path).await?
    } else {
        ConfigLoader::from_file_or_default(&config_path).await?
    };

    if cli.log_level.is_none() {
        log::set_max_level(parse_level(&config.logging.level));
    }
    log::info!("Configuration loaded from {}", config_path.display());

    let session = Session::from_config(&config).context("Failed to set up the assistant")?;
    let interval = if cli.no_reveal {
        Duration::ZERO
    } else {
        Duration::from_millis(cli.reveal_ms)
    };

    match cli.task {
        Some(task) => run_task(&session, task).await,
        None => run_interactive(&session, &config, interval).await,
    }
}

async fn run_task(session: &Session, task: String) -> Result<()> {
    log::info!("Executing task: {}", task);
    let mut sink = TerminalSink::new();
    let outcome = session.submit(UserInput::new(task), &mut sink).await?;
    println!("{}", outcome.content);

    if let TurnState::Aborted(reason) = outcome.state {
        anyhow::bail!("Task failed: {}", reason);
    }
    Ok(())
}

async fn run_interactive(session: &Session, config: &TabmindConfig, interval: Duration) -> Result<()> {
    println!("{}", config.assistant.greeting);
    println!("(type /new to start over, /quit to exit)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("> ");
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/new" => {
                match session.new_session() {
                    Ok(()) => println!("{}", config.assistant.greeting),
                    Err(AssistantError::TurnInProgress) => eprintln!("A reply is still being written."),
                    Err(e) => return Err(e.into()),
                }
                continue;
            }
            _ => {}
        }

        let mut sink = TerminalSink::new();
        match session.submit(UserInput::new(line), &mut sink).await {
            Ok(outcome) => print_revealed(&outcome.content, interval).await?,
            Err(AssistantError::TurnInProgress) => eprintln!("A reply is still being written."),
            Err(e) => return Err(e.into()),
        }
    }

    log::info!("Session closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_level_prefers_flag_then_env() {
        assert_eq!(startup_level(Some("debug"), Some("error".to_string())), LevelFilter::Debug);
        assert_eq!(startup_level(None, Some("warn".to_string())), LevelFilter::Warn);
        assert_eq!(startup_level(None, None), LevelFilter::Info);
        assert_eq!(startup_level(Some("loud"), None), LevelFilter::Info);
    }

    #[tokio::test]
    async fn test_missing_config_warning_is_emitted_after_logger_setup() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("tabmind.log");
        init_logging(LevelFilter::Warn, &log_path).unwrap();

        let missing = dir.path().join("absent.yaml");
        ConfigLoader::from_file_or_default(&missing).await.unwrap();
        log::logger().flush();

        let logged = std::fs::read_to_string(&log_path).unwrap();
        assert!(logged.contains("absent.yaml"), "log was: {}", logged);
    }
}
