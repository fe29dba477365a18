mod logic;
mod render;
mod repl;
mod storage;
mod util;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdin, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use logic::reports::{generate_console_report, generate_json_report};
use logic::{SimulationConfig, run_simulation};
use pandemic_game::{Command, CommandOutcome, GameSession, SessionConfig, TrackerEngine};
use repl::Repl;
use storage::{CatalogSource, FileStorage};
use util::parse_seeds;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "pandemic", version)]
#[command(about = "Track the infection deck of a cooperative outbreak board game")]
struct Args {
    /// Directory holding saved games
    #[arg(long, global = true, default_value = "saves")]
    saves: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Action,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Start a new game and save it
    New {
        name: String,
        /// Location catalog JSON; the bundled world map when omitted
        #[arg(long)]
        catalog: Option<PathBuf>,
        #[arg(long)]
        shock_markers: Option<u8>,
        #[arg(long)]
        infection_rate: Option<u8>,
        /// Replace an existing save with the same name
        #[arg(long)]
        force: bool,
    },
    /// Interactive prompt over a saved game
    Play { name: String },
    /// Print the board of a saved game
    Show {
        name: String,
        /// Print the raw snapshot instead of the board
        #[arg(long)]
        json: bool,
    },
    /// Run a single command against a saved game, e.g. `exec mygame infect tokyo`
    Exec {
        name: String,
        #[arg(required = true, trailing_var_arg = true)]
        command: Vec<String>,
    },
    /// Delete a saved game
    Delete { name: String },
    /// Play seeded random games and check every invariant
    Simulate {
        /// Seeds to run (comma-separated)
        #[arg(long, default_value = "1337")]
        seeds: String,
        #[arg(long, default_value_t = 200)]
        steps: usize,
        #[arg(long)]
        shock_markers: Option<u8>,
        #[arg(long)]
        infection_rate: Option<u8>,
        /// Output report format
        #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
        report: ReportFormat,
        /// Optional path to write the report output instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let storage = FileStorage::new(&args.saves);
    match args.command {
        Action::New {
            name,
            catalog,
            shock_markers,
            infection_rate,
            force,
        } => {
            let engine = engine(&storage, catalog.as_deref());
            if !force {
                match engine.load_session(&name) {
                    Ok(None) => {}
                    Ok(Some(_)) => bail!(
                        "a saved game named {name} already exists (use --force to replace it)"
                    ),
                    Err(err) => bail!(
                        "a saved game named {name} exists but cannot be loaded: {err:#} \
                         (use --force to replace it)"
                    ),
                }
            }
            let config = session_config(shock_markers, infection_rate);
            let session = engine.create_session(&name, config)?;
            engine.save_session(&name, &session)?;
            println!("{}", render::render_session(&session));
        }
        Action::Play { name } => {
            announce_banner();
            let session = load(&storage, &name)?;
            let mut repl = Repl::new(session, &storage, &name);
            let mut out = stdout();
            repl.run(stdin().lock(), &mut out)?;
        }
        Action::Show { name, json } => {
            let session = load(&storage, &name)?;
            if json {
                println!("{}", session.to_json()?);
            } else {
                println!("{}", render::render_session(&session));
            }
        }
        Action::Exec { name, command } => {
            let mut session = load(&storage, &name)?;
            let line = command.join(" ");
            let parsed = Command::parse(&line)?;
            let outcome = session
                .execute(parsed)
                .with_context(|| format!("running '{line}' on {name}"))?;
            println!("{outcome}");
            if !matches!(outcome, CommandOutcome::Status { .. }) {
                engine(&storage, None).save_session(&name, &session)?;
            }
        }
        Action::Delete { name } => {
            engine(&storage, None).delete_session(&name)?;
            println!("Deleted {name}");
        }
        Action::Simulate {
            seeds,
            steps,
            shock_markers,
            infection_rate,
            report,
            output,
        } => {
            announce_banner();
            let config = session_config(shock_markers, infection_rate);
            let passed = simulate(&parse_seeds(&seeds)?, steps, config, report, output)?;
            if !passed {
                std::process::exit(1);
            }
        }
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn announce_banner() {
    println!("{}", "🦠 Pandemic Infection Tracker".bright_cyan().bold());
    println!("{}", "=============================".cyan());
}

fn session_config(shock_markers: Option<u8>, infection_rate: Option<u8>) -> SessionConfig {
    let mut config = SessionConfig::default();
    if let Some(markers) = shock_markers {
        config = config.with_shock_markers(markers);
    }
    if let Some(rate) = infection_rate {
        config = config.with_infection_rate(rate);
    }
    config
}

fn engine(
    storage: &FileStorage,
    catalog: Option<&Path>,
) -> TrackerEngine<CatalogSource, FileStorage> {
    TrackerEngine::new(CatalogSource::from_arg(catalog), storage.clone())
}

fn load(storage: &FileStorage, name: &str) -> Result<GameSession> {
    engine(storage, None)
        .load_session(name)?
        .ok_or_else(|| anyhow!("no saved game named {name}"))
}

fn simulate(
    seeds: &[u64],
    steps: usize,
    session: SessionConfig,
    report: ReportFormat,
    output: Option<PathBuf>,
) -> Result<bool> {
    if seeds.is_empty() {
        bail!("no seeds given");
    }
    let start_time = Instant::now();
    let results = seeds
        .iter()
        .map(|&seed| {
            run_simulation(
                &SimulationConfig::new(seed)
                    .with_steps(steps)
                    .with_session(session),
            )
        })
        .collect::<Result<Vec<_>>>()?;

    let mut output_target = OutputTarget::new(output)?;
    match report {
        ReportFormat::Console => {
            generate_console_report(&mut output_target, &results, start_time.elapsed())?;
        }
        ReportFormat::Json => generate_json_report(&mut output_target, &results)?,
    }
    output_target.flush_inner()?;
    Ok(results.iter().all(|r| r.passed))
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_parse_exec_with_multiword_command() {
        let args =
            Args::try_parse_from(["pandemic", "exec", "game", "infect", "new", "york"]).unwrap();
        match args.command {
            Action::Exec { name, command } => {
                assert_eq!(name, "game");
                assert_eq!(command.join(" "), "infect new york");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn session_config_applies_overrides() {
        let config = session_config(Some(6), None);
        assert_eq!(config.shock_markers, 6);
        assert_eq!(config.infection_rate, SessionConfig::default().infection_rate);
    }

    #[test]
    fn simulate_writes_json_to_file() {
        let path = std::env::temp_dir().join(format!(
            "pandemic-main-sim-{}.json",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        let passed = simulate(
            &[3, 4],
            30,
            SessionConfig::default(),
            ReportFormat::Json,
            Some(path.clone()),
        )
        .unwrap();
        assert!(passed);
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
    }
}
