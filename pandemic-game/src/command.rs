//! The small text command surface front ends drive the session through.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::error::DeckError;
use crate::report::LocationReport;
use crate::session::{GameSession, InfectionOutcome, ShockOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "args", rename_all = "snake_case")]
pub enum Command {
    Infect(String),
    Shock(String),
    Quarantine(String),
    Unquarantine(String),
    Deal(String),
    SetLevel(String, u8),
    SetRate(u8),
    /// Empty means every location.
    Status(Vec<String>),
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unrecognized command {0}")]
    Unknown(String),
    #[error("{0} needs a location")]
    MissingLocation(&'static str),
    #[error("{verb} expects a number, got '{value}'")]
    InvalidNumber { verb: &'static str, value: String },
    #[error(transparent)]
    Deck(#[from] DeckError),
}

impl Command {
    /// Parse one line of player input. Location arguments may contain
    /// spaces; `status` takes a comma-separated list.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] describing what was wrong with the line.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let (verb, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(v, r)| (v, r.trim()));
        if verb.is_empty() {
            return Err(CommandError::Empty);
        }
        match verb.to_lowercase().as_str() {
            "infect" | "i" => location_arg("infect", rest).map(Self::Infect),
            "shock" | "epidemic" | "e" => location_arg("shock", rest).map(Self::Shock),
            "quarantine" | "q" => location_arg("quarantine", rest).map(Self::Quarantine),
            "unquarantine" | "uq" => location_arg("unquarantine", rest).map(Self::Unquarantine),
            "deal" | "d" => location_arg("deal", rest).map(Self::Deal),
            "set" => {
                let (name, level) = rest
                    .rsplit_once(char::is_whitespace)
                    .ok_or(CommandError::MissingLocation("set"))?;
                let name = location_arg("set", name)?;
                Ok(Self::SetLevel(name, number_arg("set", level)?))
            }
            "rate" => number_arg("rate", rest).map(Self::SetRate),
            "status" | "s" => Ok(Self::Status(
                rest.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn location_arg(verb: &'static str, rest: &str) -> Result<String, CommandError> {
    let name = rest.split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        return Err(CommandError::MissingLocation(verb));
    }
    Ok(name)
}

fn number_arg(verb: &'static str, value: &str) -> Result<u8, CommandError> {
    value.trim().parse().map_err(|_| CommandError::InvalidNumber {
        verb,
        value: value.trim().to_string(),
    })
}

/// What a successful command did. `Display` gives the console message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandOutcome {
    Infected {
        name: String,
        outcome: InfectionOutcome,
    },
    Shocked {
        name: String,
        outcome: ShockOutcome,
    },
    Quarantined { name: String },
    Unquarantined { name: String },
    Dealt { name: String },
    LevelSet { name: String, level: u8 },
    RateSet { rate: u8 },
    Status { reports: Vec<LocationReport> },
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Infected { name, outcome } => match outcome {
                InfectionOutcome::Absorbed => {
                    write!(f, "Infection of {name} absorbed by quarantine")
                }
                InfectionOutcome::Infected { level } => write!(f, "Infected {name} (level {level})"),
                InfectionOutcome::Outbreak => write!(f, "Outbreak in {name}!"),
            },
            Self::Shocked { name, outcome } => match outcome {
                ShockOutcome::Absorbed { restacked } => write!(
                    f,
                    "Epidemic in {name} absorbed by quarantine; {restacked} cards restacked"
                ),
                ShockOutcome::Escalated { restacked, .. } => {
                    write!(f, "Epidemic in {name}; {restacked} cards restacked")
                }
            },
            Self::Quarantined { name } => write!(f, "Quarantined {name}"),
            Self::Unquarantined { name } => write!(f, "Lifted quarantine on {name}"),
            Self::Dealt { name } => write!(f, "Dealt {name} from the city deck"),
            Self::LevelSet { name, level } => write!(f, "{name} set to level {level}"),
            Self::RateSet { rate } => write!(f, "Infection rate is now {rate}"),
            Self::Status { reports } => {
                for (idx, report) in reports.iter().enumerate() {
                    if idx > 0 {
                        writeln!(f)?;
                    }
                    write!(
                        f,
                        "{:<20} {:>5.2} level {}{}",
                        report.name,
                        report.probability,
                        report.infection_level,
                        if report.quarantined { " (quarantined)" } else { "" }
                    )?;
                }
                Ok(())
            }
        }
    }
}

impl GameSession {
    /// Run a parsed command. Location arguments resolve by exact name, then
    /// by case-insensitive prefix.
    ///
    /// # Errors
    ///
    /// Returns the failing operation's error; the session is unchanged.
    pub fn execute(&mut self, command: Command) -> Result<CommandOutcome, CommandError> {
        let outcome = match command {
            Command::Infect(query) => {
                let name = self.resolve_name(&query)?;
                let outcome = self.infect(&name)?;
                CommandOutcome::Infected { name, outcome }
            }
            Command::Shock(query) => {
                let name = self.resolve_name(&query)?;
                let outcome = self.cause_shock(&name)?;
                CommandOutcome::Shocked { name, outcome }
            }
            Command::Quarantine(query) => {
                let name = self.resolve_name(&query)?;
                self.quarantine(&name)?;
                CommandOutcome::Quarantined { name }
            }
            Command::Unquarantine(query) => {
                let name = self.resolve_name(&query)?;
                self.remove_quarantine(&name)?;
                CommandOutcome::Unquarantined { name }
            }
            Command::Deal(query) => {
                let name = self.resolve_name(&query)?;
                self.draw_city_card(&name)?;
                CommandOutcome::Dealt { name }
            }
            Command::SetLevel(query, level) => {
                let name = self.resolve_name(&query)?;
                self.set_infection_level(&name, level)?;
                CommandOutcome::LevelSet { name, level }
            }
            Command::SetRate(rate) => {
                self.set_infection_rate(rate)?;
                CommandOutcome::RateSet { rate }
            }
            Command::Status(queries) => {
                let reports = if queries.is_empty() {
                    self.report_all()
                } else {
                    let names = queries
                        .iter()
                        .map(|q| self.resolve_name(q))
                        .collect::<Result<Vec<_>, _>>()?;
                    self.report(&names)?
                };
                CommandOutcome::Status { reports }
            }
        };
        Ok(outcome)
    }

    fn resolve_name(&self, query: &str) -> Result<String, DeckError> {
        self.registry()
            .resolve(query)
            .map(|l| l.name().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;

    #[test]
    fn parse_recognises_aliases_and_multiword_names() {
        assert_eq!(
            Command::parse("i  new   york").unwrap(),
            Command::Infect("new york".into())
        );
        assert_eq!(
            Command::parse("epidemic Lima").unwrap(),
            Command::Shock("Lima".into())
        );
        assert_eq!(
            Command::parse("set Ho Chi Minh City 2").unwrap(),
            Command::SetLevel("Ho Chi Minh City".into(), 2)
        );
        assert_eq!(Command::parse("rate 3").unwrap(), Command::SetRate(3));
        assert_eq!(
            Command::parse("status tok, lim").unwrap(),
            Command::Status(vec!["tok".into(), "lim".into()])
        );
        assert_eq!(Command::parse("s").unwrap(), Command::Status(Vec::new()));
    }

    #[test]
    fn parse_reports_bad_input() {
        assert!(matches!(Command::parse("   "), Err(CommandError::Empty)));
        assert!(matches!(
            Command::parse("dance Lima"),
            Err(CommandError::Unknown(verb)) if verb == "dance"
        ));
        assert!(matches!(
            Command::parse("infect"),
            Err(CommandError::MissingLocation("infect"))
        ));
        assert!(matches!(
            Command::parse("rate lots"),
            Err(CommandError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn execute_resolves_prefixes() {
        let mut s = GameSession::with_default_catalog("cmd", SessionConfig::default()).unwrap();
        let outcome = s.execute(Command::parse("infect tok").unwrap()).unwrap();
        assert_eq!(outcome.to_string(), "Infected Tokyo (level 1)");
        let err = s.execute(Command::parse("infect sa").unwrap()).unwrap_err();
        assert!(err.to_string().contains("ambiguous"));
        let err = s.execute(Command::parse("infect tokyo").unwrap()).unwrap_err();
        assert!(matches!(err, CommandError::Deck(DeckError::DuplicateDraw { .. })));
    }

    #[test]
    fn status_lists_requested_locations() {
        let mut s = GameSession::with_default_catalog("cmd", SessionConfig::default()).unwrap();
        s.execute(Command::Quarantine("Lima".into())).unwrap();
        let outcome = s.execute(Command::parse("status lima, tokyo").unwrap()).unwrap();
        let text = outcome.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Lima"));
        assert!(lines[0].ends_with("(quarantined)"));
        assert!(lines[1].starts_with("Tokyo"));
    }
}
