use anyhow::{Context, Result};
use colored::Colorize;
use pandemic_game::{Command, CommandOutcome, GameSession, GameStorage};
use std::io::{BufRead, Write};

use crate::render::render_session;

const HELP: &str = "\
commands:
  infect|i <location>          draw an infection card
  epidemic|shock|e <location>  resolve an epidemic on a discarded card
  quarantine|q <location>      place a quarantine
  unquarantine|uq <location>   lift a quarantine
  deal|d <location>            record a city card dealt to a player
  set <location> <level>       correct an infection level (0-3)
  rate <n>                     change the infection rate
  status|s [loc, loc...]       probabilities, most at risk first
  board|b                      redraw the striation board
  save                         write the game to disk
  quit|exit                    save and leave";

enum Meta {
    Help,
    Board,
    Save,
    Quit,
}

fn parse_meta(line: &str) -> Option<Meta> {
    match line.trim().to_lowercase().as_str() {
        "help" | "h" | "?" => Some(Meta::Help),
        "board" | "b" => Some(Meta::Board),
        "save" => Some(Meta::Save),
        "quit" | "exit" => Some(Meta::Quit),
        _ => None,
    }
}

/// Interactive command loop over one saved game. Every successful change is
/// saved straight away.
pub struct Repl<'a, S: GameStorage> {
    session: GameSession,
    storage: &'a S,
    save_name: String,
}

impl<'a, S: GameStorage> Repl<'a, S> {
    pub fn new(session: GameSession, storage: &'a S, save_name: impl Into<String>) -> Self {
        Self {
            session,
            storage,
            save_name: save_name.into(),
        }
    }

    #[cfg(test)]
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    fn save(&self) -> Result<()> {
        self.storage
            .save_session(&self.save_name, &self.session)
            .with_context(|| format!("saving {}", self.save_name))
    }

    /// Run one line. Returns `false` once the player asks to leave.
    pub fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> Result<bool> {
        if line.trim().is_empty() {
            return Ok(true);
        }
        if let Some(meta) = parse_meta(line) {
            match meta {
                Meta::Help => writeln!(out, "{HELP}")?,
                Meta::Board => writeln!(out, "{}", render_session(&self.session))?,
                Meta::Save => {
                    self.save()?;
                    writeln!(out, "Saved {}", self.save_name)?;
                }
                Meta::Quit => {
                    self.save()?;
                    return Ok(false);
                }
            }
            return Ok(true);
        }

        let result = Command::parse(line).and_then(|cmd| self.session.execute(cmd));
        match result {
            Ok(outcome) => {
                let mutated = !matches!(outcome, CommandOutcome::Status { .. });
                writeln!(out, "{outcome}")?;
                if mutated {
                    self.save()?;
                }
            }
            Err(err) => {
                log::debug!("command '{}' rejected: {err}", line.trim());
                writeln!(out, "{}", err.to_string().yellow())?;
            }
        }
        Ok(true)
    }

    /// # Errors
    ///
    /// Fails on I/O errors reading input, writing output or saving.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<()> {
        writeln!(out, "{}", render_session(&self.session))?;
        writeln!(out, "{}", "type 'help' for commands".dimmed())?;
        for line in input.lines() {
            let line = line.context("reading command")?;
            if !self.handle_line(&line, out)? {
                return Ok(());
            }
            out.flush()?;
        }
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileStorage;
    use pandemic_game::SessionConfig;
    use std::io::Cursor;

    fn storage(label: &str) -> FileStorage {
        FileStorage::new(std::env::temp_dir().join(format!(
            "pandemic-repl-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        )))
    }

    #[test]
    fn scripted_input_updates_and_saves() {
        colored::control::set_override(false);
        let storage = storage("script");
        let session = GameSession::with_default_catalog("script", SessionConfig::default()).unwrap();
        let mut repl = Repl::new(session, &storage, "script");
        let input = Cursor::new("infect lima\ninfect lima\nq tokyo\nfrobnicate\nquit\ninfect paris\n");
        let mut out = Vec::new();
        repl.run(input, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Infected Lima (level 1)"));
        assert!(text.contains("Lima has already been drawn from the infection deck"));
        assert!(text.contains("Quarantined Tokyo"));
        assert!(text.contains("unrecognized command frobnicate"));
        assert!(
            !repl.session().infection_deck().is_drawn("Paris"),
            "input after quit must be ignored"
        );

        let saved = storage.load_session("script").unwrap().unwrap();
        assert_eq!(&saved, repl.session());
        assert!(saved.location("Tokyo").unwrap().is_quarantined());
    }
}
