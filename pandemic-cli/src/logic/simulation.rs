use std::collections::HashSet;
use std::time::{Duration, Instant};

use pandemic_game::{Command, CommandOutcome, GameSession, InfectionOutcome, SessionConfig};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

/// Configuration for one seeded random game.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub seed: u64,
    pub steps: usize,
    pub session: SessionConfig,
}

impl SimulationConfig {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            steps: 200,
            session: SessionConfig::default(),
        }
    }

    #[must_use]
    pub const fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    #[must_use]
    pub const fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }
}

/// Tally of one seeded run plus any invariant that broke along the way.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub seed: u64,
    pub steps: usize,
    pub infections: usize,
    pub shocks: usize,
    pub quarantines: usize,
    pub deals: usize,
    pub rejected: usize,
    pub outbreaks: u32,
    pub striations: usize,
    pub peak_probability: f64,
    pub final_shock_probability: f64,
    pub violations: Vec<String>,
    pub passed: bool,
    #[serde(serialize_with = "serialize_millis")]
    pub duration: Duration,
}

fn serialize_millis<S: serde::Serializer>(
    value: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_u128(value.as_millis())
}

#[derive(Default)]
struct Tally {
    infections: usize,
    shocks: usize,
    quarantines: usize,
    deals: usize,
    rejected: usize,
    peak_probability: f64,
}

/// Shocks target the discard pile when it has cards, as at the table.
fn random_command(
    rng: &mut ChaCha8Rng,
    names: &[String],
    discards: &[String],
) -> Option<Command> {
    let name = names.choose(rng)?.clone();
    let command = match rng.gen_range(0..20) {
        0 => Command::Shock(discards.choose(rng).cloned().unwrap_or(name)),
        1 | 2 => Command::Quarantine(name),
        3 => Command::Unquarantine(name),
        4 | 5 => Command::Deal(name),
        6 => Command::SetLevel(name, rng.gen_range(0..=3)),
        _ => Command::Infect(name),
    };
    Some(command)
}

/// Every structural rule a tracked game has to keep.
pub fn check_invariants(session: &GameSession) -> Vec<String> {
    let mut violations = Vec::new();
    let deck = session.infection_deck();
    let mut seen = HashSet::new();
    for name in deck
        .striations()
        .iter()
        .flat_map(|s| s.members())
        .chain(deck.drawn().iter().map(String::as_str))
    {
        if !seen.insert(name) {
            violations.push(format!("{name} is held twice in the infection deck"));
        }
    }
    for location in session.registry().iter() {
        let name = location.name();
        if !seen.contains(name) {
            violations.push(format!("{name} is missing from the infection deck"));
        }
        let p = session.probability(name);
        if !(0.0..=1.0).contains(&p) {
            violations.push(format!("{name} has probability {p} outside [0, 1]"));
        }
        if location.is_quarantined() && p > 0.0 {
            violations.push(format!("{name} is quarantined but has probability {p}"));
        }
    }
    if seen.len() != session.registry().len() {
        violations.push("infection deck holds cards outside the catalog".to_string());
    }
    let shock_p = session.city_deck().probability_of_shock_this_draw();
    if !(0.0..=1.0).contains(&shock_p) {
        violations.push(format!("shock probability {shock_p} outside [0, 1]"));
    }
    violations
}

/// Play `config.steps` random commands against a fresh game over the
/// bundled catalog, checking invariants after each one.
///
/// # Errors
///
/// Returns an error if the session configuration does not fit the catalog.
pub fn run_simulation(config: &SimulationConfig) -> anyhow::Result<SimulationResult> {
    let started = Instant::now();
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut session =
        GameSession::with_default_catalog(format!("sim-{}", config.seed), config.session)?;
    let names: Vec<String> = session.registry().names().map(str::to_string).collect();
    let mut tally = Tally::default();
    let mut violations = Vec::new();

    for step in 0..config.steps {
        let discards = session.infection_deck().drawn();
        let Some(command) = random_command(&mut rng, &names, discards) else {
            break;
        };
        let before = session.clone();
        match session.execute(command) {
            Ok(outcome) => match outcome {
                CommandOutcome::Infected { outcome, .. } => {
                    tally.infections += 1;
                    if outcome == InfectionOutcome::Outbreak {
                        log::debug!("seed {} step {step}: outbreak", config.seed);
                    }
                }
                CommandOutcome::Shocked { .. } => tally.shocks += 1,
                CommandOutcome::Quarantined { .. } => tally.quarantines += 1,
                CommandOutcome::Dealt { .. } => tally.deals += 1,
                _ => {}
            },
            Err(err) => {
                tally.rejected += 1;
                log::trace!("seed {} step {step}: rejected ({err})", config.seed);
                if session != before {
                    violations.push(format!("step {step}: rejected command changed state"));
                }
            }
        }
        for violation in check_invariants(&session) {
            violations.push(format!("step {step}: {violation}"));
        }
        let peak = names
            .iter()
            .map(|n| session.probability(n))
            .fold(0.0_f64, f64::max);
        tally.peak_probability = tally.peak_probability.max(peak);
    }

    match GameSession::from_json(&session.to_json()?) {
        Ok(restored) if restored == session => {}
        Ok(_) => violations.push("snapshot round trip changed the session".to_string()),
        Err(err) => violations.push(format!("snapshot did not reload: {err}")),
    }

    Ok(SimulationResult {
        seed: config.seed,
        steps: config.steps,
        infections: tally.infections,
        shocks: tally.shocks,
        quarantines: tally.quarantines,
        deals: tally.deals,
        rejected: tally.rejected,
        outbreaks: session.outbreaks(),
        striations: session.infection_deck().striations().len(),
        peak_probability: tally.peak_probability,
        final_shock_probability: session.city_deck().probability_of_shock_this_draw(),
        passed: violations.is_empty(),
        violations,
        duration: started.elapsed(),
    })
}
