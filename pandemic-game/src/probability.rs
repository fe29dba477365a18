//! Draw probability for a single location, combining the city deck's shock
//! risk with the infection deck's band structure.
//!
//! Everything here is a pure read of the current session; nothing is cached.
use serde::{Deserialize, Serialize};

use crate::constants::CRITICAL_PROBABILITY;
use crate::numbers::{clamp_probability, ratio};
use crate::session::GameSession;

/// Where a location sits relative to the next draw window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Exposure {
    /// Not in the catalog.
    Unknown,
    Quarantined,
    /// Undrawn, but in a band behind the bottom one.
    Buried { striation: usize },
    /// In the first non-empty band.
    Bottom { band_size: usize },
    /// In the discard pile.
    Discarded { pile_size: usize },
}

impl Exposure {
    /// Structurally out of reach of the next draw window; probability is
    /// exactly zero without doing any arithmetic.
    #[must_use]
    pub const fn is_excluded(self) -> bool {
        matches!(self, Self::Unknown | Self::Quarantined | Self::Buried { .. })
    }
}

/// Classify a location without computing a probability.
#[must_use]
pub fn exposure_of(session: &GameSession, name: &str) -> Exposure {
    let Ok(location) = session.registry().get(name) else {
        return Exposure::Unknown;
    };
    if location.is_quarantined() {
        return Exposure::Quarantined;
    }
    let deck = session.infection_deck();
    if deck.is_drawn(name) {
        return Exposure::Discarded {
            pile_size: deck.drawn().len(),
        };
    }
    match deck.bottom_striation() {
        Some(bottom) if bottom.contains(name) => Exposure::Bottom {
            band_size: bottom.size(),
        },
        _ => Exposure::Buried {
            striation: deck.striation_of(name).unwrap_or_default(),
        },
    }
}

/// `P(shock) * P(pulled | shock) + P(no shock) * P(drawn | no shock)`.
#[must_use]
pub fn probability_of_location(session: &GameSession, name: &str) -> f64 {
    let exposure = exposure_of(session, name);
    if exposure.is_excluded() {
        return 0.0;
    }
    let rate = session.infection_rate();
    let p_shock = session.city_deck().probability_of_shock_this_draw();
    let p_shock_branch = match exposure {
        Exposure::Bottom { band_size } => ratio(1.0, band_size),
        Exposure::Discarded { pile_size } => ratio(f64::from(rate), 1 + pile_size),
        Exposure::Unknown | Exposure::Quarantined | Exposure::Buried { .. } => 0.0,
    };
    let p_no_shock_branch = session.infection_deck().probability_of_drawing(name, rate);
    clamp_probability(p_shock.mul_add(p_shock_branch, (1.0 - p_shock) * p_no_shock_branch))
}

/// Three-tier colouring used by renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Safe,
    Caution,
    Critical,
}

impl RiskTier {
    #[must_use]
    pub fn classify(exposure: Exposure, probability: f64) -> Self {
        if exposure.is_excluded() {
            Self::Safe
        } else if probability > CRITICAL_PROBABILITY {
            Self::Critical
        } else {
            Self::Caution
        }
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Caution => "caution",
            Self::Critical => "critical",
        }
    }
}
