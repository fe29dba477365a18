//! The player city deck: one card per location plus a fixed number of shock
//! markers, and the ordered list of cards already dealt.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::constants::{LOG_TARGET_DECK, SHOCK_DRAW_WINDOW};
use crate::error::DeckError;
use crate::numbers::ratio;
use crate::snapshot::SnapshotError;

const DECK_NAME: &str = "city deck";

/// A single card in the city deck.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeckEntry {
    Location { name: String },
    ShockMarker { index: usize },
}

impl DeckEntry {
    #[must_use]
    pub fn location_name(&self) -> Option<&str> {
        match self {
            Self::Location { name } => Some(name),
            Self::ShockMarker { .. } => None,
        }
    }

    #[must_use]
    pub const fn is_shock_marker(&self) -> bool {
        matches!(self, Self::ShockMarker { .. })
    }
}

/// Full card set plus the dealt cards, in deal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CityDeck {
    all: Vec<DeckEntry>,
    #[serde(default)]
    drawn: Vec<DeckEntry>,
}

impl CityDeck {
    /// One card per location followed by `shock_markers` markers.
    #[must_use]
    pub fn new<'a, I>(names: I, shock_markers: usize) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let all = names
            .into_iter()
            .map(|name| DeckEntry::Location {
                name: name.to_string(),
            })
            .chain((0..shock_markers).map(|index| DeckEntry::ShockMarker { index }))
            .collect();
        Self {
            all,
            drawn: Vec::new(),
        }
    }

    #[must_use]
    pub fn all(&self) -> &[DeckEntry] {
        &self.all
    }

    #[must_use]
    pub fn drawn(&self) -> &[DeckEntry] {
        &self.drawn
    }

    #[must_use]
    pub fn drawn_count(&self) -> usize {
        self.drawn.len()
    }

    #[must_use]
    pub fn is_drawn(&self, name: &str) -> bool {
        self.drawn.iter().any(|e| e.location_name() == Some(name))
    }

    /// Deal a location card.
    ///
    /// # Errors
    ///
    /// [`DeckError::DuplicateDraw`] if the card was already dealt,
    /// [`DeckError::NotFound`] if the deck has no such card.
    pub fn draw(&mut self, name: &str) -> Result<(), DeckError> {
        if self.is_drawn(name) {
            return Err(DeckError::duplicate(name, DECK_NAME));
        }
        let entry = self
            .all
            .iter()
            .find(|e| e.location_name() == Some(name))
            .cloned()
            .ok_or_else(|| DeckError::not_found(name, DECK_NAME))?;
        self.drawn.push(entry);
        log::debug!(target: LOG_TARGET_DECK, "city deck: dealt {name} ({} drawn)", self.drawn.len());
        Ok(())
    }

    /// # Errors
    ///
    /// [`DeckError::Exhausted`] once every configured marker has been drawn.
    pub fn draw_shock_marker(&mut self) -> Result<(), DeckError> {
        self.check_shock_available()?;
        let index = self
            .all
            .iter()
            .find_map(|e| match e {
                DeckEntry::ShockMarker { index } if !self.drawn.contains(e) => Some(*index),
                _ => None,
            })
            .ok_or(DeckError::Exhausted {
                drawn: self.shock_markers_drawn(),
                total: self.shock_marker_count(),
            })?;
        self.drawn.push(DeckEntry::ShockMarker { index });
        log::debug!(
            target: LOG_TARGET_DECK,
            "city deck: shock marker {} of {} drawn",
            index + 1,
            self.shock_marker_count()
        );
        Ok(())
    }

    /// Validation half of [`Self::draw_shock_marker`], so callers composing
    /// several mutations can check first.
    ///
    /// # Errors
    ///
    /// [`DeckError::Exhausted`] once every configured marker has been drawn.
    pub fn check_shock_available(&self) -> Result<(), DeckError> {
        let drawn = self.shock_markers_drawn();
        let total = self.shock_marker_count();
        if drawn >= total {
            return Err(DeckError::Exhausted { drawn, total });
        }
        Ok(())
    }

    #[must_use]
    pub fn total_entries(&self) -> usize {
        self.all.len()
    }

    #[must_use]
    pub fn shock_marker_count(&self) -> usize {
        self.all.iter().filter(|e| e.is_shock_marker()).count()
    }

    #[must_use]
    pub fn shock_markers_drawn(&self) -> usize {
        self.drawn.iter().filter(|e| e.is_shock_marker()).count()
    }

    /// Size of each phase; every phase holds exactly one marker. Zero when
    /// the deck has no markers.
    #[must_use]
    pub fn cards_per_shock_phase(&self) -> usize {
        match self.shock_marker_count() {
            0 => 0,
            markers => self.total_entries() / markers,
        }
    }

    /// Chance that the next pair of player draws turns up a shock marker.
    ///
    /// Non-zero only while the current phase has not yet produced its
    /// marker.
    #[must_use]
    pub fn probability_of_shock_this_draw(&self) -> f64 {
        let per_phase = self.cards_per_shock_phase();
        if per_phase == 0 {
            return 0.0;
        }
        let drawn = self.drawn.len();
        let phase = drawn / per_phase;
        if phase != self.shock_markers_drawn() {
            return 0.0;
        }
        ratio(SHOCK_DRAW_WINDOW, per_phase - drawn % per_phase)
    }

    pub(crate) fn validate(&self) -> Result<(), SnapshotError> {
        let mut seen = HashSet::with_capacity(self.drawn.len());
        for entry in &self.drawn {
            if !seen.insert(entry) {
                return Err(SnapshotError::DuplicateDeal(describe(entry)));
            }
            if !self.all.contains(entry) {
                return Err(SnapshotError::UnknownDeal(describe(entry)));
            }
        }
        Ok(())
    }
}

fn describe(entry: &DeckEntry) -> String {
    match entry {
        DeckEntry::Location { name } => name.clone(),
        DeckEntry::ShockMarker { index } => format!("shock marker #{index}"),
    }
}
