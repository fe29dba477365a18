//! The infection deck, modelled as ordered striations of undrawn cards plus
//! a discard pile.
//!
//! Striation 0 is the band the next ordinary draw comes from. A shock
//! reshuffles the discard pile into a fresh band that is inserted at index 0,
//! pushing every older band one step further away.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::constants::LOG_TARGET_DECK;
use crate::error::DeckError;
use crate::location::LocationRegistry;
use crate::numbers::{count_to_f64, ratio};
use crate::snapshot::SnapshotError;

const DECK_NAME: &str = "infection deck";

/// An unordered group of undrawn cards that were shuffled together.
///
/// Members are kept sorted. Decoding keeps repeated names so that snapshot
/// validation can reject them instead of silently merging them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Striation {
    members: Vec<String>,
}

impl Striation {
    #[must_use]
    pub fn size(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.members.iter().any(|m| m == name)
    }

    /// Members in a stable display order.
    #[must_use]
    pub fn members(&self) -> Vec<&str> {
        self.members.iter().map(String::as_str).collect()
    }
}

impl<S: Into<String>> FromIterator<S> for Striation {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut members: Vec<String> = iter.into_iter().map(Into::into).collect();
        members.sort_unstable();
        members.dedup();
        Self { members }
    }
}

impl From<Vec<String>> for Striation {
    fn from(mut members: Vec<String>) -> Self {
        members.sort_unstable();
        Self { members }
    }
}

impl From<Striation> for Vec<String> {
    fn from(striation: Striation) -> Self {
        striation.members
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct InfectionDeck {
    striations: Vec<Striation>,
    /// Discard pile, most recent first.
    #[serde(default)]
    drawn: Vec<String>,
}

impl InfectionDeck {
    /// A fresh deck: every location in one shuffled band.
    #[must_use]
    pub fn new<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            striations: vec![names.into_iter().collect()],
            drawn: Vec::new(),
        }
    }

    /// A deck pre-split into bands, index 0 first.
    #[must_use]
    pub fn from_bands<B, S>(bands: B) -> Self
    where
        B: IntoIterator,
        B::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            striations: bands.into_iter().map(|b| b.into_iter().collect()).collect(),
            drawn: Vec::new(),
        }
    }

    #[must_use]
    pub fn striations(&self) -> &[Striation] {
        &self.striations
    }

    #[must_use]
    pub fn drawn(&self) -> &[String] {
        &self.drawn
    }

    #[must_use]
    pub fn is_drawn(&self, name: &str) -> bool {
        self.drawn.iter().any(|d| d == name)
    }

    /// Index of the striation holding `name`, if it is still undrawn.
    #[must_use]
    pub fn striation_of(&self, name: &str) -> Option<usize> {
        self.striations.iter().position(|s| s.contains(name))
    }

    /// The first non-empty band, if any card is still undrawn.
    #[must_use]
    pub fn bottom_striation(&self) -> Option<&Striation> {
        self.striations.iter().find(|s| !s.is_empty())
    }

    #[must_use]
    pub fn in_bottom_striation(&self, name: &str) -> bool {
        self.bottom_striation().is_some_and(|s| s.contains(name))
    }

    /// Move a card from whichever band holds it onto the discard pile. The
    /// band stays in place even when this empties it.
    ///
    /// # Errors
    ///
    /// [`DeckError::DuplicateDraw`] if the card is already discarded,
    /// [`DeckError::NotFound`] if no band holds it.
    pub fn draw(&mut self, name: &str) -> Result<(), DeckError> {
        if self.is_drawn(name) {
            return Err(DeckError::duplicate(name, DECK_NAME));
        }
        let idx = self
            .striation_of(name)
            .ok_or_else(|| DeckError::not_found(name, DECK_NAME))?;
        self.striations[idx].members.retain(|m| m != name);
        self.drawn.insert(0, name.to_string());
        log::debug!(target: LOG_TARGET_DECK, "infection deck: drew {name} from striation {idx}");
        Ok(())
    }

    /// Pull the named card out of the discard pile and place it back on top,
    /// as the most recent discard, ready for [`Self::shuffle_drawn`].
    ///
    /// # Errors
    ///
    /// [`DeckError::NotFound`] if the card is not in the discard pile.
    pub fn pull_from_bottom(&mut self, name: &str) -> Result<(), DeckError> {
        let pos = self
            .drawn
            .iter()
            .position(|d| d == name)
            .ok_or_else(|| DeckError::not_found(name, "infection discard pile"))?;
        let card = self.drawn.remove(pos);
        self.drawn.insert(0, card);
        log::debug!(target: LOG_TARGET_DECK, "infection deck: pulled {name} for a shock");
        Ok(())
    }

    /// Restack the whole discard pile as a new band at index 0. Bands left
    /// empty by earlier draws are dropped.
    pub fn shuffle_drawn(&mut self) {
        self.striations.retain(|s| !s.is_empty());
        if self.drawn.is_empty() {
            return;
        }
        let band: Striation = self.drawn.drain(..).collect();
        log::debug!(
            target: LOG_TARGET_DECK,
            "infection deck: restacked {} cards as striation 0",
            band.size()
        );
        self.striations.insert(0, band);
    }

    /// Chance that `name` comes up in the next draw window without a shock.
    #[must_use]
    pub fn probability_of_drawing(&self, name: &str, infection_rate: u8) -> f64 {
        if self.is_drawn(name) {
            return ratio(f64::from(infection_rate), 1 + self.drawn.len());
        }
        match self.bottom_striation() {
            Some(bottom) if bottom.contains(name) => ratio(1.0, bottom.size()),
            _ => 0.0,
        }
    }

    /// Total number of cards held, undrawn and drawn.
    #[must_use]
    pub fn card_count(&self) -> usize {
        self.striations.iter().map(Striation::size).sum::<usize>() + self.drawn.len()
    }

    /// Mean band size, used by the board summary.
    #[must_use]
    pub fn mean_striation_size(&self) -> f64 {
        let bands: Vec<&Striation> = self.striations.iter().filter(|s| !s.is_empty()).collect();
        if bands.is_empty() {
            return 0.0;
        }
        let total: usize = bands.iter().map(|s| s.size()).sum();
        count_to_f64(total) / count_to_f64(bands.len())
    }

    /// Every catalog location must sit in exactly one band or the discard
    /// pile, and nothing else may.
    pub(crate) fn validate(&self, registry: &LocationRegistry) -> Result<(), SnapshotError> {
        let mut seen: HashMap<&str, usize> = HashMap::with_capacity(registry.len());
        let held = self
            .striations
            .iter()
            .flat_map(|s| s.members.iter())
            .chain(self.drawn.iter());
        for name in held {
            *seen.entry(name.as_str()).or_default() += 1;
        }
        for name in registry.names() {
            match seen.remove(name) {
                Some(1) => {}
                Some(_) => return Err(SnapshotError::DuplicateCard(name.to_string())),
                None => return Err(SnapshotError::MissingCard(name.to_string())),
            }
        }
        if let Some(extra) = seen.keys().min() {
            return Err(SnapshotError::UnknownCard((*extra).to_string()));
        }
        Ok(())
    }
}
