//! Loading and saving a session as a single JSON snapshot.
//!
//! A snapshot is parsed completely and checked against every deck invariant
//! before a session is handed back; a file that fails either step never
//! becomes live state.
use std::collections::HashSet;
use thiserror::Error;

use crate::city_deck::DeckEntry;
use crate::config::ConfigError;
use crate::location::{Category, CatalogError};
use crate::session::GameSession;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("invalid session JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0} is dealt more than once")]
    DuplicateDeal(String),
    #[error("{0} was dealt but is not part of the city deck")]
    UnknownDeal(String),
    #[error("city deck does not match the catalog: {0}")]
    CityDeckMismatch(String),
    #[error("{0} appears more than once in the infection deck")]
    DuplicateCard(String),
    #[error("{0} is missing from the infection deck")]
    MissingCard(String),
    #[error("infection deck holds {0}, which is not in the catalog")]
    UnknownCard(String),
    #[error("category {0} has no display metadata")]
    MissingCategory(Category),
}

impl GameSession {
    /// Parse and validate a saved session.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the decoded state breaks
    /// any deck invariant.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let session: Self = serde_json::from_str(json)?;
        session.validate()?;
        Ok(session)
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every cross-structure invariant of the session.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        self.catalog.validate()?;
        if self.infection_rate == 0 {
            return Err(ConfigError::ZeroInfectionRate(self.infection_rate).into());
        }
        for location in self.catalog.iter() {
            if !self
                .category_data
                .iter()
                .any(|info| info.category == location.category())
            {
                return Err(SnapshotError::MissingCategory(location.category()));
            }
        }
        self.validate_city_deck()?;
        self.city_deck.validate()?;
        self.infection_deck.validate(&self.catalog)
    }

    fn validate_city_deck(&self) -> Result<(), SnapshotError> {
        let mut names = HashSet::with_capacity(self.catalog.len());
        let mut markers = HashSet::new();
        for entry in self.city_deck.all() {
            let fresh = match entry {
                DeckEntry::Location { name } => {
                    if !self.catalog.contains(name) {
                        return Err(SnapshotError::CityDeckMismatch(format!(
                            "{name} is not in the catalog"
                        )));
                    }
                    names.insert(name.as_str())
                }
                DeckEntry::ShockMarker { index } => markers.insert(*index),
            };
            if !fresh {
                return Err(SnapshotError::CityDeckMismatch(
                    "card listed more than once".to_string(),
                ));
            }
        }
        if let Some(missing) = self.catalog.names().find(|n| !names.contains(n)) {
            return Err(SnapshotError::CityDeckMismatch(format!(
                "{missing} has no card"
            )));
        }
        if markers.is_empty() {
            return Err(ConfigError::NoShockMarkers.into());
        }
        Ok(())
    }
}
