//! The game session: every player-visible operation goes through here so
//! that both decks and the registry stay consistent with each other.
use serde::{Deserialize, Serialize};

use crate::city_deck::CityDeck;
use crate::config::{ConfigError, SessionConfig};
use crate::constants::{LOG_TARGET_SESSION, MAX_INFECTION_LEVEL};
use crate::error::DeckError;
use crate::infection_deck::InfectionDeck;
use crate::location::{Category, CategoryInfo, Location, LocationRegistry};
use crate::probability::{exposure_of, probability_of_location};

/// Result of an `infect` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InfectionOutcome {
    /// The location was quarantined; the quarantine is spent instead.
    Absorbed,
    Infected { level: u8 },
    /// Already at the maximum level. Chain resolution is left to players.
    Outbreak,
}

/// Result of a `cause_shock` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShockOutcome {
    /// The location was quarantined; the quarantine is spent instead.
    Absorbed { restacked: usize },
    Escalated { previous_level: u8, restacked: usize },
}

/// Full tracked state of one game. This is the unit that gets saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    pub(crate) catalog: LocationRegistry,
    pub(crate) category_data: Vec<CategoryInfo>,
    pub(crate) city_deck: CityDeck,
    pub(crate) infection_deck: InfectionDeck,
    pub(crate) infection_rate: u8,
    #[serde(default)]
    pub(crate) outbreaks: u32,
    pub(crate) game_name: String,
}

impl GameSession {
    /// Start a game over `catalog`: every location undrawn in one band.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` does not fit the catalog.
    pub fn new(
        game_name: impl Into<String>,
        catalog: LocationRegistry,
        config: SessionConfig,
    ) -> Result<Self, ConfigError> {
        config.validate(catalog.len())?;
        let city_deck = CityDeck::new(catalog.names(), usize::from(config.shock_markers));
        let infection_deck = InfectionDeck::new(catalog.names());
        let game_name = game_name.into();
        log::info!(
            target: LOG_TARGET_SESSION,
            "new game {game_name}: {} locations, {} shock markers, infection rate {}",
            catalog.len(),
            config.shock_markers,
            config.infection_rate
        );
        Ok(Self {
            catalog,
            category_data: CategoryInfo::default_palette(),
            city_deck,
            infection_deck,
            infection_rate: config.infection_rate,
            outbreaks: 0,
            game_name,
        })
    }

    /// Start a game over the bundled world map.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` does not fit the catalog.
    pub fn with_default_catalog(
        game_name: impl Into<String>,
        config: SessionConfig,
    ) -> Result<Self, ConfigError> {
        Self::new(game_name, LocationRegistry::default_catalog().clone(), config)
    }

    #[must_use]
    pub const fn registry(&self) -> &LocationRegistry {
        &self.catalog
    }

    #[must_use]
    pub const fn city_deck(&self) -> &CityDeck {
        &self.city_deck
    }

    #[must_use]
    pub const fn infection_deck(&self) -> &InfectionDeck {
        &self.infection_deck
    }

    #[must_use]
    pub const fn infection_rate(&self) -> u8 {
        self.infection_rate
    }

    #[must_use]
    pub const fn outbreaks(&self) -> u32 {
        self.outbreaks
    }

    #[must_use]
    pub fn game_name(&self) -> &str {
        &self.game_name
    }

    #[must_use]
    pub fn category_data(&self) -> &[CategoryInfo] {
        &self.category_data
    }

    /// # Errors
    ///
    /// Returns [`DeckError::NotFound`] if the location does not exist.
    pub fn location(&self, name: &str) -> Result<&Location, DeckError> {
        self.catalog.get(name)
    }

    /// # Errors
    ///
    /// Returns [`DeckError::NotFound`] if no metadata exists for the tag.
    pub fn category_info(&self, category: Category) -> Result<&CategoryInfo, DeckError> {
        self.category_data
            .iter()
            .find(|info| info.category == category)
            .ok_or_else(|| DeckError::not_found(category.key(), "category table"))
    }

    /// Record an infection card drawn for `name`.
    ///
    /// # Errors
    ///
    /// Propagates lookup and infection deck errors; nothing changes on error.
    pub fn infect(&mut self, name: &str) -> Result<InfectionOutcome, DeckError> {
        self.catalog.get(name)?;
        self.infection_deck.draw(name)?;
        let location = self.catalog.get_mut(name)?;
        if location.is_quarantined() {
            location.set_quarantined(false);
            log::info!(target: LOG_TARGET_SESSION, "{name}: infection absorbed by quarantine");
            return Ok(InfectionOutcome::Absorbed);
        }
        if location.infect() {
            self.outbreaks += 1;
            log::warn!(
                target: LOG_TARGET_SESSION,
                "{name}: outbreak (total outbreaks {})",
                self.outbreaks
            );
            return Ok(InfectionOutcome::Outbreak);
        }
        let level = location.infection_level();
        log::debug!(target: LOG_TARGET_SESSION, "{name}: infected to level {level}");
        Ok(InfectionOutcome::Infected { level })
    }

    /// Resolve a shock on `name`: the card is pulled from the discard pile,
    /// a shock marker is recorded, the location jumps to the maximum level
    /// unless quarantined, and the discard pile is restacked as the new
    /// bottom band.
    ///
    /// # Errors
    ///
    /// [`DeckError::NotFound`] for unknown locations or a card that is not in
    /// the discard pile, then [`DeckError::Exhausted`] when no shock markers
    /// remain. Both are checked before anything changes.
    pub fn cause_shock(&mut self, name: &str) -> Result<ShockOutcome, DeckError> {
        self.catalog.get(name)?;
        if !self.infection_deck.is_drawn(name) {
            return Err(DeckError::not_found(name, "infection discard pile"));
        }
        self.city_deck.check_shock_available()?;

        self.infection_deck.pull_from_bottom(name)?;
        self.city_deck.draw_shock_marker()?;
        let restacked = self.infection_deck.drawn().len();

        let location = self.catalog.get_mut(name)?;
        let outcome = if location.is_quarantined() {
            location.set_quarantined(false);
            ShockOutcome::Absorbed { restacked }
        } else {
            let previous_level = location.infection_level();
            location.escalate();
            ShockOutcome::Escalated {
                previous_level,
                restacked,
            }
        };
        self.infection_deck.shuffle_drawn();
        log::info!(
            target: LOG_TARGET_SESSION,
            "shock at {name}: {restacked} cards restacked ({} of {} markers drawn)",
            self.city_deck.shock_markers_drawn(),
            self.city_deck.shock_marker_count()
        );
        Ok(outcome)
    }

    /// Record a player city card dealt for `name`.
    ///
    /// # Errors
    ///
    /// Propagates lookup and city deck errors.
    pub fn draw_city_card(&mut self, name: &str) -> Result<(), DeckError> {
        self.catalog.get(name)?;
        self.city_deck.draw(name)
    }

    /// # Errors
    ///
    /// [`DeckError::AlreadySet`] if the location is already quarantined.
    pub fn quarantine(&mut self, name: &str) -> Result<(), DeckError> {
        let location = self.catalog.get_mut(name)?;
        if location.is_quarantined() {
            return Err(DeckError::AlreadySet {
                name: name.to_string(),
            });
        }
        location.set_quarantined(true);
        log::info!(target: LOG_TARGET_SESSION, "{name}: quarantined");
        Ok(())
    }

    /// # Errors
    ///
    /// [`DeckError::NotSet`] if the location is not quarantined.
    pub fn remove_quarantine(&mut self, name: &str) -> Result<(), DeckError> {
        let location = self.catalog.get_mut(name)?;
        if !location.is_quarantined() {
            return Err(DeckError::NotSet {
                name: name.to_string(),
            });
        }
        location.set_quarantined(false);
        log::info!(target: LOG_TARGET_SESSION, "{name}: quarantine lifted");
        Ok(())
    }

    /// Manual correction of a location's level.
    ///
    /// # Errors
    ///
    /// [`DeckError::InvalidLevel`] above the maximum, or
    /// [`DeckError::NotFound`].
    pub fn set_infection_level(&mut self, name: &str, level: u8) -> Result<(), DeckError> {
        if level > MAX_INFECTION_LEVEL {
            return Err(DeckError::InvalidLevel {
                level,
                max: MAX_INFECTION_LEVEL,
            });
        }
        self.catalog.get_mut(name)?.set_infection_level(level);
        Ok(())
    }

    /// # Errors
    ///
    /// [`DeckError::InvalidRate`] for a rate of zero.
    pub fn set_infection_rate(&mut self, rate: u8) -> Result<(), DeckError> {
        if rate == 0 {
            return Err(DeckError::InvalidRate { rate });
        }
        self.infection_rate = rate;
        Ok(())
    }

    #[must_use]
    pub fn probability(&self, name: &str) -> f64 {
        probability_of_location(self, name)
    }

    /// Infected, reachable by the next draw window, and either full or in
    /// the bottom band.
    #[must_use]
    pub fn can_outbreak(&self, name: &str) -> bool {
        let Ok(location) = self.catalog.get(name) else {
            return false;
        };
        if location.infection_level() == 0 || exposure_of(self, name).is_excluded() {
            return false;
        }
        location.infection_level() == MAX_INFECTION_LEVEL
            || self.infection_deck.in_bottom_striation(name)
    }
}
