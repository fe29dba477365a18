//! Infection deck tracker
//!
//! Platform-agnostic model of the two card decks in a cooperative outbreak
//! board game, and the probability that each location is drawn next.
//! This crate has no terminal, file or UI dependencies; front ends drive it
//! through [`GameSession`] and the [`Command`] surface.

pub mod city_deck;
pub mod command;
pub mod config;
pub mod constants;
pub mod error;
pub mod infection_deck;
pub mod location;
pub mod numbers;
pub mod probability;
pub mod report;
pub mod session;
pub mod snapshot;

// Re-export commonly used types
pub use city_deck::{CityDeck, DeckEntry};
pub use command::{Command, CommandError, CommandOutcome};
pub use config::{ConfigError, SessionConfig};
pub use error::DeckError;
pub use infection_deck::{InfectionDeck, Striation};
pub use location::{
    CatalogError, Category, CategoryInfo, Location, LocationRegistry, by_infection_level,
};
pub use probability::{Exposure, RiskTier, exposure_of, probability_of_location};
pub use report::{Band, BandKind, BoardSummary, LocationReport};
pub use session::{GameSession, InfectionOutcome, ShockOutcome};
pub use snapshot::SnapshotError;

/// Trait for abstracting where the location catalog comes from.
/// Front ends provide the implementation.
pub trait CatalogLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the location catalog for a new game
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read or is invalid.
    fn load_catalog(&self) -> Result<LocationRegistry, Self::Error>;
}

/// Loads the bundled world map.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledCatalog;

impl CatalogLoader for BundledCatalog {
    type Error = std::convert::Infallible;

    fn load_catalog(&self) -> Result<LocationRegistry, Self::Error> {
        Ok(LocationRegistry::default_catalog().clone())
    }
}

/// Trait for abstracting save/load operations
/// Platform-specific implementations should provide this
pub trait GameStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save a session snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be saved.
    fn save_session(&self, save_name: &str, session: &GameSession) -> Result<(), Self::Error>;

    /// Load a session snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot exists but cannot be read.
    fn load_session(&self, save_name: &str) -> Result<Option<GameSession>, Self::Error>;

    /// Delete a saved session
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    fn delete_session(&self, save_name: &str) -> Result<(), Self::Error>;
}

/// Binds a catalog source to a storage backend.
#[derive(Debug)]
pub struct TrackerEngine<L, S>
where
    L: CatalogLoader,
    S: GameStorage,
{
    catalog_loader: L,
    storage: S,
}

impl<L, S> TrackerEngine<L, S>
where
    L: CatalogLoader,
    S: GameStorage,
{
    pub const fn new(catalog_loader: L, storage: S) -> Self {
        Self {
            catalog_loader,
            storage,
        }
    }

    /// Start a new session over the loader's catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded or the configuration
    /// does not fit it.
    pub fn create_session(
        &self,
        game_name: &str,
        config: SessionConfig,
    ) -> Result<GameSession, anyhow::Error> {
        let catalog = self.catalog_loader.load_catalog()?;
        Ok(GameSession::new(game_name, catalog, config)?)
    }

    /// # Errors
    ///
    /// Returns an error if the session cannot be saved.
    pub fn save_session(&self, save_name: &str, session: &GameSession) -> Result<(), S::Error> {
        self.storage.save_session(save_name, session)
    }

    /// Load a session, re-checking every invariant before handing it out.
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be read or is inconsistent.
    pub fn load_session(&self, save_name: &str) -> Result<Option<GameSession>, anyhow::Error> {
        let Some(session) = self.storage.load_session(save_name)? else {
            return Ok(None);
        };
        session.validate()?;
        Ok(Some(session))
    }

    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    pub fn delete_session(&self, save_name: &str) -> Result<(), S::Error> {
        self.storage.delete_session(save_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::convert::Infallible;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct MemoryStorage {
        saves: Rc<RefCell<HashMap<String, String>>>,
    }

    impl GameStorage for MemoryStorage {
        type Error = SnapshotError;

        fn save_session(&self, save_name: &str, session: &GameSession) -> Result<(), Self::Error> {
            self.saves
                .borrow_mut()
                .insert(save_name.to_string(), session.to_json()?);
            Ok(())
        }

        fn load_session(&self, save_name: &str) -> Result<Option<GameSession>, Self::Error> {
            self.saves
                .borrow()
                .get(save_name)
                .map(|json| GameSession::from_json(json.as_str()))
                .transpose()
        }

        fn delete_session(&self, save_name: &str) -> Result<(), Self::Error> {
            self.saves.borrow_mut().remove(save_name);
            Ok(())
        }
    }

    #[derive(Clone, Copy)]
    struct TinyCatalog;

    impl CatalogLoader for TinyCatalog {
        type Error = CatalogError;

        fn load_catalog(&self) -> Result<LocationRegistry, Self::Error> {
            LocationRegistry::new(vec![
                Location::new("North", Category::Blue).with_neighbors(["South"]),
                Location::new("South", Category::Red).with_neighbors(["North"]),
            ])
        }
    }

    #[test]
    fn engine_creates_and_roundtrips_sessions() {
        let engine = TrackerEngine::new(BundledCatalog, MemoryStorage::default());
        let mut session = engine
            .create_session("slot-one", SessionConfig::default())
            .unwrap();
        session.infect("Lima").unwrap();
        session.cause_shock("Lima").unwrap();
        engine.save_session("slot-one", &session).unwrap();

        let loaded = engine.load_session("slot-one").unwrap().expect("save exists");
        assert_eq!(loaded, session);
        assert!(engine.load_session("missing-slot").unwrap().is_none());

        engine.delete_session("slot-one").unwrap();
        assert!(engine.load_session("slot-one").unwrap().is_none());
    }

    #[test]
    fn engine_rejects_config_that_does_not_fit_catalog() {
        let engine = TrackerEngine::new(TinyCatalog, MemoryStorage::default());
        let err = engine
            .create_session("tiny", SessionConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("shock markers"));
        let session = engine
            .create_session("tiny", SessionConfig::default().with_shock_markers(1))
            .unwrap();
        assert_eq!(session.registry().len(), 2);
    }

    #[test]
    fn bundled_catalog_is_infallible() {
        let catalog: Result<LocationRegistry, Infallible> = BundledCatalog.load_catalog();
        assert_eq!(catalog.map(|c| c.len()).unwrap_or_default(), 48);
    }
}
