//! Location registry: the static catalog of places plus their mutable
//! infection state.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::OnceLock;
use thiserror::Error;

use crate::constants::MAX_INFECTION_LEVEL;
use crate::error::DeckError;

const DEFAULT_CATALOG_DATA: &str = include_str!("../data/cities.json");

/// Category tag assigned to each location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Yellow,
    Red,
    Black,
    Blue,
    Faded,
}

impl Category {
    pub const ALL: [Self; 5] = [
        Self::Yellow,
        Self::Red,
        Self::Black,
        Self::Blue,
        Self::Faded,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Yellow => "yellow",
            Self::Red => "red",
            Self::Black => "black",
            Self::Blue => "blue",
            Self::Faded => "faded",
        }
    }

    /// Parse a tag case-insensitively.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.key().eq_ignore_ascii_case(key.trim()))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Display metadata for a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub category: Category,
    pub label: String,
    /// Terminal colour name used by renderers.
    pub color: String,
}

impl CategoryInfo {
    /// The fixed palette used by new sessions.
    #[must_use]
    pub fn default_palette() -> Vec<Self> {
        [
            (Category::Yellow, "Yellow fever", "yellow"),
            (Category::Red, "Red plague", "red"),
            (Category::Black, "Black rot", "black"),
            (Category::Blue, "Blue flu", "blue"),
            (Category::Faded, "Faded", "white"),
        ]
        .into_iter()
        .map(|(category, label, color)| Self {
            category,
            label: label.to_string(),
            color: color.to_string(),
        })
        .collect()
    }
}

/// A single place on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    name: String,
    category: Category,
    #[serde(default)]
    neighbors: SmallVec<[String; 6]>,
    #[serde(default)]
    infection_level: u8,
    #[serde(default)]
    quarantined: bool,
}

impl Location {
    #[must_use]
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            category,
            neighbors: SmallVec::new(),
            infection_level: 0,
            quarantined: false,
        }
    }

    #[must_use]
    pub fn with_neighbors<I, S>(mut self, neighbors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.neighbors = neighbors.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    #[must_use]
    pub fn neighbors(&self) -> &[String] {
        &self.neighbors
    }

    #[must_use]
    pub const fn infection_level(&self) -> u8 {
        self.infection_level
    }

    #[must_use]
    pub const fn is_quarantined(&self) -> bool {
        self.quarantined
    }

    #[must_use]
    pub fn is_adjacent(&self, other: &str) -> bool {
        self.neighbors.iter().any(|n| n == other)
    }

    /// Add one cube. Returns `true` when the location was already full, in
    /// which case the level stays at the maximum.
    pub(crate) fn infect(&mut self) -> bool {
        if self.infection_level >= MAX_INFECTION_LEVEL {
            return true;
        }
        self.infection_level += 1;
        false
    }

    pub(crate) const fn escalate(&mut self) {
        self.infection_level = MAX_INFECTION_LEVEL;
    }

    pub(crate) const fn set_infection_level(&mut self, level: u8) {
        self.infection_level = level;
    }

    pub(crate) const fn set_quarantined(&mut self, quarantined: bool) {
        self.quarantined = quarantined;
    }
}

/// Ordering used to surface the most threatened locations first: infection
/// level descending, then name ascending.
#[must_use]
pub fn by_infection_level(a: (u8, &str), b: (u8, &str)) -> Ordering {
    b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1))
}

/// Problems found while loading a location catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog contains no locations")]
    Empty,
    #[error("location {0} is listed more than once")]
    DuplicateName(String),
    #[error("{location} lists unknown neighbour {neighbor}")]
    UnknownNeighbor { location: String, neighbor: String },
    #[error("{location} has infection level {level}, above the maximum of {max}")]
    LevelOutOfRange { location: String, level: u8, max: u8 },
}

/// Arena of locations, indexed by name. Catalog order is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LocationRegistry {
    #[serde(default)]
    locations: Vec<Location>,
}

impl LocationRegistry {
    /// Build a registry, rejecting catalogs that break registry invariants.
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate names, unknown neighbours, out-of-range
    /// infection levels, or an empty catalog.
    pub fn new(locations: Vec<Location>) -> Result<Self, CatalogError> {
        let registry = Self { locations };
        registry.validate()?;
        Ok(registry)
    }

    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or fails validation.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let registry: Self = serde_json::from_str(json)?;
        registry.validate()?;
        Ok(registry)
    }

    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_CATALOG_DATA).unwrap_or_default()
    }

    /// The bundled 48-location world map.
    #[must_use]
    pub fn default_catalog() -> &'static Self {
        static CATALOG: OnceLock<LocationRegistry> = OnceLock::new();
        CATALOG.get_or_init(Self::load_from_static)
    }

    /// # Errors
    ///
    /// Returns the first invariant violation found.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.locations.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::with_capacity(self.locations.len());
        for location in &self.locations {
            if !seen.insert(location.name.as_str()) {
                return Err(CatalogError::DuplicateName(location.name.clone()));
            }
            if location.infection_level > MAX_INFECTION_LEVEL {
                return Err(CatalogError::LevelOutOfRange {
                    location: location.name.clone(),
                    level: location.infection_level,
                    max: MAX_INFECTION_LEVEL,
                });
            }
        }
        for location in &self.locations {
            if let Some(neighbor) = location.neighbors.iter().find(|n| !seen.contains(n.as_str()))
            {
                return Err(CatalogError::UnknownNeighbor {
                    location: location.name.clone(),
                    neighbor: neighbor.clone(),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.locations.iter().map(Location::name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.locations.iter().any(|l| l.name == name)
    }

    /// Exact, case-sensitive lookup.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::NotFound`] if no location has this name.
    pub fn get(&self, name: &str) -> Result<&Location, DeckError> {
        self.locations
            .iter()
            .find(|l| l.name == name)
            .ok_or_else(|| DeckError::not_found(name, "catalog"))
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Result<&mut Location, DeckError> {
        self.locations
            .iter_mut()
            .find(|l| l.name == name)
            .ok_or_else(|| DeckError::not_found(name, "catalog"))
    }

    /// Case-insensitive prefix lookup.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::NotFound`] when nothing matches and
    /// [`DeckError::Ambiguous`] when more than one location does.
    pub fn get_by_prefix(&self, prefix: &str) -> Result<&Location, DeckError> {
        let needle = prefix.to_lowercase();
        let mut matches = self
            .locations
            .iter()
            .filter(|l| l.name.to_lowercase().starts_with(&needle));
        let Some(first) = matches.next() else {
            return Err(DeckError::not_found(prefix, "catalog"));
        };
        let rest: Vec<&Location> = matches.collect();
        if rest.is_empty() {
            return Ok(first);
        }
        Err(DeckError::Ambiguous {
            prefix: prefix.to_string(),
            matches: std::iter::once(first)
                .chain(rest)
                .map(|l| l.name.clone())
                .collect(),
        })
    }

    /// Exact name first, then prefix. This is how the command layer resolves
    /// player input, so "Lima" still works even if another name starts with it.
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`Self::get_by_prefix`].
    pub fn resolve(&self, query: &str) -> Result<&Location, DeckError> {
        let query = query.trim();
        self.get(query).or_else(|_| self.get_by_prefix(query))
    }

    /// All locations with the given tag, in catalog order.
    #[must_use]
    pub fn with_category(&self, category: Category) -> Vec<&Location> {
        self.locations
            .iter()
            .filter(|l| l.category == category)
            .collect()
    }

    /// # Errors
    ///
    /// Returns [`DeckError::NotFound`] if the location does not exist.
    pub fn neighbors(&self, name: &str) -> Result<&[String], DeckError> {
        self.get(name).map(Location::neighbors)
    }

    /// Sort names most-at-risk first. Unknown names sort as level 0.
    #[must_use]
    pub fn sort_by_infection_level<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        let mut keyed: Vec<(u8, &str)> = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                let level = self.get(name).map_or(0, Location::infection_level);
                (level, name)
            })
            .collect();
        keyed.sort_by(|a, b| by_infection_level(*a, *b));
        keyed.into_iter().map(|(_, name)| name.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> LocationRegistry {
        LocationRegistry::new(vec![
            Location::new("Santiago", Category::Yellow).with_neighbors(["Lima"]),
            Location::new("San Francisco", Category::Blue).with_neighbors(["Tokyo"]),
            Location::new("Lima", Category::Yellow).with_neighbors(["Santiago"]),
            Location::new("Tokyo", Category::Red).with_neighbors(["San Francisco"]),
        ])
        .unwrap()
    }

    #[test]
    fn prefix_lookup_is_case_insensitive() {
        let reg = registry();
        assert_eq!(reg.get_by_prefix("tok").unwrap().name(), "Tokyo");
        assert_eq!(reg.get_by_prefix("LI").unwrap().name(), "Lima");
    }

    #[test]
    fn prefix_lookup_reports_ambiguity_and_absence() {
        let reg = registry();
        match reg.get_by_prefix("sa") {
            Err(DeckError::Ambiguous { matches, .. }) => {
                assert_eq!(matches, vec!["Santiago", "San Francisco"]);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
        assert!(matches!(
            reg.get_by_prefix("zz"),
            Err(DeckError::NotFound { .. })
        ));
    }

    #[test]
    fn exact_lookup_is_case_sensitive() {
        let reg = registry();
        assert!(reg.get("Lima").is_ok());
        assert!(matches!(reg.get("lima"), Err(DeckError::NotFound { .. })));
        assert_eq!(reg.resolve("lima").unwrap().name(), "Lima");
    }

    #[test]
    fn category_filter_keeps_catalog_order() {
        let reg = registry();
        let yellow: Vec<&str> = reg
            .with_category(Category::Yellow)
            .into_iter()
            .map(Location::name)
            .collect();
        assert_eq!(yellow, vec!["Santiago", "Lima"]);
    }

    #[test]
    fn sort_puts_highest_level_first_then_name() {
        let mut reg = registry();
        reg.get_mut("Tokyo").unwrap().set_infection_level(2);
        reg.get_mut("Lima").unwrap().set_infection_level(2);
        reg.get_mut("Santiago").unwrap().set_infection_level(3);
        let sorted = reg.sort_by_infection_level(&["Tokyo", "San Francisco", "Lima", "Santiago"]);
        assert_eq!(sorted, vec!["Santiago", "Lima", "Tokyo", "San Francisco"]);
    }

    #[test]
    fn comparator_is_pure() {
        assert_eq!(by_infection_level((3, "b"), (1, "a")), Ordering::Less);
        assert_eq!(by_infection_level((1, "a"), (1, "b")), Ordering::Less);
        assert_eq!(by_infection_level((1, "a"), (1, "a")), Ordering::Equal);
    }

    #[test]
    fn infect_stops_at_max_and_signals_overflow() {
        let mut location = Location::new("Lima", Category::Yellow);
        assert!(!location.infect());
        assert!(!location.infect());
        assert!(!location.infect());
        assert_eq!(location.infection_level(), 3);
        assert!(location.infect());
        assert_eq!(location.infection_level(), 3);
    }

    #[test]
    fn validation_rejects_bad_catalogs() {
        let dup = LocationRegistry::new(vec![
            Location::new("Lima", Category::Yellow),
            Location::new("Lima", Category::Yellow),
        ]);
        assert!(matches!(dup, Err(CatalogError::DuplicateName(_))));

        let orphan = LocationRegistry::new(vec![
            Location::new("Lima", Category::Yellow).with_neighbors(["Atlantis"]),
        ]);
        assert!(matches!(orphan, Err(CatalogError::UnknownNeighbor { .. })));

        assert!(matches!(
            LocationRegistry::new(Vec::new()),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn default_catalog_has_symmetric_adjacency() {
        let reg = LocationRegistry::default_catalog();
        assert_eq!(reg.len(), 48);
        for category in [Category::Yellow, Category::Red, Category::Black, Category::Blue] {
            assert_eq!(reg.with_category(category).len(), 12, "{category}");
        }
        for location in reg.iter() {
            for neighbor in location.neighbors() {
                let other = reg.get(neighbor).unwrap();
                assert!(
                    other.is_adjacent(location.name()),
                    "{} -> {} is one-way",
                    location.name(),
                    neighbor
                );
            }
        }
    }

    #[test]
    fn category_keys_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_key(category.key()), Some(category));
        }
        assert_eq!(Category::from_key(" BLUE "), Some(Category::Blue));
        assert_eq!(Category::from_key("green"), None);
    }
}
