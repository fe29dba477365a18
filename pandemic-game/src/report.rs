//! Read-only views over a session for renderers.
use serde::{Deserialize, Serialize};

use crate::error::DeckError;
use crate::location::Category;
use crate::probability::{Exposure, RiskTier, exposure_of};
use crate::session::GameSession;

/// Everything a renderer needs to draw one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationReport {
    pub name: String,
    pub category: Category,
    pub probability: f64,
    pub infection_level: u8,
    pub quarantined: bool,
    pub exposure: Exposure,
    pub tier: RiskTier,
    pub can_outbreak: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BandKind {
    Discard,
    Striation { index: usize },
}

/// One column of the board, most at-risk locations first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub kind: BandKind,
    pub members: Vec<LocationReport>,
}

impl Band {
    #[must_use]
    pub fn label(&self) -> String {
        match self.kind {
            BandKind::Discard => "Drawn".to_string(),
            BandKind::Striation { index } => format!("Striation {index}"),
        }
    }
}

/// Headline numbers for the status line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSummary {
    pub game_name: String,
    pub infection_rate: u8,
    pub outbreaks: u32,
    pub cards_dealt: usize,
    pub shock_markers_drawn: usize,
    pub shock_markers_total: usize,
    pub shock_probability: f64,
    pub mean_striation_size: f64,
}

impl GameSession {
    fn report_for(&self, name: &str) -> Result<LocationReport, DeckError> {
        let location = self.registry().get(name)?;
        let exposure = exposure_of(self, name);
        let probability = self.probability(name);
        Ok(LocationReport {
            name: location.name().to_string(),
            category: location.category(),
            probability,
            infection_level: location.infection_level(),
            quarantined: location.is_quarantined(),
            exposure,
            tier: RiskTier::classify(exposure, probability),
            can_outbreak: self.can_outbreak(name),
        })
    }

    /// Reports for the named locations, in the order requested.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::NotFound`] for the first unknown name.
    pub fn report<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<LocationReport>, DeckError> {
        names.iter().map(|n| self.report_for(n.as_ref())).collect()
    }

    /// Reports for every location, most at-risk first.
    #[must_use]
    pub fn report_all(&self) -> Vec<LocationReport> {
        let names: Vec<&str> = self.registry().names().collect();
        self.sorted_reports(&names)
    }

    fn sorted_reports<S: AsRef<str>>(&self, names: &[S]) -> Vec<LocationReport> {
        self.registry()
            .sort_by_infection_level(names)
            .iter()
            .filter_map(|name| self.report_for(name).ok())
            .collect()
    }

    /// Board columns, most recent first: the discard pile, then striation
    /// 0, 1, ... Empty bands are skipped.
    #[must_use]
    pub fn board(&self) -> Vec<Band> {
        let deck = self.infection_deck();
        let mut bands = Vec::with_capacity(deck.striations().len() + 1);
        if !deck.drawn().is_empty() {
            bands.push(Band {
                kind: BandKind::Discard,
                members: self.sorted_reports(deck.drawn()),
            });
        }
        for (index, striation) in deck.striations().iter().enumerate() {
            if striation.is_empty() {
                continue;
            }
            bands.push(Band {
                kind: BandKind::Striation { index },
                members: self.sorted_reports(&striation.members()),
            });
        }
        bands
    }

    #[must_use]
    pub fn summary(&self) -> BoardSummary {
        let city = self.city_deck();
        BoardSummary {
            game_name: self.game_name().to_string(),
            infection_rate: self.infection_rate(),
            outbreaks: self.outbreaks(),
            cards_dealt: city.drawn_count(),
            shock_markers_drawn: city.shock_markers_drawn(),
            shock_markers_total: city.shock_marker_count(),
            shock_probability: city.probability_of_shock_this_draw(),
            mean_striation_size: self.infection_deck().mean_striation_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;

    fn session() -> GameSession {
        GameSession::with_default_catalog("report", SessionConfig::default()).unwrap()
    }

    #[test]
    fn board_lists_discards_then_bands() {
        let mut s = session();
        s.infect("Lima").unwrap();
        s.infect("Tokyo").unwrap();
        s.cause_shock("Lima").unwrap();
        s.infect("Paris").unwrap();

        let board = s.board();
        let labels: Vec<String> = board.iter().map(Band::label).collect();
        assert_eq!(labels, vec!["Drawn", "Striation 0", "Striation 1"]);
        let bottom: Vec<&str> = board[1].members.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(bottom, vec!["Lima", "Tokyo"]);
        assert_eq!(board[2].members.len(), 45);
        assert!(board[2].members.iter().all(|r| r.tier == RiskTier::Safe));
    }

    #[test]
    fn report_preserves_requested_order_and_flags_unknowns() {
        let s = session();
        let reports = s.report(&["Tokyo", "Lima"]).unwrap();
        assert_eq!(reports[0].name, "Tokyo");
        assert_eq!(reports[1].name, "Lima");
        assert!(matches!(
            s.report(&["Atlantis"]),
            Err(DeckError::NotFound { .. })
        ));
    }

    #[test]
    fn report_all_sorts_by_infection_level() {
        let mut s = session();
        s.set_infection_level("Tokyo", 2).unwrap();
        s.set_infection_level("Lima", 3).unwrap();
        let all = s.report_all();
        assert_eq!(all.len(), 48);
        assert_eq!(all[0].name, "Lima");
        assert_eq!(all[1].name, "Tokyo");
        assert_eq!(all[2].name, "Algiers");
    }

    #[test]
    fn summary_tracks_deck_progress() {
        let mut s = session();
        s.draw_city_card("Essen").unwrap();
        let summary = s.summary();
        assert_eq!(summary.cards_dealt, 1);
        assert_eq!(summary.shock_markers_total, 5);
        assert!((summary.mean_striation_size - 48.0).abs() < f64::EPSILON);
        // 53 cards, 10 per phase, one dealt
        assert!((summary.shock_probability - 2.0 / 9.0).abs() < 1e-12);
    }
}
