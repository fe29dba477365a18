//! Centralized rule and tuning constants for the deck model.
//!
//! These values define the deterministic math behind every probability the
//! tracker reports. Keeping them together means the numbers can only change
//! through reviewed code, never through a save file.

// Deck setup ---------------------------------------------------------------
pub const DEFAULT_SHOCK_MARKERS: u8 = 5;
pub const DEFAULT_INFECTION_RATE: u8 = 2;

// Infection levels ---------------------------------------------------------
pub const MAX_INFECTION_LEVEL: u8 = 3;

// Probability --------------------------------------------------------------
/// Number of city-deck draws considered jointly when estimating shock risk.
pub(crate) const SHOCK_DRAW_WINDOW: f64 = 2.0;
/// Probabilities strictly above this render in the critical tier.
pub const CRITICAL_PROBABILITY: f64 = 0.8;

// Logging targets ----------------------------------------------------------
pub(crate) const LOG_TARGET_DECK: &str = "pandemic::deck";
pub(crate) const LOG_TARGET_SESSION: &str = "pandemic::session";
