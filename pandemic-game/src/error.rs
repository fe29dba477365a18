//! Error types shared by every deck and session operation.
use thiserror::Error;

/// Recoverable failures reported back to the command layer.
///
/// None of these leave partial state behind: every operation validates
/// before it mutates.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeckError {
    #[error("no location named {name} in the {collection}")]
    NotFound {
        name: String,
        collection: &'static str,
    },
    #[error("'{prefix}' is ambiguous: matches {}", matches.join(", "))]
    Ambiguous { prefix: String, matches: Vec<String> },
    #[error("{name} has already been drawn from the {deck}")]
    DuplicateDraw { name: String, deck: &'static str },
    #[error("already drawn {drawn} of {total} shock markers this game, there shouldn't be any more")]
    Exhausted { drawn: usize, total: usize },
    #[error("{name} is already quarantined")]
    AlreadySet { name: String },
    #[error("{name} is not quarantined")]
    NotSet { name: String },
    #[error("infection level {level} is out of range (0..={max})")]
    InvalidLevel { level: u8, max: u8 },
    #[error("infection rate must be at least 1 (got {rate})")]
    InvalidRate { rate: u8 },
}

impl DeckError {
    pub(crate) fn not_found(name: impl Into<String>, collection: &'static str) -> Self {
        Self::NotFound {
            name: name.into(),
            collection,
        }
    }

    pub(crate) fn duplicate(name: impl Into<String>, deck: &'static str) -> Self {
        Self::DuplicateDraw {
            name: name.into(),
            deck,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_location() {
        let err = DeckError::not_found("Atlantis", "catalog");
        assert_eq!(err.to_string(), "no location named Atlantis in the catalog");

        let err = DeckError::Ambiguous {
            prefix: "sa".into(),
            matches: vec!["San Francisco".into(), "Santiago".into()],
        };
        assert_eq!(
            err.to_string(),
            "'sa' is ambiguous: matches San Francisco, Santiago"
        );
    }
}
