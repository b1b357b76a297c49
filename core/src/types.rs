//! Shared primitive types used across the entire report pipeline.

/// Identifier of a single played map (one row of the `matches` table).
pub type MatchId = String;

/// Team identity as written by the normalizer.
pub type TeamName = String;

/// Player handle as written by the normalizer.
pub type PlayerName = String;

/// Number of a round inside a match, starting at 1.
pub type RoundNumber = u32;
