use anchor_lang::prelude::*;

/// A main-draw result. Immutable once appended to the result log.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct WinnerRecord {
    /// Unix milliseconds
    pub timestamp: i64,
    pub competition_id: String,
    pub competition_name: String,
    pub winner_name: String,
    pub round: u64,
    /// Pence collected in the round when the draw fired
    pub funds_collected_at_draw: u64,
}
