use anchor_lang::prelude::*;

/// A prize removed from a competition's instant prize pool.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct InstantWinRecord {
    /// Unix milliseconds
    pub timestamp: i64,
    pub competition_id: String,
    pub buyer_name: String,
    pub prize: String,
    pub round: u64,
}
