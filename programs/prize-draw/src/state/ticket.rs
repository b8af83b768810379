use anchor_lang::prelude::*;

/// One accepted ticket in the current round.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct TicketEntry {
    pub buyer_name: String,
    /// Unix milliseconds
    pub timestamp: i64,
    /// Human-displayable reference handed back to the buyer
    pub reference: String,
    /// Round the ticket was bought in
    pub round: u64,
}
