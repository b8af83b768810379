use anchor_lang::prelude::*;

use crate::error::CompetitionError;
use crate::state::{Competition, CompetitionConfig, Settings};

/// Event emitted when a competition's configuration is edited
#[event]
pub struct CompetitionUpdated {
    pub competition_id: String,
    pub name: String,
    pub ticket_price: u64,
    pub draw_threshold: u64,
    pub ticket_limit: u64,
    /// Instant prizes left after the edit
    pub instant_prizes: u64,
}

/// Returns `competition` with its configuration replaced by `config`.
///
/// Round number, funds, ticket count and both logs are carried over untouched;
/// an edit is also the only way to refill the instant prize pool.
///
/// # Errors
/// Besides the field checks of [`CompetitionConfig::normalize`], an edit is
/// rejected when it would break the current round's accounting: the price is
/// frozen once the round has tickets, and a non-zero limit may not drop below
/// the tickets already sold.
pub fn update_competition(
    competition: &Competition,
    config: &CompetitionConfig,
    settings: &Settings,
) -> Result<Competition> {
    let config = config.normalize(settings)?;

    let sold = competition.tickets_sold_in_round;
    require!(
        sold == 0 || config.ticket_price == competition.ticket_price,
        CompetitionError::TicketPriceLockedForRound
    );
    require!(
        config.ticket_limit == 0 || config.ticket_limit >= sold,
        CompetitionError::TicketLimitBelowSold
    );

    let mut updated = competition.clone();
    updated.apply_config(config);

    msg!("Competition {} updated", updated.id);
    emit!(CompetitionUpdated {
        competition_id: updated.id.clone(),
        name: updated.name.clone(),
        ticket_price: updated.ticket_price,
        draw_threshold: updated.draw_threshold,
        ticket_limit: updated.ticket_limit,
        instant_prizes: updated.instant_prize_pool.len() as u64,
    });

    Ok(updated)
}
