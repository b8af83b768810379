use anchor_lang::prelude::*;

use crate::error::CompetitionError;
use crate::instructions::{draw_winner, evaluate_instant_win};
use crate::random::RandomSource;
use crate::state::{Competition, InstantWinRecord, Settings, TicketEntry, WinnerRecord};
use crate::utils::to_base36;

/// Ticket references end in a number below this bound.
const REFERENCE_SUFFIX_RANGE: u64 = 1_000_000;

/// Event emitted when a ticket is accepted
#[event]
pub struct TicketPurchased {
    pub competition_id: String,
    pub buyer_name: String,
    pub reference: String,
    /// Round the ticket entered
    pub round: u64,
    /// Pence collected in the round including this ticket
    pub funds_collected: u64,
    pub tickets_sold_in_round: u64,
}

/// Everything a single accepted purchase produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PurchaseOutcome {
    /// The competition after the ticket, instant win and any draw
    pub competition: Competition,
    pub ticket_reference: String,
    pub instant_win: Option<InstantWinRecord>,
    pub winner: Option<WinnerRecord>,
}

/// Decides one ticket purchase against a snapshot of a competition.
///
/// # Arguments
/// * `competition` - Current state; never modified
/// * `buyer_name` - Name recorded on the ticket, trimmed
/// * `now` - Purchase time in Unix milliseconds
/// * `settings` - Supplies the instant win chance
/// * `random` - Entropy for the reference, instant win and draw
///
/// # Errors
/// Rejections leave the caller's state exactly as it was:
/// - `BuyerNameRequired` if the trimmed name is empty
/// - `CompetitionEnded` if an expiry is set and `now` has reached it
/// - `CompetitionSoldOut` if a ticket limit is set and already reached
///
/// # Implementation Notes
/// - Funds are pence, so accumulation is exact and uses checked arithmetic
/// - Instant win is evaluated before the main draw
/// - The main draw sees the round including the ticket just added
pub fn submit_purchase(
    competition: &Competition,
    buyer_name: &str,
    now: i64,
    settings: &Settings,
    random: &dyn RandomSource,
) -> Result<PurchaseOutcome> {
    let buyer_name = buyer_name.trim();
    require!(!buyer_name.is_empty(), CompetitionError::BuyerNameRequired);
    require!(!competition.is_ended(now), CompetitionError::CompetitionEnded);
    require!(!competition.is_sold_out(), CompetitionError::CompetitionSoldOut);

    let mut updated = competition.clone();

    let ticket_reference = format!(
        "T-{}-{}",
        to_base36(now.max(0) as u64),
        random.below(REFERENCE_SUFFIX_RANGE)?
    );
    updated.ticket_log.push(TicketEntry {
        buyer_name: buyer_name.to_string(),
        timestamp: now,
        reference: ticket_reference.clone(),
        round: updated.round,
    });
    updated.tickets_sold_in_round = updated
        .tickets_sold_in_round
        .checked_add(1)
        .ok_or(CompetitionError::Overflow)?;
    updated.funds_collected = updated
        .funds_collected
        .checked_add(updated.ticket_price)
        .ok_or(CompetitionError::Overflow)?;

    emit!(TicketPurchased {
        competition_id: updated.id.clone(),
        buyer_name: buyer_name.to_string(),
        reference: ticket_reference.clone(),
        round: updated.round,
        funds_collected: updated.funds_collected,
        tickets_sold_in_round: updated.tickets_sold_in_round,
    });

    let instant_win = evaluate_instant_win(
        &mut updated,
        buyer_name,
        settings.instant_win_chance,
        now,
        random,
    )?;
    let winner = draw_winner(&mut updated, now, random)?;

    Ok(PurchaseOutcome {
        competition: updated,
        ticket_reference,
        instant_win,
        winner,
    })
}
