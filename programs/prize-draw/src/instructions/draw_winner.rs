use anchor_lang::prelude::*;

use crate::error::CompetitionError;
use crate::random::RandomSource;
use crate::state::{Competition, WinnerRecord};

/// Event emitted when a main draw fires
#[event]
pub struct WinnerDrawn {
    pub competition_id: String,
    pub winner_name: String,
    /// The round that was drawn
    pub round: u64,
    /// Pence collected in the drawn round
    pub funds_collected: u64,
    pub tickets_in_round: u64,
}

/// Draws the main winner once funds reach the threshold, then opens the next round.
///
/// Only tickets stamped with the current round are eligible. Every ticket in
/// the log carries the current round today because the log is cleared on
/// each draw; the filter keeps the draw correct should older rounds ever be
/// retained.
///
/// After a draw:
/// - `round` is incremented
/// - `funds_collected` and `tickets_sold_in_round` are zero
/// - `ticket_log` is empty
/// - the instant prize pool and instant win log are untouched
///
/// Returns `None` when the threshold is not met or no ticket is eligible.
pub fn draw_winner(
    competition: &mut Competition,
    now: i64,
    random: &dyn RandomSource,
) -> Result<Option<WinnerRecord>> {
    if competition.funds_collected < competition.draw_threshold {
        return Ok(None);
    }

    let round = competition.round;
    let pool: Vec<_> = competition
        .ticket_log
        .iter()
        .filter(|ticket| ticket.round == round)
        .collect();
    if pool.is_empty() {
        msg!("Competition {} reached its threshold with no tickets", competition.id);
        return Ok(None);
    }

    let index = random.below(pool.len() as u64)? as usize;
    let tickets_in_round = pool.len() as u64;
    let record = WinnerRecord {
        timestamp: now,
        competition_id: competition.id.clone(),
        competition_name: competition.name.clone(),
        winner_name: pool[index].buyer_name.clone(),
        round,
        funds_collected_at_draw: competition.funds_collected,
    };

    competition.round = round.checked_add(1).ok_or(CompetitionError::Overflow)?;
    competition.funds_collected = 0;
    competition.tickets_sold_in_round = 0;
    competition.ticket_log.clear();

    msg!(
        "Winner drawn for {} round {}: {}",
        record.competition_name,
        record.round,
        record.winner_name
    );
    emit!(WinnerDrawn {
        competition_id: record.competition_id.clone(),
        winner_name: record.winner_name.clone(),
        round: record.round,
        funds_collected: record.funds_collected_at_draw,
        tickets_in_round,
    });

    Ok(Some(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::create_competition;
    use crate::random::SeededRandom;
    use crate::state::{CompetitionConfig, Settings, TicketEntry};

    fn ticket(buyer: &str, round: u64) -> TicketEntry {
        TicketEntry {
            buyer_name: buyer.to_string(),
            timestamp: 0,
            reference: format!("T-{}", buyer),
            round,
        }
    }

    fn competition_at_threshold() -> Competition {
        let config = CompetitionConfig::new("Cash", 100)
            .draw_threshold(200)
            .instant_prizes(["Mug"]);
        let mut competition =
            create_competition(&config, &Settings::default(), "c".to_string(), 0).unwrap();
        competition.round = 2;
        competition.funds_collected = 200;
        competition.tickets_sold_in_round = 2;
        competition.ticket_log = vec![ticket("Old", 1), ticket("Ann", 2), ticket("Ben", 2)];
        competition
    }

    #[test]
    fn below_threshold_is_a_no_op() {
        let mut competition = competition_at_threshold();
        competition.funds_collected = 199;
        let before = competition.clone();

        let outcome = draw_winner(&mut competition, 10, &SeededRandom::new(1)).unwrap();
        assert!(outcome.is_none());
        assert_eq!(competition, before);
    }

    #[test]
    fn only_current_round_tickets_can_win() {
        for seed in 0..50 {
            let mut competition = competition_at_threshold();
            let record = draw_winner(&mut competition, 10, &SeededRandom::new(seed))
                .unwrap()
                .unwrap();
            assert!(record.winner_name == "Ann" || record.winner_name == "Ben");
            assert_eq!(record.round, 2);
            assert_eq!(record.funds_collected_at_draw, 200);
        }
    }

    #[test]
    fn resets_round_state_but_keeps_instant_prizes() {
        let mut competition = competition_at_threshold();
        draw_winner(&mut competition, 10, &SeededRandom::new(9)).unwrap();

        assert_eq!(competition.round, 3);
        assert_eq!(competition.funds_collected, 0);
        assert_eq!(competition.tickets_sold_in_round, 0);
        assert!(competition.ticket_log.is_empty());
        assert_eq!(competition.instant_prize_pool, vec!["Mug".to_string()]);
    }

    #[test]
    fn empty_pool_does_not_draw() {
        let mut competition = competition_at_threshold();
        competition.ticket_log = vec![ticket("Old", 1)];
        let outcome = draw_winner(&mut competition, 10, &SeededRandom::new(1)).unwrap();
        assert!(outcome.is_none());
        assert_eq!(competition.round, 2);
    }
}
