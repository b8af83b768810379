use anchor_lang::prelude::*;

use crate::random::RandomSource;
use crate::state::{Competition, InstantWinRecord};

/// Event emitted when a purchase wins an instant prize
#[event]
pub struct InstantPrizeAwarded {
    pub competition_id: String,
    pub buyer_name: String,
    pub prize: String,
    pub round: u64,
    /// Prizes left in the pool after this award
    pub prizes_remaining: u64,
}

/// Runs the instant-win sub-lottery for one accepted purchase.
///
/// With a non-empty pool, a uniform draw at or below `chance` removes one
/// uniformly chosen prize from the pool and records it against the buyer.
/// A chance of zero never awards. The pool is never replenished here.
pub fn evaluate_instant_win(
    competition: &mut Competition,
    buyer_name: &str,
    chance: f64,
    now: i64,
    random: &dyn RandomSource,
) -> Result<Option<InstantWinRecord>> {
    if !competition.has_instant_prizes() || chance <= 0.0 {
        return Ok(None);
    }
    if random.unit() > chance {
        return Ok(None);
    }

    let index = random.below(competition.instant_prize_pool.len() as u64)? as usize;
    let prize = competition.instant_prize_pool.remove(index);

    let record = InstantWinRecord {
        timestamp: now,
        competition_id: competition.id.clone(),
        buyer_name: buyer_name.to_string(),
        prize,
        round: competition.round,
    };
    competition.instant_win_log.push(record.clone());

    msg!(
        "Instant win on {}: {} won {}",
        competition.id,
        record.buyer_name,
        record.prize
    );
    emit!(InstantPrizeAwarded {
        competition_id: competition.id.clone(),
        buyer_name: record.buyer_name.clone(),
        prize: record.prize.clone(),
        round: record.round,
        prizes_remaining: competition.instant_prize_pool.len() as u64,
    });

    Ok(Some(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::create_competition;
    use crate::random::SeededRandom;
    use crate::state::{CompetitionConfig, Settings};

    fn competition_with_prizes(prizes: &[&str]) -> Competition {
        let config = CompetitionConfig::new("Cash", 100).instant_prizes(prizes.iter().copied());
        create_competition(&config, &Settings::default(), "c".to_string(), 0).unwrap()
    }

    #[test]
    fn certain_chance_drains_pool_one_prize_at_a_time() {
        let mut competition = competition_with_prizes(&["A", "B", "C"]);
        let random = SeededRandom::new(3);

        let mut awarded = Vec::new();
        for step in 0..5 {
            let before = competition.instant_prize_pool.len();
            let win = evaluate_instant_win(&mut competition, "Ann", 1.0, step, &random).unwrap();
            match win {
                Some(record) => {
                    assert_eq!(competition.instant_prize_pool.len(), before - 1);
                    awarded.push(record.prize);
                }
                None => assert_eq!(before, 0),
            }
        }

        awarded.sort();
        assert_eq!(awarded, vec!["A", "B", "C"]);
        assert!(competition.instant_prize_pool.is_empty());
        assert_eq!(competition.instant_win_log.len(), 3);
    }

    #[test]
    fn zero_chance_never_awards() {
        let mut competition = competition_with_prizes(&["A"]);
        let random = SeededRandom::new(5);
        for step in 0..1_000 {
            assert!(evaluate_instant_win(&mut competition, "Ann", 0.0, step, &random)
                .unwrap()
                .is_none());
        }
        assert_eq!(competition.instant_prize_pool.len(), 1);
    }

    #[test]
    fn empirical_rate_converges_to_chance() {
        let random = SeededRandom::new(2024);
        let trials = 20_000;
        let mut wins = 0;
        for step in 0..trials {
            let mut competition = competition_with_prizes(&["A", "B"]);
            if evaluate_instant_win(&mut competition, "Ann", 0.06, step, &random)
                .unwrap()
                .is_some()
            {
                wins += 1;
            }
        }
        let rate = wins as f64 / trials as f64;
        assert!((rate - 0.06).abs() < 0.01, "rate {}", rate);
    }
}
