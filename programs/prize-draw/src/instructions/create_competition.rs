use anchor_lang::prelude::*;

use crate::state::{Competition, CompetitionConfig, Settings};

/// Event emitted when a competition is created
#[event]
pub struct CompetitionCreated {
    /// The id assigned to the competition
    pub competition_id: String,
    pub name: String,
    /// Price per ticket in pence
    pub ticket_price: u64,
    /// Funds in pence that trigger the main draw
    pub draw_threshold: u64,
    /// 0 means unlimited
    pub ticket_limit: u64,
    pub created_at: i64,
}

/// Builds a new round-one competition.
///
/// # Arguments
/// * `config` - Administrative input, validated and normalized here
/// * `settings` - Supplies the default threshold and category
/// * `id` - Fresh identifier chosen by the registry
/// * `now` - Creation time in Unix milliseconds
///
/// # Errors
/// - `CompetitionNameRequired` if the trimmed name is empty
/// - `TicketPriceNotPositive` if the ticket price is zero
/// - `DrawThresholdTooLow` if the threshold is below 1.00
pub fn create_competition(
    config: &CompetitionConfig,
    settings: &Settings,
    id: String,
    now: i64,
) -> Result<Competition> {
    let config = config.normalize(settings)?;
    let competition = Competition::open(id, config, now);

    msg!(
        "Competition {} created: {} at {}p per ticket",
        competition.id,
        competition.name,
        competition.ticket_price
    );
    emit!(CompetitionCreated {
        competition_id: competition.id.clone(),
        name: competition.name.clone(),
        ticket_price: competition.ticket_price,
        draw_threshold: competition.draw_threshold,
        ticket_limit: competition.ticket_limit,
        created_at: now,
    });

    Ok(competition)
}
