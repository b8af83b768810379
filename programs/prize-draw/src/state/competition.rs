use anchor_lang::prelude::*;

use crate::error::CompetitionError;
use crate::state::{InstantWinRecord, Settings, TicketEntry, MIN_DRAW_THRESHOLD};

/// Administrative input for creating or editing a competition.
///
/// Amounts are pence. `ticket_limit == 0` means unlimited, `draw_threshold`
/// falls back to [`Settings::default_draw_threshold`] and a blank category to
/// [`Settings::default_category`].
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CompetitionConfig {
    pub name: String,
    pub category: String,
    pub image_ref: String,
    pub external_payment_ref: String,
    pub ticket_price: u64,
    pub ticket_limit: u64,
    pub draw_threshold: Option<u64>,
    /// Unix milliseconds after which no ticket is accepted
    pub expiry: Option<i64>,
    pub instant_prize_pool: Vec<String>,
}

impl CompetitionConfig {
    pub fn new(name: impl Into<String>, ticket_price: u64) -> Self {
        Self {
            name: name.into(),
            ticket_price,
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn image_ref(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = image_ref.into();
        self
    }

    pub fn external_payment_ref(mut self, payment_ref: impl Into<String>) -> Self {
        self.external_payment_ref = payment_ref.into();
        self
    }

    pub fn ticket_price(mut self, pence: u64) -> Self {
        self.ticket_price = pence;
        self
    }

    pub fn ticket_limit(mut self, limit: u64) -> Self {
        self.ticket_limit = limit;
        self
    }

    pub fn draw_threshold(mut self, pence: u64) -> Self {
        self.draw_threshold = Some(pence);
        self
    }

    pub fn expiry(mut self, expiry: i64) -> Self {
        self.expiry = Some(expiry);
        self
    }

    pub fn instant_prizes<I, S>(mut self, prizes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instant_prize_pool = prizes.into_iter().map(Into::into).collect();
        self
    }

    /// Trims text fields, fills defaults and checks field constraints in
    /// declaration order, failing on the first violation.
    pub fn normalize(&self, settings: &Settings) -> Result<CompetitionConfig> {
        let name = self.name.trim().to_string();
        require!(!name.is_empty(), CompetitionError::CompetitionNameRequired);
        require!(self.ticket_price > 0, CompetitionError::TicketPriceNotPositive);

        let draw_threshold = self
            .draw_threshold
            .unwrap_or(settings.default_draw_threshold);
        require!(
            draw_threshold >= MIN_DRAW_THRESHOLD,
            CompetitionError::DrawThresholdTooLow
        );

        let category = match self.category.trim() {
            "" => settings.default_category.clone(),
            category => category.to_string(),
        };

        Ok(CompetitionConfig {
            name,
            category,
            image_ref: self.image_ref.trim().to_string(),
            external_payment_ref: self.external_payment_ref.trim().to_string(),
            ticket_price: self.ticket_price,
            ticket_limit: self.ticket_limit,
            draw_threshold: Some(draw_threshold),
            expiry: self.expiry,
            instant_prize_pool: self
                .instant_prize_pool
                .iter()
                .map(|prize| prize.trim())
                .filter(|prize| !prize.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }
}

/// A repeating prize draw: configuration plus the state of its current round.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Competition {
    pub id: String,
    pub name: String,
    pub category: String,
    pub image_ref: String,
    pub external_payment_ref: String,
    pub ticket_price: u64,
    pub ticket_limit: u64,
    pub draw_threshold: u64,
    pub expiry: Option<i64>,
    pub created_at: i64,
    /// Remaining instant prizes; entries are removed as they are won
    pub instant_prize_pool: Vec<String>,
    pub round: u64,
    pub funds_collected: u64,
    pub tickets_sold_in_round: u64,
    pub ticket_log: Vec<TicketEntry>,
    /// Survives draws
    pub instant_win_log: Vec<InstantWinRecord>,
}

impl Competition {
    /// Builds a round-one competition from an already normalized config.
    pub(crate) fn open(id: String, config: CompetitionConfig, created_at: i64) -> Self {
        let mut competition = Self {
            id,
            name: String::new(),
            category: String::new(),
            image_ref: String::new(),
            external_payment_ref: String::new(),
            ticket_price: 0,
            ticket_limit: 0,
            draw_threshold: 0,
            expiry: None,
            created_at,
            instant_prize_pool: Vec::new(),
            round: 1,
            funds_collected: 0,
            tickets_sold_in_round: 0,
            ticket_log: Vec::new(),
            instant_win_log: Vec::new(),
        };
        competition.apply_config(config);
        competition
    }

    /// Overwrites configuration fields only; round state is left alone.
    pub(crate) fn apply_config(&mut self, config: CompetitionConfig) {
        self.name = config.name;
        self.category = config.category;
        self.image_ref = config.image_ref;
        self.external_payment_ref = config.external_payment_ref;
        self.ticket_price = config.ticket_price;
        self.ticket_limit = config.ticket_limit;
        self.draw_threshold = config.draw_threshold.unwrap_or(self.draw_threshold);
        self.expiry = config.expiry;
        self.instant_prize_pool = config.instant_prize_pool;
    }

    /// The current configuration, as a starting point for an edit.
    pub fn config(&self) -> CompetitionConfig {
        CompetitionConfig {
            name: self.name.clone(),
            category: self.category.clone(),
            image_ref: self.image_ref.clone(),
            external_payment_ref: self.external_payment_ref.clone(),
            ticket_price: self.ticket_price,
            ticket_limit: self.ticket_limit,
            draw_threshold: Some(self.draw_threshold),
            expiry: self.expiry,
            instant_prize_pool: self.instant_prize_pool.clone(),
        }
    }

    pub fn is_ended(&self, now: i64) -> bool {
        matches!(self.expiry, Some(expiry) if now >= expiry)
    }

    pub fn is_sold_out(&self) -> bool {
        self.ticket_limit > 0 && self.tickets_sold_in_round >= self.ticket_limit
    }

    /// Milliseconds left before expiry, `Some(0)` once ended, `None` without expiry.
    pub fn time_remaining(&self, now: i64) -> Option<i64> {
        self.expiry.map(|expiry| expiry.saturating_sub(now).max(0))
    }

    pub fn has_instant_prizes(&self) -> bool {
        !self.instant_prize_pool.is_empty()
    }
}
