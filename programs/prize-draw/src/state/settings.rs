use anchor_lang::prelude::*;

use crate::error::CompetitionError;

/// Chance that an accepted ticket wins an instant prize, when prizes remain.
pub const INSTANT_WIN_CHANCE: f64 = 0.06;
/// Draw threshold applied when a competition leaves it unset: 1000.00.
pub const DEFAULT_DRAW_THRESHOLD: u64 = 100_000;
/// Lowest accepted draw threshold: 1.00.
pub const MIN_DRAW_THRESHOLD: u64 = 100;
pub const DEFAULT_CATEGORY: &str = "Other";
pub const ADMIN_PASSWORD_DEFAULT: &str = "admin123";

/// Engine-wide tunables shared by every competition in a registry.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq)]
pub struct Settings {
    pub instant_win_chance: f64,
    pub default_draw_threshold: u64,
    pub default_category: String,
    pub admin_password: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            instant_win_chance: INSTANT_WIN_CHANCE,
            default_draw_threshold: DEFAULT_DRAW_THRESHOLD,
            default_category: DEFAULT_CATEGORY.to_string(),
            admin_password: ADMIN_PASSWORD_DEFAULT.to_string(),
        }
    }
}

impl Settings {
    pub fn with_instant_win_chance(mut self, chance: f64) -> Self {
        self.instant_win_chance = chance;
        self
    }

    pub fn with_default_draw_threshold(mut self, pence: u64) -> Self {
        self.default_draw_threshold = pence;
        self
    }

    pub fn with_default_category(mut self, category: impl Into<String>) -> Self {
        self.default_category = category.into();
        self
    }

    pub fn with_admin_password(mut self, password: impl Into<String>) -> Self {
        self.admin_password = password.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        require!(
            self.instant_win_chance.is_finite()
                && (0.0..=1.0).contains(&self.instant_win_chance),
            CompetitionError::InvalidInstantWinChance
        );
        require!(
            self.default_draw_threshold >= MIN_DRAW_THRESHOLD,
            CompetitionError::DrawThresholdTooLow
        );
        Ok(())
    }
}
