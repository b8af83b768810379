use anchor_lang::prelude::*;

use crate::error::CompetitionError;
use crate::state::{Competition, InstantWinRecord, WinnerRecord};

pub const STATE_DOCUMENT_VERSION: u8 = 3;

/// Everything the persistence collaborator loads at startup and rewrites
/// after each mutation.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct StateDocument {
    pub version: u8,
    pub competitions: Vec<Competition>,
    pub winners: Vec<WinnerRecord>,
    pub instant_wins: Vec<InstantWinRecord>,
}

impl Default for StateDocument {
    fn default() -> Self {
        Self {
            version: STATE_DOCUMENT_VERSION,
            competitions: Vec::new(),
            winners: Vec::new(),
            instant_wins: Vec::new(),
        }
    }
}

impl StateDocument {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.serialize(&mut bytes).map_err(|e| {
            msg!("State document encoding failed: {}", e);
            CompetitionError::StorageFailed
        })?;
        Ok(bytes)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let document = Self::try_from_slice(bytes).map_err(|e| {
            msg!("State document decoding failed: {}", e);
            CompetitionError::CorruptStateDocument
        })?;
        require!(
            document.version == STATE_DOCUMENT_VERSION,
            CompetitionError::CorruptStateDocument
        );
        Ok(document)
    }
}
