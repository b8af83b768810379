use anchor_lang::error::{Error, ERROR_CODE_OFFSET};
use anchor_lang::error_code;

#[error_code]
pub enum CompetitionError {
    Overflow,
    #[msg("Competition name must not be empty")]
    CompetitionNameRequired,
    #[msg("Ticket price must be greater than zero")]
    TicketPriceNotPositive,
    #[msg("Draw threshold must be at least 1.00")]
    DrawThresholdTooLow,
    #[msg("Amount must be a finite, non-negative number")]
    InvalidAmount,
    #[msg("Instant win chance must be between 0 and 1")]
    InvalidInstantWinChance,
    #[msg("Competition not found")]
    CompetitionNotFound,
    #[msg("Buyer name must not be empty")]
    BuyerNameRequired,
    #[msg("This competition has ended")]
    CompetitionEnded,
    #[msg("This competition is sold out")]
    CompetitionSoldOut,
    #[msg("Wrong admin password")]
    AdminPasswordRejected,
    #[msg("Persisting competition state failed")]
    StorageFailed,
    #[msg("Stored competition state could not be decoded")]
    CorruptStateDocument,
    #[msg("Winner CSV is malformed")]
    MalformedCsv,
    #[msg("Ticket price cannot change while the current round has tickets")]
    TicketPriceLockedForRound,
    #[msg("Ticket limit is below the tickets already sold this round")]
    TicketLimitBelowSold,
}

/// Coarse classification callers use to pick a user-facing response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Creation or update input violates a field constraint.
    InvalidConfig,
    /// The referenced competition id is unknown.
    NotFound,
    /// A purchase was rejected: ended, sold out or no buyer name.
    Ineligible,
    /// The admin gate refused the supplied password.
    Unauthorized,
    /// Arithmetic, persistence or decoding failures.
    Internal,
}

const ALL_ERRORS: [CompetitionError; 16] = [
    CompetitionError::Overflow,
    CompetitionError::CompetitionNameRequired,
    CompetitionError::TicketPriceNotPositive,
    CompetitionError::DrawThresholdTooLow,
    CompetitionError::InvalidAmount,
    CompetitionError::InvalidInstantWinChance,
    CompetitionError::CompetitionNotFound,
    CompetitionError::BuyerNameRequired,
    CompetitionError::CompetitionEnded,
    CompetitionError::CompetitionSoldOut,
    CompetitionError::AdminPasswordRejected,
    CompetitionError::StorageFailed,
    CompetitionError::CorruptStateDocument,
    CompetitionError::MalformedCsv,
    CompetitionError::TicketPriceLockedForRound,
    CompetitionError::TicketLimitBelowSold,
];

impl CompetitionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompetitionError::CompetitionNameRequired
            | CompetitionError::TicketPriceNotPositive
            | CompetitionError::DrawThresholdTooLow
            | CompetitionError::InvalidAmount
            | CompetitionError::InvalidInstantWinChance
            | CompetitionError::TicketPriceLockedForRound
            | CompetitionError::TicketLimitBelowSold => ErrorKind::InvalidConfig,
            CompetitionError::CompetitionNotFound => ErrorKind::NotFound,
            CompetitionError::BuyerNameRequired
            | CompetitionError::CompetitionEnded
            | CompetitionError::CompetitionSoldOut => ErrorKind::Ineligible,
            CompetitionError::AdminPasswordRejected => ErrorKind::Unauthorized,
            CompetitionError::Overflow
            | CompetitionError::StorageFailed
            | CompetitionError::CorruptStateDocument
            | CompetitionError::MalformedCsv => ErrorKind::Internal,
        }
    }

    /// Recovers the variant behind an anchor error raised by this crate.
    pub fn from_error(err: &Error) -> Option<CompetitionError> {
        let code = match err {
            Error::AnchorError(anchor_error) => anchor_error.error_code_number,
            Error::ProgramError(_) => return None,
        };
        let index = code.checked_sub(ERROR_CODE_OFFSET)? as usize;
        ALL_ERRORS
            .get(index)
            .copied()
            .filter(|variant| u32::from(*variant) == code)
    }
}

/// Classifies an error returned by any engine or registry operation.
pub fn error_kind(err: &Error) -> Option<ErrorKind> {
    CompetitionError::from_error(err).map(|variant| variant.kind())
}
