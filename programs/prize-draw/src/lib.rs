//! Threshold-triggered prize draws.
//!
//! Buyers purchase tickets for a competition; once the money collected in a
//! round reaches the competition's draw threshold a winner is drawn from that
//! round's tickets and a new round starts. Each accepted ticket may also win a
//! prize from the competition's finite instant prize pool.
//!
//! [`CompetitionRegistry`] is the entry point for callers. The decision logic
//! lives in [`instructions`] as plain functions over [`state::Competition`].

pub mod admin;
pub mod error;
pub mod instructions;
pub mod random;
pub mod registry;
pub mod result_log;
pub mod state;
pub mod store;
pub mod utils;

pub use admin::AdminGate;
pub use error::{error_kind, CompetitionError, ErrorKind};
pub use instructions::PurchaseOutcome;
pub use random::{OsRandom, RandomSource, SeededRandom};
pub use registry::{CompetitionRegistry, FilteredCompetitions};
pub use result_log::{CsvWinnerRow, ResultLog};
pub use state::{
    Competition, CompetitionConfig, InstantWinRecord, Settings, StateDocument, TicketEntry,
    WinnerRecord,
};
pub use store::{FileStore, MemoryStore, Store};
