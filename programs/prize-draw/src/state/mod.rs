pub use competition::*;
pub use document::*;
pub use instant_win::*;
pub use settings::*;
pub use ticket::*;
pub use winner::*;

pub mod competition;
pub mod document;
pub mod instant_win;
pub mod settings;
pub mod ticket;
pub mod winner;
