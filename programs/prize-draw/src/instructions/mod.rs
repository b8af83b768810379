pub use create_competition::*;
pub use draw_winner::*;
pub use instant_win::*;
pub use submit_purchase::*;
pub use update_competition::*;

pub mod create_competition;
pub mod draw_winner;
pub mod instant_win;
pub mod submit_purchase;
pub mod update_competition;
