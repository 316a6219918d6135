//! Domain types for the Chandelier engine.

pub mod bar;
pub mod portfolio;
pub mod signal;
pub mod trade;

pub use bar::Bar;
pub use portfolio::{OpenPosition, PortfolioState};
pub use signal::{Direction, Signal};
pub use trade::TradeRecord;
