pub mod bets;
pub mod bus;
pub mod config;
pub mod core;
pub mod fixtures;
pub mod ledger;
pub mod sync;
pub mod wager;

pub use crate::bets::classifier::{ClassifyOptions, classify_bets, classify_bets_with};
pub use crate::bets::odds::format_odds;
pub use crate::core::error::BetSyncError;
pub use crate::core::types::{Bet, BetAction, BetBook, FixtureDetails};
