pub mod accounts;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod reaper;
pub mod state;
