//! Signup bookkeeping that feeds the reaper.

pub mod services;

pub use services::{confirm_verification, register_pending, SignupError};
