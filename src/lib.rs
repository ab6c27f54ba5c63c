pub mod awards;
pub mod cache;
pub mod classifier;
pub mod cli;
pub mod clock;
pub mod config;
pub mod dates;
pub mod error;
pub mod history;
pub mod logging;
pub mod membership;
pub mod progress;
pub mod protocol;
pub mod roster;
pub mod stream;
