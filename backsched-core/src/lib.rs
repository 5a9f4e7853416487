pub mod backup;
pub mod cancellation;
pub mod clock;
pub mod config;
pub mod exec;
pub mod outdated;
pub mod requirement;
pub mod secrets;
pub mod state;

pub const VERSION: Option<&str> = option_env!("BACKSCHED_VERSION");
