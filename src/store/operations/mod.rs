pub mod attempts;
pub mod daily_stats;
pub mod items;
pub mod key_errors;
pub mod plans;
pub mod progress;
pub mod pronunciation;
