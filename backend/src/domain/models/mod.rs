pub mod completed_task;
pub mod family;
pub mod kid;
pub mod reward;
pub mod task;
pub mod user;

/// Status field shared by submissions and redemptions
pub const STATUS_FIELD: &str = "status";

pub use completed_task::CompletedTask;
pub use family::{Family, HighscoreGroup};
pub use kid::Kid;
pub use reward::{RedeemedReward, Reward};
pub use task::Task;
pub use user::{FamilyRole, UserProfile};
