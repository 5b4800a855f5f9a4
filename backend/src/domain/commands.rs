//! Domain-level command and result types.
//!
//! Services take these instead of the `shared` DTOs; the REST layer maps
//! request bodies onto them. Dates arrive as strings and are parsed and
//! validated by the service.

pub mod task {
    use crate::domain::models::Task;
    use shared::{DayOfWeek, RecurrenceType};

    /// Fields of a task definition, used for both create and update
    #[derive(Debug, Clone)]
    pub struct TaskCommand {
        pub name: String,
        pub points: u32,
        pub recurrence_type: RecurrenceType,
        pub days_of_week: Vec<DayOfWeek>,
        pub start_date: Option<String>,
        pub custom_due_date: Option<String>,
        pub assigned_kid_id: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct SubmitTaskCommand {
        pub family_id: String,
        pub kid_id: String,
        pub task_id: String,
    }

    #[derive(Debug, Clone)]
    pub struct ApproveTaskCommand {
        pub family_id: String,
        pub completed_task_id: String,
        /// Overrides the points snapshotted at submission
        pub points_awarded: Option<u32>,
        pub note: Option<String>,
        pub approver: String,
    }

    #[derive(Debug, Clone)]
    pub struct ApproveTaskResult {
        pub completed_task: crate::domain::models::CompletedTask,
        pub kid: crate::domain::models::Kid,
        /// Next occurrence of a recurring task after this approval
        pub next_due_date: Option<chrono::NaiveDate>,
        /// Fresh copy of an `immediately` task
        pub cloned_task: Option<Task>,
    }

    #[derive(Debug, Clone)]
    pub struct RejectTaskCommand {
        pub family_id: String,
        pub completed_task_id: String,
        /// Delete the submission so the same occurrence can be resubmitted
        pub reopen: bool,
        pub note: Option<String>,
        pub approver: String,
    }
}

pub mod reward {
    use crate::domain::models::{Kid, RedeemedReward, Reward};

    #[derive(Debug, Clone)]
    pub struct RewardCommand {
        pub name: String,
        pub point_cost: u32,
        pub is_available: bool,
    }

    #[derive(Debug, Clone)]
    pub struct RedeemRewardCommand {
        pub family_id: String,
        pub kid_id: String,
        pub reward_id: String,
    }

    #[derive(Debug, Clone)]
    pub struct RedemptionResult {
        pub redeemed_reward: RedeemedReward,
        pub kid: Kid,
    }

    #[derive(Debug, Clone)]
    pub struct FulfillRedemptionCommand {
        pub family_id: String,
        pub redeemed_reward_id: String,
        pub relist_reward: bool,
        pub fulfiller: String,
    }

    #[derive(Debug, Clone)]
    pub struct FulfillRedemptionResult {
        pub redeemed_reward: RedeemedReward,
        pub relisted_reward: Option<Reward>,
    }

    #[derive(Debug, Clone)]
    pub struct CancelRedemptionCommand {
        pub family_id: String,
        pub redeemed_reward_id: String,
        pub note: Option<String>,
        pub canceller: String,
    }
}

pub mod kid {
    #[derive(Debug, Clone)]
    pub struct KidCommand {
        pub name: String,
        pub email: Option<String>,
    }
}

pub mod family {
    use shared::HighscoreScope;

    #[derive(Debug, Clone)]
    pub struct FamilyCommand {
        pub name: String,
        pub highscore_scope: HighscoreScope,
        pub highscore_group_id: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct AddParentResult {
        pub added: bool,
        pub message: String,
    }
}

pub mod session {
    use crate::domain::models::UserProfile;
    use shared::{FamilyRoleKind, SessionView};

    /// Identity asserted by the external identity provider
    #[derive(Debug, Clone)]
    pub struct SignInCommand {
        pub uid: String,
        pub email: Option<String>,
        pub display_name: Option<String>,
        pub is_anonymous: bool,
    }

    #[derive(Debug, Clone)]
    pub struct SwitchRoleCommand {
        pub uid: String,
        /// `None` returns an administrator to the admin view
        pub family_id: Option<String>,
        pub role: Option<FamilyRoleKind>,
    }

    #[derive(Debug, Clone)]
    pub struct SessionResult {
        pub profile: Option<UserProfile>,
        pub view: SessionView,
    }
}
