use serde::{Deserialize, Serialize};
use std::fmt;

/// How a task repeats once its current occurrence is approved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceType {
    /// One-off task with a fixed due date
    #[default]
    None,
    Daily,
    /// Repeats on a selected set of weekdays
    Weekly,
    /// Repeats on the start date's day of month
    Monthly,
    /// One-off task that is re-listed as a fresh copy every time it is approved
    Immediately,
}

impl RecurrenceType {
    /// Daily, weekly and monthly tasks advance their next due date in place
    pub fn is_recurring(&self) -> bool {
        matches!(self, RecurrenceType::Daily | RecurrenceType::Weekly | RecurrenceType::Monthly)
    }
}

impl fmt::Display for RecurrenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RecurrenceType::None => "none",
            RecurrenceType::Daily => "daily",
            RecurrenceType::Weekly => "weekly",
            RecurrenceType::Monthly => "monthly",
            RecurrenceType::Immediately => "immediately",
        };
        write!(f, "{}", label)
    }
}

/// Day of week as stored on weekly tasks ("sun" .. "sat")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Sun,
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Sun,
        DayOfWeek::Mon,
        DayOfWeek::Tue,
        DayOfWeek::Wed,
        DayOfWeek::Thu,
        DayOfWeek::Fri,
        DayOfWeek::Sat,
    ];

    /// 0 = Sunday, 1 = Monday, ..., 6 = Saturday
    pub fn index(&self) -> u32 {
        *self as u32
    }

    pub fn from_index(index: u32) -> Option<DayOfWeek> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn short_label(&self) -> &'static str {
        match self {
            DayOfWeek::Sun => "Su",
            DayOfWeek::Mon => "M",
            DayOfWeek::Tue => "Tu",
            DayOfWeek::Wed => "W",
            DayOfWeek::Thu => "Th",
            DayOfWeek::Fri => "F",
            DayOfWeek::Sat => "Sa",
        }
    }
}

/// Lifecycle of a task submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    PendingApproval,
    Approved,
    Rejected,
}

impl CompletionStatus {
    /// Pending and approved submissions close their occurrence for resubmission
    pub fn holds_occurrence(&self) -> bool {
        matches!(self, CompletionStatus::PendingApproval | CompletionStatus::Approved)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::PendingApproval => "pending_approval",
            CompletionStatus::Approved => "approved",
            CompletionStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a reward redemption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionStatus {
    PendingFulfillment,
    Fulfilled,
    CancelledByParent,
}

impl RedemptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedemptionStatus::PendingFulfillment => "pending_fulfillment",
            RedemptionStatus::Fulfilled => "fulfilled",
            RedemptionStatus::CancelledByParent => "cancelled_by_parent",
        }
    }
}

impl fmt::Display for RedemptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who a family's kids are ranked against on the highscore board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HighscoreScope {
    #[default]
    Disabled,
    Internal,
    Group,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FamilyRoleKind {
    Parent,
    Kid,
}

/// Window of tasks shown on the kid's task list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskViewPeriod {
    #[default]
    Today,
    Week,
    AllUpcoming,
}

/// Window used when filtering a kid's history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HistoryPeriod {
    #[default]
    All,
    Today,
    Week,
    Month,
}

// ---------------------------------------------------------------------------
// Entity views
//
// Dates are "YYYY-MM-DD" strings, timestamps are RFC 3339 strings.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Family {
    pub id: String,
    pub name: String,
    pub highscore_scope: HighscoreScope,
    pub highscore_group_id: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyRole {
    pub family_id: String,
    pub role: FamilyRoleKind,
    pub family_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub is_system_admin: bool,
    pub family_roles: Vec<FamilyRole>,
    pub active_family_role: Option<FamilyRole>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kid {
    pub id: String,
    pub family_id: String,
    pub name: String,
    pub email: Option<String>,
    pub auth_uid: Option<String>,
    /// Redeemable balance
    pub points: u64,
    /// Lifetime points earned, never decremented
    pub total_earned_points: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub family_id: String,
    pub name: String,
    pub points: u32,
    pub recurrence_type: RecurrenceType,
    pub days_of_week: Vec<DayOfWeek>,
    pub start_date: Option<String>,
    pub custom_due_date: Option<String>,
    pub next_due_date: Option<String>,
    pub assigned_kid_id: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedTask {
    pub id: String,
    pub kid_id: String,
    pub kid_name: String,
    pub task_id: String,
    pub task_name: String,
    pub task_points: u32,
    pub task_due_date: String,
    pub date_submitted: String,
    pub status: CompletionStatus,
    pub date_approved_or_rejected: Option<String>,
    pub points_awarded: Option<u32>,
    pub approval_note: Option<String>,
    pub processed_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub id: String,
    pub family_id: String,
    pub name: String,
    pub point_cost: u32,
    pub is_available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedeemedReward {
    pub id: String,
    pub kid_id: String,
    pub kid_name: String,
    pub reward_id: String,
    pub reward_name: String,
    pub points_spent: u32,
    pub date_redeemed: String,
    pub status: RedemptionStatus,
    pub date_fulfilled: Option<String>,
    pub date_cancelled: Option<String>,
    pub cancellation_note: Option<String>,
    pub fulfilled_by: Option<String>,
    pub cancelled_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighscoreGroup {
    pub id: String,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Identity asserted by the external identity provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignInRequest {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

/// Screen the UI should present for the current session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum SessionView {
    SignedOut,
    /// Signed in but not a member of any family yet
    NoFamily,
    AdminDashboard,
    ParentDashboard { family_id: String },
    KidDashboard { family_id: String, kid_id: String },
    /// Kid role without a matching kid profile in the family
    KidProfileMissing { family_id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResponse {
    pub profile: Option<UserProfile>,
    pub view: SessionView,
}

/// Select the active family role; `None` switches an administrator to the admin view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchRoleRequest {
    pub family_id: Option<String>,
    pub role: Option<FamilyRoleKind>,
}

// ---------------------------------------------------------------------------
// Administration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyRequest {
    pub name: String,
    #[serde(default)]
    pub highscore_scope: HighscoreScope,
    pub highscore_group_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyListResponse {
    pub families: Vec<Family>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddParentRequest {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddParentResponse {
    pub added: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighscoreGroupRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighscoreGroupListResponse {
    pub groups: Vec<HighscoreGroup>,
}

// ---------------------------------------------------------------------------
// Family management
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KidRequest {
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KidListResponse {
    pub kids: Vec<Kid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    pub name: String,
    pub points: u32,
    #[serde(default)]
    pub recurrence_type: RecurrenceType,
    #[serde(default)]
    pub days_of_week: Vec<DayOfWeek>,
    pub start_date: Option<String>,
    pub custom_due_date: Option<String>,
    pub assigned_kid_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetTaskActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardRequest {
    pub name: String,
    pub point_cost: u32,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardListResponse {
    pub rewards: Vec<Reward>,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitTaskRequest {
    pub kid_id: String,
    pub task_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproveTaskRequest {
    /// Defaults to the points snapshotted at submission time
    pub points_awarded: Option<u32>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproveTaskResponse {
    pub completed_task: CompletedTask,
    pub kid: Kid,
    pub next_due_date: Option<String>,
    pub cloned_task: Option<Task>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectTaskRequest {
    /// Delete the submission so the kid can resubmit the same occurrence
    #[serde(default)]
    pub reopen: bool,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectTaskResponse {
    /// `None` when the submission was deleted to reopen the occurrence
    pub completed_task: Option<CompletedTask>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedTaskListResponse {
    pub completed_tasks: Vec<CompletedTask>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedeemRewardRequest {
    pub kid_id: String,
    pub reward_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedeemRewardResponse {
    pub redeemed_reward: RedeemedReward,
    pub kid: Kid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FulfillRedemptionRequest {
    /// Re-list the reward so it can be redeemed again
    #[serde(default)]
    pub relist_reward: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FulfillRedemptionResponse {
    pub redeemed_reward: RedeemedReward,
    pub relisted_reward: Option<Reward>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelRedemptionRequest {
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelRedemptionResponse {
    pub redeemed_reward: RedeemedReward,
    pub kid: Kid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedeemedRewardListResponse {
    pub redeemed_rewards: Vec<RedeemedReward>,
}

// ---------------------------------------------------------------------------
// Kid views
// ---------------------------------------------------------------------------

/// How close an occurrence is to its due date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DueStatus {
    Overdue,
    DueToday,
    DaysLeft { days: u32 },
    Later,
    Unscheduled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KidTaskItem {
    pub task: Task,
    pub due_date: Option<String>,
    pub due_status: DueStatus,
    /// Set when the kid has a pending submission for this occurrence
    pub pending_submission_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KidTaskListResponse {
    pub period: TaskViewPeriod,
    pub items: Vec<KidTaskItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighscoreEntry {
    pub kid_id: String,
    pub name: String,
    pub family_name: String,
    pub points: u64,
    pub is_current: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    pub scope: HighscoreScope,
    pub entries: Vec<HighscoreEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KidHistoryResponse {
    pub period: HistoryPeriod,
    pub completed_tasks: Vec<CompletedTask>,
    pub redeemed_rewards: Vec<RedeemedReward>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSummary {
    pub today: u64,
    pub this_week: u64,
    pub this_month: u64,
    /// Points of submissions still waiting for approval
    pub pending: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyOverview {
    pub pending_approvals: usize,
    pub pending_fulfillments: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
