//! # Domain Module
//!
//! Business rules of the chore tracker, independent of HTTP and of the
//! storage engine.
//!
//! ## Module Organization
//!
//! - **due_date**: recurring due-date calculator
//! - **task_view**: what a kid sees on their task list
//! - **session**: roles, view selection and authorization checks
//! - **task_service** / **approval_service**: task definitions and the
//!   submission lifecycle that credits points
//! - **reward_service**: reward catalogue and the redemption lifecycle
//! - **kid_service**, **family_service**, **user_service**: accounts and
//!   memberships
//! - **highscore_service**, **history_service**: read-only summaries
//!
//! ## Ledger Rules
//!
//! - A kid's balance never goes below zero
//! - `total_earned_points` only ever grows
//! - Each (task, kid, occurrence) has at most one submission

pub mod approval_service;
pub mod clock;
pub mod collections;
pub mod commands;
pub mod due_date;
pub mod error;
pub mod family_service;
pub mod highscore_service;
pub mod history_service;
pub mod kid_service;
pub mod models;
pub mod reward_service;
pub mod session;
pub mod task_service;
pub mod task_view;
pub mod user_service;

#[cfg(test)]
pub(crate) mod test_support;

pub use approval_service::ApprovalService;
pub use clock::{Clock, FixedClock, SystemClock};
pub use collections::Collections;
pub use error::{ChoreError, ChoreResult, ValidationError};
pub use family_service::FamilyService;
pub use highscore_service::HighscoreService;
pub use history_service::{HistoryService, KidHistory};
pub use kid_service::KidService;
pub use reward_service::RewardService;
pub use session::{select_view, Actor, Role};
pub use task_service::TaskService;
pub use task_view::KidTaskEntry;
pub use user_service::UserService;
