use crate::domain::commands::task::{ApproveTaskResult, TaskCommand};
use crate::domain::models::{CompletedTask as DomainCompletedTask, Task as DomainTask};
use crate::domain::KidTaskEntry;
use shared::{
    ApproveTaskResponse, CompletedTask as SharedCompletedTask, CompletedTaskListResponse,
    KidTaskItem, KidTaskListResponse, Task as SharedTask, TaskListResponse, TaskRequest,
    TaskViewPeriod,
};

use super::{format_date, format_timestamp, KidMapper};

/// Mapper for tasks, submissions and the kid task list
pub struct TaskMapper;

impl TaskMapper {
    pub fn to_dto(domain: DomainTask) -> SharedTask {
        SharedTask {
            id: domain.id,
            family_id: domain.family_id,
            name: domain.name,
            points: domain.points,
            recurrence_type: domain.recurrence_type,
            days_of_week: domain.days_of_week,
            start_date: domain.start_date.map(format_date),
            custom_due_date: domain.custom_due_date.map(format_date),
            next_due_date: domain.next_due_date.map(format_date),
            assigned_kid_id: domain.assigned_kid_id,
            is_active: domain.is_active,
        }
    }

    pub fn to_task_list_dto(tasks: Vec<DomainTask>) -> TaskListResponse {
        TaskListResponse {
            tasks: tasks.into_iter().map(Self::to_dto).collect(),
        }
    }

    pub fn to_command(request: TaskRequest) -> TaskCommand {
        TaskCommand {
            name: request.name,
            points: request.points,
            recurrence_type: request.recurrence_type,
            days_of_week: request.days_of_week,
            start_date: request.start_date,
            custom_due_date: request.custom_due_date,
            assigned_kid_id: request.assigned_kid_id,
        }
    }

    pub fn to_completed_dto(domain: DomainCompletedTask) -> SharedCompletedTask {
        SharedCompletedTask {
            id: domain.id,
            kid_id: domain.kid_id,
            kid_name: domain.kid_name,
            task_id: domain.task_id,
            task_name: domain.task_name,
            task_points: domain.task_points,
            task_due_date: format_date(domain.task_due_date),
            date_submitted: format_timestamp(domain.date_submitted),
            status: domain.status,
            date_approved_or_rejected: domain.date_approved_or_rejected.map(format_timestamp),
            points_awarded: domain.points_awarded,
            approval_note: domain.approval_note,
            processed_by: domain.processed_by,
        }
    }

    pub fn to_completed_list_dto(completed: Vec<DomainCompletedTask>) -> CompletedTaskListResponse {
        CompletedTaskListResponse {
            completed_tasks: completed.into_iter().map(Self::to_completed_dto).collect(),
        }
    }

    pub fn to_approve_dto(result: ApproveTaskResult) -> ApproveTaskResponse {
        ApproveTaskResponse {
            completed_task: Self::to_completed_dto(result.completed_task),
            kid: KidMapper::to_dto(result.kid),
            next_due_date: result.next_due_date.map(format_date),
            cloned_task: result.cloned_task.map(Self::to_dto),
        }
    }

    pub fn to_kid_task_list_dto(period: TaskViewPeriod, entries: Vec<KidTaskEntry>) -> KidTaskListResponse {
        KidTaskListResponse {
            period,
            items: entries
                .into_iter()
                .map(|entry| KidTaskItem {
                    task: Self::to_dto(entry.task),
                    due_date: entry.due_date.map(format_date),
                    due_status: entry.due_status,
                    pending_submission_id: entry.pending_submission_id,
                })
                .collect(),
        }
    }
}
