use std::collections::{HashMap, VecDeque};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::errors::CoreError;
use crate::tools::Priority;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Blocked,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Blocked => "blocked",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub assignee: Option<String>,
    pub milestone_id: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    pub assignee: Option<String>,
    pub milestone_id: Option<String>,
    pub due_date: Option<NaiveDate>,
}

impl NewTask {
    pub fn titled(title: &str) -> Self {
        Self { title: title.to_string(), ..Default::default() }
    }
}

/// Partial update; absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub id: String,
    pub name: String,
    pub target_date: NaiveDate,
    pub task_ids: Vec<String>,
    /// Percentage of the milestone's tasks that are completed.
    pub progress: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMilestone {
    pub name: String,
    pub target_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    pub at: DateTime<Utc>,
    pub kind: String,
    pub subject_id: String,
    pub message: String,
}

/// Tasks, milestones and the bounded activity log.
pub struct TaskBook {
    tasks: HashMap<String, Task>,
    milestones: HashMap<String, Milestone>,
    activity: VecDeque<ActivityEntry>,
    activity_cap: usize,
}

impl TaskBook {
    pub fn new(activity_cap: usize) -> Self {
        Self {
            tasks: HashMap::new(),
            milestones: HashMap::new(),
            activity: VecDeque::new(),
            activity_cap: activity_cap.max(1),
        }
    }

    pub fn create_task(&mut self, new: NewTask) -> Result<Task, CoreError> {
        if new.title.trim().is_empty() {
            return Err(CoreError::InvalidInput("Task title must not be empty".into()));
        }
        if let Some(milestone_id) = &new.milestone_id {
            if !self.milestones.contains_key(milestone_id) {
                return Err(CoreError::not_found("milestone", milestone_id));
            }
        }

        let now = Utc::now();
        let task = Task {
            id: format!("task-{}", Uuid::new_v4()),
            title: new.title,
            description: new.description,
            status: TaskStatus::Pending,
            priority: new.priority,
            assignee: new.assignee,
            milestone_id: new.milestone_id,
            due_date: new.due_date,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };

        if let Some(milestone) = task.milestone_id.as_ref().and_then(|id| self.milestones.get_mut(id)) {
            milestone.task_ids.push(task.id.clone());
        }
        self.tasks.insert(task.id.clone(), task.clone());
        self.refresh_milestone(task.milestone_id.as_deref());
        self.log("task-created", &task.id, format!("Created task '{}'", task.title));
        Ok(task)
    }

    pub fn update_task(&mut self, id: &str, update: TaskUpdate) -> Result<Task, CoreError> {
        let task = self.tasks.get_mut(id).ok_or_else(|| CoreError::not_found("task", id))?;
        let now = Utc::now();
        let mut changes = Vec::new();

        if let Some(title) = update.title {
            task.title = title;
            changes.push("title".to_string());
        }
        if let Some(description) = update.description {
            task.description = description;
            changes.push("description".to_string());
        }
        if let Some(priority) = update.priority {
            task.priority = priority;
            changes.push(format!("priority={:?}", priority).to_lowercase());
        }
        if let Some(due) = update.due_date {
            task.due_date = Some(due);
            changes.push(format!("due={}", due));
        }
        if let Some(status) = update.status {
            if status != task.status {
                task.completed_at = (status == TaskStatus::Completed).then_some(now);
                task.status = status;
            }
            changes.push(format!("status={}", status.as_str()));
        }
        task.updated_at = now;

        let task = task.clone();
        self.refresh_milestone(task.milestone_id.as_deref());
        let message = if changes.is_empty() {
            format!("Touched task '{}'", task.title)
        } else {
            format!("Updated task '{}': {}", task.title, changes.join(", "))
        };
        self.log("task-updated", &task.id, message);
        Ok(task)
    }

    /// Reassign a task; returns it with the previous assignee.
    pub fn assign_task(&mut self, id: &str, agent_id: &str) -> Result<(Task, Option<String>), CoreError> {
        let task = self.tasks.get_mut(id).ok_or_else(|| CoreError::not_found("task", id))?;
        let previous = task.assignee.replace(agent_id.to_string());
        task.updated_at = Utc::now();
        let task = task.clone();
        self.log("task-assigned", &task.id, format!("Assigned '{}' to {}", task.title, agent_id));
        Ok((task, previous))
    }

    pub fn get_task(&self, id: &str) -> Result<Task, CoreError> {
        self.tasks.get(id).cloned().ok_or_else(|| CoreError::not_found("task", id))
    }

    /// Tasks oldest first, optionally filtered by status or assignee.
    pub fn list_tasks(&self, status: Option<TaskStatus>, assignee: Option<&str>) -> Vec<Task> {
        let mut list: Vec<Task> = self
            .tasks
            .values()
            .filter(|t| status.map_or(true, |s| t.status == s))
            .filter(|t| assignee.map_or(true, |a| t.assignee.as_deref() == Some(a)))
            .cloned()
            .collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        list
    }

    pub fn create_milestone(&mut self, new: NewMilestone) -> Result<Milestone, CoreError> {
        if new.name.trim().is_empty() {
            return Err(CoreError::InvalidInput("Milestone name must not be empty".into()));
        }
        let milestone = Milestone {
            id: format!("milestone-{}", Uuid::new_v4()),
            name: new.name,
            target_date: new.target_date,
            task_ids: Vec::new(),
            progress: 0.0,
            created_at: Utc::now(),
        };
        self.milestones.insert(milestone.id.clone(), milestone.clone());
        self.log(
            "milestone-created",
            &milestone.id,
            format!("Created milestone '{}' due {}", milestone.name, milestone.target_date),
        );
        Ok(milestone)
    }

    /// Milestones by target date.
    pub fn list_milestones(&self) -> Vec<Milestone> {
        let mut list: Vec<Milestone> = self.milestones.values().cloned().collect();
        list.sort_by(|a, b| a.target_date.cmp(&b.target_date).then_with(|| a.id.cmp(&b.id)));
        list
    }

    fn refresh_milestone(&mut self, milestone_id: Option<&str>) {
        let Some(milestone) = milestone_id.and_then(|id| self.milestones.get_mut(id)) else {
            return;
        };
        let total = milestone.task_ids.len();
        let done = milestone
            .task_ids
            .iter()
            .filter(|id| self.tasks.get(*id).is_some_and(|t| t.status == TaskStatus::Completed))
            .count();
        milestone.progress = percentage(done, total);
    }

    /// Completed share of an agent's tasks, or `None` when it has none.
    pub fn agent_progress(&self, agent_id: &str) -> Option<f64> {
        let assigned: Vec<&Task> = self
            .tasks
            .values()
            .filter(|t| t.assignee.as_deref() == Some(agent_id))
            .collect();
        if assigned.is_empty() {
            return None;
        }
        let done = assigned.iter().filter(|t| t.status == TaskStatus::Completed).count();
        Some(percentage(done, assigned.len()))
    }

    /// Completed share of assigned tasks; 0 when nothing is assigned.
    pub fn completion_rate(&self) -> f64 {
        let assigned: Vec<&Task> = self.tasks.values().filter(|t| t.assignee.is_some()).collect();
        let done = assigned.iter().filter(|t| t.status == TaskStatus::Completed).count();
        percentage(done, assigned.len())
    }

    pub fn completed_since(&self, since: DateTime<Utc>) -> usize {
        self.tasks
            .values()
            .filter(|t| t.completed_at.is_some_and(|at| at >= since))
            .count()
    }

    pub fn log(&mut self, kind: &str, subject_id: &str, message: String) -> ActivityEntry {
        let entry = ActivityEntry {
            at: Utc::now(),
            kind: kind.to_string(),
            subject_id: subject_id.to_string(),
            message,
        };
        self.activity.push_back(entry.clone());
        while self.activity.len() > self.activity_cap {
            self.activity.pop_front();
        }
        entry
    }

    /// Most recent entries, newest first.
    pub fn activity(&self, limit: Option<usize>) -> Vec<ActivityEntry> {
        self.activity
            .iter()
            .rev()
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    pub fn last_activity(&self) -> Option<&ActivityEntry> {
        self.activity.back()
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}
