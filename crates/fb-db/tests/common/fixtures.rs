#![allow(dead_code)]

use fb_core::{Column, Project, Task};
use fb_db::{ColumnRepository, ProjectRepository, TaskRepository};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Creates a test Project
pub fn create_test_project() -> Project {
    Project::new("Test Project".to_string(), "#6366f1".to_string(), 0)
}

/// Creates a test Column with sensible defaults
pub fn create_test_column(project_id: Uuid, name: &str, sort_order: i32) -> Column {
    Column::new(project_id, name.to_string(), "#3b82f6".to_string(), sort_order)
}

/// Creates the default (inbox) column of a project
pub fn create_default_column(project_id: Uuid, sort_order: i32) -> Column {
    Column::new_default(
        project_id,
        "Backlog".to_string(),
        "#94a3b8".to_string(),
        sort_order,
    )
}

/// Creates the done column of a project
pub fn create_done_column(project_id: Uuid, sort_order: i32) -> Column {
    Column::new_done(
        project_id,
        "Done".to_string(),
        "#22c55e".to_string(),
        sort_order,
    )
}

/// Creates a test Task at a given position
pub fn create_test_task(project_id: Uuid, column_id: Uuid, title: &str, position: i32) -> Task {
    let mut task = Task::new(project_id, column_id, title.to_string());
    task.position = position;
    task
}

/// Creates a subtask of `parent` at a given checklist position
pub fn create_test_subtask(parent: &Task, title: &str, position: i32) -> Task {
    let mut task = Task::new_subtask(parent, title.to_string());
    task.position = position;
    task
}

/// A fully seeded board:
/// Backlog (default) = [Alpha, Beta], In Progress = [Gamma],
/// Review = [Review One, Review Two], Done (done) = [].
pub struct SeededBoard {
    pub project: Project,
    pub backlog: Column,
    pub in_progress: Column,
    pub review: Column,
    pub done: Column,
    pub alpha: Task,
    pub beta: Task,
    pub gamma: Task,
    pub review_one: Task,
    pub review_two: Task,
}

pub async fn seed_board(pool: &SqlitePool) -> SeededBoard {
    let project = create_test_project();
    ProjectRepository::create(pool, &project)
        .await
        .expect("Failed to create project");

    let backlog = create_default_column(project.id, 0);
    let in_progress = create_test_column(project.id, "In Progress", 1);
    let review = create_test_column(project.id, "Review", 2);
    let done = create_done_column(project.id, 3);
    for column in [&backlog, &in_progress, &review, &done] {
        ColumnRepository::create(pool, column)
            .await
            .expect("Failed to create column");
    }

    let alpha = create_test_task(project.id, backlog.id, "Alpha", 0);
    let beta = create_test_task(project.id, backlog.id, "Beta", 1);
    let gamma = create_test_task(project.id, in_progress.id, "Gamma", 0);
    let review_one = create_test_task(project.id, review.id, "Review One", 0);
    let review_two = create_test_task(project.id, review.id, "Review Two", 1);
    for task in [&alpha, &beta, &gamma, &review_one, &review_two] {
        TaskRepository::create(pool, task)
            .await
            .expect("Failed to create task");
    }

    SeededBoard {
        project,
        backlog,
        in_progress,
        review,
        done,
        alpha,
        beta,
        gamma,
        review_one,
        review_two,
    }
}
