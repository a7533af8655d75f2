use crate::repositories::{parse_optional_timestamp, parse_optional_uuid, parse_timestamp, parse_uuid};
use crate::Result;

use fb_core::Task;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

/// Read-side filter for task listings.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub project_id: Option<Uuid>,
    pub priority: Option<i32>,
    pub completed: Option<bool>,
    pub search: Option<String>,
}

pub struct TaskRepository;

impl TaskRepository {
    pub async fn create<'e, E>(executor: E, task: &Task) -> Result<()>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        sqlx::query(
            r#"
              INSERT INTO tasks (
                  id, project_id, column_id, parent_id, position,
                  title, description, priority, due_date,
                  completed_at, archived, created_at, updated_at
              ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
              "#,
        )
        .bind(task.id.to_string())
        .bind(task.project_id.to_string())
        .bind(task.column_id.to_string())
        .bind(task.parent_id.map(|id| id.to_string()))
        .bind(task.position)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.priority)
        .bind(task.due_date.map(|dt| dt.timestamp()))
        .bind(task.completed_at.map(|dt| dt.timestamp()))
        .bind(task.archived)
        .bind(task.created_at.timestamp())
        .bind(task.updated_at.timestamp())
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Task>>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let row = sqlx::query(&select("WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(executor)
            .await?;

        row.as_ref().map(decode_task).transpose()
    }

    /// Every task of a project, subtasks included, ordered by position.
    pub async fn find_by_project<'e, E>(executor: E, project_id: Uuid) -> Result<Vec<Task>>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let rows = sqlx::query(&select("WHERE project_id = ? ORDER BY position ASC"))
            .bind(project_id.to_string())
            .fetch_all(executor)
            .await?;

        rows.iter().map(decode_task).collect()
    }

    /// Top-level tasks of one column, ordered by position.
    pub async fn find_by_column<'e, E>(executor: E, column_id: Uuid) -> Result<Vec<Task>>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let rows = sqlx::query(&select(
            "WHERE column_id = ? AND parent_id IS NULL ORDER BY position ASC",
        ))
        .bind(column_id.to_string())
        .fetch_all(executor)
        .await?;

        rows.iter().map(decode_task).collect()
    }

    pub async fn find_children<'e, E>(executor: E, parent_id: Uuid) -> Result<Vec<Task>>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let rows = sqlx::query(&select("WHERE parent_id = ? ORDER BY position ASC"))
            .bind(parent_id.to_string())
            .fetch_all(executor)
            .await?;

        rows.iter().map(decode_task).collect()
    }

    pub async fn update<'e, E>(executor: E, task: &Task) -> Result<()>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        sqlx::query(
            r#"
              UPDATE tasks
              SET column_id = ?, position = ?, title = ?, description = ?,
                  priority = ?, due_date = ?, completed_at = ?, archived = ?,
                  updated_at = ?
              WHERE id = ?
              "#,
        )
        .bind(task.column_id.to_string())
        .bind(task.position)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.priority)
        .bind(task.due_date.map(|dt| dt.timestamp()))
        .bind(task.completed_at.map(|dt| dt.timestamp()))
        .bind(task.archived)
        .bind(task.updated_at.timestamp())
        .bind(task.id.to_string())
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn set_position<'e, E>(
        executor: E,
        id: Uuid,
        column_id: Uuid,
        position: i32,
    ) -> Result<()>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let updated_at = Utc::now().timestamp();
        sqlx::query(
            r#"UPDATE tasks SET column_id = ?, position = ?, updated_at = ? WHERE id = ?"#,
        )
        .bind(column_id.to_string())
        .bind(position)
        .bind(updated_at)
        .bind(id.to_string())
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn set_completed<'e, E>(
        executor: E,
        id: Uuid,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<()>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let updated_at = Utc::now().timestamp();
        sqlx::query(r#"UPDATE tasks SET completed_at = ?, updated_at = ? WHERE id = ?"#)
            .bind(completed_at.map(|dt| dt.timestamp()))
            .bind(updated_at)
            .bind(id.to_string())
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn find_max_position<'e, E>(
        executor: E,
        column_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> Result<i32>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let max: i64 = sqlx::query_scalar(
            r#"
              SELECT COALESCE(MAX(position), -1)
              FROM tasks
              WHERE column_id = ? AND parent_id IS ?
              "#,
        )
        .bind(column_id.to_string())
        .bind(parent_id.map(|id| id.to_string()))
        .fetch_one(executor)
        .await?;
        Ok(max as i32)
    }

    /// Hard delete; subtasks cascade.
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<()>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        sqlx::query(r#"DELETE FROM tasks WHERE id = ?"#)
            .bind(id.to_string())
            .execute(executor)
            .await?;

        Ok(())
    }

    /// Title substring search over top-level tasks, most recently
    /// updated first.
    pub async fn search<'e, E>(executor: E, query: &str) -> Result<Vec<Task>>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(&select(
            "WHERE title LIKE ? AND parent_id IS NULL ORDER BY updated_at DESC LIMIT 20",
        ))
        .bind(format!("%{}%", trimmed))
        .fetch_all(executor)
        .await?;

        rows.iter().map(decode_task).collect()
    }

    pub async fn find_filtered<'e, E>(executor: E, filter: &TaskFilter) -> Result<Vec<Task>>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let mut clauses = String::from("WHERE parent_id IS NULL");
        if filter.project_id.is_some() {
            clauses.push_str(" AND project_id = ?");
        }
        if filter.priority.is_some() {
            clauses.push_str(" AND priority = ?");
        }
        match filter.completed {
            Some(true) => clauses.push_str(" AND completed_at IS NOT NULL"),
            Some(false) => clauses.push_str(" AND completed_at IS NULL"),
            None => {}
        }
        if filter.search.is_some() {
            clauses.push_str(" AND title LIKE ?");
        }
        clauses.push_str(" ORDER BY position ASC");

        let sql = select(&clauses);
        let mut query = sqlx::query(&sql);
        if let Some(project_id) = filter.project_id {
            query = query.bind(project_id.to_string());
        }
        if let Some(priority) = filter.priority {
            query = query.bind(priority);
        }
        if let Some(search) = &filter.search {
            query = query.bind(format!("%{}%", search.trim()));
        }

        let rows = query.fetch_all(executor).await?;
        rows.iter().map(decode_task).collect()
    }
}

fn select(clauses: &str) -> String {
    format!(
        r#"
          SELECT id, project_id, column_id, parent_id, position,
                 title, description, priority, due_date,
                 completed_at, archived, created_at, updated_at
          FROM tasks
          {}
          "#,
        clauses
    )
}

fn decode_task(row: &SqliteRow) -> Result<Task> {
    let id: String = row.try_get("id")?;
    let project_id: String = row.try_get("project_id")?;
    let column_id: String = row.try_get("column_id")?;
    let parent_id: Option<String> = row.try_get("parent_id")?;
    let due_date: Option<i64> = row.try_get("due_date")?;
    let completed_at: Option<i64> = row.try_get("completed_at")?;
    let created_at: i64 = row.try_get("created_at")?;
    let updated_at: i64 = row.try_get("updated_at")?;

    Ok(Task {
        id: parse_uuid(&id, "tasks.id")?,
        project_id: parse_uuid(&project_id, "tasks.project_id")?,
        column_id: parse_uuid(&column_id, "tasks.column_id")?,
        parent_id: parse_optional_uuid(parent_id.as_deref(), "tasks.parent_id")?,
        position: row.try_get::<i64, _>("position")? as i32,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        priority: row.try_get::<i64, _>("priority")? as i32,
        due_date: parse_optional_timestamp(due_date),
        completed_at: parse_optional_timestamp(completed_at),
        archived: row.try_get("archived")?,
        created_at: parse_timestamp(created_at, "tasks.created_at")?,
        updated_at: parse_timestamp(updated_at, "tasks.updated_at")?,
    })
}
