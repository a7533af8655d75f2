use crate::repositories::{parse_timestamp, parse_uuid};
use crate::Result;

use fb_core::Project;

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

pub struct ProjectRepository;

impl ProjectRepository {
    pub async fn create<'e, E>(executor: E, project: &Project) -> Result<()>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        sqlx::query(
            r#"
              INSERT INTO projects (
                  id, name, description, color, sort_order,
                  created_at, updated_at
              ) VALUES (?, ?, ?, ?, ?, ?, ?)
              "#,
        )
        .bind(project.id.to_string())
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.color)
        .bind(project.sort_order)
        .bind(project.created_at.timestamp())
        .bind(project.updated_at.timestamp())
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Project>>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let row = sqlx::query(
            r#"
              SELECT id, name, description, color, sort_order, created_at, updated_at
              FROM projects
              WHERE id = ?
              "#,
        )
        .bind(id.to_string())
        .fetch_optional(executor)
        .await?;

        row.as_ref().map(decode_project).transpose()
    }

    pub async fn find_all<'e, E>(executor: E) -> Result<Vec<Project>>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let rows = sqlx::query(
            r#"
              SELECT id, name, description, color, sort_order, created_at, updated_at
              FROM projects
              ORDER BY sort_order ASC
              "#,
        )
        .fetch_all(executor)
        .await?;

        rows.iter().map(decode_project).collect()
    }

    pub async fn find_max_sort_order<'e, E>(executor: E) -> Result<i32>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let max: i64 =
            sqlx::query_scalar(r#"SELECT COALESCE(MAX(sort_order), -1) FROM projects"#)
                .fetch_one(executor)
                .await?;
        Ok(max as i32)
    }

    pub async fn update<'e, E>(executor: E, project: &Project) -> Result<()>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        sqlx::query(
            r#"
              UPDATE projects
              SET name = ?, description = ?, color = ?, sort_order = ?, updated_at = ?
              WHERE id = ?
              "#,
        )
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.color)
        .bind(project.sort_order)
        .bind(project.updated_at.timestamp())
        .bind(project.id.to_string())
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Hard delete; columns and tasks cascade.
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<()>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        sqlx::query(r#"DELETE FROM projects WHERE id = ?"#)
            .bind(id.to_string())
            .execute(executor)
            .await?;

        Ok(())
    }
}

fn decode_project(row: &SqliteRow) -> Result<Project> {
    let id: String = row.try_get("id")?;
    let created_at: i64 = row.try_get("created_at")?;
    let updated_at: i64 = row.try_get("updated_at")?;

    Ok(Project {
        id: parse_uuid(&id, "projects.id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        color: row.try_get("color")?,
        sort_order: row.try_get::<i64, _>("sort_order")? as i32,
        created_at: parse_timestamp(created_at, "projects.created_at")?,
        updated_at: parse_timestamp(updated_at, "projects.updated_at")?,
    })
}
