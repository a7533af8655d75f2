use crate::repositories::{parse_timestamp, parse_uuid};
use crate::Result;

use fb_core::Column;

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

pub struct ColumnRepository;

impl ColumnRepository {
    pub async fn create<'e, E>(executor: E, column: &Column) -> Result<()>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        sqlx::query(
            r#"
              INSERT INTO columns (
                  id, project_id, name, color, sort_order, is_default, is_done,
                  created_at, updated_at
              ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
              "#,
        )
        .bind(column.id.to_string())
        .bind(column.project_id.to_string())
        .bind(&column.name)
        .bind(&column.color)
        .bind(column.sort_order)
        .bind(column.is_default)
        .bind(column.is_done)
        .bind(column.created_at.timestamp())
        .bind(column.updated_at.timestamp())
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Column>>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let row = sqlx::query(
            r#"
              SELECT id, project_id, name, color, sort_order, is_default, is_done,
                     created_at, updated_at
              FROM columns
              WHERE id = ?
              "#,
        )
        .bind(id.to_string())
        .fetch_optional(executor)
        .await?;

        row.as_ref().map(decode_column).transpose()
    }

    pub async fn find_by_project<'e, E>(executor: E, project_id: Uuid) -> Result<Vec<Column>>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let rows = sqlx::query(
            r#"
              SELECT id, project_id, name, color, sort_order, is_default, is_done,
                     created_at, updated_at
              FROM columns
              WHERE project_id = ?
              ORDER BY sort_order ASC
              "#,
        )
        .bind(project_id.to_string())
        .fetch_all(executor)
        .await?;

        rows.iter().map(decode_column).collect()
    }

    pub async fn find_default<'e, E>(executor: E, project_id: Uuid) -> Result<Option<Column>>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let row = sqlx::query(
            r#"
              SELECT id, project_id, name, color, sort_order, is_default, is_done,
                     created_at, updated_at
              FROM columns
              WHERE project_id = ? AND is_default = 1
              LIMIT 1
              "#,
        )
        .bind(project_id.to_string())
        .fetch_optional(executor)
        .await?;

        row.as_ref().map(decode_column).transpose()
    }

    pub async fn update<'e, E>(executor: E, column: &Column) -> Result<()>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        sqlx::query(
            r#"
              UPDATE columns
              SET name = ?, color = ?, sort_order = ?, updated_at = ?
              WHERE id = ?
              "#,
        )
        .bind(&column.name)
        .bind(&column.color)
        .bind(column.sort_order)
        .bind(column.updated_at.timestamp())
        .bind(column.id.to_string())
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn set_sort_order<'e, E>(executor: E, id: Uuid, sort_order: i32) -> Result<()>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        sqlx::query(r#"UPDATE columns SET sort_order = ? WHERE id = ?"#)
            .bind(sort_order)
            .bind(id.to_string())
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn find_max_sort_order<'e, E>(executor: E, project_id: Uuid) -> Result<i32>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let max: i64 = sqlx::query_scalar(
            r#"SELECT COALESCE(MAX(sort_order), -1) FROM columns WHERE project_id = ?"#,
        )
        .bind(project_id.to_string())
        .fetch_one(executor)
        .await?;
        Ok(max as i32)
    }

    /// Hard delete. The default-column guard lives in the store, which
    /// checks before deleting inside the same transaction.
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<()>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        sqlx::query(r#"DELETE FROM columns WHERE id = ?"#)
            .bind(id.to_string())
            .execute(executor)
            .await?;

        Ok(())
    }
}

fn decode_column(row: &SqliteRow) -> Result<Column> {
    let id: String = row.try_get("id")?;
    let project_id: String = row.try_get("project_id")?;
    let created_at: i64 = row.try_get("created_at")?;
    let updated_at: i64 = row.try_get("updated_at")?;

    Ok(Column {
        id: parse_uuid(&id, "columns.id")?,
        project_id: parse_uuid(&project_id, "columns.project_id")?,
        name: row.try_get("name")?,
        color: row.try_get("color")?,
        sort_order: row.try_get::<i64, _>("sort_order")? as i32,
        is_default: row.try_get("is_default")?,
        is_done: row.try_get("is_done")?,
        created_at: parse_timestamp(created_at, "columns.created_at")?,
        updated_at: parse_timestamp(updated_at, "columns.updated_at")?,
    })
}
