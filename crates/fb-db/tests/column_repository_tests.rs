mod common;

use common::{create_default_column, create_test_column, create_test_pool, create_test_project};

use fb_db::{ColumnRepository, ProjectRepository};

use chrono::Utc;
use googletest::prelude::*;
use uuid::Uuid;

#[tokio::test]
async fn given_valid_column_when_created_then_can_be_found_by_id() {
    // Given: A test database with a project
    let pool = create_test_pool().await;
    let project = create_test_project();
    ProjectRepository::create(&pool, &project).await.unwrap();

    let column = create_test_column(project.id, "In Progress", 1);

    // When: Creating the column
    ColumnRepository::create(&pool, &column).await.unwrap();

    // Then: Finding by ID returns the column
    let result = ColumnRepository::find_by_id(&pool, column.id).await.unwrap();

    assert_that!(result, some(anything()));
    let found = result.unwrap();
    assert_that!(found.id, eq(column.id));
    assert_that!(found.name, eq(&column.name));
    assert_that!(found.color, eq(&column.color));
    assert_that!(found.is_default, eq(false));
    assert_that!(found.is_done, eq(false));
}

#[tokio::test]
async fn given_empty_database_when_finding_nonexistent_id_then_returns_none() {
    // Given: An empty database
    let pool = create_test_pool().await;

    // When: Finding a column that doesn't exist
    let result = ColumnRepository::find_by_id(&pool, Uuid::new_v4()).await.unwrap();

    // Then: Returns None
    assert_that!(result, none());
}

#[tokio::test]
async fn given_columns_when_listed_by_project_then_ordered_by_sort_order() {
    // Given: Columns created out of order
    let pool = create_test_pool().await;
    let project = create_test_project();
    ProjectRepository::create(&pool, &project).await.unwrap();

    let third = create_test_column(project.id, "Third", 2);
    let first = create_default_column(project.id, 0);
    let second = create_test_column(project.id, "Second", 1);
    for column in [&third, &first, &second] {
        ColumnRepository::create(&pool, column).await.unwrap();
    }

    // When: Listing the project's columns
    let columns = ColumnRepository::find_by_project(&pool, project.id).await.unwrap();

    // Then: They come back in sort order
    let ids: Vec<Uuid> = columns.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![first.id, second.id, third.id]);
}

#[tokio::test]
async fn given_default_column_when_queried_then_find_default_returns_it() {
    // Given: A project with a default and a plain column
    let pool = create_test_pool().await;
    let project = create_test_project();
    ProjectRepository::create(&pool, &project).await.unwrap();

    let default = create_default_column(project.id, 0);
    let other = create_test_column(project.id, "Other", 1);
    ColumnRepository::create(&pool, &default).await.unwrap();
    ColumnRepository::create(&pool, &other).await.unwrap();

    // When: Looking up the default column
    let found = ColumnRepository::find_default(&pool, project.id).await.unwrap();

    // Then: The default one is returned
    assert_that!(found, some(anything()));
    assert_that!(found.unwrap().id, eq(default.id));
}

#[tokio::test]
async fn given_existing_column_when_updated_then_changes_are_persisted() {
    // Given: A column exists in the database
    let pool = create_test_pool().await;
    let project = create_test_project();
    ProjectRepository::create(&pool, &project).await.unwrap();

    let mut column = create_test_column(project.id, "Review", 1);
    ColumnRepository::create(&pool, &column).await.unwrap();

    // When: Updating the column's name and color
    column.name = "Code Review".to_string();
    column.color = "#f59e0b".to_string();
    column.updated_at = Utc::now();
    ColumnRepository::update(&pool, &column).await.unwrap();

    // Then: The changes are persisted
    let found = ColumnRepository::find_by_id(&pool, column.id).await.unwrap().unwrap();
    assert_that!(found.name, eq("Code Review"));
    assert_that!(found.color, eq("#f59e0b"));
}

#[tokio::test]
async fn given_columns_when_querying_max_sort_order_then_returns_highest() {
    // Given: A project with two columns
    let pool = create_test_pool().await;
    let project = create_test_project();
    ProjectRepository::create(&pool, &project).await.unwrap();

    // Then: Empty projects report -1 so the first append lands at 0
    let empty = ColumnRepository::find_max_sort_order(&pool, project.id).await.unwrap();
    assert_that!(empty, eq(-1));

    ColumnRepository::create(&pool, &create_default_column(project.id, 0)).await.unwrap();
    ColumnRepository::create(&pool, &create_test_column(project.id, "Next", 4)).await.unwrap();

    // When: Querying the max sort order
    let max = ColumnRepository::find_max_sort_order(&pool, project.id).await.unwrap();

    // Then: The highest persisted value is returned
    assert_that!(max, eq(4));
}

#[tokio::test]
async fn given_existing_column_when_sort_order_set_then_persisted() {
    // Given: A column at sort order 1
    let pool = create_test_pool().await;
    let project = create_test_project();
    ProjectRepository::create(&pool, &project).await.unwrap();
    let column = create_test_column(project.id, "Movable", 1);
    ColumnRepository::create(&pool, &column).await.unwrap();

    // When: Rewriting its sort order
    ColumnRepository::set_sort_order(&pool, column.id, 7).await.unwrap();

    // Then: The new value is persisted
    let found = ColumnRepository::find_by_id(&pool, column.id).await.unwrap().unwrap();
    assert_that!(found.sort_order, eq(7));
}
