#![allow(dead_code)]

use crate::board::BoardState;
use crate::models::column::Column;
use crate::models::project::Project;
use crate::models::task::Task;
use crate::store::{BoardStore, StoreError, StoreResult};

use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

pub fn create_test_project() -> Project {
    Project::new("Test Project".to_string(), "#6366f1".to_string(), 0)
}

pub fn create_test_column(project_id: Uuid, name: &str, sort_order: i32) -> Column {
    Column::new(project_id, name.to_string(), "#3b82f6".to_string(), sort_order)
}

pub fn create_default_column(project_id: Uuid, name: &str, sort_order: i32) -> Column {
    Column::new_default(project_id, name.to_string(), "#94a3b8".to_string(), sort_order)
}

pub fn create_done_column(project_id: Uuid, name: &str, sort_order: i32) -> Column {
    Column::new_done(project_id, name.to_string(), "#22c55e".to_string(), sort_order)
}

pub fn create_test_task(project_id: Uuid, column_id: Uuid, title: &str, position: i32) -> Task {
    let mut task = Task::new(project_id, column_id, title.to_string());
    task.position = position;
    task
}

/// Standard board used across tests:
/// Backlog (default) = [A, B, C], Doing = [X, Y, Z], Review = [T1, T2],
/// Done (done) = [].
pub struct Fixture {
    pub board: BoardState,
    pub backlog: Uuid,
    pub doing: Uuid,
    pub review: Uuid,
    pub done: Uuid,
    pub task_a: Uuid,
    pub task_b: Uuid,
    pub task_c: Uuid,
    pub task_x: Uuid,
    pub task_y: Uuid,
    pub task_z: Uuid,
    pub task_t1: Uuid,
    pub task_t2: Uuid,
}

pub fn standard_board() -> Fixture {
    let project = create_test_project();
    let backlog = create_default_column(project.id, "Backlog", 0);
    let doing = create_test_column(project.id, "Doing", 1);
    let review = create_test_column(project.id, "Review", 2);
    let done = create_done_column(project.id, "Done", 3);

    let task_a = create_test_task(project.id, backlog.id, "A", 0);
    let task_b = create_test_task(project.id, backlog.id, "B", 1);
    let task_c = create_test_task(project.id, backlog.id, "C", 2);
    let task_x = create_test_task(project.id, doing.id, "X", 0);
    let task_y = create_test_task(project.id, doing.id, "Y", 1);
    let task_z = create_test_task(project.id, doing.id, "Z", 2);
    let task_t1 = create_test_task(project.id, review.id, "T1", 0);
    let task_t2 = create_test_task(project.id, review.id, "T2", 1);

    let fixture = Fixture {
        backlog: backlog.id,
        doing: doing.id,
        review: review.id,
        done: done.id,
        task_a: task_a.id,
        task_b: task_b.id,
        task_c: task_c.id,
        task_x: task_x.id,
        task_y: task_y.id,
        task_z: task_z.id,
        task_t1: task_t1.id,
        task_t2: task_t2.id,
        board: BoardState::hydrate(
            project,
            vec![backlog, doing, review, done],
            vec![
                task_a, task_b, task_c, task_x, task_y, task_z, task_t1, task_t2,
            ],
        )
        .unwrap(),
    };
    fixture
}

/// Positions in a column are exactly 0..len with no duplicates, and the
/// ownership index agrees with the sequence.
pub fn assert_dense(board: &BoardState, column_id: Uuid) {
    let tasks = board.ordered_tasks(column_id).unwrap();
    for (index, task) in tasks.iter().enumerate() {
        assert_eq!(task.position, index as i32);
        assert_eq!(task.column_id, column_id);
        assert_eq!(board.find_column_of(task.id), Some(column_id));
    }
}

/// In-memory store that records calls and can fail on one method.
#[derive(Default)]
pub struct MemoryStore {
    calls: Mutex<Vec<String>>,
    fail_on: Mutex<Option<&'static str>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(method: &'static str) -> Self {
        let store = Self::default();
        *store.fail_on.lock().unwrap() = Some(method);
        store
    }

    pub fn recorded(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, method: &'static str) -> StoreResult<()> {
        self.calls.lock().unwrap().push(method.to_string());
        if *self.fail_on.lock().unwrap() == Some(method) {
            return Err(StoreError::new("injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl BoardStore for MemoryStore {
    async fn fetch_board(
        &self,
        _project_id: Uuid,
    ) -> StoreResult<(Project, Vec<Column>, Vec<Task>)> {
        self.record("fetch_board")?;
        Err(StoreError::new("fetch_board is not backed by MemoryStore"))
    }

    async fn move_task(&self, task_id: Uuid, column_id: Uuid, _position: i32) -> StoreResult<Task> {
        self.record("move_task")?;
        let mut task = Task::new(Uuid::new_v4(), column_id, "persisted".to_string());
        task.id = task_id;
        Ok(task)
    }

    async fn set_column_task_order(
        &self,
        _column_id: Uuid,
        _ordered_task_ids: &[Uuid],
    ) -> StoreResult<()> {
        self.record("set_column_task_order")
    }

    async fn set_project_column_order(
        &self,
        _project_id: Uuid,
        _ordered_column_ids: &[Uuid],
    ) -> StoreResult<()> {
        self.record("set_project_column_order")
    }

    async fn create_column(&self, _column: &Column) -> StoreResult<()> {
        self.record("create_column")
    }

    async fn update_column(&self, _column: &Column) -> StoreResult<()> {
        self.record("update_column")
    }

    async fn delete_column(&self, _column_id: Uuid) -> StoreResult<()> {
        self.record("delete_column")
    }

    async fn create_task(&self, _task: &Task) -> StoreResult<()> {
        self.record("create_task")
    }

    async fn update_task(&self, _task: &Task) -> StoreResult<()> {
        self.record("update_task")
    }

    async fn delete_task(&self, _task_id: Uuid) -> StoreResult<()> {
        self.record("delete_task")
    }
}
