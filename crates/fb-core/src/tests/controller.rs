use super::support::{assert_dense, standard_board, MemoryStore};
use crate::models::task::TaskPatch;
use crate::planner::{DragSession, MovePlan};
use crate::sync::{OpPhase, SyncController, SyncError};

use uuid::Uuid;

#[tokio::test]
async fn test_move_across_columns_persists_move_and_both_orders() {
    let fx = standard_board();
    let mut controller = SyncController::new(MemoryStore::new(), fx.board);

    let delta = controller.move_task(fx.task_b, fx.doing, 0).await.unwrap();

    assert!(delta.moved);
    assert_eq!(controller.phase(), OpPhase::Committed);
    assert_eq!(
        controller.store().recorded(),
        vec![
            "move_task",
            "set_column_task_order",
            "set_column_task_order"
        ]
    );
    assert_eq!(
        controller.board().ordered_task_ids(fx.doing).unwrap()[0],
        fx.task_b
    );
    assert_dense(controller.board(), fx.backlog);
    assert_dense(controller.board(), fx.doing);
}

#[tokio::test]
async fn test_self_target_move_issues_no_persistence_call() {
    let fx = standard_board();
    let before = fx.board.clone();
    let mut controller = SyncController::new(MemoryStore::new(), fx.board);

    let delta = controller.move_task(fx.task_y, fx.doing, 1).await.unwrap();

    assert!(!delta.moved);
    assert_eq!(*controller.board(), before);
    assert!(controller.store().recorded().is_empty());
}

#[tokio::test]
async fn test_failed_persistence_rolls_back_exactly() {
    let fx = standard_board();
    let before = fx.board.clone();
    let mut controller =
        SyncController::new(MemoryStore::failing_on("set_column_task_order"), fx.board);

    let err = controller.move_task(fx.task_z, fx.doing, 0).await.unwrap_err();

    assert!(matches!(err, SyncError::Store { .. }));
    assert_eq!(controller.phase(), OpPhase::RolledBack);
    assert_eq!(*controller.board(), before);

    let notices = controller.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].operation, "move task");
    assert!(controller.notices().is_empty());
}

#[tokio::test]
async fn test_move_to_unknown_column_touches_nothing() {
    let fx = standard_board();
    let before = fx.board.clone();
    let mut controller = SyncController::new(MemoryStore::new(), fx.board);

    let err = controller
        .move_task(fx.task_x, Uuid::new_v4(), 0)
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Core(_)));
    assert_eq!(*controller.board(), before);
    assert!(controller.store().recorded().is_empty());
}

#[tokio::test]
async fn test_reorder_columns_persists_board_order() {
    let fx = standard_board();
    let mut controller = SyncController::new(MemoryStore::new(), fx.board);

    controller
        .reorder_columns(&[fx.done, fx.backlog, fx.doing, fx.review])
        .await
        .unwrap();

    assert_eq!(
        controller.store().recorded(),
        vec!["set_project_column_order"]
    );
    assert_eq!(
        controller.board().ordered_column_ids(),
        &[fx.done, fx.backlog, fx.doing, fx.review]
    );
}

#[tokio::test]
async fn test_reorder_columns_to_current_order_is_silent() {
    let fx = standard_board();
    let order = fx.board.ordered_column_ids().to_vec();
    let mut controller = SyncController::new(MemoryStore::new(), fx.board);

    controller.reorder_columns(&order).await.unwrap();

    assert!(controller.store().recorded().is_empty());
}

#[tokio::test]
async fn test_reorder_columns_failure_restores_previous_order() {
    let fx = standard_board();
    let before = fx.board.clone();
    let mut controller =
        SyncController::new(MemoryStore::failing_on("set_project_column_order"), fx.board);

    let err = controller
        .reorder_columns(&[fx.done, fx.backlog, fx.doing, fx.review])
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Store { .. }));
    assert_eq!(*controller.board(), before);
    assert_eq!(controller.drain_notices().len(), 1);
}

#[tokio::test]
async fn test_delete_default_column_is_rejected_without_any_call() {
    let fx = standard_board();
    let before = fx.board.clone();
    let mut controller = SyncController::new(MemoryStore::new(), fx.board);

    let err = controller.delete_column(fx.backlog).await.unwrap_err();

    assert!(matches!(
        err,
        SyncError::Core(crate::CoreError::InvariantViolation { .. })
    ));
    assert_eq!(controller.phase(), OpPhase::Idle);
    assert_eq!(*controller.board(), before);
    assert!(controller.store().recorded().is_empty());
}

#[tokio::test]
async fn test_delete_column_relocates_then_deletes() {
    let fx = standard_board();
    let mut controller = SyncController::new(MemoryStore::new(), fx.board);

    let relocated = controller.delete_column(fx.review).await.unwrap();

    assert_eq!(relocated, vec![fx.task_t1, fx.task_t2]);
    assert_eq!(controller.store().recorded(), vec!["delete_column"]);
    assert!(controller.board().column(fx.review).is_none());
    assert_eq!(
        controller.board().ordered_task_ids(fx.backlog).unwrap(),
        &[fx.task_a, fx.task_b, fx.task_c, fx.task_t1, fx.task_t2]
    );
    assert_dense(controller.board(), fx.backlog);
}

#[tokio::test]
async fn test_delete_column_failure_keeps_the_column() {
    let fx = standard_board();
    let before = fx.board.clone();
    let mut controller =
        SyncController::new(MemoryStore::failing_on("delete_column"), fx.board);

    controller.delete_column(fx.review).await.unwrap_err();

    assert_eq!(*controller.board(), before);
    assert!(controller.board().column(fx.review).is_some());
    assert_eq!(controller.phase(), OpPhase::RolledBack);
}

#[tokio::test]
async fn test_create_column_appends_at_end() {
    let fx = standard_board();
    let mut controller = SyncController::new(MemoryStore::new(), fx.board);

    let column = controller.create_column("Blocked", None).await.unwrap();

    assert_eq!(column.sort_order, 4);
    assert_eq!(controller.store().recorded(), vec!["create_column"]);
    assert_eq!(controller.board().ordered_column_ids().last(), Some(&column.id));
}

#[tokio::test]
async fn test_create_column_with_empty_name_is_rejected_before_applying() {
    let fx = standard_board();
    let before = fx.board.clone();
    let mut controller = SyncController::new(MemoryStore::new(), fx.board);

    let err = controller.create_column("   ", None).await.unwrap_err();

    assert!(matches!(
        err,
        SyncError::Core(crate::CoreError::Validation { .. })
    ));
    assert_eq!(*controller.board(), before);
    assert!(controller.store().recorded().is_empty());
}

#[tokio::test]
async fn test_create_task_appends_to_column() {
    let fx = standard_board();
    let mut controller = SyncController::new(MemoryStore::new(), fx.board);

    let task = controller
        .create_task(fx.doing, "new work", None, Some(2), None)
        .await
        .unwrap();

    assert_eq!(task.position, 3);
    assert_eq!(task.priority, 2);
    assert_eq!(controller.store().recorded(), vec!["create_task"]);
    assert_eq!(
        controller.board().ordered_task_ids(fx.doing).unwrap().last(),
        Some(&task.id)
    );
}

#[tokio::test]
async fn test_create_task_failure_rolls_the_insert_back() {
    let fx = standard_board();
    let before = fx.board.clone();
    let mut controller = SyncController::new(MemoryStore::failing_on("create_task"), fx.board);

    controller
        .create_task(fx.doing, "new work", None, None, None)
        .await
        .unwrap_err();

    assert_eq!(*controller.board(), before);
}

#[tokio::test]
async fn test_create_subtask_inherits_column_and_priority() {
    let fx = standard_board();
    let mut controller = SyncController::new(MemoryStore::new(), fx.board);
    controller
        .update_task(
            fx.task_x,
            TaskPatch {
                priority: Some(1),
                ..TaskPatch::default()
            },
        )
        .await
        .unwrap();

    let subtask = controller
        .create_subtask(fx.task_x, "  checklist entry  ")
        .await
        .unwrap();

    assert_eq!(subtask.parent_id, Some(fx.task_x));
    assert_eq!(subtask.priority, 1);
    assert_eq!(subtask.title, "checklist entry");
    assert_eq!(
        controller.board().checklists().for_parent(fx.task_x),
        &[subtask.id]
    );
    // Subtasks never enter the column order.
    assert_eq!(
        controller.board().ordered_task_ids(fx.doing).unwrap(),
        &[fx.task_x, fx.task_y, fx.task_z]
    );
}

#[tokio::test]
async fn test_subtasks_cannot_nest() {
    let fx = standard_board();
    let mut controller = SyncController::new(MemoryStore::new(), fx.board);
    let subtask = controller.create_subtask(fx.task_x, "sub").await.unwrap();

    let err = controller.create_subtask(subtask.id, "subsub").await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::Core(crate::CoreError::InvariantViolation { .. })
    ));
}

#[tokio::test]
async fn test_update_task_with_out_of_range_priority_is_rejected() {
    let fx = standard_board();
    let before = fx.board.clone();
    let mut controller = SyncController::new(MemoryStore::new(), fx.board);

    let err = controller
        .update_task(
            fx.task_a,
            TaskPatch {
                priority: Some(5),
                ..TaskPatch::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SyncError::Core(crate::CoreError::Validation { .. })
    ));
    assert_eq!(*controller.board(), before);
    assert!(controller.store().recorded().is_empty());
}

#[tokio::test]
async fn test_delete_task_renumbers_siblings() {
    let fx = standard_board();
    let mut controller = SyncController::new(MemoryStore::new(), fx.board);

    controller.delete_task(fx.task_b).await.unwrap();

    assert_eq!(controller.store().recorded(), vec!["delete_task"]);
    assert_eq!(
        controller.board().ordered_task_ids(fx.backlog).unwrap(),
        &[fx.task_a, fx.task_c]
    );
    assert_dense(controller.board(), fx.backlog);
}

#[tokio::test]
async fn test_toggle_complete_moves_to_done_column_end() {
    let fx = standard_board();
    let mut controller = SyncController::new(MemoryStore::new(), fx.board);

    let task = controller.toggle_complete(fx.task_a).await.unwrap();

    assert!(task.is_completed());
    assert_eq!(task.column_id, fx.done);
    assert_eq!(
        controller.board().ordered_task_ids(fx.done).unwrap(),
        &[fx.task_a]
    );
    assert_eq!(
        controller.board().ordered_task_ids(fx.backlog).unwrap(),
        &[fx.task_b, fx.task_c]
    );
    assert_eq!(
        controller.store().recorded(),
        vec![
            "move_task",
            "set_column_task_order",
            "set_column_task_order"
        ]
    );
}

#[tokio::test]
async fn test_toggle_complete_back_returns_to_default_column() {
    let fx = standard_board();
    let mut controller = SyncController::new(MemoryStore::new(), fx.board);
    controller.toggle_complete(fx.task_a).await.unwrap();

    let task = controller.toggle_complete(fx.task_a).await.unwrap();

    assert!(!task.is_completed());
    assert_eq!(task.column_id, fx.backlog);
    assert_eq!(
        controller.board().ordered_task_ids(fx.backlog).unwrap(),
        &[fx.task_b, fx.task_c, fx.task_a]
    );
}

#[tokio::test]
async fn test_toggle_complete_on_subtask_only_flips_the_flag() {
    let fx = standard_board();
    let mut controller = SyncController::new(MemoryStore::new(), fx.board);
    let subtask = controller.create_subtask(fx.task_x, "sub").await.unwrap();

    let toggled = controller.toggle_complete(subtask.id).await.unwrap();

    assert!(toggled.is_completed());
    assert_eq!(toggled.column_id, fx.doing);
    assert_eq!(
        controller.store().recorded(),
        vec!["create_task", "update_task"]
    );
}

#[tokio::test]
async fn test_preview_mutates_locally_without_persistence() {
    let fx = standard_board();
    let mut controller = SyncController::new(MemoryStore::new(), fx.board);
    let session = DragSession::begin(controller.board(), fx.task_a).unwrap();

    let plan = session.drag_over(controller.board(), fx.task_y).unwrap();
    controller.preview(&plan).unwrap();

    assert_eq!(
        controller.board().ordered_task_ids(fx.doing).unwrap(),
        &[fx.task_x, fx.task_a, fx.task_y, fx.task_z]
    );
    assert!(controller.store().recorded().is_empty());
}

#[tokio::test]
async fn test_release_over_nothing_commits_the_preview() {
    let fx = standard_board();
    let mut controller = SyncController::new(MemoryStore::new(), fx.board);
    let session = DragSession::begin(controller.board(), fx.task_a).unwrap();

    let plan = session.drag_over(controller.board(), fx.task_y).unwrap();
    controller.preview(&plan).unwrap();

    let final_plan = session.drag_end(controller.board(), None);
    assert_eq!(final_plan, MovePlan::NoOp);
    controller.execute(final_plan).await.unwrap();

    // The previewed spot became final and was persisted.
    assert_eq!(
        controller.board().ordered_task_ids(fx.doing).unwrap(),
        &[fx.task_x, fx.task_a, fx.task_y, fx.task_z]
    );
    assert_eq!(
        controller.store().recorded(),
        vec![
            "move_task",
            "set_column_task_order",
            "set_column_task_order"
        ]
    );
    assert_eq!(controller.phase(), OpPhase::Committed);
}

#[tokio::test]
async fn test_commit_failure_reverts_the_whole_gesture() {
    let fx = standard_board();
    let before = fx.board.clone();
    let mut controller =
        SyncController::new(MemoryStore::failing_on("move_task"), fx.board);
    let session = DragSession::begin(controller.board(), fx.task_a).unwrap();

    let plan = session.drag_over(controller.board(), fx.task_y).unwrap();
    controller.preview(&plan).unwrap();

    let final_plan = session.drag_end(controller.board(), Some(fx.task_y));
    controller.execute(final_plan).await.unwrap_err();

    // Rollback undoes the preview too: back to the pre-gesture board.
    assert_eq!(*controller.board(), before);
    assert_eq!(controller.phase(), OpPhase::RolledBack);
    assert_eq!(controller.drain_notices().len(), 1);
}

#[tokio::test]
async fn test_release_without_preview_over_nothing_does_nothing() {
    let fx = standard_board();
    let before = fx.board.clone();
    let mut controller = SyncController::new(MemoryStore::new(), fx.board);
    let session = DragSession::begin(controller.board(), fx.task_a).unwrap();

    let plan = session.drag_end(controller.board(), None);
    controller.execute(plan).await.unwrap();

    assert_eq!(*controller.board(), before);
    assert!(controller.store().recorded().is_empty());
}
