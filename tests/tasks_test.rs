mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{at, session, task};
use tandem_rs::backend::{Backend, MemoryBackend, Op};
use tandem_rs::engine::{NoticeKind, RowState, TaskBoard, order_tasks};

#[test]
fn open_tasks_first_then_newest_first() {
    let s = session();
    let mut tasks = vec![
        task(&s, "old open", false, at(2024, 1, 1, 0, 0, 0)),
        task(&s, "new done", true, at(2024, 1, 3, 0, 0, 0)),
        task(&s, "new open", false, at(2024, 1, 2, 0, 0, 0)),
        task(&s, "old done", true, at(2024, 1, 1, 0, 0, 0)),
    ];
    order_tasks(&mut tasks);
    let texts: Vec<_> = tasks.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, ["new open", "old open", "new done", "old done"]);
}

async fn seeded() -> (Arc<MemoryBackend>, TaskBoard) {
    let s = session();
    let backend = Arc::new(MemoryBackend::new());
    backend.insert_task(task(&s, "buy flowers", false, at(2024, 1, 1, 9, 0, 0)));
    backend.insert_task(task(&s, "book table", false, at(2024, 1, 2, 9, 0, 0)));
    backend.insert_task(task(&s, "pick movie", true, at(2024, 1, 3, 9, 0, 0)));
    let board = TaskBoard::new(backend.clone(), &s);
    board.load().await.unwrap();
    (backend, board)
}

#[tokio::test]
async fn create_prepends_after_confirmation_and_clears_input() {
    let (backend, board) = seeded().await;

    let mut input = "  write letter ".to_string();
    let created = board.create(&mut input).await.unwrap();

    assert_eq!(created.text, "write letter");
    assert!(input.is_empty());
    assert_eq!(board.tasks()[0].id, created.id);
    assert_eq!(backend.tasks().len(), 4);
}

#[tokio::test]
async fn blank_task_is_rejected_before_any_remote_call() {
    let (backend, board) = seeded().await;

    let mut input = "   ".to_string();
    let notice = board.create(&mut input).await.unwrap_err();

    assert_eq!(notice.kind, NoticeKind::Validation);
    assert_eq!(backend.calls(Op::CreateTask), 0);
    assert_eq!(input, "   ");
}

#[tokio::test]
async fn failed_create_keeps_input_and_list() {
    let (backend, board) = seeded().await;
    backend.fail_next(Op::CreateTask);

    let before = board.tasks();
    let mut input = "write letter".to_string();
    let notice = board.create(&mut input).await.unwrap_err();

    assert_eq!(notice.kind, NoticeKind::Transient);
    assert_eq!(input, "write letter");
    assert_eq!(board.tasks(), before);
}

#[tokio::test(start_paused = true)]
async fn toggle_is_visible_before_the_backend_answers() {
    let (backend, board) = seeded().await;
    backend.set_latency(Some(Duration::from_millis(100)));
    let target = board.tasks()[0].clone();
    assert!(!target.completed);

    let toggle = board.toggle(target.id);
    tokio::pin!(toggle);
    assert!(
        tokio::time::timeout(Duration::from_millis(10), &mut toggle)
            .await
            .is_err()
    );

    let local = board.tasks();
    let row = local.iter().find(|t| t.id == target.id).unwrap();
    assert!(row.completed);
    assert_eq!(board.row_state(target.id), RowState::Mutating);
    let remote = backend.tasks();
    assert!(!remote.iter().find(|t| t.id == target.id).unwrap().completed);

    toggle.await.unwrap();
    assert_eq!(board.row_state(target.id), RowState::Idle);
    let remote = backend.tasks();
    assert!(remote.iter().find(|t| t.id == target.id).unwrap().completed);
}

#[tokio::test]
async fn failed_toggle_reloads_the_remote_state() {
    let (backend, board) = seeded().await;
    let s_couple = board.tasks()[0].couple_id;
    let pre_toggle = backend.list_tasks(s_couple).await.unwrap();
    let target = board.tasks()[0].id;

    backend.fail_next(Op::UpdateTask);
    let notice = board.toggle(target).await.unwrap_err();

    assert_eq!(notice.kind, NoticeKind::Transient);
    let mut expected = pre_toggle;
    order_tasks(&mut expected);
    assert_eq!(board.tasks(), expected);
    assert_eq!(board.row_state(target), RowState::Idle);
}

#[tokio::test]
async fn failed_delete_reloads_the_remote_state() {
    let (backend, board) = seeded().await;
    let before = board.tasks();
    let target = before[1].id;
    let list_calls = backend.calls(Op::ListTasks);

    backend.fail_next(Op::DeleteTask);
    let notice = board.delete(target).await.unwrap_err();

    assert_eq!(notice.kind, NoticeKind::Transient);
    assert_eq!(backend.calls(Op::ListTasks), list_calls + 1);
    assert_eq!(board.tasks(), before);
}

#[tokio::test]
async fn delete_removes_locally_and_remotely() {
    let (backend, board) = seeded().await;
    let target = board.tasks()[0].id;

    board.delete(target).await.unwrap();

    assert!(board.tasks().iter().all(|t| t.id != target));
    assert!(backend.tasks().iter().all(|t| t.id != target));
    assert_eq!(board.progress(), (1, 2));
}

#[tokio::test(start_paused = true)]
async fn different_rows_mutate_concurrently() {
    let (backend, board) = seeded().await;
    backend.set_latency(Some(Duration::from_millis(50)));
    let tasks = board.tasks();

    let (a, b) = tokio::join!(board.toggle(tasks[0].id), board.delete(tasks[1].id));
    a.unwrap();
    b.unwrap();

    assert_eq!(board.tasks().len(), 2);
    assert_eq!(backend.tasks().len(), 2);
    assert_eq!(board.progress(), (2, 2));
}

#[tokio::test(start_paused = true)]
async fn rollback_keeps_a_delete_still_in_flight() {
    let (backend, board) = seeded().await;
    backend.set_latency(Some(Duration::from_millis(100)));
    let tasks = board.tasks();
    let (failing, deleted) = (tasks[0].id, tasks[1].id);

    backend.fail_next(Op::UpdateTask);
    let (toggled, removed) = tokio::join!(board.toggle(failing), async {
        tokio::time::sleep(Duration::from_millis(150)).await;
        board.delete(deleted).await
    });

    assert_eq!(toggled.unwrap_err().kind, NoticeKind::Transient);
    removed.unwrap();
    assert!(backend.tasks().iter().all(|t| t.id != deleted));
    assert!(board.tasks().iter().all(|t| t.id != deleted));

    let mut remote = backend.tasks();
    order_tasks(&mut remote);
    assert_eq!(board.tasks(), remote);
}

#[tokio::test(start_paused = true)]
async fn rollback_keeps_a_toggle_still_in_flight() {
    let (backend, board) = seeded().await;
    backend.set_latency(Some(Duration::from_millis(100)));
    let tasks = board.tasks();
    let (failing, flipped) = (tasks[0].id, tasks[2].id);
    assert!(tasks[2].completed);

    backend.fail_next(Op::UpdateTask);
    let (first, second) = tokio::join!(board.toggle(failing), async {
        tokio::time::sleep(Duration::from_millis(150)).await;
        board.toggle(flipped).await
    });

    assert!(first.is_err());
    second.unwrap();
    let local = board.tasks();
    assert!(!local.iter().find(|t| t.id == flipped).unwrap().completed);
    assert!(!local.iter().find(|t| t.id == failing).unwrap().completed);

    let mut remote = backend.tasks();
    order_tasks(&mut remote);
    assert_eq!(local, remote);
    assert_eq!(board.row_state(flipped), RowState::Idle);
}

#[tokio::test(start_paused = true)]
async fn second_mutation_on_a_busy_row_is_refused() {
    let (backend, board) = seeded().await;
    backend.set_latency(Some(Duration::from_millis(50)));
    let target = board.tasks()[0].id;

    let (first, second) = tokio::join!(board.toggle(target), board.delete(target));
    first.unwrap();
    assert_eq!(second.unwrap_err().kind, NoticeKind::Busy);
    assert!(backend.tasks().iter().any(|t| t.id == target));
}

#[tokio::test]
async fn failed_load_keeps_the_previous_list() {
    let (backend, board) = seeded().await;
    let before = board.tasks();

    backend.fail_next(Op::ListTasks);
    let notice = board.load().await.unwrap_err();

    assert_eq!(notice.kind, NoticeKind::Transient);
    assert_eq!(board.tasks(), before);
}

#[tokio::test]
async fn unknown_task_is_not_found() {
    let (_backend, board) = seeded().await;
    let notice = board
        .toggle(tandem_rs::model::TaskId::new())
        .await
        .unwrap_err();
    assert_eq!(notice.kind, NoticeKind::NotFound);
}
