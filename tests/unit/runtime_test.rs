//! Tests for tokio spawner utilities

use env_reaper::core::SchedulerError;
use env_reaper::runtime::tokio_spawner::TokioSpawner;
use env_reaper::runtime::Spawn;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[tokio::test]
async fn test_current_spawner_inside_runtime() {
    let spawner = TokioSpawner::current().expect("inside a runtime");

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send("spawned").unwrap();
    });
    assert_eq!(rx.await.unwrap(), "spawned");
}

#[test]
fn test_current_spawner_outside_runtime() {
    let result = TokioSpawner::current();
    assert!(matches!(result, Err(SchedulerError::Runtime(_))));
}
