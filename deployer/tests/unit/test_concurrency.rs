//! Mutual exclusion between concurrent requests

use std::path::Path;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use fs2::FileExt;

use deployer::deploy::lock::acquire_blocking;

use crate::common::{app, request, send, write_conf};

fn write_sleeper(dir: &Path, name: &str) {
    write_conf(
        dir,
        name,
        &format!(
            "commands = [\"sh\", \"-c\", \"echo start {name} >> trace; sleep 0.4; echo end {name} >> trace\"]\n\
             env = [\"PATH=/usr/local/bin:/usr/bin:/bin\"]\n"
        ),
    );
}

fn trace(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("trace"))
        .unwrap()
        .lines()
        .map(|line| line.split_whitespace().next().unwrap_or("").to_string())
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_deployment_never_overlaps() {
    let temp = tempfile::tempdir().unwrap();
    write_sleeper(temp.path(), "site");
    let router = app(temp.path());

    let started = Instant::now();
    let (first, second) = tokio::join!(
        send(router.clone(), request("POST", "/incoming/site", "")),
        send(router.clone(), request("POST", "/incoming/site", "")),
    );

    assert_eq!(first.0, StatusCode::OK);
    assert_eq!(second.0, StatusCode::OK);
    assert!(started.elapsed() >= Duration::from_millis(800));
    assert_eq!(trace(temp.path()), vec!["start", "end", "start", "end"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_different_deployments_run_in_parallel() {
    let temp = tempfile::tempdir().unwrap();
    write_sleeper(temp.path(), "alpha");
    write_sleeper(temp.path(), "beta");
    let router = app(temp.path());

    let (first, second) = tokio::join!(
        send(router.clone(), request("POST", "/incoming/alpha", "")),
        send(router.clone(), request("POST", "/incoming/beta", "")),
    );

    assert_eq!(first.0, StatusCode::OK);
    assert_eq!(second.0, StatusCode::OK);
    assert_eq!(trace(temp.path()), vec!["start", "start", "end", "end"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_dropped_request_keeps_lock_until_command_exits() {
    let temp = tempfile::tempdir().unwrap();
    write_conf(
        temp.path(),
        "site",
        "commands = [\"sh\", \"-c\", \"sleep 1; echo done > marker\"]\n\
         env = [\"PATH=/usr/local/bin:/usr/bin:/bin\"]\n",
    );
    let router = app(temp.path());

    let abandoned = tokio::time::timeout(
        Duration::from_millis(300),
        send(router, request("POST", "/incoming/site", "")),
    )
    .await;
    assert!(abandoned.is_err());

    let lock_path = temp.path().join("site.conf.lock");
    let contender = std::fs::File::open(&lock_path).unwrap();
    assert!(contender.try_lock_exclusive().is_err());
    assert!(!temp.path().join("marker").exists());
    drop(contender);

    let handle = tokio::task::spawn_blocking(move || acquire_blocking(&lock_path))
        .await
        .unwrap()
        .unwrap();
    assert!(temp.path().join("marker").exists());
    handle.release();
}
