//! Dispatcher request/response tests

use axum::body::Body;
use axum::http::{Request, StatusCode};

use crate::common::{app, request, send, write_conf};

#[tokio::test]
async fn test_missing_config_is_404_without_locking() {
    let temp = tempfile::tempdir().unwrap();

    let (status, body) = send(app(temp.path()), request("POST", "/incoming/ghost", "")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.starts_with("Config ghost not found: "));
    assert!(body.ends_with('\n'));
    assert!(!temp.path().join("ghost.conf.lock").exists());
}

#[tokio::test]
async fn test_missing_base_dir_is_404() {
    let temp = tempfile::tempdir().unwrap();
    let gone = temp.path().join("gone");

    let (status, body) = send(app(&gone), request("GET", "/incoming/site", "")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Config site not found: Path not found\n");
}

#[tokio::test]
async fn test_malformed_config_is_500() {
    let temp = tempfile::tempdir().unwrap();
    write_conf(temp.path(), "broken", "commands = [");

    let (status, body) = send(app(temp.path()), request("GET", "/incoming/broken", "")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with("Config broken read error: "));
}

#[tokio::test]
async fn test_echo_round_trip() {
    let temp = tempfile::tempdir().unwrap();
    write_conf(temp.path(), "hello", "commands = [\"echo\", \"hello\"]\nlog-to = \"hello.log\"\n");

    let (status, body) = send(app(temp.path()), request("GET", "/incoming/hello", "")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    let logged = std::fs::read_to_string(temp.path().join("hello.log")).unwrap();
    assert_eq!(logged, "hello\n");
}

#[tokio::test]
async fn test_name_is_last_path_segment() {
    let temp = tempfile::tempdir().unwrap();
    write_conf(temp.path(), "site", "commands = [\"true\"]\n");

    let (status, body) = send(app(temp.path()), request("POST", "/incoming/team/site/", "")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_disallowed_method_is_400_and_never_runs() {
    let temp = tempfile::tempdir().unwrap();
    write_conf(
        temp.path(),
        "site",
        "commands = [\"sh\", \"-c\", \"echo ran > marker\"]\nallowed-methods = [\"POST\"]\n",
    );

    let (status, body) = send(app(temp.path()), request("GET", "/incoming/site", "")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Config site preconditions error: Method not allowed\n");
    assert!(!temp.path().join("marker").exists());
    assert!(!temp.path().join("site.conf.lock").exists());
}

#[tokio::test]
async fn test_unsupported_method_rejected_by_router() {
    let temp = tempfile::tempdir().unwrap();
    write_conf(temp.path(), "site", "commands = [\"true\"]\n");

    let (status, _) = send(app(temp.path()), request("PUT", "/incoming/site", "")).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_body_secret() {
    let temp = tempfile::tempdir().unwrap();
    write_conf(
        temp.path(),
        "site",
        "commands = [\"sh\", \"-c\", \"echo ran > marker\"]\nsecret = \"s3cret\"\n",
    );

    let (status, body) = send(app(temp.path()), request("POST", "/incoming/site", "wrong")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Config site preconditions error: Secret mismatched\n");

    let (status, body) = send(app(temp.path()), request("POST", "/incoming/site", "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Config site preconditions error: Body is empty\n");
    assert!(!temp.path().join("marker").exists());

    let (status, body) = send(app(temp.path()), request("POST", "/incoming/site", "s3cret")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    assert!(temp.path().join("marker").exists());
}

#[tokio::test]
async fn test_header_secret() {
    let temp = tempfile::tempdir().unwrap();
    write_conf(
        temp.path(),
        "site",
        "commands = [\"true\"]\nsecret = \"s3cret\"\nsecret-header = \"X-Deploy-Secret\"\n",
    );

    // body is ignored when the header is configured
    let (status, _) = send(app(temp.path()), request("POST", "/incoming/site", "s3cret")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let with_header = Request::builder()
        .method("GET")
        .uri("/incoming/site")
        .header("x-deploy-secret", "s3cret")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(temp.path()), with_header).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_failing_command_is_500_with_output() {
    let temp = tempfile::tempdir().unwrap();
    write_conf(
        temp.path(),
        "fail",
        "commands = [\"sh\", \"-c\", \"echo broken build >&2; exit 2\"]\n",
    );

    let (status, body) = send(app(temp.path()), request("POST", "/incoming/fail", "")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("execution error"));
    assert!(body.contains("broken build"));
    assert!(body.starts_with("Config fail execution error: "));
}

#[tokio::test]
async fn test_missing_executable_is_500() {
    let temp = tempfile::tempdir().unwrap();
    write_conf(temp.path(), "nobin", "commands = [\"/no/such/program\"]\n");

    let (status, body) = send(app(temp.path()), request("POST", "/incoming/nobin", "")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with("Config nobin execution error: "));
}

#[tokio::test]
async fn test_repeated_requests_keep_lock_usable() {
    let temp = tempfile::tempdir().unwrap();
    write_conf(temp.path(), "echo", "commands = [\"echo\", \"again\"]\n");

    for _ in 0..5 {
        let (status, body) = send(app(temp.path()), request("GET", "/incoming/echo", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    let lock_path = temp.path().join("echo.conf.lock");
    assert!(lock_path.exists());
    deployer::deploy::lock::acquire_blocking(&lock_path)
        .unwrap()
        .release();
}
