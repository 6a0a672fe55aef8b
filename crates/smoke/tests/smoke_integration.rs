//! Runs the smoke suite against in-process backend and frontend servers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use api::database::SqlDatabase;
use api::routes::AppState;
use axum::Json;
use axum::Router;
use axum::http::{HeaderValue, StatusCode};
use axum::routing::get;
use reqwest::Url;
use smoke::checks::{ApiDocs, BackendHealth, DatabaseConnection, FrontendLoads};
use smoke::{CheckContext, CheckStatus, HarnessConfig, Runner, SmokeCheck, default_suite};

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn healthy_backend() -> SocketAddr {
    let database = SqlDatabase::connect_lazy("sqlite::memory:", Duration::from_secs(2)).unwrap();
    let metrics = metrics_exporter_prometheus::PrometheusBuilder::new()
        .build_recorder()
        .handle();
    serve(api::create_app(
        Arc::new(AppState { database }),
        metrics,
        HeaderValue::from_static("http://localhost:3000"),
    ))
    .await
}

async fn degraded_backend() -> SocketAddr {
    serve(
        Router::new()
            .route(
                "/health",
                get(|| async {
                    Json(serde_json::json!({"status": "degraded", "database": "disconnected"}))
                }),
            )
            .route("/docs", get(|| async { "docs" })),
    )
    .await
}

async fn frontend() -> SocketAddr {
    serve(web::create_app()).await
}

fn context(frontend: SocketAddr, backend: SocketAddr) -> Arc<CheckContext> {
    Arc::new(CheckContext::new(
        Url::parse(&format!("http://{frontend}")).unwrap(),
        Url::parse(&format!("http://{backend}")).unwrap(),
        Duration::from_secs(5),
    ))
}

/// Port that refuses connections.
async fn closed_port() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

#[tokio::test]
async fn healthy_services_pass_every_check() {
    let ctx = context(frontend().await, healthy_backend().await);

    let outcomes = Runner::new(4, 0, Duration::from_secs(5))
        .run(default_suite(), ctx)
        .await;

    assert_eq!(outcomes.len(), 4);
    for outcome in &outcomes {
        assert_eq!(
            outcome.status,
            CheckStatus::Passed,
            "{}: {:?}",
            outcome.title,
            outcome.error
        );
    }
}

#[tokio::test]
async fn degraded_backend_fails_health_and_database_only() {
    let ctx = context(frontend().await, degraded_backend().await);

    let outcomes = Runner::new(4, 0, Duration::from_secs(5))
        .run(default_suite(), ctx)
        .await;

    let status_of = |title: &str| {
        outcomes
            .iter()
            .find(|o| o.title.contains(title))
            .unwrap()
            .status
    };
    assert_eq!(status_of("health check"), CheckStatus::Failed);
    assert_eq!(status_of("database connection"), CheckStatus::Failed);
    assert_eq!(status_of("documentation"), CheckStatus::Passed);
    assert_eq!(status_of("frontend"), CheckStatus::Passed);

    let health = outcomes.iter().find(|o| o.title.contains("health check")).unwrap();
    assert_eq!(
        health.error.as_deref(),
        Some("expected property \"status\" to be \"healthy\", received \"degraded\"")
    );
}

#[tokio::test]
async fn absent_backend_fails_without_hanging() {
    let ctx = context(frontend().await, closed_port().await);
    let started = Instant::now();

    let result = BackendHealth.run(&ctx).await;

    let err = result.unwrap_err();
    assert!(!err.is_assertion(), "unexpected assertion: {err}");
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn docs_not_found_fails_docs_check() {
    let backend = serve(Router::new().route("/health", get(|| async { "ok" }))).await;
    let ctx = context(frontend().await, backend);

    let err = ApiDocs.run(&ctx).await.unwrap_err();
    assert!(err.is_assertion());
    assert!(err.to_string().contains("expected status 200 OK, received 404 Not Found"));
}

#[tokio::test]
async fn database_check_needs_connected_database() {
    let backend = serve(Router::new().route(
        "/health",
        get(|| async {
            Json(serde_json::json!({"status": "healthy", "database": "error: unable to open database file"}))
        }),
    ))
    .await;
    let ctx = context(frontend().await, backend);

    let err = DatabaseConnection.run(&ctx).await.unwrap_err();
    assert!(err.is_assertion());
}

#[tokio::test]
async fn health_error_status_fails_health_check() {
    let backend = serve(Router::new().route(
        "/health",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
    ))
    .await;
    let ctx = context(frontend().await, backend);

    let err = BackendHealth.run(&ctx).await.unwrap_err();
    assert!(err.to_string().contains("received 503 Service Unavailable"));
}

#[tokio::test]
async fn frontend_loads_twice_identically() {
    let ctx = context(frontend().await, closed_port().await);
    let check = FrontendLoads::default();

    check.run(&ctx).await.unwrap();
    check.run(&ctx).await.unwrap();
}

#[tokio::test]
async fn frontend_with_wrong_title_fails() {
    let site = serve(Router::new().route(
        "/",
        get(|| async {
            axum::response::Html("<html><head><title>Coming soon</title></head><body>x</body></html>")
        }),
    ))
    .await;
    let ctx = context(site, closed_port().await);

    let err = FrontendLoads::default().run(&ctx).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "expected page title to match /Tickets P2P/, received \"Coming soon\""
    );
}

#[tokio::test]
async fn hanging_backend_is_cut_off_by_timeout() {
    let backend = serve(Router::new().route(
        "/health",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            "late"
        }),
    ))
    .await;
    let ctx = context(frontend().await, backend);
    let started = Instant::now();

    let outcomes = Runner::new(1, 1, Duration::from_millis(200))
        .run(vec![Arc::new(BackendHealth) as Arc<dyn SmokeCheck>], ctx)
        .await;

    assert_eq!(outcomes[0].status, CheckStatus::Failed);
    assert_eq!(outcomes[0].attempts, 2);
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn run_suite_without_servers_builds_report() {
    let frontend = frontend().await;
    let backend = healthy_backend().await;
    let config = HarnessConfig {
        base_url: format!("http://{frontend}"),
        backend_url: format!("http://{backend}"),
        ..HarnessConfig::for_mode(true)
    };

    let report = smoke::run_suite(&config, default_suite(), false)
        .await
        .unwrap();

    assert!(report.ci);
    assert_eq!(report.workers, 1);
    assert_eq!(report.retries, 2);
    assert_eq!(report.passed(), 4);
    assert!(report.is_success());
}

#[tokio::test]
async fn run_suite_reuses_running_servers() {
    let frontend = frontend().await;
    let backend = healthy_backend().await;
    let mut config = HarnessConfig::for_mode(false);
    config.set_base_url(format!("http://{frontend}")).unwrap();
    config.set_backend_url(format!("http://{backend}")).unwrap();
    // any launch attempt would fail the run
    config.set_command("backend", "exit 1".to_string());
    config.set_command("frontend", "exit 1".to_string());

    let report = smoke::run_suite(&config, default_suite(), true)
        .await
        .unwrap();

    assert_eq!(report.failed(), 0);
}
