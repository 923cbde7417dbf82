mod common;

use axum::extract::State;
use gocart_api::routes::health::health_check;

#[tokio::test]
async fn health_reports_degraded_without_a_database() -> anyhow::Result<()> {
    let state = common::offline_state()?;
    let response = health_check(State(state)).await;
    assert_eq!(response.0.message, "Health check");
    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "degraded");
    assert!(!data.database);
    assert_eq!(data.service, "gocart-api");
    assert_eq!(data.version, env!("CARGO_PKG_VERSION"));
    Ok(())
}

#[tokio::test]
async fn health_is_ok_when_the_database_answers() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let data = health_check(State(state)).await.0.data.expect("health data");
    assert_eq!(data.status, "ok");
    assert!(data.database);
    Ok(())
}
