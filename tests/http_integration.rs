mod common;

use axum::http::{StatusCode, header};
use common::{body_text, build_app, get, scenario_probe};
use hostmetrics::config::DiskAggregation;
use hostmetrics::probe::fake::ProbeCall;
use serde_json::Value;
use tower::ServiceExt;

#[tokio::test]
async fn metrics_endpoint_collects_and_renders() {
    let probe = scenario_probe();
    let app = build_app(&probe, DiskAggregation::Averaged);

    let response = app
        .oneshot(get("/metrics"))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/plain; version=0.0.4; charset=utf-8"
    );

    let body = body_text(response).await;
    for line in [
        "cpu_usage_0 10",
        "cpu_usage_1 20",
        "cpu_usage_2 30",
        "cpu_usage_3 40",
        "total_cpu_usage 25",
        "cpu_core_count 4",
        "memory_usage 62.5",
        "total_memory_usage 62.5",
        "total_memory_installed 16000000000",
        "swap_usage 3",
        "total_disk_size 300000000000",
        "total_disk_usage 37.5",
        "disk_usage__{mountpoint=\"/\"} 50",
        "disk_usage__data{mountpoint=\"/data\"} 25",
    ] {
        assert!(body.contains(line), "missing `{line}` in:\n{body}");
    }
    assert!(body.contains("# HELP total_cpu_usage Total CPU usage percentage"));
    assert!(body.contains("# TYPE total_cpu_usage gauge"));
    assert_eq!(probe.cpu_intervals().len(), 1);
}

#[tokio::test]
async fn every_scrape_recollects() {
    let probe = scenario_probe();
    let app = build_app(&probe, DiskAggregation::Root);

    let first = body_text(app.clone().oneshot(get("/metrics")).await.unwrap()).await;
    assert!(first.contains("total_cpu_usage 25"));

    probe.set_cpu(vec![90.0, 90.0, 90.0, 90.0], 90.0);
    let second = body_text(app.oneshot(get("/metrics")).await.unwrap()).await;

    assert!(second.contains("total_cpu_usage 90"));
    assert_eq!(probe.cpu_intervals().len(), 2);
}

#[tokio::test]
async fn failed_cycle_still_answers_ok_with_stale_values() {
    let probe = scenario_probe();
    let app = build_app(&probe, DiskAggregation::Root);
    app.clone().oneshot(get("/metrics")).await.unwrap();

    probe.set_partitions(vec![hostmetrics::probe::PartitionSample::new(
        "/",
        100 * common::GB,
        75.0,
    )]);
    probe.fail(ProbeCall::NetworkIo);
    probe.fail(ProbeCall::Partitions);

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("total_disk_usage 50"));
    assert!(body.contains("disk_usage__{mountpoint=\"/\"} 50"));
}

#[tokio::test]
async fn root_returns_status_without_collecting() {
    let probe = scenario_probe();
    let app = build_app(&probe, DiskAggregation::Root);

    let response = app.oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json, serde_json::json!({ "status": "running" }));
    assert!(probe.cpu_intervals().is_empty());
}

#[tokio::test]
async fn health_check_answers_ok() {
    let app = build_app(&scenario_probe(), DiskAggregation::Root);
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");
}

#[tokio::test]
async fn concurrent_scrapes_both_succeed() {
    let probe = scenario_probe();
    let app = build_app(&probe, DiskAggregation::Averaged);

    let (a, b) = tokio::join!(
        app.clone().oneshot(get("/metrics")),
        app.oneshot(get("/metrics"))
    );

    assert_eq!(a.unwrap().status(), StatusCode::OK);
    assert_eq!(b.unwrap().status(), StatusCode::OK);
    assert_eq!(probe.cpu_intervals().len(), 2);
}
