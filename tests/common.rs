#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, Response};
use axum::Router;
use hostmetrics::config::DiskAggregation;
use hostmetrics::metrics::{Collector, CollectorSettings, Exporter};
use hostmetrics::platform::Posix;
use hostmetrics::probe::fake::ScriptedProbe;
use hostmetrics::probe::PartitionSample;
use hostmetrics::routes::create_router;
use hostmetrics::state::AppState;
use std::time::Duration;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

pub const GB: u64 = 1_000_000_000;

/// Four cores, `/` and `/data`, matching the documented scenarios.
pub fn scenario_probe() -> ScriptedProbe {
    let probe = ScriptedProbe::new(4).with_partitions(vec![
        PartitionSample::new("/", 100 * GB, 50.0),
        PartitionSample::new("/data", 200 * GB, 25.0),
    ]);
    probe.set_cpu(vec![10.0, 20.0, 30.0, 40.0], 25.0);
    probe.set_memory(62.5, 16 * GB, 3.0);
    probe
}

pub fn settings(aggregation: DiskAggregation) -> CollectorSettings {
    CollectorSettings {
        cpu_sample_interval: Duration::from_secs(1),
        disk_aggregation: aggregation,
    }
}

pub fn build_collector(probe: &ScriptedProbe, aggregation: DiskAggregation) -> Collector {
    Collector::new(
        Arc::new(Posix),
        Box::new(probe.clone()),
        settings(aggregation),
    )
    .expect("registry should build from scripted topology")
}

pub fn build_app(probe: &ScriptedProbe, aggregation: DiskAggregation) -> Router {
    let state = AppState::new(Exporter::new(build_collector(probe, aggregation)));
    create_router(state)
}

pub fn get(path: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(path)
        .body(Body::empty())
        .expect("failed to build request")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    String::from_utf8(bytes.to_vec()).expect("body should be UTF-8")
}

/// Counts ERROR events seen by the subscriber it is installed in.
#[derive(Clone, Default)]
pub struct ErrorCounter(Arc<AtomicUsize>);

impl ErrorCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::ERROR {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}
