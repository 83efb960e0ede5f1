use tracing::field::{Field, Visit};
use tracing::level_filters::LevelFilter;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::{LogFormat, LoggingConfig};
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

#[derive(Default)]
struct FieldCollector {
    fields: Map<String, Value>,
}

impl Visit for FieldCollector {
    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.fields
            .insert(field.name().to_string(), Value::from(format!("{:?}", value)));
    }
}

/// Writes each event as one OTel log-data-model JSON line.
#[derive(Clone)]
pub struct OtelJsonFormat {
    resource: Map<String, Value>,
}

impl OtelJsonFormat {
    pub fn new(config: &LoggingConfig) -> Self {
        let mut resource = Map::new();
        resource.insert(
            "service.name".to_string(),
            Value::from(config.service_name.clone()),
        );
        resource.insert(
            "service.version".to_string(),
            Value::from(config.service_version.clone()),
        );
        if let Some(host) = sysinfo::System::host_name() {
            resource.insert("host.name".to_string(), Value::from(host));
        }
        OtelJsonFormat { resource }
    }

    fn severity_number(level: &Level) -> u64 {
        match *level {
            Level::TRACE => 1,
            Level::DEBUG => 5,
            Level::INFO => 9,
            Level::WARN => 13,
            Level::ERROR => 17,
        }
    }
}

impl<S, N> FormatEvent<S, N> for OtelJsonFormat
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let mut collector = FieldCollector::default();
        event.record(&mut collector);

        let mut attributes = collector.fields;
        attributes.insert("code.target".to_string(), Value::from(metadata.target()));
        if let Some(line) = metadata.line() {
            attributes.insert("code.lineno".to_string(), Value::from(line));
        }

        let body = match attributes.remove("message") {
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => metadata.name().to_string(),
        };

        let mut root = Map::new();
        root.insert(
            "timestamp".to_string(),
            Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        root.insert(
            "severity_text".to_string(),
            Value::from(metadata.level().as_str()),
        );
        root.insert(
            "severity_number".to_string(),
            Value::from(Self::severity_number(metadata.level())),
        );
        root.insert("body".to_string(), Value::from(body));
        root.insert("resource".to_string(), Value::Object(self.resource.clone()));
        root.insert("attributes".to_string(), Value::Object(attributes));

        let serialized = serde_json::to_string(&Value::Object(root)).map_err(|_| std::fmt::Error)?;
        writer.write_str(&serialized)?;
        writer.write_char('\n')
    }
}

/// Installs the global subscriber. `RUST_LOG`, when set, wins over `level`.
pub fn init_logging(config: &LoggingConfig, level: LevelFilter) -> Result<(), TryInitError> {
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().event_format(OtelJsonFormat::new(config)))
            .try_init(),
        LogFormat::Console => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .try_init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use tracing_subscriber::prelude::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn json_lines_follow_the_otel_shape() {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let config = LoggingConfig {
            service_name: "hostmetrics-test".to_string(),
            ..LoggingConfig::default()
        };
        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .event_format(OtelJsonFormat::new(&config))
                .with_writer(move || writer.clone()),
        );

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(family = "disk", cores = 4u64, "Collected disk metrics");
        });

        let output = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        let line: Value = serde_json::from_str(output.trim()).unwrap();

        assert_eq!(line["body"], "Collected disk metrics");
        assert_eq!(line["severity_text"], "WARN");
        assert_eq!(line["severity_number"], 13);
        assert_eq!(line["resource"]["service.name"], "hostmetrics-test");
        assert_eq!(line["attributes"]["family"], "disk");
        assert_eq!(line["attributes"]["cores"], 4);
    }
}
