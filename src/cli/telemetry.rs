//! Log output on stderr, plus OTLP trace export when a collector is configured.

use anyhow::Result;
use opentelemetry::propagation::TextMapCompositePropagator;
use opentelemetry::{global, trace::TracerProvider as _, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    propagation::{BaggagePropagator, TraceContextPropagator},
    trace::{SdkTracerProvider, Tracer},
    Resource,
};
use std::{env::var, sync::OnceLock, time::Duration};
use tracing::{debug, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};
use ulid::Ulid;

const SERVICE_NAME: &str = env!("CARGO_PKG_NAME");
const EXPORT_TIMEOUT: Duration = Duration::from_secs(3);

/// HTTP client internals stay quiet unless `RUST_LOG` asks for them.
const QUIET_TARGETS: [&str; 3] = ["hyper=error", "reqwest=warn", "opentelemetry_sdk=warn"];

static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// Collector address from `OTEL_EXPORTER_OTLP_ENDPOINT`, or `None` when unset.
fn collector_endpoint() -> Option<String> {
    let endpoint = var("OTEL_EXPORTER_OTLP_ENDPOINT").ok()?;
    let endpoint = endpoint.trim();

    if endpoint.is_empty() {
        return None;
    }

    Some(with_scheme(endpoint))
}

// bare host:port is treated as TLS, matching the gRPC exporter default
fn with_scheme(endpoint: &str) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("https://{}", endpoint.trim_end_matches('/'))
    }
}

fn build_filter(level: Level) -> Result<EnvFilter> {
    let mut filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    for directive in QUIET_TARGETS {
        filter = filter.add_directive(directive.parse()?);
    }

    Ok(filter)
}

fn build_tracer(endpoint: &str) -> Result<Tracer> {
    match var("OTEL_EXPORTER_OTLP_PROTOCOL") {
        Ok(protocol) if protocol != "grpc" => {
            debug!("ignoring OTEL_EXPORTER_OTLP_PROTOCOL={protocol}, exporting over grpc");
        }
        _ => {}
    }

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .with_timeout(EXPORT_TIMEOUT)
        .build()?;

    let instance_id = var("OTEL_SERVICE_INSTANCE_ID").unwrap_or_else(|_| Ulid::new().to_string());

    let resource = Resource::builder_empty()
        .with_attributes([
            KeyValue::new("service.name", SERVICE_NAME),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
            KeyValue::new("service.instance.id", instance_id),
        ])
        .build();

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build();

    let _ = TRACER_PROVIDER.set(provider.clone());

    global::set_tracer_provider(provider.clone());
    global::set_text_map_propagator(TextMapCompositePropagator::new(vec![
        Box::new(TraceContextPropagator::new()),
        Box::new(BaggagePropagator::new()),
    ]));

    Ok(provider.tracer(SERVICE_NAME))
}

/// Install the global subscriber at `level` (ERROR when `None`).
///
/// Logs go to stderr so the JSON printed by `check` and `login` stays clean.
///
/// # Errors
///
/// Returns an error if the exporter cannot be built or a subscriber is already set
pub fn init(level: Option<Level>) -> Result<()> {
    let filter = build_filter(level.unwrap_or(Level::ERROR))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(false)
        .with_line_number(false);

    let registry = Registry::default().with(fmt_layer);

    match collector_endpoint() {
        Some(endpoint) => {
            let tracer = build_tracer(&endpoint)?;
            let subscriber = registry
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .with(filter);
            tracing::subscriber::set_global_default(subscriber)?;
        }
        None => tracing::subscriber::set_global_default(registry.with(filter))?,
    }

    Ok(())
}

/// Flush pending spans; does nothing when no exporter was installed.
pub fn shutdown_tracer() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        debug!("flushing trace exporter");
        let _ = provider.shutdown();
    }
}
