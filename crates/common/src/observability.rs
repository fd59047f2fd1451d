use std::borrow::Cow;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use tracing::Subscriber;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::{EnvFilter, Layer};

pub const ERROR_EVENTS_METRIC: &str = "portfolio_tracing_error_events";

/// Flushes the global tracer provider when dropped. Hold it for the life of `main`.
pub struct OtelGuard {
    _private: (),
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        opentelemetry::global::shutdown_tracer_provider();
    }
}

/// Counts ERROR-level events so failures show up on `/metrics` as well as in logs.
struct ErrorCounterLayer;

impl<S> Layer<S> for ErrorCounterLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == tracing::Level::ERROR {
            metrics::counter!(ERROR_EVENTS_METRIC).increment(1);
        }
    }
}

/// OTLP/HTTP tracer, only when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
/// Must be called inside a Tokio runtime.
fn otlp_tracer(service_name: &str) -> Option<opentelemetry_sdk::trace::Tracer> {
    use opentelemetry_otlp::WithExportConfig;

    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok()?;
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()
        .ok()?;

    let resource = Resource::new(vec![KeyValue::new(
        "service.name",
        service_name.to_string(),
    )]);
    let provider = opentelemetry_sdk::trace::TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .with_resource(resource)
        .build();

    let tracer = provider.tracer("sei_portfolio");
    let _ = opentelemetry::global::set_tracer_provider(provider);
    Some(tracer)
}

/// Build the process-wide `tracing` dispatcher:
/// JSON lines on stdout, `RUST_LOG` over `default_level`, the error counter,
/// and OTLP span export when configured through the environment.
pub fn build_dispatch(
    service_name: impl Into<Cow<'static, str>>,
    default_level: &str,
) -> (tracing::Dispatch, Option<OtelGuard>) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .json();

    let base = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(ErrorCounterLayer);

    let service_name = service_name.into();
    match otlp_tracer(&service_name) {
        Some(tracer) => {
            let subscriber = base.with(tracing_opentelemetry::layer().with_tracer(tracer));
            (
                tracing::Dispatch::new(subscriber),
                Some(OtelGuard { _private: () }),
            )
        }
        None => (tracing::Dispatch::new(base), None),
    }
}
