//! Telemetry bootstrap: tracing subscriber + OTEL stdout span exporter.
//!
//! Spans are exported to stdout; inbound/outbound trace linkage uses the
//! W3C trace-context and baggage propagators.

use anyhow::{Context, Result};
use opentelemetry::{
    global, propagation::TextMapCompositePropagator, trace::TracerProvider as _, KeyValue,
};
use opentelemetry_sdk::{
    propagation::{BaggagePropagator, TraceContextPropagator},
    runtime,
    trace as sdktrace,
    Resource,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

/// Owns the tracer provider for the lifetime of the process.
///
/// [`Telemetry::shutdown`] consumes the guard, so the flush-and-shutdown
/// sequence can only run once. The caller must invoke it after the serve
/// loop exits; dropping the guard without calling it loses buffered spans.
pub struct Telemetry {
    provider: sdktrace::TracerProvider,
}

/// Initialise the global tracer provider and the tracing subscriber.
///
/// Configures:
/// - A stdout span exporter with batch export and an always-on sampler.
/// - A composite trace-context + baggage propagator so span linkage crosses
///   request boundaries in both directions.
/// - A [`tracing_subscriber`] registry with an env filter, fmt layer, and a
///   [`tracing_opentelemetry`] layer bridging spans into the OTEL pipeline.
///
/// # Errors
///
/// Returns an error if the subscriber cannot be installed. Callers treat any
/// failure as fatal: the middleware chain assumes a registered tracer.
pub fn init(config: &Config) -> Result<Telemetry> {
    let exporter = opentelemetry_stdout::SpanExporter::default();

    let provider = sdktrace::TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_config(
            sdktrace::Config::default()
                .with_sampler(sdktrace::Sampler::AlwaysOn)
                .with_resource(service_resource()),
        )
        .build();

    global::set_tracer_provider(provider.clone());
    global::set_text_map_propagator(TextMapCompositePropagator::new(vec![
        Box::new(TraceContextPropagator::new()),
        Box::new(BaggagePropagator::new()),
    ]));

    let otel_layer = tracing_opentelemetry::layer().with_tracer(provider.tracer("magazin-pos"));

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(otel_layer)
        .try_init()
        .context("failed to initialise tracing subscriber")?;

    Ok(Telemetry { provider })
}

impl Telemetry {
    /// Flush buffered spans and shut the provider down.
    ///
    /// Runs once, at process teardown, after the serve loop has exited.
    pub fn shutdown(self) {
        for result in self.provider.force_flush() {
            if let Err(e) = result {
                tracing::warn!(error = %e, "span flush failed during shutdown");
            }
        }
        global::shutdown_tracer_provider();
    }
}

fn service_resource() -> Resource {
    Resource::new(vec![
        KeyValue::new(
            opentelemetry_semantic_conventions::resource::SERVICE_NAME,
            "magazin-pos",
        ),
        KeyValue::new(
            opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
            env!("CARGO_PKG_VERSION"),
        ),
    ])
}
