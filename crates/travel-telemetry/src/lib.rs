use opentelemetry::trace::{Span as _, Tracer as _, TracerProvider as _};
use opentelemetry::KeyValue;
use opentelemetry_sdk::trace::{Tracer, TracerProvider};
pub use opentelemetry_sdk::trace::Span;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::{event, Level};

pub struct Telemetry {
    _provider: TracerProvider,
    tracer: Tracer,
    registry: Registry,
    llm_calls: IntCounterVec,
    llm_input_tokens: IntCounterVec,
    llm_output_tokens: IntCounterVec,
    llm_latency_ms: HistogramVec,
    tool_calls: IntCounterVec,
    tool_latency_ms: HistogramVec,
    planning_requests: IntCounterVec,
    planning_latency_ms: HistogramVec,
}

impl Telemetry {
    pub fn new() -> Result<Self, prometheus::Error> {
        let provider = TracerProvider::builder().build();
        let tracer = provider.tracer("travel-planner");
        let registry = Registry::new();
        let llm_calls = IntCounterVec::new(Opts::new("llm_calls", "LLM call count"), &["model"])?;
        let llm_input_tokens = IntCounterVec::new(
            Opts::new("llm_input_tokens", "Tokens sent to LLMs"),
            &["model"],
        )?;
        let llm_output_tokens = IntCounterVec::new(
            Opts::new("llm_output_tokens", "Tokens returned by LLMs"),
            &["model"],
        )?;
        let llm_latency_ms = HistogramVec::new(
            HistogramOpts::new(
                "llm_call_latency_ms",
                "LLM call latency distribution (milliseconds)",
            ),
            &["model"],
        )?;
        let tool_calls = IntCounterVec::new(Opts::new("tool_calls", "Tool call count"), &["tool"])?;
        let tool_latency_ms = HistogramVec::new(
            HistogramOpts::new(
                "tool_call_latency_ms",
                "Tool call latency distribution (milliseconds)",
            ),
            &["tool"],
        )?;
        let planning_requests = IntCounterVec::new(
            Opts::new("planning_requests", "Planning requests by front end and outcome"),
            &["frontend", "outcome"],
        )?;
        let planning_latency_ms = HistogramVec::new(
            HistogramOpts::new(
                "planning_latency_ms",
                "End-to-end planning latency distribution (milliseconds)",
            )
            .buckets(vec![
                250.0, 1_000.0, 5_000.0, 10_000.0, 30_000.0, 60_000.0, 120_000.0,
            ]),
            &["frontend"],
        )?;

        registry.register(Box::new(llm_calls.clone()))?;
        registry.register(Box::new(llm_input_tokens.clone()))?;
        registry.register(Box::new(llm_output_tokens.clone()))?;
        registry.register(Box::new(llm_latency_ms.clone()))?;
        registry.register(Box::new(tool_calls.clone()))?;
        registry.register(Box::new(tool_latency_ms.clone()))?;
        registry.register(Box::new(planning_requests.clone()))?;
        registry.register(Box::new(planning_latency_ms.clone()))?;

        Ok(Self {
            _provider: provider,
            tracer,
            registry,
            llm_calls,
            llm_input_tokens,
            llm_output_tokens,
            llm_latency_ms,
            tool_calls,
            tool_latency_ms,
            planning_requests,
            planning_latency_ms,
        })
    }

    pub fn record_llm_call(
        &self,
        model: &str,
        input_tokens: u64,
        output_tokens: u64,
        duration_ms: Option<f64>,
    ) {
        self.llm_calls.with_label_values(&[model]).inc();
        self.llm_input_tokens
            .with_label_values(&[model])
            .inc_by(input_tokens);
        self.llm_output_tokens
            .with_label_values(&[model])
            .inc_by(output_tokens);
        if let Some(value) = duration_ms {
            self.llm_latency_ms.with_label_values(&[model]).observe(value);
        }
        event!(
            Level::INFO,
            %model,
            input_tokens,
            output_tokens,
            duration_ms = duration_ms.unwrap_or_default(),
            "llm call recorded"
        );
    }

    pub fn record_tool_call(&self, tool: &str, duration_ms: Option<f64>) {
        self.tool_calls.with_label_values(&[tool]).inc();
        if let Some(value) = duration_ms {
            self.tool_latency_ms.with_label_values(&[tool]).observe(value);
        }
        event!(Level::INFO, %tool, duration_ms = duration_ms.unwrap_or_default(), "tool call recorded");
    }

    pub fn record_planning(&self, frontend: &str, outcome: &str, duration_ms: f64) {
        self.planning_requests
            .with_label_values(&[frontend, outcome])
            .inc();
        self.planning_latency_ms
            .with_label_values(&[frontend])
            .observe(duration_ms);
        event!(Level::INFO, %frontend, %outcome, duration_ms, "planning request recorded");
    }

    pub fn start_span(&self, name: &str) -> Span {
        self.tracer.start(name.to_string())
    }

    pub fn end_span(mut span: Span, outcome: &str) {
        span.set_attribute(KeyValue::new("outcome", outcome.to_string()));
        span.end();
    }

    pub fn export_metrics(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
