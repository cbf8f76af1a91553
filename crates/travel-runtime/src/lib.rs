use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::instrument;

use travel_core::prompt::{dashboard_prompt, form_prompt, quick_prompt};
use travel_core::{
    itinerary_lines, warning, AgentConfig, AgentError, DashboardRequest, Message, ModelReply,
    ToolCall, TripRequest,
};
use travel_models::ChatModel;
use travel_telemetry::Telemetry;
use travel_tools::ToolProvider;

enum LoopState {
    Agent,
    Tools(Vec<ToolCall>),
    Finished { answer: String, truncated: bool },
}

#[derive(Debug, Clone)]
pub struct LoopOutcome {
    pub answer: String,
    pub messages: Vec<Message>,
    pub model_turns: usize,
    pub tool_rounds: usize,
    /// Set when the round cap stopped the loop before a plain answer.
    pub truncated: bool,
}

impl LoopOutcome {
    /// Assistant turns that requested tools.
    pub fn tool_call_turns(&self) -> usize {
        self.messages.iter().filter(|m| m.requests_tools()).count()
    }

    pub fn steps(&self) -> usize {
        self.messages.len().saturating_sub(1)
    }
}

/// Alternates model turns and tool execution until the model answers
/// without tool calls or `max_tool_rounds` round-trips have run.
pub struct AgentLoop {
    pub max_tool_rounds: usize,
    telemetry: Option<Arc<Telemetry>>,
}

impl AgentLoop {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            max_tool_rounds: config.max_tool_rounds,
            telemetry: None,
        }
    }

    pub fn with_telemetry(mut self, telemetry: Arc<Telemetry>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    #[instrument(skip_all, fields(max_tool_rounds = self.max_tool_rounds))]
    pub async fn run(
        &self,
        model: &dyn ChatModel,
        tools: &dyn ToolProvider,
        mut messages: Vec<Message>,
    ) -> Result<LoopOutcome, AgentError> {
        let specs = tools
            .list_tools()
            .await
            .map_err(|e| AgentError::Tools(e.to_string()))?;
        let model_name = model.metadata().model;
        let mut model_turns = 0usize;
        let mut tool_rounds = 0usize;
        let mut state = LoopState::Agent;

        loop {
            state = match state {
                LoopState::Agent => {
                    tracing::debug!(turn = model_turns + 1, "agent is processing the request");
                    let started = Instant::now();
                    let response = model
                        .complete(&messages, &specs)
                        .await
                        .map_err(|e| AgentError::Model(e.to_string()))?;
                    model_turns += 1;
                    if let Some(telemetry) = &self.telemetry {
                        telemetry.record_llm_call(
                            &model_name,
                            response.usage.prompt_tokens,
                            response.usage.completion_tokens,
                            Some(elapsed_ms(started)),
                        );
                    }

                    messages.push(Message::assistant(response.reply.clone()));
                    match response.reply {
                        ModelReply::Answer { content } => LoopState::Finished {
                            answer: content,
                            truncated: false,
                        },
                        ModelReply::ToolCalls { calls, .. } if tool_rounds >= self.max_tool_rounds => {
                            tracing::warn!(
                                tool_rounds,
                                pending = calls.len(),
                                "tool round limit reached; returning partial answer"
                            );
                            LoopState::Finished {
                                answer: best_effort_answer(&messages, tool_rounds),
                                truncated: true,
                            }
                        }
                        ModelReply::ToolCalls { calls, .. } => {
                            let names: Vec<&str> = calls.iter().map(|c| c.name.as_str()).collect();
                            tracing::info!(tools = ?names, "agent decided to use tools");
                            LoopState::Tools(calls)
                        }
                    }
                }
                LoopState::Tools(calls) => {
                    for call in &calls {
                        let started = Instant::now();
                        let output = tools.call_tool(&call.name, call.arguments.clone()).await;
                        if let Some(telemetry) = &self.telemetry {
                            telemetry.record_tool_call(&call.name, Some(elapsed_ms(started)));
                        }
                        messages.push(Message::tool_result(call, output));
                    }
                    tool_rounds += 1;
                    LoopState::Agent
                }
                LoopState::Finished { answer, truncated } => {
                    return Ok(LoopOutcome {
                        answer,
                        messages,
                        model_turns,
                        tool_rounds,
                        truncated,
                    });
                }
            };
        }
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1_000.0
}

/// Latest non-blank assistant text, or a note that planning was cut short.
fn best_effort_answer(messages: &[Message], tool_rounds: usize) -> String {
    messages
        .iter()
        .rev()
        .find_map(|message| match message {
            Message::Assistant { reply } => reply
                .text()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string),
            _ => None,
        })
        .unwrap_or_else(|| {
            warning(format!(
                "Planning stopped after {tool_rounds} tool rounds without a final answer."
            ))
        })
}

#[derive(Debug, Clone)]
pub struct FormPlan {
    pub itinerary: Vec<String>,
    pub outcome: LoopOutcome,
}

#[derive(Debug, Clone)]
pub struct DashboardPlan {
    pub answer: String,
    pub file_name: String,
    pub elapsed: Duration,
    pub tool_calls: usize,
    pub steps: usize,
    pub truncated: bool,
}

/// Validates a request, builds its prompt and runs the agent loop once.
pub struct TripPlanner {
    model: Arc<dyn ChatModel>,
    tools: Arc<dyn ToolProvider>,
    agent_loop: AgentLoop,
}

impl TripPlanner {
    pub fn new(model: Arc<dyn ChatModel>, tools: Arc<dyn ToolProvider>, agent_loop: AgentLoop) -> Self {
        Self {
            model,
            tools,
            agent_loop,
        }
    }

    pub async fn run_prompt(&self, prompt: String) -> Result<LoopOutcome, AgentError> {
        self.agent_loop
            .run(self.model.as_ref(), self.tools.as_ref(), vec![Message::user(prompt)])
            .await
    }

    pub async fn plan_form(&self, req: &TripRequest) -> Result<FormPlan, AgentError> {
        req.validate()?;
        let outcome = self.run_prompt(form_prompt(req)).await?;
        tracing::info!(
            destination = %req.destination,
            model_turns = outcome.model_turns,
            "trip planned"
        );
        Ok(FormPlan {
            itinerary: itinerary_lines(&outcome.answer),
            outcome,
        })
    }

    /// One-shot guide for a single city, used by the command line.
    pub async fn plan_quick(&self, city: &str) -> Result<LoopOutcome, AgentError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(AgentError::validation("Please enter a destination."));
        }
        self.run_prompt(quick_prompt(city)).await
    }

    pub async fn plan_dashboard(&self, req: &DashboardRequest) -> Result<DashboardPlan, AgentError> {
        req.validate()?;
        let started = Instant::now();
        let outcome = self.run_prompt(dashboard_prompt(req)).await?;
        let plan = DashboardPlan {
            file_name: req.download_file_name(),
            elapsed: started.elapsed(),
            tool_calls: outcome.tool_call_turns(),
            steps: outcome.steps(),
            truncated: outcome.truncated,
            answer: outcome.answer,
        };
        tracing::info!(
            destinations = ?req.destinations(),
            tool_calls = plan.tool_calls,
            steps = plan.steps,
            "dashboard plan generated"
        );
        Ok(plan)
    }
}
