use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use travel_core::{
    AgentConfig, AgentError, DashboardRequest, Message, ModelReply, ToolCall, ToolSpec,
    TripRequest,
};
use travel_models::ScriptedModel;
use travel_runtime::{AgentLoop, TripPlanner};
use travel_tools::{ToolError, ToolProvider};

#[derive(Default)]
struct RecordingTools {
    calls: Mutex<Vec<(String, Value)>>,
}

impl RecordingTools {
    fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ToolProvider for RecordingTools {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolError> {
        Ok(vec![ToolSpec {
            name: "weather_forecast".into(),
            description: "Get a weather forecast for a city".into(),
            parameters: json!({"type": "object", "properties": {"city": {"type": "string"}}}),
        }])
    }

    async fn call_tool(&self, name: &str, args: Value) -> String {
        self.calls.lock().unwrap().push((name.to_string(), args));
        "Sunny, 24°C".to_string()
    }
}

fn weather_call(id: &str) -> ModelReply {
    ModelReply::ToolCalls {
        content: None,
        calls: vec![ToolCall::new(id, "weather_forecast", json!({"city": "Paris"}))],
    }
}

fn agent_loop(max_tool_rounds: usize) -> AgentLoop {
    AgentLoop::new(&AgentConfig {
        max_tool_rounds,
        ..AgentConfig::default()
    })
}

fn paris_form() -> TripRequest {
    TripRequest {
        destination: "Paris".into(),
        days: 3,
        travelers: "2".into(),
        interests: String::new(),
        budget: String::new(),
    }
}

#[tokio::test]
async fn plain_answer_is_returned_after_one_turn() {
    let model = ScriptedModel::new(vec![ModelReply::answer("Day 1: Louvre")]);
    let tools = RecordingTools::default();

    let outcome = agent_loop(8)
        .run(&model, &tools, vec![Message::user("plan Paris")])
        .await
        .unwrap();

    assert_eq!(outcome.answer, "Day 1: Louvre");
    assert_eq!(outcome.model_turns, 1);
    assert_eq!(outcome.tool_rounds, 0);
    assert!(!outcome.truncated);
    assert!(tools.calls().is_empty());
}

#[tokio::test]
async fn tool_result_is_visible_to_the_next_turn() {
    let model = ScriptedModel::new(vec![weather_call("call_1"), ModelReply::answer("Pack sunglasses")]);
    let tools = RecordingTools::default();

    let outcome = agent_loop(8)
        .run(&model, &tools, vec![Message::user("plan Paris")])
        .await
        .unwrap();

    assert_eq!(outcome.answer, "Pack sunglasses");
    assert_eq!(tools.calls(), vec![("weather_forecast".to_string(), json!({"city": "Paris"}))]);
    assert_eq!(outcome.tool_call_turns(), 1);
    // user, assistant(tool call), tool result, assistant(answer)
    assert_eq!(outcome.steps(), 3);

    let histories = model.histories();
    assert_eq!(histories.len(), 2);
    let second = &histories[1];
    assert!(matches!(
        second.last(),
        Some(Message::Tool { call_id, name, content })
            if call_id == "call_1" && name == "weather_forecast" && content == "Sunny, 24°C"
    ));
}

#[tokio::test]
async fn endless_tool_requests_stop_at_the_round_cap() {
    let model = ScriptedModel::repeating(weather_call("again"));
    let tools = RecordingTools::default();

    let outcome = agent_loop(3)
        .run(&model, &tools, vec![Message::user("plan Paris")])
        .await
        .unwrap();

    assert!(outcome.truncated);
    assert_eq!(outcome.tool_rounds, 3);
    assert_eq!(tools.calls().len(), 3);
    assert_eq!(model.calls(), 4);
    assert!(outcome.answer.starts_with(travel_core::WARNING_MARKER));
}

#[tokio::test]
async fn truncated_run_keeps_partial_text() {
    let model = ScriptedModel::repeating(ModelReply::ToolCalls {
        content: Some("Day 1: Eiffel Tower".into()),
        calls: vec![ToolCall::new("c", "weather_forecast", json!({}))],
    });
    let tools = RecordingTools::default();

    let outcome = agent_loop(1)
        .run(&model, &tools, vec![Message::user("plan Paris")])
        .await
        .unwrap();

    assert!(outcome.truncated);
    assert_eq!(outcome.answer, "Day 1: Eiffel Tower");
}

#[tokio::test]
async fn model_failure_surfaces_as_model_error() {
    let model = ScriptedModel::failing("connection refused");
    let tools = RecordingTools::default();

    let err = agent_loop(8)
        .run(&model, &tools, vec![Message::user("plan Paris")])
        .await
        .unwrap_err();

    assert!(matches!(err, AgentError::Model(ref msg) if msg.contains("connection refused")));
}

#[tokio::test]
async fn form_plan_splits_answer_into_lines() {
    let model = Arc::new(ScriptedModel::new(vec![ModelReply::answer(
        "<h2>Day 1</h2>\n\n<p>Louvre</p>\n<h2>Day 2</h2>",
    )]));
    let planner = TripPlanner::new(model.clone(), Arc::new(RecordingTools::default()), agent_loop(8));

    let plan = planner.plan_form(&paris_form()).await.unwrap();

    assert_eq!(plan.itinerary, vec!["<h2>Day 1</h2>", "<p>Louvre</p>", "<h2>Day 2</h2>"]);
    let prompt = match &model.histories()[0][0] {
        Message::User { content } => content.clone(),
        other => panic!("unexpected first message: {other:?}"),
    };
    assert!(prompt.contains("Paris"));
}

#[tokio::test]
async fn invalid_form_never_reaches_the_model() {
    let model = Arc::new(ScriptedModel::new(vec![]));
    let planner = TripPlanner::new(model.clone(), Arc::new(RecordingTools::default()), agent_loop(8));

    let err = planner
        .plan_form(&TripRequest {
            destination: "   ".into(),
            ..paris_form()
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AgentError::Validation(_)));
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn dashboard_plan_reports_stats_and_file_name() {
    let model = Arc::new(ScriptedModel::new(vec![
        weather_call("call_1"),
        ModelReply::answer("<h1>Paris guide</h1>"),
    ]));
    let planner = TripPlanner::new(model, Arc::new(RecordingTools::default()), agent_loop(8));

    let plan = planner.plan_dashboard(&DashboardRequest::default()).await.unwrap();

    assert_eq!(plan.answer, "<h1>Paris guide</h1>");
    assert_eq!(plan.file_name, "travel_plan_Paris_Pro.txt");
    assert_eq!(plan.tool_calls, 1);
    assert_eq!(plan.steps, 3);
    assert!(!plan.truncated);
}

#[tokio::test]
async fn empty_dashboard_destination_is_rejected_before_planning() {
    let model = Arc::new(ScriptedModel::new(vec![]));
    let planner = TripPlanner::new(model.clone(), Arc::new(RecordingTools::default()), agent_loop(8));

    let err = planner
        .plan_dashboard(&DashboardRequest {
            city: String::new(),
            ..DashboardRequest::default()
        })
        .await
        .unwrap_err();

    assert_eq!(
        err.user_message(),
        travel_core::warning("Please enter at least one destination.")
    );
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn quick_plan_rejects_blank_city() {
    let model = Arc::new(ScriptedModel::new(vec![]));
    let planner = TripPlanner::new(model.clone(), Arc::new(RecordingTools::default()), agent_loop(8));

    let err = planner.plan_quick("  ").await.unwrap_err();

    assert!(matches!(err, AgentError::Validation(_)));
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn quick_plan_returns_the_final_answer() {
    let model = Arc::new(ScriptedModel::new(vec![ModelReply::answer("Top attractions in Agra")]));
    let planner = TripPlanner::new(model.clone(), Arc::new(RecordingTools::default()), agent_loop(8));

    let outcome = planner.plan_quick("Agra").await.unwrap();

    assert_eq!(outcome.answer, "Top attractions in Agra");
    assert_eq!(model.calls(), 1);
}
