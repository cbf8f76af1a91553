mod config;

use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::AppConfig;
use travel_core::AgentConfig;
use travel_memory::InMemoryPlanStore;
use travel_models::OpenAiChatModel;
use travel_runtime::{AgentLoop, TripPlanner};
use travel_telemetry::Telemetry;
use travel_tools::builtins::travel_registry;
use travel_tools::mcp::McpToolClient;
use travel_tools::ToolProvider;
use travel_web::{router, tool_server_router, AppState};

#[derive(Parser)]
#[command(name = "travel-planner", about = "AI travel planner with live travel tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the trip form and the planning dashboard
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Host the travel tools for remote planners over JSON-RPC
    ToolServer {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Plan a trip to one city and print the guide
    Plan { city: String },
    /// List available tools
    Tools,
}

async fn tool_provider(config: &AppConfig) -> anyhow::Result<Arc<dyn ToolProvider>> {
    match &config.tool_server_url {
        Some(url) => Ok(Arc::new(
            McpToolClient::connect(url.clone(), config.endpoints.timeout).await?,
        )),
        None => Ok(Arc::new(travel_registry(&config.endpoints)?)),
    }
}

async fn planner(config: &AppConfig, telemetry: Arc<Telemetry>) -> anyhow::Result<TripPlanner> {
    let model = OpenAiChatModel::new(config.chat_model_config()?)?;
    let agent_loop = AgentLoop::new(&AgentConfig {
        max_tool_rounds: config.max_tool_rounds,
        ..AgentConfig::default()
    })
    .with_telemetry(telemetry);
    Ok(TripPlanner::new(
        Arc::new(model),
        tool_provider(config).await?,
        agent_loop,
    ))
}

async fn serve(router: axum::Router, addr: String) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on http://{addr}");
    axum::serve(listener, router).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "travel=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            return Err(err.into());
        }
    }
    let config = AppConfig::from_env()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port } => {
            let telemetry = Arc::new(Telemetry::new()?);
            let planner = planner(&config, telemetry.clone()).await?;
            info!(model = %config.llm_model, max_tool_rounds = config.max_tool_rounds, "planner ready");
            let state = AppState {
                planner: Arc::new(planner),
                plans: Arc::new(InMemoryPlanStore::new(config.plan_store_capacity)),
                telemetry,
            };
            let addr = format!(
                "{}:{}",
                host.unwrap_or_else(|| config.host.clone()),
                port.unwrap_or(config.port)
            );
            serve(router(state), addr).await?;
        }
        Commands::ToolServer { host, port } => {
            let registry = travel_registry(&config.endpoints)?;
            info!(tools = ?registry.list(), "tool server ready");
            let addr = format!(
                "{}:{}",
                host.unwrap_or_else(|| config.host.clone()),
                port.unwrap_or(config.tool_server_port)
            );
            serve(tool_server_router(Arc::new(registry)), addr).await?;
        }
        Commands::Plan { city } => {
            let telemetry = Arc::new(Telemetry::new()?);
            let planner = planner(&config, telemetry).await?;
            println!("\n--- Running Travel Planner Agent for {city} ---\n");
            let outcome = match planner.plan_quick(&city).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    eprintln!("{}", err.user_message());
                    return Err(err.into());
                }
            };
            println!("--- Final Travel Plan ---\n");
            println!("{}", outcome.answer);
            println!(
                "\n📊 Used {} tools across {} steps.",
                outcome.tool_call_turns(),
                outcome.steps()
            );
            println!(
                "\n🌍 Note: This assistant provides travel tips and info only. \
                 Always check latest local advisories before travel.\n"
            );
        }
        Commands::Tools => {
            let registry = travel_registry(&config.endpoints)?;
            for spec in registry.specs() {
                println!("{:<20} {}", spec.name, spec.description);
            }
        }
    }
    Ok(())
}
