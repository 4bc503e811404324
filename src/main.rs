use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kube_mcp_gateway::auth::OidcValidator;
use kube_mcp_gateway::config::Settings;
use kube_mcp_gateway::server::state::OptionalValidator;
use kube_mcp_gateway::server::{run_http_server, run_stdio_server, ServerState};

#[derive(Parser, Debug)]
#[clap(about = "MCP gateway for Kubernetes cluster management")]
struct CliArgs {
    /// Serve the HTTP transport regardless of ENABLE_HTTP_TRANSPORT.
    #[clap(long)]
    pub http: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    // Logs go to stderr so the stdio transport keeps stdout clean
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to init logging: {e}"))?;

    let settings = Settings::from_env()?;

    let validator: OptionalValidator = if settings.auth_enabled {
        let validator = OidcValidator::new(&settings.oidc).await?;
        Some(Arc::new(validator))
    } else {
        None
    };

    let http = cli_args.http || settings.http_transport;
    let state = ServerState::build(settings, validator)?;
    info!(
        "Gateway ready: {} tools registered, auth {}",
        state.registry.tool_count(),
        if state.settings.auth_enabled {
            "enabled"
        } else {
            "disabled"
        }
    );

    if http {
        run_http_server(state).await
    } else {
        run_stdio_server(state).await
    }
}
