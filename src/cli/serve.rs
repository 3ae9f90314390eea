//! `serve` command: build the catalog and run the chosen transport

use clap::Args;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::auth::create_auth_provider;
use crate::catalog::{GateValues, Tier};
use crate::config::{AppConfig, ProfileSet, TransportMode, build_policy};
use crate::gitlab::{GitLabClient, detect_tier};
use crate::server::GitLabMcpHandler;
use crate::tools::RegistryManager;
use crate::transport::{HttpConfig, run_http, run_stdio};

use super::parse_transport;

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Transport (stdio, http)
    #[arg(long, value_parser = parse_transport)]
    pub transport: Option<TransportMode>,

    /// HTTP bind host
    #[arg(long)]
    pub host: Option<String>,

    /// HTTP bind port
    #[arg(long)]
    pub port: Option<u16>,
}

impl ServeArgs {
    pub async fn run(config: AppConfig) -> anyhow::Result<()> {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            gitlab = %config.gitlab.api_url(),
            "Starting GitLab MCP server"
        );

        let profiles = ProfileSet::load(config.tools.profiles_path.as_deref())
            .inspect_err(|e| error!(error = %e, "Failed to load profiles"))?;
        let profile = match config.tools.profile.as_deref() {
            Some(name) => {
                let (kind, profile) = profiles
                    .resolve(name)
                    .inspect_err(|e| error!(error = %e, "Failed to resolve profile"))?;
                info!(profile = name, ?kind, "Using profile");
                Some(profile)
            }
            None => None,
        };

        let auth = create_auth_provider(&config.gitlab)
            .inspect_err(|e| error!(error = %e, "Failed to create auth provider"))?;
        let gitlab = Arc::new(
            GitLabClient::new(&config.gitlab, auth)
                .inspect_err(|e| error!(error = %e, "Failed to create GitLab client"))?,
        );

        let tier = resolve_tier(&config, &gitlab).await;
        let policy = build_policy(
            &config.tools,
            profile.as_ref(),
            GateValues::from_process(),
            tier,
        );
        let manager = Arc::new(
            RegistryManager::new(policy).with_schema_mode(config.tools.schema_mode),
        );
        let handler = GitLabMcpHandler::new(&config, manager, gitlab);

        match config.server.transport {
            TransportMode::Stdio => run_stdio(handler).await,
            TransportMode::Http => {
                let http = HttpConfig::from_host_port(&config.server.host, config.server.port)?;
                run_http(handler, http).await
            }
        }
    }
}

/// Configured tier, else whatever the instance reports
async fn resolve_tier(config: &AppConfig, gitlab: &GitLabClient) -> Option<Tier> {
    match config.tools.tier.as_deref().map(str::parse::<Tier>) {
        Some(Ok(tier)) => {
            info!(%tier, "Using configured tier");
            Some(tier)
        }
        Some(Err(e)) => {
            warn!(error = %e, "Ignoring configured tier, tier filtering disabled");
            None
        }
        None => {
            let tier = detect_tier(gitlab).await;
            match tier {
                Some(tier) => info!(%tier, "Detected instance tier"),
                None => info!("Instance tier unknown, tier filtering disabled"),
            }
            tier
        }
    }
}
