mod api;
mod metrics;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let config = common::config::Config::load()?;

    let (dispatch, _otel_guard) =
        common::observability::build_dispatch("portfolio-web", &config.general.log_level);
    tracing::dispatcher::set_global_default(dispatch).map_err(anyhow::Error::msg)?;

    let prometheus = metrics::init_global()?;

    let web_port = config.web.as_ref().map_or(8080, |w| w.port);
    let web_host = config
        .web
        .as_ref()
        .map_or("0.0.0.0".to_string(), |w| w.host.clone());

    let http = reqwest::Client::builder()
        .user_agent(config.fetch.user_agent.clone())
        .build()?;
    let state = api::AppState::new(config, http, Some(prometheus));
    if state.llm_api_key.is_none() {
        tracing::warn!(
            env = %state.config.llm.api_key_env,
            "LLM API key not set, /api/trade-summary will return errors"
        );
    }

    let app = api::router(Arc::new(state));
    let addr: SocketAddr = format!("{web_host}:{web_port}").parse()?;
    tracing::info!(%addr, "portfolio API listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
