#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), forbid(clippy::expect_used))]
//! Forum server entry-point: loads settings, selects adapters and serves the
//! forum pages, JSON endpoints and health checks.

mod server;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use forum::inbound::http::health::HealthState;
use forum::inbound::http::session_config::{BuildMode, SessionSettings};
use forum::inbound::http::state::HttpState;
use forum::settings::ForumSettings;
use server::{ServerConfig, ServerPorts, build_http_ports, create_server, schedule_statistics};

#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ForumSettings::load().wrap_err("loading settings")?;
    let session = SessionSettings::from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .wrap_err("configuring sessions")?;
    let bind_addr = settings.bind_addr()?;
    let tuning = settings.tuning()?;

    let spool_poll = settings.spool_poll()?;

    let ServerPorts {
        http: ports,
        storage,
        spool_worker,
    } = build_http_ports(&settings).await?;
    let dispatcher = ports.dispatcher.clone();
    let http_state = HttpState::new(ports, tuning);

    let health_state = web::Data::new(HealthState::new(storage));
    let server = create_server(
        health_state.clone(),
        http_state,
        ServerConfig::new(session, bind_addr),
    )?;
    info!(%bind_addr, storage, "forum listening");
    schedule_statistics(dispatcher);
    if let Some(worker) = spool_worker {
        info!(poll_secs = spool_poll.as_secs(), "spool worker started");
        worker.start(spool_poll);
    }

    let handle = server.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            health_state.mark_draining();
            handle.stop(true).await;
        }
    });

    server.await.wrap_err("running server")
}
