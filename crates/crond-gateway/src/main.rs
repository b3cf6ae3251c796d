use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use crond_core::CrondConfig;
use crond_executor::ExecUser;
use crond_manager::{ConfigStore, JobManager, Launcher};
use crond_scheduler::Engine;

mod app;
mod http;
mod logging;
mod pid;

#[derive(Parser)]
#[command(name = "crond", version, about = "Job scheduling daemon with an HTTP control API")]
struct Cli {
    /// Runtime config file (default ./crond.toml).
    #[arg(short, long, env = "CROND_CONFIG")]
    config: Option<String>,

    /// Do not register the daemon heartbeat metric.
    #[arg(long)]
    without_heart_beat: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = CrondConfig::load(cli.config.as_deref())?;
    logging::init(&config.log)?;

    let pid = pid::PidFile::create(&config.pid_path)?;
    let result = run(config, !cli.without_heart_beat).await;
    pid.remove();
    result
}

async fn run(config: CrondConfig, heartbeat: bool) -> anyhow::Result<()> {
    let sink = crond_beat::build_sink(&config.beat, config.bk_biz_id)?;
    info!(sink = sink.name(), "monitoring sink ready");

    let user = ExecUser::resolve(config.jobs_user.as_deref())?;
    match &user {
        Some(u) => info!(user = %u.name, uid = u.uid, gid = u.gid, "jobs run as configured user"),
        None => info!("jobs run as the daemon user"),
    }

    let store = ConfigStore::open(&config.jobs_config)?;
    let engine = Engine::new();
    let mut manager = JobManager::new(
        Arc::clone(&engine),
        store,
        Launcher::new(Arc::clone(&sink), user),
        heartbeat,
    );
    manager.bootstrap()?;

    let addr: SocketAddr = config.listen_addr().parse()?;
    let state = Arc::new(app::AppState::new(manager, sink));
    let router = app::build_router(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("crond listening on {}", addr);

    // quit is a hard stop: in-flight jobs are not drained
    tokio::select! {
        served = axum::serve(listener, router) => served?,
        _ = state.quit.notified() => info!("quit requested over HTTP"),
        signal = tokio::signal::ctrl_c() => match signal {
            Ok(()) => info!("interrupted"),
            Err(e) => warn!(error = %e, "signal handler failed"),
        },
    }

    engine.stop();
    Ok(())
}
