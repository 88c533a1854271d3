use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::{info, warn};

mod api;
mod app;
mod config;
mod controller;
mod error;
mod state;
mod types;

use api::{resolve_artifact_url, GenerationService};
use app::{status_line, AppEvent, ChannelPresenter};
use config::AppConfig;
use controller::JobController;
use state::JobStatus;
use types::Job;

#[derive(Parser)]
#[command(name = "vidgen", version, about = "Generate short videos from a topic and track the render")]
struct Cli {
    /// Backend origin, e.g. http://localhost:8000
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Delay between status polls, in milliseconds
    #[arg(long, global = true)]
    poll_interval_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a topic and wait for the video to finish rendering
    Generate {
        topic: String,
        /// documentary, cinematic, emotional, upbeat or horror
        #[arg(long)]
        style: Option<String>,
        /// Target length in seconds: 15, 30, 45 or 60
        #[arg(long)]
        duration: Option<u32>,
        /// On Ctrl-C stop watching but keep the job id instead of resetting
        #[arg(long)]
        detach: bool,
    },
    /// Check that the backend is reachable
    Health,
    /// List videos the backend has finished
    Videos,
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing()?;
    let cli = Cli::parse();

    let mut config = AppConfig::load()?;
    if let Some(url) = cli.base_url {
        config.set_base_url(url);
    }
    if let Some(millis) = cli.poll_interval_ms {
        config.set_poll_interval_ms(millis)?;
    }

    let client = api::Client::new(Some(config.base_url()))?;
    info!(base_url = %client.base_url(), "starting vidgen CLI");

    match cli.command {
        Command::Generate { topic, style, duration, detach } => {
            run_generate(client, &config, &topic, style, duration, detach).await
        }
        Command::Health => run_health(&client).await,
        Command::Videos => run_videos(&client).await,
    }
}

async fn run_generate(
    client: api::Client,
    config: &AppConfig,
    topic: &str,
    style: Option<String>,
    duration: Option<u32>,
    detach: bool,
) -> Result<()> {
    let (event_tx, mut event_rx) = unbounded_channel();
    let presenter = Arc::new(ChannelPresenter::new(event_tx));
    let controller = JobController::new(Arc::new(client), presenter, config.poll_interval());

    let style = style.unwrap_or_else(|| config.default_style().to_string());
    let duration = duration.unwrap_or_else(|| config.default_duration_seconds());

    let job = match controller.start(topic, &style, duration).await {
        Ok(job) => job,
        Err(err) => {
            drain_events(&mut event_rx);
            return Err(err.into());
        }
    };
    println!("Submitted job {} ({}, {}s)", job.id, job.style, job.duration_seconds);

    let mut emit = print_event;
    tokio::select! {
        outcome = follow_job(&controller, &job, &mut event_rx, &mut emit) => outcome,
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl-C")?;
            if detach {
                controller.stop().await;
                println!("Stopped watching job {}; the backend keeps rendering.", job.id);
                return Ok(());
            }
            controller.reset().await;
            warn!(job_id = %job.id, "interrupted; the backend keeps rendering");
            bail!("interrupted");
        }
    }
}

/// Emit controller events until the job reaches a terminal status.
async fn follow_job(
    controller: &JobController,
    job: &Job,
    event_rx: &mut UnboundedReceiver<AppEvent>,
    emit: &mut impl FnMut(AppEvent),
) -> Result<()> {
    loop {
        let event = event_rx.recv().await.ok_or_else(|| anyhow!("job controller went away"))?;
        let outcome = match &event {
            AppEvent::StateChanged(state) => match state.status {
                JobStatus::Completed { .. } => Some(Ok(())),
                JobStatus::Failed { .. } => Some(Err(anyhow!("job {} failed", job.id))),
                _ => None,
            },
            AppEvent::Alert(_) => None,
        };
        emit(event);
        if let Some(outcome) = outcome {
            // the terminal alert is sent under the state lock, so it is queued once this returns
            controller.snapshot().await;
            while let Ok(event) = event_rx.try_recv() {
                emit(event);
            }
            return outcome;
        }
    }
}

fn drain_events(event_rx: &mut UnboundedReceiver<AppEvent>) {
    while let Ok(event) = event_rx.try_recv() {
        print_event(event);
    }
}

fn print_event(event: AppEvent) {
    match event {
        AppEvent::StateChanged(state) => println!("{}", status_line(&state)),
        AppEvent::Alert(message) => eprintln!("{message}"),
    }
}

async fn run_health(client: &api::Client) -> Result<()> {
    let status = client.health_check().await?;
    println!("Backend {} is {status}", client.base_url());
    Ok(())
}

async fn run_videos(client: &api::Client) -> Result<()> {
    let videos = client.list_videos().await.context("failed to list videos")?;
    if videos.is_empty() {
        println!("No finished videos yet.");
        return Ok(());
    }
    for video in videos {
        let location = match video.video_url.as_deref() {
            Some(path) => resolve_artifact_url(client.base_url(), path)?.to_string(),
            None => "-".to_string(),
        };
        println!("{}  {:?}  {location}", video.id, video.status);
    }
    Ok(())
}

fn setup_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err: Box<dyn std::error::Error + Send + Sync>| {
            anyhow!("failed to initialise tracing: {err}")
        })?;
    Ok(())
}
