use crate::{
    controller::Presenter,
    state::{JobState, JobStatus},
};
use tokio::sync::mpsc::UnboundedSender;

const PROGRESS_BAR_WIDTH: usize = 20;

#[derive(Debug, Clone)]
pub enum AppEvent {
    StateChanged(JobState),
    Alert(String),
}

/// Forwards controller updates to the terminal loop in `main`.
pub struct ChannelPresenter {
    event_tx: UnboundedSender<AppEvent>,
}

impl ChannelPresenter {
    pub fn new(event_tx: UnboundedSender<AppEvent>) -> Self {
        Self { event_tx }
    }
}

impl Presenter for ChannelPresenter {
    fn render(&self, state: &JobState) {
        let _ = self.event_tx.send(AppEvent::StateChanged(state.clone()));
    }

    fn alert(&self, message: &str) {
        let _ = self.event_tx.send(AppEvent::Alert(message.to_string()));
    }
}

pub fn status_line(state: &JobState) -> String {
    let job = state.job_id().map(|id| format!("Job {id}")).unwrap_or_else(|| "Job".to_string());
    match &state.status {
        JobStatus::Idle => "Idle".to_string(),
        JobStatus::Starting => format!("{job}: initializing…"),
        JobStatus::Processing => {
            format!("{job}: crafting your video {} {:>3}%", progress_bar(state.progress), state.progress)
        }
        JobStatus::Completed { artifact_url } => format!("{job} completed → {artifact_url}"),
        JobStatus::Failed { error_message } if error_message.is_empty() => {
            format!("{job} failed")
        }
        JobStatus::Failed { error_message } => format!("{job} failed: {error_message}"),
    }
}

fn progress_bar(progress: u8) -> String {
    let filled = usize::from(progress.min(100)) * PROGRESS_BAR_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(PROGRESS_BAR_WIDTH - filled))
}
