//! Lifecycle of a single generation job: submit, poll on a fixed interval, stop on a
//! terminal status.
//!
//! All state lives behind one lock inside [`JobController`]. Every continuation that
//! resumes after network I/O (the submit response, each poll response) re-checks the
//! job's epoch under that lock, so a response that lands after [`JobController::stop`]
//! or [`JobController::reset`] is dropped without touching the state.

use crate::{
    api::{resolve_artifact_url, GenerationService, ServiceError},
    error::{ControllerError, ValidationError},
    state::{JobState, JobStatus},
    types::{is_supported_duration, GenerateRequest, Job, RemoteStatus, StatusResponse, VideoStyle},
};
use std::{sync::Arc, time::Duration};
use tokio::{sync::Mutex, time::sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Receives every state change for display. Implementations must not call back into the
/// controller.
pub trait Presenter: Send + Sync {
    fn render(&self, state: &JobState);

    /// User-visible error (submission failure, failed job).
    fn alert(&self, _message: &str) {}
}

#[derive(Clone)]
pub struct JobController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    service: Arc<dyn GenerationService>,
    presenter: Arc<dyn Presenter>,
    poll_interval: Duration,
    tracked: Mutex<Tracked>,
}

struct Tracked {
    state: JobState,
    epoch: u64,
    cancel: Option<CancellationToken>,
}

impl Tracked {
    /// Revoke the current job's poller and invalidate any response still in flight.
    fn retire(&mut self) -> bool {
        self.epoch = self.epoch.wrapping_add(1);
        match self.cancel.take() {
            Some(cancel) => {
                cancel.cancel();
                true
            }
            None => false,
        }
    }
}

enum PollOutcome {
    Continue,
    Finished,
    Stale,
}

impl JobController {
    pub fn new(
        service: Arc<dyn GenerationService>,
        presenter: Arc<dyn Presenter>,
        poll_interval: Duration,
    ) -> Self {
        let inner = ControllerInner {
            service,
            presenter,
            poll_interval,
            tracked: Mutex::new(Tracked { state: JobState::idle(), epoch: 0, cancel: None }),
        };
        Self { inner: Arc::new(inner) }
    }

    pub async fn snapshot(&self) -> JobState {
        self.inner.tracked.lock().await.state.clone()
    }

    /// Submit a new job and begin polling it in the background.
    ///
    /// Returns once the backend has assigned an id. Polling continues on its own task
    /// until a terminal status arrives or the job is stopped.
    pub async fn start(
        &self,
        topic: &str,
        style: &str,
        duration_seconds: u32,
    ) -> Result<Job, ControllerError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(ValidationError::EmptyTopic.into());
        }
        let style: VideoStyle = style.parse().map_err(ValidationError::UnknownStyle)?;
        if !is_supported_duration(duration_seconds) {
            return Err(ValidationError::UnsupportedDuration(duration_seconds).into());
        }

        let (epoch, cancel) = {
            let mut tracked = self.inner.tracked.lock().await;
            if tracked.state.status.is_active() {
                let id = tracked.state.job_id().unwrap_or("<pending>").to_string();
                return Err(ValidationError::JobActive(id).into());
            }
            tracked.retire();
            let cancel = CancellationToken::new();
            tracked.cancel = Some(cancel.clone());
            tracked.state = JobState { status: JobStatus::Starting, ..JobState::idle() };
            self.inner.presenter.render(&tracked.state);
            (tracked.epoch, cancel)
        };

        let request =
            GenerateRequest { topic: topic.to_string(), video_style: style, duration: duration_seconds };
        info!(%style, duration = duration_seconds, "submitting generation request");

        let submitted = tokio::select! {
            _ = cancel.cancelled() => return Err(ControllerError::Cancelled),
            result = self.inner.service.submit(&request) => result,
        };
        let submitted = submitted.and_then(|response| {
            if response.id.trim().is_empty() {
                Err(ServiceError::MissingJobId)
            } else {
                Ok(response)
            }
        });

        let mut tracked = self.inner.tracked.lock().await;
        if tracked.epoch != epoch {
            return Err(ControllerError::Cancelled);
        }

        match submitted {
            Err(err) => {
                error!(error = %err, "generation request failed");
                tracked.cancel = None;
                tracked.state = JobState::idle();
                self.inner.presenter.render(&tracked.state);
                self.inner.presenter.alert(&format!("Failed to start generation: {err}"));
                Err(ControllerError::Submission(err))
            }
            Ok(response) => {
                let job = Job { id: response.id, topic: request.topic, style, duration_seconds };
                info!(job_id = %job.id, "generation job accepted");
                tracked.state.job = Some(job.clone());
                tracked.state.touch();
                self.inner.presenter.render(&tracked.state);
                Self::spawn_poll_task(self.inner.clone(), job.id.clone(), epoch, cancel);
                Ok(job)
            }
        }
    }

    /// Stop tracking the current job. The backend job keeps running.
    pub async fn stop(&self) {
        let mut tracked = self.inner.tracked.lock().await;
        if tracked.retire() {
            info!(job_id = tracked.state.job_id().unwrap_or("<pending>"), "stopped tracking job");
        }
    }

    /// Stop tracking and return to `Idle` so a new job can be started.
    pub async fn reset(&self) {
        let mut tracked = self.inner.tracked.lock().await;
        tracked.retire();
        tracked.state = JobState::idle();
        self.inner.presenter.render(&tracked.state);
    }

    fn spawn_poll_task(
        inner: Arc<ControllerInner>,
        job_id: String,
        epoch: u64,
        cancel: CancellationToken,
    ) {
        tokio::spawn(async move {
            Self::poll_job(inner, &job_id, epoch, &cancel).await;
            debug!(%job_id, "polling stopped");
        });
    }

    async fn poll_job(
        inner: Arc<ControllerInner>,
        job_id: &str,
        epoch: u64,
        cancel: &CancellationToken,
    ) {
        let mut attempt = 0u32;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = sleep(inner.poll_interval) => {}
            }
            attempt = attempt.saturating_add(1);
            debug!(job_id, attempt, "polling job status");

            let result = tokio::select! {
                _ = cancel.cancelled() => return,
                result = inner.service.query_status(job_id) => result,
            };
            let status = match result {
                Ok(status) => status,
                Err(err) => {
                    warn!(job_id, attempt, error = %err, "status poll failed, retrying");
                    continue;
                }
            };

            match inner.apply_status(epoch, job_id, status).await {
                Ok(PollOutcome::Continue) => {}
                Ok(PollOutcome::Finished | PollOutcome::Stale) => return,
                Err(err) => {
                    warn!(job_id, attempt, error = %err, "unusable status response, retrying");
                }
            }
        }
    }
}

impl ControllerInner {
    async fn apply_status(
        &self,
        epoch: u64,
        job_id: &str,
        response: StatusResponse,
    ) -> Result<PollOutcome, ServiceError> {
        let mut tracked = self.tracked.lock().await;
        if tracked.epoch != epoch {
            return Ok(PollOutcome::Stale);
        }

        let progress = response.progress_percent();
        let previous = (tracked.state.status.clone(), tracked.state.progress);
        let state = &mut tracked.state;
        match response.status {
            RemoteStatus::Pending | RemoteStatus::Starting => {
                state.status = JobStatus::Starting;
                state.progress = progress;
            }
            RemoteStatus::Processing => {
                // progress never moves backwards while processing
                if state.status == JobStatus::Processing {
                    state.progress = state.progress.max(progress);
                } else {
                    state.progress = progress;
                }
                state.status = JobStatus::Processing;
            }
            RemoteStatus::Completed => {
                let video_url = response
                    .video_url
                    .as_deref()
                    .filter(|url| !url.trim().is_empty())
                    .ok_or(ServiceError::MissingVideoUrl)?;
                let artifact_url = resolve_artifact_url(self.service.base_url(), video_url)?;
                info!(job_id, %artifact_url, "generation completed");
                state.status = JobStatus::Completed { artifact_url };
                state.progress = 100;
            }
            RemoteStatus::Failed => {
                let error_message = response.error.unwrap_or_default();
                info!(job_id, error = %error_message, "generation failed");
                state.status = JobStatus::Failed { error_message };
            }
        }

        if (state.status.clone(), state.progress) != previous {
            state.touch();
            self.presenter.render(&tracked.state);
        }

        if !response.status.is_terminal() {
            return Ok(PollOutcome::Continue);
        }
        tracked.cancel = None;
        if let Some(message) = tracked.state.error_message() {
            self.presenter.alert(&format!("Generation failed: {message}"));
        }
        Ok(PollOutcome::Finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SubmitResponse;
    use async_trait::async_trait;
    use reqwest::Url;
    use std::{
        collections::VecDeque,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex as StdMutex,
        },
    };
    use tokio::{sync::Notify, time::Instant};

    const TICK: Duration = Duration::from_millis(2000);

    #[derive(Default)]
    struct ScriptedService {
        submits: StdMutex<VecDeque<Result<SubmitResponse, ServiceError>>>,
        polls: StdMutex<VecDeque<Result<StatusResponse, ServiceError>>>,
        requests: StdMutex<Vec<GenerateRequest>>,
        poll_times: StdMutex<Vec<Instant>>,
        submit_calls: AtomicUsize,
        poll_calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        submit_gate: Option<Arc<Notify>>,
        poll_gate: Option<Arc<Notify>>,
    }

    impl ScriptedService {
        fn with_polls(polls: Vec<Result<StatusResponse, ServiceError>>) -> Self {
            Self { polls: StdMutex::new(polls.into()), ..Self::default() }
        }

        fn submit_calls(&self) -> usize {
            self.submit_calls.load(Ordering::SeqCst)
        }

        fn poll_calls(&self) -> usize {
            self.poll_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerationService for ScriptedService {
        async fn submit(&self, request: &GenerateRequest) -> Result<SubmitResponse, ServiceError> {
            let n = self.submit_calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.requests.lock().unwrap().push(request.clone());
            if let Some(gate) = &self.submit_gate {
                gate.notified().await;
            }
            self.submits
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(SubmitResponse { id: format!("j{n}") }))
        }

        async fn query_status(&self, _job_id: &str) -> Result<StatusResponse, ServiceError> {
            self.poll_calls.fetch_add(1, Ordering::SeqCst);
            self.poll_times.lock().unwrap().push(Instant::now());
            let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);
            if let Some(gate) = &self.poll_gate {
                gate.notified().await;
            }
            let next = self.polls.lock().unwrap().pop_front().unwrap_or_else(|| Ok(processing(50)));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            next
        }

        fn base_url(&self) -> &Url {
            static BASE: std::sync::OnceLock<Url> = std::sync::OnceLock::new();
            BASE.get_or_init(|| Url::parse("http://localhost:8000").unwrap())
        }
    }

    #[derive(Default)]
    struct RecordingPresenter {
        renders: StdMutex<Vec<JobState>>,
        alerts: StdMutex<Vec<String>>,
    }

    impl RecordingPresenter {
        fn render_count(&self) -> usize {
            self.renders.lock().unwrap().len()
        }

        fn terminal_renders(&self) -> usize {
            self.renders.lock().unwrap().iter().filter(|state| state.status.is_terminal()).count()
        }

        fn alerts(&self) -> Vec<String> {
            self.alerts.lock().unwrap().clone()
        }
    }

    impl Presenter for RecordingPresenter {
        fn render(&self, state: &JobState) {
            self.renders.lock().unwrap().push(state.clone());
        }

        fn alert(&self, message: &str) {
            self.alerts.lock().unwrap().push(message.to_string());
        }
    }

    fn status(value: serde_json::Value) -> StatusResponse {
        serde_json::from_value(value).unwrap()
    }

    fn processing(progress: i64) -> StatusResponse {
        status(serde_json::json!({ "status": "processing", "progress": progress }))
    }

    fn transient() -> ServiceError {
        ServiceError::Api { status: 503, body: "upstream unavailable".into() }
    }

    fn controller(
        service: ScriptedService,
    ) -> (JobController, Arc<ScriptedService>, Arc<RecordingPresenter>) {
        let service = Arc::new(service);
        let presenter = Arc::new(RecordingPresenter::default());
        let controller = JobController::new(service.clone(), presenter.clone(), TICK);
        (controller, service, presenter)
    }

    async fn advance(duration: Duration) {
        sleep(duration).await;
    }

    #[tokio::test(start_paused = true)]
    async fn start_moves_to_starting_and_submits_once() {
        let (controller, service, presenter) = controller(ScriptedService::default());

        let job = controller.start("  deep sea vents ", "cinematic", 45).await.unwrap();

        assert_eq!(job.id, "j1");
        assert_eq!(job.topic, "deep sea vents");
        assert_eq!(service.submit_calls(), 1);
        assert_eq!(
            service.requests.lock().unwrap()[0],
            GenerateRequest {
                topic: "deep sea vents".into(),
                video_style: VideoStyle::Cinematic,
                duration: 45
            }
        );
        let first = presenter.renders.lock().unwrap()[0].clone();
        assert_eq!(first.status, JobStatus::Starting);
        assert!(first.job.is_none());

        let state = controller.snapshot().await;
        assert_eq!(state.status, JobStatus::Starting);
        assert_eq!(state.job_id(), Some("j1"));
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_input_is_rejected_before_submitting() {
        let (controller, service, presenter) = controller(ScriptedService::default());

        let err = controller.start("   ", "documentary", 30).await.unwrap_err();
        assert!(matches!(err, ControllerError::Validation(ValidationError::EmptyTopic)));

        let err = controller.start("volcanoes", "noir", 30).await.unwrap_err();
        assert!(matches!(err, ControllerError::Validation(ValidationError::UnknownStyle(s)) if s == "noir"));

        let err = controller.start("volcanoes", "horror", 20).await.unwrap_err();
        assert!(matches!(
            err,
            ControllerError::Validation(ValidationError::UnsupportedDuration(20))
        ));

        assert_eq!(service.submit_calls(), 0);
        assert_eq!(presenter.render_count(), 0);
        assert_eq!(controller.snapshot().await.status, JobStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn submit_failure_returns_to_idle_without_polling() {
        let service = ScriptedService::default();
        service.submits.lock().unwrap().push_back(Err(transient()));
        let (controller, service, presenter) = controller(service);

        let err = controller.start("glaciers", "documentary", 30).await.unwrap_err();
        assert!(matches!(err, ControllerError::Submission(ServiceError::Api { status: 503, .. })));

        advance(TICK * 5).await;
        assert_eq!(service.poll_calls(), 0);
        assert_eq!(controller.snapshot().await.status, JobStatus::Idle);
        assert_eq!(presenter.alerts().len(), 1);
        assert!(presenter.alerts()[0].starts_with("Failed to start generation"));

        // controller is usable again
        controller.start("glaciers", "documentary", 30).await.unwrap();
        assert_eq!(service.submit_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_job_id_is_a_submission_error() {
        let service = ScriptedService::default();
        service.submits.lock().unwrap().push_back(Ok(SubmitResponse { id: " ".into() }));
        let (controller, service, _presenter) = controller(service);

        let err = controller.start("glaciers", "documentary", 30).await.unwrap_err();
        assert!(matches!(err, ControllerError::Submission(ServiceError::MissingJobId)));

        advance(TICK * 3).await;
        assert_eq!(service.poll_calls(), 0);
        assert_eq!(controller.snapshot().await.status, JobStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn processing_then_completed_resolves_artifact_and_stops() {
        let (controller, service, presenter) = controller(ScriptedService::with_polls(vec![
            Ok(processing(40)),
            Ok(status(serde_json::json!({ "status": "completed", "video_url": "/files/j1.mp4" }))),
        ]));

        controller.start("coral reefs", "documentary", 30).await.unwrap();

        advance(TICK + Duration::from_millis(100)).await;
        let state = controller.snapshot().await;
        assert_eq!(state.status, JobStatus::Processing);
        assert_eq!(state.progress, 40);
        assert!(state.artifact_url().is_none());

        advance(TICK).await;
        let state = controller.snapshot().await;
        assert_eq!(
            state.artifact_url().map(Url::as_str),
            Some("http://localhost:8000/files/j1.mp4")
        );
        assert_eq!(state.progress, 100);
        assert!(state.error_message().is_none());

        advance(TICK * 10).await;
        assert_eq!(service.poll_calls(), 2);
        assert_eq!(presenter.terminal_renders(), 1);
        assert!(presenter.alerts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_status_records_error_and_stops() {
        let (controller, service, presenter) = controller(ScriptedService::with_polls(vec![Ok(
            status(serde_json::json!({ "status": "failed", "error": "render timeout" })),
        )]));

        controller.start("storm chasing", "upbeat", 15).await.unwrap();
        advance(TICK * 10).await;

        let state = controller.snapshot().await;
        assert_eq!(state.status, JobStatus::Failed { error_message: "render timeout".into() });
        assert!(state.artifact_url().is_none());
        assert_eq!(service.poll_calls(), 1);
        assert_eq!(presenter.terminal_renders(), 1);
        assert_eq!(presenter.alerts(), vec!["Generation failed: render timeout".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_status_without_text_uses_empty_message() {
        let (controller, _service, _presenter) = controller(ScriptedService::with_polls(vec![Ok(
            status(serde_json::json!({ "status": "failed" })),
        )]));

        controller.start("storm chasing", "upbeat", 15).await.unwrap();
        advance(TICK * 2).await;

        assert_eq!(controller.snapshot().await.error_message(), Some(""));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_poll_error_leaves_state_and_keeps_polling() {
        let (controller, service, presenter) = controller(ScriptedService::with_polls(vec![
            Err(transient()),
            Ok(processing(10)),
        ]));

        controller.start("desert blooms", "emotional", 60).await.unwrap();
        let before = controller.snapshot().await;
        let renders_before = presenter.render_count();

        advance(TICK + Duration::from_millis(100)).await;
        assert_eq!(service.poll_calls(), 1);
        assert_eq!(controller.snapshot().await, before);
        assert_eq!(presenter.render_count(), renders_before);

        advance(TICK).await;
        assert_eq!(service.poll_calls(), 2);
        let state = controller.snapshot().await;
        assert_eq!(state.status, JobStatus::Processing);
        assert_eq!(state.progress, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn completed_without_video_url_is_retried() {
        let (controller, service, _presenter) = controller(ScriptedService::with_polls(vec![
            Ok(status(serde_json::json!({ "status": "completed" }))),
            Ok(status(serde_json::json!({ "status": "completed", "video_url": "/static/j1.mp4" }))),
        ]));

        controller.start("auroras", "cinematic", 30).await.unwrap();

        advance(TICK + Duration::from_millis(100)).await;
        assert_eq!(controller.snapshot().await.status, JobStatus::Starting);

        advance(TICK).await;
        assert_eq!(service.poll_calls(), 2);
        assert_eq!(
            controller.snapshot().await.artifact_url().map(Url::as_str),
            Some("http://localhost:8000/static/j1.mp4")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn progress_never_decreases_while_processing() {
        let (controller, _service, _presenter) = controller(ScriptedService::with_polls(vec![
            Ok(processing(40)),
            Ok(processing(25)),
            Ok(processing(60)),
        ]));

        controller.start("mars rovers", "documentary", 30).await.unwrap();
        advance(Duration::from_millis(100)).await;

        let mut seen = Vec::new();
        for _ in 0..3 {
            advance(TICK).await;
            seen.push(controller.snapshot().await.progress);
        }
        assert_eq!(seen, vec![40, 40, 60]);
    }

    #[tokio::test(start_paused = true)]
    async fn polls_are_sequential_and_spaced_by_interval() {
        let (controller, service, _presenter) = controller(ScriptedService::default());

        controller.start("rainforests", "documentary", 30).await.unwrap();
        advance(TICK * 8 + Duration::from_millis(500)).await;

        assert_eq!(service.poll_calls(), 8);
        assert_eq!(service.max_in_flight.load(Ordering::SeqCst), 1);
        let times = service.poll_times.lock().unwrap().clone();
        assert!(times.windows(2).all(|pair| pair[1] - pair[0] >= TICK));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_discards_in_flight_poll_response() {
        let gate = Arc::new(Notify::new());
        let service = ScriptedService {
            poll_gate: Some(gate.clone()),
            polls: StdMutex::new(VecDeque::from([Ok(status(
                serde_json::json!({ "status": "completed", "video_url": "/static/j1.mp4" }),
            ))])),
            ..ScriptedService::default()
        };
        let (controller, service, presenter) = controller(service);

        controller.start("tectonics", "horror", 45).await.unwrap();
        advance(TICK + Duration::from_millis(100)).await;
        assert_eq!(service.poll_calls(), 1);

        let before = controller.snapshot().await;
        let renders_before = presenter.render_count();
        controller.stop().await;
        gate.notify_one();

        advance(TICK * 10).await;
        assert_eq!(controller.snapshot().await, before);
        assert_eq!(presenter.render_count(), renders_before);
        assert_eq!(service.poll_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_discards_in_flight_poll_response() {
        let gate = Arc::new(Notify::new());
        let service = ScriptedService {
            poll_gate: Some(gate.clone()),
            polls: StdMutex::new(VecDeque::from([Ok(status(
                serde_json::json!({ "status": "completed", "video_url": "/static/j1.mp4" }),
            ))])),
            ..ScriptedService::default()
        };
        let (controller, service, presenter) = controller(service);

        controller.start("tidepools", "documentary", 30).await.unwrap();
        advance(TICK + Duration::from_millis(100)).await;
        assert_eq!(service.poll_calls(), 1);

        controller.reset().await;
        let renders_after_reset = presenter.render_count();
        gate.notify_one();

        advance(TICK * 10).await;
        let state = controller.snapshot().await;
        assert_eq!(state.status, JobStatus::Idle);
        assert!(state.job.is_none());
        assert!(state.artifact_url().is_none());
        assert_eq!(presenter.render_count(), renders_after_reset);
        assert_eq!(presenter.terminal_renders(), 0);
        assert_eq!(service.poll_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_during_submit_discards_the_job() {
        let gate = Arc::new(Notify::new());
        let service = ScriptedService { submit_gate: Some(gate.clone()), ..ScriptedService::default() };
        let (controller, service, _presenter) = controller(service);

        let pending = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.start("eclipses", "cinematic", 15).await })
        };
        advance(Duration::from_millis(10)).await;
        assert_eq!(service.submit_calls(), 1);

        controller.stop().await;
        gate.notify_one();

        let result = pending.await.unwrap();
        assert!(matches!(result, Err(ControllerError::Cancelled)));
        advance(TICK * 5).await;
        assert_eq!(service.poll_calls(), 0);
        assert!(controller.snapshot().await.job.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_requires_terminal_state_or_reset() {
        let (controller, service, presenter) = controller(ScriptedService::default());

        controller.start("ocean currents", "documentary", 30).await.unwrap();
        let err = controller.start("another one", "documentary", 30).await.unwrap_err();
        assert!(matches!(err, ControllerError::Validation(ValidationError::JobActive(id)) if id == "j1"));
        assert_eq!(service.submit_calls(), 1);
        assert_eq!(controller.snapshot().await.job_id(), Some("j1"));

        controller.reset().await;
        assert_eq!(presenter.renders.lock().unwrap().last().map(|s| s.status.clone()), Some(JobStatus::Idle));
        let polls_after_reset = service.poll_calls();
        advance(TICK * 3).await;
        assert_eq!(service.poll_calls(), polls_after_reset);

        let job = controller.start("another one", "documentary", 30).await.unwrap();
        assert_eq!(job.id, "j2");
    }

    #[tokio::test(start_paused = true)]
    async fn new_job_allowed_after_terminal_state() {
        let (controller, service, _presenter) = controller(ScriptedService::with_polls(vec![Ok(
            status(serde_json::json!({ "status": "failed", "error": "quota" })),
        )]));

        controller.start("comets", "upbeat", 60).await.unwrap();
        advance(TICK * 2).await;
        assert!(controller.snapshot().await.status.is_terminal());

        let job = controller.start("comets again", "upbeat", 60).await.unwrap();
        assert_eq!(job.id, "j2");
        let state = controller.snapshot().await;
        assert_eq!(state.status, JobStatus::Starting);
        assert!(state.error_message().is_none());
        assert_eq!(service.submit_calls(), 2);
    }
}
