use std::{
    sync::{Arc, Mutex as StdMutex},
    time::Duration,
};

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use serde::Serialize;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::analysis::Issue;
use crate::estimator::{FrameSource, PoseEstimator};
use crate::exercise::Exercise;
use crate::pose::Pose;
use crate::report::Report;
use crate::settings::AnalysisSettings;

use super::{FormSession, SessionStatus};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub exercise: Exercise,
    pub session_id: Option<String>,
    pub elapsed_secs: u64,
    /// Issues admitted to the live feed so far, repeats included.
    pub live_issue_count: usize,
    pub pose_detected: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionEvent {
    StateChanged(SessionSnapshot),
    IssuesRaised { session_id: String, issues: Vec<Issue> },
    ReportReady(Report),
}

struct ControllerState {
    session: FormSession,
    /// Set while recording; elapsed time is measured from here.
    anchor: Option<Instant>,
}

impl ControllerState {
    fn elapsed_secs(&self) -> u64 {
        self.anchor
            .map(|anchor| anchor.elapsed().as_secs())
            .unwrap_or(0)
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.session.status(),
            exercise: self.session.exercise(),
            session_id: self.session.session_id().map(String::from),
            elapsed_secs: self.elapsed_secs(),
            live_issue_count: self.session.issues().len(),
            pose_detected: self.session.pose_detected(),
        }
    }

    /// Analyze at the current elapsed second; returns admitted issues with the session id.
    fn analyze(&mut self, pose: Option<Pose>) -> Option<(String, Vec<Issue>)> {
        let elapsed = self.elapsed_secs();
        let issues = self.session.analyze_frame(pose, elapsed);
        if issues.is_empty() {
            return None;
        }
        let session_id = self.session.session_id().unwrap_or_default().to_string();
        Some((session_id, issues))
    }
}

struct AnalysisTicker {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

type SharedSource = Arc<StdMutex<Box<dyn FrameSource>>>;

/// Drives a [`FormSession`] in real time.
///
/// Hosts either push poses themselves with [`SessionController::analyze_pose`]
/// or hand over a [`FrameSource`] and let the controller poll it on the
/// configured interval.
#[derive(Clone)]
pub struct SessionController {
    state: Arc<Mutex<ControllerState>>,
    estimator: Arc<dyn PoseEstimator>,
    ticker: Arc<Mutex<Option<AnalysisTicker>>>,
    events: broadcast::Sender<SessionEvent>,
    settings: AnalysisSettings,
}

impl SessionController {
    pub fn new(estimator: Arc<dyn PoseEstimator>, settings: AnalysisSettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(ControllerState {
                session: FormSession::new(),
                anchor: None,
            })),
            estimator,
            ticker: Arc::new(Mutex::new(None)),
            events,
            settings,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn get_snapshot(&self) -> SessionSnapshot {
        self.state.lock().await.snapshot()
    }

    /// Start recording with poses pushed by the host.
    pub async fn start_session(&self, exercise: Exercise) -> Result<SessionSnapshot> {
        {
            let mut state = self.state.lock().await;
            state.session.start(exercise, Utc::now())?;
            state.anchor = Some(Instant::now());
        }

        self.emit_state_changed().await;
        Ok(self.get_snapshot().await)
    }

    /// Start recording and poll `source` every analysis interval.
    pub async fn start_recording(
        &self,
        exercise: Exercise,
        source: Box<dyn FrameSource>,
    ) -> Result<SessionSnapshot> {
        if self.ticker.lock().await.is_some() {
            bail!("analysis loop already running");
        }

        let snapshot = self.start_session(exercise).await?;
        self.spawn_ticker(source).await;
        Ok(snapshot)
    }

    /// Analyze one pose at the current elapsed second.
    pub async fn analyze_pose(&self, pose: Option<Pose>) -> Vec<Issue> {
        let raised = self.state.lock().await.analyze(pose);
        match raised {
            Some((session_id, issues)) => {
                let _ = self.events.send(SessionEvent::IssuesRaised {
                    session_id,
                    issues: issues.clone(),
                });
                issues
            }
            None => Vec::new(),
        }
    }

    /// Stop recording and produce the report. Returns `None` when idle.
    pub async fn stop_session(&self) -> Result<Option<Report>> {
        self.cancel_ticker().await?;

        let frozen = {
            let mut state = self.state.lock().await;
            let elapsed = state.elapsed_secs();
            let frozen = state.session.freeze(elapsed);
            if frozen {
                state.anchor = None;
            }
            frozen
        };
        if !frozen {
            return Ok(None);
        }

        self.emit_state_changed().await;

        let delay = self.settings.finalize_delay();
        if !delay.is_zero() {
            time::sleep(delay).await;
        }

        let report = self.state.lock().await.session.finalize();
        self.emit_state_changed().await;

        if let Some(report) = &report {
            log_info!("{}", report.summary());
            let _ = self.events.send(SessionEvent::ReportReady(report.clone()));
        }
        Ok(report)
    }

    /// Abandon the recording without a report.
    pub async fn cancel_session(&self) -> Result<()> {
        self.cancel_ticker().await?;
        {
            let mut state = self.state.lock().await;
            if state.session.status() == SessionStatus::Idle {
                return Ok(());
            }
            state.session.cancel();
            state.anchor = None;
        }
        self.emit_state_changed().await;
        Ok(())
    }

    async fn spawn_ticker(&self, source: Box<dyn FrameSource>) {
        let mut ticker_guard = self.ticker.lock().await;

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(analysis_loop(
            self.state.clone(),
            self.estimator.clone(),
            Arc::new(StdMutex::new(source)),
            self.events.clone(),
            self.settings.clone(),
            cancel_token.clone(),
        ));

        *ticker_guard = Some(AnalysisTicker {
            handle,
            cancel_token,
        });
    }

    async fn cancel_ticker(&self) -> Result<()> {
        let Some(ticker) = self.ticker.lock().await.take() else {
            return Ok(());
        };

        ticker.cancel_token.cancel();
        ticker
            .handle
            .await
            .context("analysis loop task failed to join")
    }

    async fn emit_state_changed(&self) {
        let snapshot = self.get_snapshot().await;
        let _ = self.events.send(SessionEvent::StateChanged(snapshot));
    }
}

async fn analysis_loop(
    state: Arc<Mutex<ControllerState>>,
    estimator: Arc<dyn PoseEstimator>,
    source: SharedSource,
    events: broadcast::Sender<SessionEvent>,
    settings: AnalysisSettings,
    cancel_token: CancellationToken,
) {
    let mut ticker = time::interval(settings.analysis_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Estimation that outlived its timeout; the model is never entered twice.
    let mut pending: Option<CaptureJob> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let pose = next_pose(
                    &mut pending,
                    &estimator,
                    &source,
                    settings.estimator_timeout(),
                )
                .await;

                let raised = {
                    let mut guard = state.lock().await;
                    if guard.session.status() != SessionStatus::Recording {
                        break;
                    }
                    guard.analyze(pose)
                };

                if let Some((session_id, issues)) = raised {
                    let _ = events.send(SessionEvent::IssuesRaised { session_id, issues });
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("analysis loop shutting down");
                break;
            }
        }
    }

    if let Some(job) = pending.take() {
        log_info!("waiting for in-flight pose estimation to finish");
        if let Err(err) = job.await {
            log_error!("pose estimation worker join failed: {err}");
        }
    }
}

type CaptureJob = JoinHandle<Result<Option<Pose>>>;

/// Pose for this tick. Any failure degrades to a no-pose tick.
///
/// While an earlier estimation is still running the tick is skipped instead of
/// calling the estimator again; a job that finished late is discarded as stale.
async fn next_pose(
    pending: &mut Option<CaptureJob>,
    estimator: &Arc<dyn PoseEstimator>,
    source: &SharedSource,
    timeout: Duration,
) -> Option<Pose> {
    if let Some(job) = pending.as_ref() {
        if !job.is_finished() {
            log_debug!("pose estimation still running, skipping tick");
            return None;
        }
        *pending = None;
    }

    let mut job = spawn_capture(estimator, source);
    match time::timeout(timeout, &mut job).await {
        Ok(Ok(Ok(pose))) => pose,
        Ok(Ok(Err(err))) => {
            log_warn!("pose estimation failed: {err:?}");
            None
        }
        Ok(Err(err)) => {
            log_error!("pose estimation worker join failed: {err}");
            None
        }
        Err(_) => {
            log_warn!("pose estimation timeout (> {}ms)", timeout.as_millis());
            *pending = Some(job);
            None
        }
    }
}

/// Grab a frame and run the estimator off the async threads.
fn spawn_capture(estimator: &Arc<dyn PoseEstimator>, source: &SharedSource) -> CaptureJob {
    let estimator = Arc::clone(estimator);
    let source = Arc::clone(source);
    tokio::task::spawn_blocking(move || -> Result<Option<Pose>> {
        let frame = {
            let mut source = source
                .lock()
                .map_err(|_| anyhow!("frame source lock poisoned"))?;
            source.next_frame()?
        };
        match frame {
            Some(frame) => estimator.estimate_pose(&frame),
            None => Ok(None),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::IssueCategory;
    use crate::estimator::Frame;
    use crate::pose::{Keypoint, KeypointName};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn plank(hip_y: f32) -> Pose {
        use KeypointName::*;
        Pose::new(vec![
            Keypoint::new(LeftShoulder, 100.0, 200.0, 0.9),
            Keypoint::new(LeftHip, 250.0, hip_y, 0.9),
            Keypoint::new(LeftAnkle, 400.0, 200.0, 0.9),
        ])
    }

    fn no_estimator() -> Arc<dyn PoseEstimator> {
        Arc::new(|_frame: &Frame| -> Result<Option<Pose>> { Ok(None) })
    }

    fn settings(finalize_delay_ms: u64) -> AnalysisSettings {
        AnalysisSettings {
            analysis_interval_ms: 10,
            finalize_delay_ms,
            estimator_timeout_ms: 1000,
            default_exercise: Exercise::Squat,
        }
    }

    struct BlankCamera {
        frames: usize,
    }

    impl FrameSource for BlankCamera {
        fn next_frame(&mut self) -> Result<Option<Frame>> {
            self.frames += 1;
            Ok(Some(Frame::new_rgb8(4, 4)))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_push_mode_uses_elapsed_seconds() {
        let controller = SessionController::new(no_estimator(), settings(2000));
        let mut events = controller.subscribe();

        controller.start_session(Exercise::Plank).await.unwrap();
        assert!(controller.start_session(Exercise::Squat).await.is_err());

        assert!(controller.analyze_pose(Some(plank(200.0))).await.is_empty());
        time::advance(Duration::from_secs(3)).await;
        let issues = controller.analyze_pose(Some(plank(245.0))).await;
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].category, IssueCategory::PlankHipsSagging);
        assert_eq!(issues[0].timestamp_secs, 3);

        time::advance(Duration::from_secs(5)).await;
        let report = controller.stop_session().await.unwrap().unwrap();
        assert_eq!(report.duration_secs, 8);
        assert_eq!(report.score, 91);
        assert_eq!(controller.get_snapshot().await.status, SessionStatus::Idle);

        assert!(controller.stop_session().await.unwrap().is_none());

        let mut saw_issue = false;
        let mut saw_report = false;
        while let Ok(event) = events.try_recv() {
            match event {
                SessionEvent::IssuesRaised { issues, .. } => saw_issue |= !issues.is_empty(),
                SessionEvent::ReportReady(ready) => saw_report |= ready.session_id == report.session_id,
                SessionEvent::StateChanged(_) => {}
            }
        }
        assert!(saw_issue);
        assert!(saw_report);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_reports_finalizing_then_idle() {
        let controller = SessionController::new(no_estimator(), settings(2000));
        controller.start_session(Exercise::Squat).await.unwrap();
        time::advance(Duration::from_secs(8)).await;

        let stopping = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.stop_session().await })
        };
        // Let the stop task freeze the session and enter its finalize delay
        tokio::task::yield_now().await;
        time::sleep(Duration::from_millis(500)).await;
        let snapshot = controller.get_snapshot().await;
        assert_eq!(snapshot.status, SessionStatus::Finalizing);

        let report = stopping.await.unwrap().unwrap().unwrap();
        assert_eq!(report.score, 0);
        assert_eq!(report.duration_secs, 8);
        assert_eq!(report.feedback[0], "❌ No body detected during recording");
    }

    #[tokio::test]
    async fn test_ticker_polls_source_and_estimator() {
        let calls = Arc::new(AtomicUsize::new(0));
        let estimator: Arc<dyn PoseEstimator> = {
            let calls = Arc::clone(&calls);
            Arc::new(move |_frame: &Frame| -> Result<Option<Pose>> {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                // Sway between level and sagging so the movement gate opens
                let hip_y = if call % 2 == 0 { 200.0 } else { 245.0 };
                Ok(Some(plank(hip_y)))
            })
        };

        let controller = SessionController::new(estimator, settings(0));
        controller
            .start_recording(Exercise::Plank, Box::new(BlankCamera { frames: 0 }))
            .await
            .unwrap();
        assert!(controller
            .start_recording(Exercise::Plank, Box::new(BlankCamera { frames: 0 }))
            .await
            .is_err());

        time::sleep(Duration::from_millis(200)).await;
        let report = controller.stop_session().await.unwrap().unwrap();

        assert!(calls.load(Ordering::SeqCst) >= 2);
        assert!(report.stats.frames_analyzed >= 1);
        assert_eq!(report.categories, vec![IssueCategory::PlankHipsSagging]);
        assert_eq!(report.score, 91);

        // Ticker is gone; further ticks do not touch the idle session
        let seen = calls.load(Ordering::SeqCst);
        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), seen);
    }

    #[tokio::test]
    async fn test_estimator_failure_is_a_no_pose_tick() {
        let estimator: Arc<dyn PoseEstimator> =
            Arc::new(|_frame: &Frame| -> Result<Option<Pose>> { Err(anyhow!("model not loaded")) });
        let controller = SessionController::new(estimator, settings(0));
        controller
            .start_recording(Exercise::Squat, Box::new(BlankCamera { frames: 0 }))
            .await
            .unwrap();

        time::sleep(Duration::from_millis(60)).await;
        let report = controller.stop_session().await.unwrap().unwrap();
        assert_eq!(report.score, 0);
        assert_eq!(report.stats.frames_present, 0);
    }

    #[tokio::test]
    async fn test_slow_estimator_is_never_reentered() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_in_flight = Arc::new(AtomicUsize::new(0));
        let calls = Arc::new(AtomicUsize::new(0));
        let estimator: Arc<dyn PoseEstimator> = {
            let in_flight = Arc::clone(&in_flight);
            let max_in_flight = Arc::clone(&max_in_flight);
            let calls = Arc::clone(&calls);
            Arc::new(move |_frame: &Frame| -> Result<Option<Pose>> {
                calls.fetch_add(1, Ordering::SeqCst);
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_in_flight.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(300));
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(Some(plank(200.0)))
            })
        };

        let slow = AnalysisSettings {
            estimator_timeout_ms: 50,
            ..settings(0)
        };
        let controller = SessionController::new(estimator, slow);
        controller
            .start_recording(Exercise::Plank, Box::new(BlankCamera { frames: 0 }))
            .await
            .unwrap();

        time::sleep(Duration::from_millis(400)).await;
        let report = controller.stop_session().await.unwrap().unwrap();

        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
        assert!(calls.load(Ordering::SeqCst) >= 1);
        // Every tick timed out or was skipped
        assert!(report.stats.frames_seen >= 2);
        assert_eq!(report.stats.frames_present, 0);

        let settled = calls.load(Ordering::SeqCst);
        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), settled);
    }

    #[tokio::test]
    async fn test_cancel_discards_session() {
        let controller = SessionController::new(no_estimator(), settings(0));
        controller.cancel_session().await.unwrap();

        controller.start_session(Exercise::Pushup).await.unwrap();
        controller.cancel_session().await.unwrap();
        assert_eq!(controller.get_snapshot().await.status, SessionStatus::Idle);
        assert!(controller.stop_session().await.unwrap().is_none());
    }
}
