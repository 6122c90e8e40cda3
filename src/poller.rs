//! Cancellable status polling sessions.
//!
//! A session fetches a status endpoint, reports the snapshot, and sleeps for a
//! fixed interval before the next fetch until a terminal status is observed.
//! Failed fetches are reported and superseded by the next tick. The session's
//! task is aborted when its handle is dropped.

use std::{collections::HashMap, hash::Hash, time::Duration};

use async_trait::async_trait;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    api::{self, ApiClient, ApiError, types::{BatchJob, JobRecord, PreviewJob}},
    status::Lifecycle,
};

/// Something whose status can be fetched by id.
#[async_trait]
pub trait StatusSource: Send + Sync + 'static {
    type Snapshot: Send + 'static;

    async fn fetch(&self, id: &str) -> Result<Self::Snapshot, ApiError>;

    fn is_terminal(snapshot: &Self::Snapshot) -> bool;
}

/// Scheduling decision taken after each fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextTick {
    After(Duration),
    Stop,
}

/// Terminal snapshots stop the session; anything else (including a failed
/// fetch) schedules exactly one more fetch.
pub fn next_tick(terminal: bool, interval: Duration) -> NextTick {
    if terminal {
        NextTick::Stop
    } else {
        NextTick::After(interval)
    }
}

/// Message produced by one tick.
#[derive(Debug)]
pub enum PollUpdate<S> {
    Snapshot(S),
    Failed(String),
}

/// Handle of a running session. Dropping it cancels the session.
#[derive(Debug)]
pub struct PollSession {
    target: String,
    handle: JoinHandle<()>,
}

impl PollSession {
    /// Spawn a session polling `target` every `interval`. Each tick's outcome
    /// is passed through `map` and sent on `tx`.
    pub fn start<S, E, F>(
        source: S,
        target: String,
        interval: Duration,
        tx: mpsc::Sender<E>,
        map: F,
    ) -> Self
    where
        S: StatusSource,
        E: Send + 'static,
        F: Fn(&str, PollUpdate<S::Snapshot>) -> E + Send + 'static,
    {
        tracing::info!("poll start: {target} every {}ms", interval.as_millis());
        let handle = tokio::spawn(run_session(source, target.clone(), interval, tx, map));
        Self { target, handle }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for PollSession {
    fn drop(&mut self) {
        if !self.handle.is_finished() {
            tracing::info!("poll cancelled: {}", self.target);
        }
        self.handle.abort();
    }
}

async fn run_session<S, E, F>(
    source: S,
    target: String,
    interval: Duration,
    tx: mpsc::Sender<E>,
    map: F,
) where
    S: StatusSource,
    E: Send + 'static,
    F: Fn(&str, PollUpdate<S::Snapshot>) -> E + Send + 'static,
{
    loop {
        let (terminal, update) = match source.fetch(&target).await {
            Ok(snapshot) => (S::is_terminal(&snapshot), PollUpdate::Snapshot(snapshot)),
            Err(e) => {
                tracing::warn!("poll {target} failed: {e}");
                (false, PollUpdate::Failed(e.to_string()))
            }
        };
        if tx.send(map(&target, update)).await.is_err() {
            // Receiver gone; nobody is watching any more.
            return;
        }
        match next_tick(terminal, interval) {
            NextTick::Stop => {
                tracing::info!("poll finished: {target}");
                return;
            }
            NextTick::After(delay) => tokio::time::sleep(delay).await,
        }
    }
}

/// Sessions keyed by what they watch. At most one session per key.
#[derive(Debug)]
pub struct PollRegistry<K> {
    sessions: HashMap<K, PollSession>,
}

impl<K: Hash + Eq> PollRegistry<K> {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Register a session, cancelling any previous one for the same key.
    pub fn insert(&mut self, key: K, session: PollSession) {
        if let Some(old) = self.sessions.insert(key, session) {
            tracing::debug!("poll replaced: {}", old.target());
        }
    }

    /// Whether a still running session exists for `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.sessions.get(key).is_some_and(|s| !s.is_finished())
    }

    /// Cancel every session whose key matches `pred`.
    pub fn cancel_where(&mut self, pred: impl Fn(&K) -> bool) {
        self.sessions.retain(|k, _| !pred(k));
    }

    /// Forget sessions that reached a terminal status.
    pub fn prune(&mut self) {
        self.sessions.retain(|_, s| !s.is_finished());
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }
}

impl<K: Hash + Eq> Default for PollRegistry<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// `POST /api/jobs/status`.
pub struct JobSource(pub ApiClient);

#[async_trait]
impl StatusSource for JobSource {
    type Snapshot = JobRecord;

    async fn fetch(&self, id: &str) -> Result<JobRecord, ApiError> {
        api::jobs::status(&self.0, id).await
    }

    fn is_terminal(snapshot: &JobRecord) -> bool {
        snapshot.status.is_terminal()
    }
}

/// `GET /api/preview/{id}`.
pub struct PreviewSource(pub ApiClient);

#[async_trait]
impl StatusSource for PreviewSource {
    type Snapshot = PreviewJob;

    async fn fetch(&self, id: &str) -> Result<PreviewJob, ApiError> {
        api::preview::status(&self.0, id).await
    }

    fn is_terminal(snapshot: &PreviewJob) -> bool {
        snapshot.status.is_terminal()
    }
}

/// `GET /api/batch/status/{id}`.
pub struct BatchSource(pub ApiClient);

#[async_trait]
impl StatusSource for BatchSource {
    type Snapshot = BatchJob;

    async fn fetch(&self, id: &str) -> Result<BatchJob, ApiError> {
        api::batch::status(&self.0, id).await
    }

    fn is_terminal(snapshot: &BatchJob) -> bool {
        snapshot.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::JobStatus;
    use std::{
        collections::VecDeque,
        sync::{
            Arc, Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    const INTERVAL: Duration = Duration::from_secs(3);

    /// Replays scripted answers; repeats `fallback` once the script runs out.
    #[derive(Clone)]
    struct Scripted {
        answers: Arc<Mutex<VecDeque<Result<JobStatus, String>>>>,
        fallback: JobStatus,
        calls: Arc<AtomicUsize>,
    }

    impl Scripted {
        fn new(answers: Vec<Result<&str, &str>>, fallback: &str) -> Self {
            let answers = answers
                .into_iter()
                .map(|a| a.map(JobStatus::from).map_err(str::to_string))
                .collect();
            Self {
                answers: Arc::new(Mutex::new(answers)),
                fallback: JobStatus::from(fallback),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusSource for Scripted {
        type Snapshot = JobStatus;

        async fn fetch(&self, _id: &str) -> Result<JobStatus, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.answers.lock().unwrap().pop_front();
            match next {
                Some(Ok(s)) => Ok(s),
                Some(Err(e)) => Err(ApiError::Rejected(e)),
                None => Ok(self.fallback.clone()),
            }
        }

        fn is_terminal(snapshot: &JobStatus) -> bool {
            snapshot.is_terminal()
        }
    }

    fn start(source: &Scripted) -> (PollSession, mpsc::Receiver<PollUpdate<JobStatus>>) {
        let (tx, rx) = mpsc::channel(16);
        let session = PollSession::start(source.clone(), "job-1".into(), INTERVAL, tx, |_, u| u);
        (session, rx)
    }

    #[test]
    fn next_tick_stops_only_on_terminal() {
        assert_eq!(next_tick(true, INTERVAL), NextTick::Stop);
        assert_eq!(next_tick(false, INTERVAL), NextTick::After(INTERVAL));
    }

    #[tokio::test(start_paused = true)]
    async fn stops_after_terminal_status() {
        let source = Scripted::new(vec![Ok("planning"), Ok("editing"), Ok("completed")], "failed");
        let (session, mut rx) = start(&source);

        let mut seen = vec![];
        while let Some(PollUpdate::Snapshot(s)) = rx.recv().await {
            seen.push(s);
        }
        assert_eq!(
            seen,
            vec![JobStatus::Planning, JobStatus::Editing, JobStatus::Completed]
        );

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.calls(), 3);
        assert!(session.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn non_terminal_schedules_one_follow_up_after_interval() {
        let source = Scripted::new(vec![Ok("uploading")], "uploading");
        let (_session, mut rx) = start(&source);

        assert!(matches!(rx.recv().await, Some(PollUpdate::Snapshot(JobStatus::Uploading))));
        assert_eq!(source.calls(), 1);

        let early = tokio::time::timeout(INTERVAL - Duration::from_millis(100), rx.recv()).await;
        assert!(early.is_err(), "no fetch before the interval elapses");
        assert_eq!(source.calls(), 1);

        assert!(rx.recv().await.is_some());
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_is_superseded_by_next_tick() {
        let source = Scripted::new(vec![Err("connection refused"), Ok("failed")], "failed");
        let (_session, mut rx) = start(&source);

        match rx.recv().await {
            Some(PollUpdate::Failed(msg)) => assert!(msg.contains("connection refused")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(rx.recv().await, Some(PollUpdate::Snapshot(JobStatus::Failed))));
        assert!(rx.recv().await.is_none());
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_status_keeps_polling() {
        let source = Scripted::new(vec![Ok("rendering"), Ok("completed")], "completed");
        let (_session, mut rx) = start(&source);
        assert!(matches!(
            rx.recv().await,
            Some(PollUpdate::Snapshot(JobStatus::Other(_)))
        ));
        assert!(matches!(rx.recv().await, Some(PollUpdate::Snapshot(JobStatus::Completed))));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_session_cancels_it() {
        let source = Scripted::new(vec![], "planning");
        let (session, mut rx) = start(&source);
        assert!(rx.recv().await.is_some());

        drop(session);
        assert!(rx.recv().await.is_none());
        tokio::time::sleep(INTERVAL * 5).await;
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn registry_keeps_one_session_per_key() {
        let first = Scripted::new(vec![], "planning");
        let second = Scripted::new(vec![], "planning");
        let (s1, mut rx1) = start(&first);
        let (s2, mut rx2) = start(&second);

        let mut reg = PollRegistry::new();
        reg.insert("job-1", s1);
        reg.insert("job-1", s2);
        assert_eq!(reg.len(), 1);

        // The replaced session's channel closes once its task is aborted.
        while rx1.recv().await.is_some() {}
        assert!(rx2.recv().await.is_some());

        reg.cancel_where(|k| *k == "job-1");
        assert_eq!(reg.len(), 0);
        while rx2.recv().await.is_some() {}
    }
}
