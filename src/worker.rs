//! Background worker running backend calls for the UI.
//!
//! Each command's backend work runs on its own task, so a slow call never
//! holds up a health check or a screen load. The worker loop itself only
//! touches the poll registry, and command tasks ask it for new sessions over
//! a control channel. Sessions and command tasks stop when the loop exits.

use std::path::Path;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use tokio::{
    sync::{mpsc, watch},
    task::JoinSet,
};

use crate::{
    api::{
        self, ApiClient, ApiError,
        content, jobs, media, preview, scheduler,
        scheduler::ScheduledJob,
        types::{
            Account, AccountCreate, AccountDetail, AccountSettings, AccountUpdate, BatchJob,
            BatchStartRequest, BgmEntry, CreateDraftRequest, CreateVideoRequest, DraftProject, FinalizeDraftRequest,
            JobRecord, LibraryVideo, MoodInfo, PreviewGenerateRequest, PreviewJob, PreviewSummary,
            RecentJobs, ScriptRequest, Segment, TtsPreviewRequest, TtsTestRequest,
            UpdateSegmentRequest, Voice,
        },
    },
    config::{Config, PollingCfg},
    forms::BgmUpload,
    pager::PAGE_SIZE,
    poller::{BatchSource, JobSource, PollRegistry, PollSession, PollUpdate, PreviewSource},
    prefs::Preferences,
    status::{DraftStatus, Lifecycle, VideoStatus},
};

/// Which screen a polling session belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PollKind {
    Job,
    Preview,
    Batch,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PollKey {
    /// A job started or picked by the user.
    Job(String),
    /// An unfinished row of the jobs page on screen; replaced on page change.
    JobRow(String),
    Preview(String),
    Batch(String),
}

impl PollKey {
    pub fn kind(&self) -> PollKind {
        match self {
            PollKey::Job(_) | PollKey::JobRow(_) => PollKind::Job,
            PollKey::Preview(_) => PollKind::Preview,
            PollKey::Batch(_) => PollKind::Batch,
        }
    }
}

/// One studio tool invocation. Region, tone and TTS voice parameters come
/// from the current preferences when the action runs.
#[derive(Clone, Debug, PartialEq)]
pub enum StudioAction {
    AnalyzeTrends,
    GenerateScripts { keywords: String },
    SearchTrending,
    SearchKeywords { keywords: String },
    Download { url: String },
    Upload {
        video_path: String,
        keywords: String,
        script: Option<String>,
        privacy: String,
    },
    TtsTest { text: String },
    Produce { script: String },
}

impl StudioAction {
    pub fn title(&self) -> &'static str {
        match self {
            StudioAction::AnalyzeTrends => "Trend analysis",
            StudioAction::GenerateScripts { .. } => "Scripts",
            StudioAction::SearchTrending => "Trending videos",
            StudioAction::SearchKeywords { .. } => "Keyword search",
            StudioAction::Download { .. } => "Download",
            StudioAction::Upload { .. } => "Upload",
            StudioAction::TtsTest { .. } => "TTS test",
            StudioAction::Produce { .. } => "Produce",
        }
    }
}

/// Commands sent from the UI to the worker.
#[derive(Debug)]
pub enum WorkerCmd {
    CheckHealth,
    /// Stop every polling session of a screen being left.
    StopPolling(PollKind),

    LoadJobs { page: u32 },
    /// Start (or restart) polling one job.
    WatchJob(String),
    CreateVideo(CreateVideoRequest),

    LoadAccounts,
    LoadAccountDetail(i64),
    CreateAccount(AccountCreate),
    UpdateAccount { id: i64, body: AccountUpdate },
    DeleteAccount(i64),
    LoadAccountSettings(i64),
    SaveAccountSettings { id: i64, settings: AccountSettings },
    LoadVoices,
    PreviewVoice { text: String, settings: AccountSettings },
    TriggerSchedule(i64),
    ReloadScheduler,
    RemoveSchedule(i64),

    LoadDrafts { status: Option<DraftStatus> },
    CreateDraft(CreateDraftRequest),
    DeleteDraft { draft_id: String, status: Option<DraftStatus> },
    OpenDraft(String),
    UpdateSegment {
        draft_id: String,
        index: u32,
        body: UpdateSegmentRequest,
    },
    RegenerateSegment { draft_id: String, segment: Segment },
    FinalizeDraft { draft_id: String, body: FinalizeDraftRequest },

    GeneratePreview(PreviewGenerateRequest),
    /// Follow a past preview picked from the recent list.
    WatchPreview(String),
    FinalizePreview { job_id: String, upload: bool },
    LoadRecentPreviews,

    StartBatch(BatchStartRequest),
    LoadBatchJobs,

    LoadBgm,
    UploadBgm(BgmUpload),

    LoadVideos(Option<VideoStatus>),
    DeleteVideo { video_id: String, status: Option<VideoStatus> },
    ProcessSubtitles(String),

    Studio(StudioAction),
    /// Open a URL or local file with the system handler.
    Open(String),
    /// Open a backend-served media file given a remote URL or a backend path.
    OpenMedia(String),
    /// Open the rendered video of a preview job.
    OpenPreview(String),
}

impl WorkerCmd {
    /// Short name used in logs and error lines.
    fn describe(&self) -> &'static str {
        match self {
            WorkerCmd::CheckHealth => "health check",
            WorkerCmd::StopPolling(_) => "stop polling",
            WorkerCmd::LoadJobs { .. } => "load jobs",
            WorkerCmd::WatchJob(_) => "watch job",
            WorkerCmd::CreateVideo(_) => "create video",
            WorkerCmd::LoadAccounts => "load accounts",
            WorkerCmd::LoadAccountDetail(_) => "load account",
            WorkerCmd::CreateAccount(_) => "create account",
            WorkerCmd::UpdateAccount { .. } => "update account",
            WorkerCmd::DeleteAccount(_) => "delete account",
            WorkerCmd::LoadAccountSettings(_) => "load account settings",
            WorkerCmd::SaveAccountSettings { .. } => "save account settings",
            WorkerCmd::LoadVoices => "load voices",
            WorkerCmd::PreviewVoice { .. } => "voice preview",
            WorkerCmd::TriggerSchedule(_) => "trigger schedule",
            WorkerCmd::ReloadScheduler => "reload scheduler",
            WorkerCmd::RemoveSchedule(_) => "remove schedule",
            WorkerCmd::LoadDrafts { .. } => "load drafts",
            WorkerCmd::CreateDraft(_) => "create draft",
            WorkerCmd::DeleteDraft { .. } => "delete draft",
            WorkerCmd::OpenDraft(_) => "open draft",
            WorkerCmd::UpdateSegment { .. } => "update segment",
            WorkerCmd::RegenerateSegment { .. } => "regenerate segment",
            WorkerCmd::FinalizeDraft { .. } => "finalize draft",
            WorkerCmd::GeneratePreview(_) => "generate preview",
            WorkerCmd::WatchPreview(_) => "watch preview",
            WorkerCmd::FinalizePreview { .. } => "finalize preview",
            WorkerCmd::LoadRecentPreviews => "load previews",
            WorkerCmd::StartBatch(_) => "start batch",
            WorkerCmd::LoadBatchJobs => "load batch jobs",
            WorkerCmd::LoadBgm => "load bgm",
            WorkerCmd::UploadBgm(_) => "upload bgm",
            WorkerCmd::LoadVideos(_) => "load videos",
            WorkerCmd::DeleteVideo { .. } => "delete video",
            WorkerCmd::ProcessSubtitles(_) => "subtitle processing",
            WorkerCmd::Studio(a) => a.title(),
            WorkerCmd::Open(_) | WorkerCmd::OpenMedia(_) | WorkerCmd::OpenPreview(_) => "open",
        }
    }
}

/// Events emitted by the worker for UI updates.
#[derive(Debug)]
pub enum WorkerEvent {
    Health(bool),

    JobsLoaded { page: u32, recent: RecentJobs },
    JobPolled { job_id: String, update: PollUpdate<JobRecord> },
    /// A video job was accepted; the UI switches to the jobs screen.
    JobStarted(String),

    AccountsLoaded {
        accounts: Vec<Account>,
        scheduled: Vec<ScheduledJob>,
    },
    AccountDeleted(i64),
    AccountDetailLoaded(AccountDetail),
    AccountSettingsLoaded { id: i64, settings: AccountSettings },
    VoicesLoaded(Vec<Voice>),

    DraftsLoaded(Vec<DraftProject>),
    DraftOpened(DraftProject),
    /// Full refetch after a segment regeneration.
    DraftReloaded(DraftProject),
    SegmentUpdated { draft_id: String, segment: Segment },

    PreviewStarted(String),
    PreviewPolled { job_id: String, update: PollUpdate<PreviewJob> },
    PreviewsLoaded(Vec<PreviewSummary>),

    BatchStarted(String),
    BatchPolled { job_id: String, update: PollUpdate<BatchJob> },
    BatchJobsLoaded(Vec<BatchJob>),

    BgmLoaded {
        entries: Vec<BgmEntry>,
        moods: Vec<MoodInfo>,
    },
    VideosLoaded(Vec<LibraryVideo>),
    StudioResult { title: String, lines: Vec<String> },

    /// Informational log message.
    Log(String),
    /// User-visible error message.
    Error(String),
}

/// Requests from command tasks to the worker loop, which owns the sessions.
#[derive(Debug)]
enum Control {
    Watch { key: PollKey, replace: bool },
    /// Unfinished rows of a fetched jobs page. Ignored when another page was
    /// requested after this one.
    WatchRows { generation: u64, job_ids: Vec<String> },
}

/// Main worker loop: build the API client, then dispatch commands until the
/// UI side closes the channel.
pub async fn run(
    mut rx: mpsc::Receiver<WorkerCmd>,
    tx: mpsc::Sender<WorkerEvent>,
    cfg: Config,
    prefs: watch::Receiver<Preferences>,
) {
    let api = match ApiClient::new(&cfg) {
        Ok(a) => a,
        Err(e) => {
            tracing::error!("http client init failed: {e}");
            let _ = tx
                .send(WorkerEvent::Error(format!("http client init failed: {e}")))
                .await;
            return;
        }
    };
    tracing::info!("worker started for {}", api.base_url());

    let (mut worker, mut ctl_rx) = Worker::new(api, cfg.polling, prefs, tx);
    loop {
        tokio::select! {
            cmd = rx.recv() => match cmd {
                Some(cmd) => worker.dispatch(cmd),
                None => break,
            },
            Some(ctl) = ctl_rx.recv() => worker.control(ctl),
            Some(done) = worker.tasks.join_next(), if !worker.tasks.is_empty() => {
                if let Err(e) = done {
                    tracing::error!("command task ended abnormally: {e}");
                }
            }
        }
        worker.polls.prune();
    }
    tracing::info!("worker stopped");
}

struct Worker {
    ctx: Ctx,
    polling: PollingCfg,
    polls: PollRegistry<PollKey>,
    /// Bumped on every jobs page request.
    rows_generation: u64,
    tasks: JoinSet<()>,
}

impl Worker {
    fn new(
        api: ApiClient,
        polling: PollingCfg,
        prefs: watch::Receiver<Preferences>,
        tx: mpsc::Sender<WorkerEvent>,
    ) -> (Self, mpsc::UnboundedReceiver<Control>) {
        let (ctl, ctl_rx) = mpsc::unbounded_channel();
        let worker = Self {
            ctx: Ctx {
                api,
                prefs,
                tx,
                ctl,
            },
            polling,
            polls: PollRegistry::new(),
            rows_generation: 0,
            tasks: JoinSet::new(),
        };
        (worker, ctl_rx)
    }

    /// Registry operations run here; everything that talks to the backend
    /// gets its own task.
    fn dispatch(&mut self, cmd: WorkerCmd) {
        let what = cmd.describe();
        tracing::debug!("worker cmd: {what}");
        match cmd {
            WorkerCmd::StopPolling(kind) => self.polls.cancel_where(|k| k.kind() == kind),
            WorkerCmd::WatchJob(job_id) => self.watch(PollKey::Job(job_id), true),
            WorkerCmd::WatchPreview(job_id) => {
                // One preview is on screen at a time.
                self.polls.cancel_where(|k| k.kind() == PollKind::Preview);
                self.watch(PollKey::Preview(job_id), true);
            }
            WorkerCmd::LoadJobs { page } => {
                self.rows_generation += 1;
                self.polls.cancel_where(|k| matches!(k, PollKey::JobRow(_)));
                let generation = self.rows_generation;
                let ctx = self.ctx.clone();
                self.spawn(what, async move { ctx.load_jobs(page, generation).await });
            }
            cmd => {
                let ctx = self.ctx.clone();
                self.spawn(what, async move { ctx.handle(cmd).await });
            }
        }
    }

    fn spawn(
        &mut self,
        what: &'static str,
        work: impl Future<Output = Result<()>> + Send + 'static,
    ) {
        let ctx = self.ctx.clone();
        self.tasks.spawn(async move {
            if let Err(e) = work.await {
                tracing::error!("{what} failed: {e:#}");
                ctx.emit(WorkerEvent::Error(format!("{what} failed: {e}"))).await;
            }
        });
    }

    fn control(&mut self, ctl: Control) {
        match ctl {
            Control::Watch { key, replace } => self.watch(key, replace),
            Control::WatchRows {
                generation,
                job_ids,
            } => {
                if generation != self.rows_generation {
                    tracing::debug!("stale jobs page; {} rows not watched", job_ids.len());
                    return;
                }
                for id in job_ids {
                    if !self.polls.contains(&PollKey::Job(id.clone())) {
                        self.watch(PollKey::JobRow(id), false);
                    }
                }
            }
        }
    }

    /// Start polling `key`. With `replace` an existing session for the same
    /// key is cancelled and restarted; otherwise it is left running.
    fn watch(&mut self, key: PollKey, replace: bool) {
        if !replace && self.polls.contains(&key) {
            return;
        }
        let api = self.ctx.api.clone();
        let tx = self.ctx.tx.clone();
        let polling = &self.polling;
        let session = match &key {
            PollKey::Job(id) | PollKey::JobRow(id) => PollSession::start(
                JobSource(api),
                id.clone(),
                polling.job_interval(),
                tx,
                |id, update| WorkerEvent::JobPolled {
                    job_id: id.to_string(),
                    update,
                },
            ),
            PollKey::Preview(id) => PollSession::start(
                PreviewSource(api),
                id.clone(),
                polling.preview_interval(),
                tx,
                |id, update| WorkerEvent::PreviewPolled {
                    job_id: id.to_string(),
                    update,
                },
            ),
            PollKey::Batch(id) => PollSession::start(
                BatchSource(api),
                id.clone(),
                polling.batch_interval(),
                tx,
                |id, update| WorkerEvent::BatchPolled {
                    job_id: id.to_string(),
                    update,
                },
            ),
        };
        self.polls.insert(key, session);
        tracing::debug!("{} poll sessions running", self.polls.len());
    }
}

/// What a command task needs. Cloning is cheap: the reqwest client and the
/// channels are reference counted.
#[derive(Clone)]
struct Ctx {
    api: ApiClient,
    prefs: watch::Receiver<Preferences>,
    tx: mpsc::Sender<WorkerEvent>,
    ctl: mpsc::UnboundedSender<Control>,
}

impl Ctx {
    async fn emit(&self, ev: WorkerEvent) {
        if self.tx.send(ev).await.is_err() {
            tracing::warn!("ui channel closed; dropping event");
        }
    }

    async fn log(&self, msg: impl Into<String>) {
        let msg = msg.into();
        tracing::info!("{msg}");
        self.emit(WorkerEvent::Log(msg)).await;
    }

    /// Latest preferences published by the settings screen.
    fn prefs(&self) -> Preferences {
        self.prefs.borrow().clone()
    }

    fn control(&self, ctl: Control) {
        if self.ctl.send(ctl).is_err() {
            tracing::warn!("worker loop gone; poll request dropped");
        }
    }

    fn watch(&self, key: PollKey, replace: bool) {
        self.control(Control::Watch { key, replace });
    }

    async fn job_started(&self, job_id: String) {
        self.watch(PollKey::Job(job_id.clone()), true);
        self.log(format!("job {job_id} started")).await;
        self.emit(WorkerEvent::JobStarted(job_id)).await;
    }

    async fn load_jobs(&self, page: u32, generation: u64) -> Result<()> {
        let recent = jobs::recent(&self.api, page, PAGE_SIZE).await?;
        tracing::info!(
            "jobs page {page}: {} rows, {} total",
            recent.jobs.len(),
            recent.total
        );
        let job_ids = recent
            .jobs
            .iter()
            .filter(|j| !j.status.is_terminal())
            .map(|j| j.job_id.clone())
            .collect();
        self.control(Control::WatchRows {
            generation,
            job_ids,
        });
        self.emit(WorkerEvent::JobsLoaded { page, recent }).await;
        Ok(())
    }

    async fn handle(&self, cmd: WorkerCmd) -> Result<()> {
        let api = &self.api;
        match cmd {
            WorkerCmd::CheckHealth => {
                let up = api::health(api).await.is_ok();
                self.emit(WorkerEvent::Health(up)).await;
            }
            inline @ (WorkerCmd::StopPolling(_)
            | WorkerCmd::WatchJob(_)
            | WorkerCmd::WatchPreview(_)
            | WorkerCmd::LoadJobs { .. }) => {
                tracing::warn!("{} belongs to the worker loop", inline.describe());
            }
            WorkerCmd::CreateVideo(body) => {
                let job_id = jobs::create_video(api, &body).await?;
                self.job_started(job_id).await;
            }

            WorkerCmd::LoadAccounts => self.load_accounts().await?,
            WorkerCmd::LoadAccountDetail(id) => {
                let detail = api::accounts::detail(api, id).await?;
                self.emit(WorkerEvent::AccountDetailLoaded(detail)).await;
            }
            WorkerCmd::CreateAccount(body) => {
                let created = api::accounts::create(api, &body).await?;
                self.log(format!("account '{}' created", created.channel_name))
                    .await;
                self.load_accounts().await?;
            }
            WorkerCmd::UpdateAccount { id, body } => {
                api::accounts::update(api, id, &body).await?;
                self.log(format!("account {id} updated")).await;
                self.load_accounts().await?;
            }
            WorkerCmd::DeleteAccount(id) => {
                api::accounts::delete(api, id).await?;
                self.log(format!("account {id} deleted")).await;
                self.emit(WorkerEvent::AccountDeleted(id)).await;
            }
            WorkerCmd::LoadAccountSettings(id) => {
                let settings = match api::accounts::settings(api, id).await {
                    Ok(s) => s,
                    // Accounts created before settings existed have none yet.
                    Err(ApiError::Status { status, .. }) if status == StatusCode::NOT_FOUND => {
                        AccountSettings::default()
                    }
                    Err(e) => return Err(e.into()),
                };
                self.emit(WorkerEvent::AccountSettingsLoaded { id, settings })
                    .await;
            }
            WorkerCmd::SaveAccountSettings { id, settings } => {
                let settings = api::accounts::update_settings(api, id, &settings).await?;
                self.log(format!("settings of account {id} saved")).await;
                self.emit(WorkerEvent::AccountSettingsLoaded { id, settings })
                    .await;
            }
            WorkerCmd::LoadVoices => {
                let voices = media::tts_voices(api).await?;
                self.emit(WorkerEvent::VoicesLoaded(voices)).await;
            }
            WorkerCmd::PreviewVoice { text, settings } => {
                let audio = media::tts_preview(
                    api,
                    &TtsPreviewRequest {
                        text: &text,
                        voice_id: settings.tts_voice_id.as_deref(),
                        stability: settings.tts_stability,
                        similarity_boost: settings.tts_similarity_boost,
                        style: settings.tts_style,
                    },
                )
                .await?;
                let path = std::env::temp_dir().join("autotube_tts_preview.mp3");
                tokio::fs::write(&path, &audio)
                    .await
                    .with_context(|| format!("write {}", path.display()))?;
                self.log(format!("voice preview: {} bytes", audio.len())).await;
                open_external(path.display().to_string()).await?;
            }
            WorkerCmd::TriggerSchedule(account_id) => {
                let msg = scheduler::trigger(api, account_id).await?;
                self.log(msg.unwrap_or_else(|| format!("account {account_id} triggered")))
                    .await;
            }
            WorkerCmd::ReloadScheduler => {
                let msg = scheduler::reload(api).await?;
                self.log(msg.unwrap_or_else(|| "scheduler reloaded".into()))
                    .await;
                self.load_accounts().await?;
            }
            WorkerCmd::RemoveSchedule(account_id) => {
                let job_id = scheduler::account_job_id(account_id);
                let msg = scheduler::remove(api, &job_id).await?;
                self.log(msg.unwrap_or_else(|| format!("{job_id} removed")))
                    .await;
                self.load_accounts().await?;
            }

            WorkerCmd::LoadDrafts { status } => {
                let drafts = api::drafts::list(api, 0, 100, None, status.as_ref()).await?;
                self.emit(WorkerEvent::DraftsLoaded(drafts)).await;
            }
            WorkerCmd::CreateDraft(body) => {
                let project = api::drafts::create(api, &body).await?;
                self.log(format!(
                    "draft {} created with {} segments",
                    project.draft_id,
                    project.segments.len()
                ))
                .await;
                self.emit(WorkerEvent::DraftOpened(project)).await;
            }
            WorkerCmd::DeleteDraft { draft_id, status } => {
                api::drafts::delete(api, &draft_id).await?;
                self.log(format!("draft {draft_id} deleted")).await;
                let drafts = api::drafts::list(api, 0, 100, None, status.as_ref()).await?;
                self.emit(WorkerEvent::DraftsLoaded(drafts)).await;
            }
            WorkerCmd::OpenDraft(draft_id) => {
                let project = api::drafts::get(api, &draft_id).await?;
                self.emit(WorkerEvent::DraftOpened(project)).await;
            }
            WorkerCmd::UpdateSegment {
                draft_id,
                index,
                body,
            } => {
                let segment = api::drafts::update_segment(api, &draft_id, index, &body).await?;
                self.log(format!("segment {index} saved")).await;
                self.emit(WorkerEvent::SegmentUpdated { draft_id, segment })
                    .await;
            }
            WorkerCmd::RegenerateSegment { draft_id, segment } => {
                api::drafts::regenerate_segment(api, &draft_id, &segment).await?;
                let project = api::drafts::get(api, &draft_id).await?;
                self.log(format!("segment {} regenerated", segment.segment_index))
                    .await;
                self.emit(WorkerEvent::DraftReloaded(project)).await;
            }
            WorkerCmd::FinalizeDraft { draft_id, body } => {
                let result = api::drafts::finalize(api, &draft_id, &body).await?;
                tracing::info!(
                    "draft {} finalized: {} ({:?})",
                    result.draft_id,
                    result.status,
                    result.output_video_path
                );
                if let Some(url) = &result.youtube_url {
                    self.log(format!("draft {draft_id} published at {url}")).await;
                }
                self.job_started(result.job_id).await;
            }

            WorkerCmd::GeneratePreview(body) => {
                let job_id = preview::generate(api, &body).await?;
                self.watch(PollKey::Preview(job_id.clone()), true);
                self.log(format!("preview {job_id} started")).await;
                self.emit(WorkerEvent::PreviewStarted(job_id)).await;
            }
            WorkerCmd::FinalizePreview { job_id, upload } => {
                let job_id = preview::finalize(api, &job_id, upload).await?;
                self.watch(PollKey::Preview(job_id.clone()), true);
                self.log(format!("preview {job_id} finalizing")).await;
            }
            WorkerCmd::LoadRecentPreviews => {
                let recent = preview::recent(api, 10).await?;
                self.emit(WorkerEvent::PreviewsLoaded(recent.previews)).await;
            }

            WorkerCmd::StartBatch(body) => {
                let job_id = api::batch::start(api, &body).await?;
                self.watch(PollKey::Batch(job_id.clone()), true);
                self.log(format!("batch {job_id} started")).await;
                self.emit(WorkerEvent::BatchStarted(job_id)).await;
            }
            WorkerCmd::LoadBatchJobs => {
                let jobs = api::batch::jobs(api).await?;
                self.emit(WorkerEvent::BatchJobsLoaded(jobs)).await;
            }

            WorkerCmd::LoadBgm => self.load_bgm().await?,
            WorkerCmd::UploadBgm(upload) => {
                let (bytes, file_name) =
                    read_upload(Path::new(&upload.file_path), &upload.name).await?;
                let msg = media::bgm_upload(api, bytes, file_name, &upload.mood, &upload.name)
                    .await?;
                self.log(msg.unwrap_or_else(|| format!("uploaded {}", upload.name)))
                    .await;
                self.load_bgm().await?;
            }

            WorkerCmd::LoadVideos(status) => {
                let videos = content::videos(api, status.as_ref()).await?;
                self.emit(WorkerEvent::VideosLoaded(videos)).await;
            }
            WorkerCmd::DeleteVideo { video_id, status } => {
                content::delete_video(api, &video_id).await?;
                self.log(format!("video {video_id} deleted")).await;
                let videos = content::videos(api, status.as_ref()).await?;
                self.emit(WorkerEvent::VideosLoaded(videos)).await;
            }
            WorkerCmd::ProcessSubtitles(video_id) => {
                let lang = self.prefs().language;
                let job_id = content::process_hardcoded_subtitles(api, &video_id, &lang).await?;
                self.log(format!("subtitle job {job_id} started for {video_id}"))
                    .await;
            }

            WorkerCmd::Studio(action) => {
                let title = action.title().to_string();
                let lines = self.studio(api, action).await?;
                self.emit(WorkerEvent::StudioResult { title, lines }).await;
            }
            WorkerCmd::Open(target) => open_external(target).await?,
            WorkerCmd::OpenMedia(path) => {
                let url = api
                    .media_url(&path)
                    .context("no media file for this item")?;
                open_external(url).await?;
            }
            WorkerCmd::OpenPreview(job_id) => {
                open_external(preview::video_url(api, &job_id)).await?
            }
        }
        Ok(())
    }

    async fn load_accounts(&self) -> Result<()> {
        let accounts = api::accounts::list(&self.api).await?;
        // The scheduler list is informational; a failure there must not hide
        // the accounts themselves.
        let scheduled = match scheduler::jobs(&self.api).await {
            Ok(j) => j,
            Err(e) => {
                tracing::warn!("scheduler jobs unavailable: {e}");
                vec![]
            }
        };
        self.emit(WorkerEvent::AccountsLoaded {
            accounts,
            scheduled,
        })
        .await;
        Ok(())
    }

    async fn load_bgm(&self) -> Result<()> {
        let entries = media::bgm_list(&self.api).await?;
        let moods = match media::bgm_moods(&self.api).await {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("bgm moods unavailable: {e}");
                vec![]
            }
        };
        self.emit(WorkerEvent::BgmLoaded { entries, moods }).await;
        Ok(())
    }

    async fn studio(&self, api: &ApiClient, action: StudioAction) -> Result<Vec<String>> {
        let prefs = self.prefs();
        let lines = match action {
            StudioAction::AnalyzeTrends => {
                let v = content::analyze_trends(api, &prefs.default_region, prefs.video_format())
                    .await?;
                json_lines(&v)
            }
            StudioAction::GenerateScripts { keywords } => {
                let v = content::generate_scripts(
                    api,
                    &ScriptRequest {
                        keywords: content::split_keywords(&keywords),
                        format: prefs.video_format(),
                        duration: 60,
                        tone: &prefs.default_tone,
                        versions: 1,
                    },
                )
                .await?;
                json_lines(&v)
            }
            StudioAction::SearchTrending => {
                let found = content::search_trending(api, &prefs.default_region, 20).await?;
                found_lines(&found)
            }
            StudioAction::SearchKeywords { keywords } => {
                let found =
                    content::search_keywords(api, &keywords, &prefs.default_region, 20).await?;
                found_lines(&found)
            }
            StudioAction::Download { url } => json_lines(&content::download(api, &url).await?),
            StudioAction::Upload {
                video_path,
                keywords,
                script,
                privacy,
            } => {
                let v = content::upload(api, &video_path, &keywords, script.as_deref(), &privacy)
                    .await?;
                json_lines(&v)
            }
            StudioAction::TtsTest { text } => {
                let v = media::tts_test(
                    api,
                    &TtsTestRequest {
                        text: &text,
                        language: &prefs.language,
                        speed: prefs.tts_speed,
                        pitch: prefs.tts_pitch,
                    },
                )
                .await?;
                json_lines(&v)
            }
            StudioAction::Produce { script } => {
                let v = jobs::produce(api, &script, prefs.video_format(), &prefs.default_tone)
                    .await?;
                json_lines(&v)
            }
        };
        Ok(lines)
    }
}

/// Bytes and file name of a local file picked for upload.
async fn read_upload(path: &Path, name: &str) -> Result<(Vec<u8>, String)> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{name}.mp3"));
    Ok((bytes, file_name))
}

/// Open a URL or file with the desktop's default handler.
async fn open_external(target: String) -> Result<()> {
    tracing::info!("open {target}");
    tokio::task::spawn_blocking(move || webbrowser::open(&target))
        .await
        .context("opener task failed")?
        .context("no handler could open it")?;
    Ok(())
}

const MAX_RESULT_LINES: usize = 80;

/// Pretty JSON, cut to what fits the result panel.
fn json_lines(v: &serde_json::Value) -> Vec<String> {
    let text = serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string());
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
    if lines.len() > MAX_RESULT_LINES {
        let hidden = lines.len() - MAX_RESULT_LINES;
        lines.truncate(MAX_RESULT_LINES);
        lines.push(format!("... {hidden} more lines"));
    }
    lines
}

fn found_lines(found: &[api::types::FoundVideo]) -> Vec<String> {
    if found.is_empty() {
        return vec!["no videos found".into()];
    }
    found
        .iter()
        .map(|v| {
            let views = v
                .view_count
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".into());
            format!("{} | {views} views | {}", v.title, v.url)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn offline_worker() -> (Worker, mpsc::Receiver<WorkerEvent>) {
        let api = ApiClient::with_client(reqwest::Client::new(), "http://127.0.0.1:9");
        let (tx, rx) = mpsc::channel(64);
        let (_prefs_tx, prefs) = watch::channel(Preferences::default());
        let (worker, _ctl_rx) = Worker::new(api, Config::default().polling, prefs, tx);
        (worker, rx)
    }

    /// Answers `/api/health` at once and leaves every other request hanging.
    async fn stalling_backend() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut sock, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let n = sock.read(&mut buf).await.unwrap_or(0);
                    if buf[..n].starts_with(b"GET /api/health") {
                        let _ = sock
                            .write_all(
                                b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\n\
                                  content-length: 2\r\nconnection: close\r\n\r\n{}",
                            )
                            .await;
                    } else {
                        tokio::time::sleep(Duration::from_secs(3600)).await;
                    }
                });
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn slow_call_does_not_hold_up_health_check() {
        let mut cfg = Config::default();
        cfg.api.base_url = stalling_backend().await;
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (ev_tx, mut ev_rx) = mpsc::channel(8);
        let (_prefs_tx, prefs) = watch::channel(Preferences::default());
        tokio::spawn(run(cmd_rx, ev_tx, cfg, prefs));

        cmd_tx
            .send(WorkerCmd::Studio(StudioAction::AnalyzeTrends))
            .await
            .unwrap();
        cmd_tx.send(WorkerCmd::CheckHealth).await.unwrap();

        let ev = tokio::time::timeout(Duration::from_secs(5), ev_rx.recv())
            .await
            .expect("health answer waited behind trend analysis");
        assert!(matches!(ev, Some(WorkerEvent::Health(true))), "{ev:?}");
    }

    #[tokio::test]
    async fn page_change_stops_row_sessions_of_the_old_page() {
        let (mut worker, _rx) = offline_worker();
        worker.rows_generation = 1;
        worker.control(Control::WatchRows {
            generation: 1,
            job_ids: vec!["p1-0".into(), "p1-1".into()],
        });
        worker.watch(PollKey::Job("mine".into()), true);
        assert!(worker.polls.contains(&PollKey::JobRow("p1-0".into())));

        worker.dispatch(WorkerCmd::LoadJobs { page: 2 });
        assert_eq!(worker.rows_generation, 2);
        assert!(!worker.polls.contains(&PollKey::JobRow("p1-0".into())));
        assert!(!worker.polls.contains(&PollKey::JobRow("p1-1".into())));
        // Jobs the user started keep their session across pages.
        assert!(worker.polls.contains(&PollKey::Job("mine".into())));
    }

    #[tokio::test]
    async fn rows_of_a_superseded_page_are_not_watched() {
        let (mut worker, _rx) = offline_worker();
        worker.rows_generation = 3;
        worker.control(Control::WatchRows {
            generation: 2,
            job_ids: vec!["late".into()],
        });
        assert_eq!(worker.polls.len(), 0);

        worker.watch(PollKey::Job("both".into()), true);
        worker.control(Control::WatchRows {
            generation: 3,
            job_ids: vec!["both".into(), "row".into()],
        });
        assert!(!worker.polls.contains(&PollKey::JobRow("both".into())));
        assert!(worker.polls.contains(&PollKey::JobRow("row".into())));
        assert_eq!(worker.polls.len(), 2);
    }

    #[tokio::test]
    async fn picking_a_preview_replaces_the_previous_one() {
        let (mut worker, _rx) = offline_worker();
        worker.dispatch(WorkerCmd::WatchPreview("old".into()));
        worker.dispatch(WorkerCmd::WatchPreview("new".into()));
        assert!(!worker.polls.contains(&PollKey::Preview("old".into())));
        assert!(worker.polls.contains(&PollKey::Preview("new".into())));
    }

    #[tokio::test]
    async fn unreadable_upload_names_the_local_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.mp3");
        let err = read_upload(&missing, "calm").await.unwrap_err();
        assert!(format!("{err:#}").contains("missing.mp3"), "{err:#}");

        let file = dir.path().join("rain.wav");
        std::fs::write(&file, b"RIFF").unwrap();
        let (bytes, name) = read_upload(&file, "calm").await.unwrap();
        assert_eq!(bytes, b"RIFF");
        assert_eq!(name, "rain.wav");
    }

    #[test]
    fn poll_keys_map_to_their_screen() {
        assert_eq!(PollKey::Job("j".into()).kind(), PollKind::Job);
        assert_eq!(PollKey::JobRow("r".into()).kind(), PollKind::Job);
        assert_eq!(PollKey::Preview("p".into()).kind(), PollKind::Preview);
        assert_eq!(PollKey::Batch("b".into()).kind(), PollKind::Batch);
    }

    #[test]
    fn long_json_results_are_truncated() {
        let v = serde_json::Value::Array((0..200).map(serde_json::Value::from).collect());
        let lines = json_lines(&v);
        assert_eq!(lines.len(), MAX_RESULT_LINES + 1);
        assert!(lines.last().unwrap().starts_with("... "));
    }

    #[test]
    fn search_results_show_title_views_and_url() {
        let found = vec![api::types::FoundVideo {
            video_id: "abc".into(),
            title: "Rust in 100s".into(),
            url: "https://youtu.be/abc".into(),
            channel_name: None,
            view_count: Some(1200),
            duration: None,
        }];
        assert_eq!(
            found_lines(&found),
            vec!["Rust in 100s | 1200 views | https://youtu.be/abc"]
        );
        assert_eq!(found_lines(&[]), vec!["no videos found"]);
    }
}
