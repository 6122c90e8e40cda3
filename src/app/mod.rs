//! TUIのイベントループ、入力処理、状態管理。

mod handlers;
mod render;

use anyhow::{Result, anyhow};
use crossterm::event::{self, Event};
use std::{
    collections::HashSet,
    path::PathBuf,
    time::{Duration, Instant},
};
use tokio::sync::mpsc;

use crate::{
    api::{
        media,
        scheduler::ScheduledJob,
        types::{
            Account, AccountDetail, BatchJob, BgmEntry, DraftProject, JobRecord, LibraryVideo,
            MoodInfo, PreviewJob, PreviewSummary, Voice,
        },
    },
    config::Config,
    draft_editor::DraftEditor,
    events::{Screen, UiState},
    forms::{
        AccountForm, BatchForm, BgmUploadForm, FieldForm, PrefsForm, PreviewForm, SettingsPanel,
        StudioForm,
    },
    input::InputBoxState,
    pager::{PAGE_SIZE, Pager},
    poller::PollUpdate,
    prefs::PrefsStore,
    shortcuts::Shortcuts,
    status::{DraftStatus, Lifecycle, VideoStatus},
    ui::Tui,
    wizard::CreateWizard,
    worker::{self, PollKind, WorkerCmd, WorkerEvent},
};

use handlers::{handle_key, is_ctrl_c};
use render::draw;

/// バックエンド疎通確認の間隔。
const HEALTH_EVERY: Duration = Duration::from_secs(15);

/// 入力処理と描画で共有するアプリ状態。
pub struct App {
    /// メモリ上の現在設定。
    pub cfg: Config,
    /// ローカル設定（保存と購読者への通知を担う）。
    pub prefs: PrefsStore,
    /// 選択位置やステータスなどUI固有の状態。
    pub ui: UiState,
    /// ショートカットキー設定。
    pub shortcuts: Shortcuts,
    /// Workerへのコマンド送信チャネル。
    pub worker_tx: mpsc::Sender<WorkerCmd>,
    /// Workerからのイベント受信チャネル。
    pub worker_rx: mpsc::Receiver<WorkerEvent>,
    /// 入力ボックスの状態（入力中はSome）。
    pub input_box: Option<InputBoxState>,

    // ジョブ
    pub jobs: Vec<JobRecord>,
    pub jobs_total: u64,
    pub pager: Pager,
    /// このクライアントが開始または指定したジョブ。一覧に無ければ1ページ目へ差し込む。
    pub watched_jobs: HashSet<String>,

    // アカウント
    pub accounts: Vec<Account>,
    pub scheduled: Vec<ScheduledJob>,
    pub account_detail: Option<AccountDetail>,
    pub account_form: AccountForm,
    pub settings_panel: Option<SettingsPanel>,
    pub voices: Vec<Voice>,

    // ドラフト
    pub drafts: Vec<DraftProject>,
    pub draft_filter: Option<DraftStatus>,
    pub editor: Option<DraftEditor>,

    /// 動画作成ウィザード。
    pub wizard: CreateWizard,

    // プレビュー
    pub preview_form: PreviewForm,
    pub preview: Option<PreviewJob>,
    pub previews: Vec<PreviewSummary>,

    // バッチ
    pub batch_form: BatchForm,
    pub batch: Option<BatchJob>,
    pub batch_jobs: Vec<BatchJob>,

    // BGM（ムード順に並べ替え済み）
    pub bgm: Vec<BgmEntry>,
    pub moods: Vec<MoodInfo>,
    pub bgm_form: BgmUploadForm,
    /// BGM画面でアップロードフォームを編集中か。
    pub bgm_upload: bool,

    // ダウンロード済み動画
    pub videos: Vec<LibraryVideo>,
    pub video_filter: Option<VideoStatus>,

    // スタジオ
    pub studio_form: StudioForm,
    pub studio_action: usize,
    pub studio_result: Option<(String, Vec<String>)>,

    /// 設定画面の編集バッファ。
    pub prefs_form: PrefsForm,
}

impl App {
    pub fn new(
        cfg: Config,
        prefs: PrefsStore,
        shortcuts: Shortcuts,
        worker_tx: mpsc::Sender<WorkerCmd>,
        worker_rx: mpsc::Receiver<WorkerEvent>,
    ) -> Self {
        let p = prefs.current();
        Self {
            cfg,
            ui: UiState::new(Screen::Jobs),
            shortcuts,
            worker_tx,
            worker_rx,
            input_box: None,
            jobs: vec![],
            jobs_total: 0,
            pager: Pager::default(),
            watched_jobs: HashSet::new(),
            accounts: vec![],
            scheduled: vec![],
            account_detail: None,
            account_form: AccountForm::new(),
            settings_panel: None,
            voices: vec![],
            drafts: vec![],
            draft_filter: None,
            editor: None,
            wizard: CreateWizard::new(&p),
            preview_form: PreviewForm::from_prefs(&p),
            preview: None,
            previews: vec![],
            batch_form: BatchForm::default(),
            batch: None,
            batch_jobs: vec![],
            bgm: vec![],
            moods: vec![],
            bgm_form: BgmUploadForm::default(),
            bgm_upload: false,
            videos: vec![],
            video_filter: None,
            studio_form: StudioForm::default(),
            studio_action: 0,
            studio_result: None,
            prefs_form: PrefsForm { prefs: p },
            prefs,
        }
    }

    /// 現在の画面で編集中のフォーム。
    pub fn form(&self) -> Option<&dyn FieldForm> {
        match self.ui.screen {
            Screen::AccountForm => Some(&self.account_form),
            Screen::Preview => Some(&self.preview_form),
            Screen::Batch => Some(&self.batch_form),
            Screen::Bgm if self.bgm_upload => Some(&self.bgm_form),
            Screen::Studio => Some(&self.studio_form),
            Screen::Settings => Some(&self.prefs_form),
            _ => None,
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut dyn FieldForm> {
        match self.ui.screen {
            Screen::AccountForm => Some(&mut self.account_form),
            Screen::Preview => Some(&mut self.preview_form),
            Screen::Batch => Some(&mut self.batch_form),
            Screen::Bgm if self.bgm_upload => Some(&mut self.bgm_form),
            Screen::Studio => Some(&mut self.studio_form),
            Screen::Settings => Some(&mut self.prefs_form),
            _ => None,
        }
    }

    /// ジョブの監視を始める。
    pub async fn watch_job(&mut self, job_id: String) -> Result<()> {
        self.watched_jobs.insert(job_id.clone());
        self.send(WorkerCmd::WatchJob(job_id)).await
    }

    /// Workerへコマンドを送る。
    pub async fn send(&self, cmd: WorkerCmd) -> Result<()> {
        self.worker_tx
            .send(cmd)
            .await
            .map_err(|_| anyhow!("worker is not running"))
    }
}

/// ユーザーが終了するまでメインTUIループを回す。
pub async fn run_app(terminal: &mut Tui, cfg: Config) -> Result<()> {
    // ショートカット設定とローカル設定を読み込む（無ければデフォルト）。
    let shortcuts = Shortcuts::load_or_default(PathBuf::from("shortcut.toml"))?;
    let prefs = PrefsStore::open("prefs.toml")?;

    // Worker通信用のコマンド/イベントチャネルを作る。
    let (tx_cmd, rx_cmd) = mpsc::channel::<WorkerCmd>(64);
    let (tx_ev, rx_ev) = mpsc::channel::<WorkerEvent>(256);

    // 設定スナップショットと設定の購読口を渡してWorkerを起動する。
    tokio::spawn(worker::run(rx_cmd, tx_ev, cfg.clone(), prefs.subscribe()));

    let mut app = App::new(cfg, prefs, shortcuts, tx_cmd, rx_ev);
    app.send(WorkerCmd::CheckHealth).await?;
    load_screen(&mut app).await?;
    let mut last_health = Instant::now();

    loop {
        terminal.draw(|f| draw(f, &app))?;

        // 入力処理の前にWorkerイベントを消化する。
        while let Ok(ev) = app.worker_rx.try_recv() {
            handle_worker_event(&mut app, ev).await?;
        }

        if last_health.elapsed() >= HEALTH_EVERY {
            app.send(WorkerCmd::CheckHealth).await?;
            last_health = Instant::now();
        }

        // UIの応答性確保のため短いタイムアウトで入力をポーリングする。
        if event::poll(Duration::from_millis(50))?
            && let Event::Key(k) = event::read()?
        {
            // どの画面でもCtrl+Cで終了できるようにする。
            if is_ctrl_c(&k) {
                break;
            }
            if handle_key(&mut app, k).await? {
                break;
            }
        }
    }
    Ok(())
}

/// 画面が所有するポーリングの種類。
fn poll_kind(screen: Screen) -> Option<PollKind> {
    match screen {
        Screen::Jobs => Some(PollKind::Job),
        Screen::Preview => Some(PollKind::Preview),
        Screen::Batch => Some(PollKind::Batch),
        _ => None,
    }
}

/// 画面を切り替える。離れる画面のポーリングを止め、新しい画面のデータを読み込む。
pub async fn navigate(app: &mut App, screen: Screen) -> Result<()> {
    if app.ui.screen == screen {
        return Ok(());
    }
    switch_screen(app, screen).await?;
    load_screen(app).await
}

/// データを読み込まずに画面だけ切り替える。
async fn switch_screen(app: &mut App, screen: Screen) -> Result<()> {
    let from = app.ui.screen;
    if let Some(kind) = poll_kind(from) {
        app.send(WorkerCmd::StopPolling(kind)).await?;
    }
    tracing::debug!("screen {:?} -> {:?}", from, screen);
    app.ui.screen = screen;
    app.ui.selected = 0;
    app.ui.field_idx = 0;
    app.ui.error = None;
    app.ui.status = screen.title().into();
    app.bgm_upload = false;
    Ok(())
}

/// 現在の画面が表示するデータを要求する。
pub async fn load_screen(app: &mut App) -> Result<()> {
    let cmd = match app.ui.screen {
        Screen::Jobs => Some(WorkerCmd::LoadJobs {
            page: app.pager.page,
        }),
        Screen::Accounts => Some(WorkerCmd::LoadAccounts),
        Screen::AccountSettings => app
            .settings_panel
            .as_ref()
            .map(|p| WorkerCmd::LoadAccountSettings(p.account_id)),
        Screen::Drafts => Some(WorkerCmd::LoadDrafts {
            status: app.draft_filter.clone(),
        }),
        Screen::DraftEditor => app
            .editor
            .as_ref()
            .map(|e| WorkerCmd::OpenDraft(e.draft_id().to_string())),
        Screen::Preview => Some(WorkerCmd::LoadRecentPreviews),
        Screen::Batch => Some(WorkerCmd::LoadBatchJobs),
        Screen::Bgm => Some(WorkerCmd::LoadBgm),
        Screen::Videos => Some(WorkerCmd::LoadVideos(app.video_filter.clone())),
        Screen::Settings => {
            // 保存済みの値で編集バッファを作り直す。
            app.prefs_form = PrefsForm {
                prefs: app.prefs.current(),
            };
            None
        }
        Screen::AccountForm | Screen::CreateVideo | Screen::Studio => None,
    };
    if let Some(cmd) = cmd {
        app.send(cmd).await?;
    }
    Ok(())
}

/// WorkerイベントをUI状態へ反映する。
pub async fn handle_worker_event(app: &mut App, ev: WorkerEvent) -> Result<()> {
    match ev {
        WorkerEvent::Health(up) => {
            if app.ui.backend_up != Some(up) {
                tracing::info!("backend reachable: {up}");
            }
            app.ui.backend_up = Some(up);
        }

        WorkerEvent::JobsLoaded { page, recent } => {
            app.pager.update(page, recent.total_pages);
            app.jobs_total = recent.total;
            app.jobs = recent.jobs;
            app.ui.selected = app.ui.selected.min(app.jobs.len().saturating_sub(1));
            app.ui.status = format!(
                "{} jobs, page {}/{}",
                app.jobs_total,
                app.pager.page,
                app.pager.total_pages.max(1)
            );
        }
        WorkerEvent::JobPolled { job_id, update } => match update {
            PollUpdate::Snapshot(job) => {
                let own = if job.status.is_terminal() {
                    report_finished_job(app, &job);
                    app.watched_jobs.remove(&job_id)
                } else {
                    app.watched_jobs.contains(&job_id)
                };
                if let Some(row) = app.jobs.iter_mut().find(|j| j.job_id == job_id) {
                    *row = job;
                } else if own && app.pager.page == 1 {
                    // 自分で始めたジョブがまだ一覧に無ければ先頭に差し込む。
                    app.jobs.insert(0, job);
                    app.jobs.truncate(PAGE_SIZE as usize);
                }
            }
            PollUpdate::Failed(msg) => {
                app.ui.error = Some(format!("status of {job_id} unavailable: {msg}"));
            }
        },
        WorkerEvent::JobStarted(job_id) => {
            app.watched_jobs.insert(job_id.clone());
            app.ui.push_log(format!("watching job {job_id}"));
            app.pager.page = 1;
            if app.ui.screen == Screen::Jobs {
                load_screen(app).await?;
            } else {
                navigate(app, Screen::Jobs).await?;
            }
            app.ui.status = format!("Job {job_id} started");
        }

        WorkerEvent::AccountsLoaded {
            accounts,
            scheduled,
        } => {
            app.accounts = accounts;
            app.scheduled = scheduled;
            app.ui.selected = app.ui.selected.min(app.accounts.len().saturating_sub(1));
            app.ui.status = format!("{} accounts", app.accounts.len());
        }
        WorkerEvent::AccountDeleted(id) => {
            // 再取得せずにローカルの一覧から取り除く。
            app.accounts.retain(|a| a.id != id);
            if app.account_detail.as_ref().is_some_and(|d| d.account.id == id) {
                app.account_detail = None;
            }
            app.ui.selected = app.ui.selected.min(app.accounts.len().saturating_sub(1));
            app.ui.status = format!("Account {id} deleted");
        }
        WorkerEvent::AccountDetailLoaded(detail) => app.account_detail = Some(detail),
        WorkerEvent::AccountSettingsLoaded { id, settings } => {
            match app.settings_panel.as_mut().filter(|p| p.account_id == id) {
                Some(panel) => panel.settings = settings,
                None => {
                    let mut panel = SettingsPanel::new(id, settings);
                    panel.voices = app.voices.clone();
                    app.settings_panel = Some(panel);
                }
            }
        }
        WorkerEvent::VoicesLoaded(voices) => {
            if let Some(panel) = &mut app.settings_panel {
                panel.voices = voices.clone();
            }
            app.voices = voices;
        }

        WorkerEvent::DraftsLoaded(drafts) => {
            app.drafts = drafts;
            app.ui.selected = app.ui.selected.min(app.drafts.len().saturating_sub(1));
            app.ui.status = format!("{} drafts", app.drafts.len());
        }
        WorkerEvent::DraftOpened(project) => {
            let upload = app.cfg.finalize.upload;
            match app
                .editor
                .as_mut()
                .filter(|e| e.draft_id() == project.draft_id)
            {
                Some(ed) => ed.replace_project(project),
                None => app.editor = Some(DraftEditor::new(project, upload)),
            }
            // 取得済みなので再読み込みはしない。
            if app.ui.screen != Screen::DraftEditor {
                switch_screen(app, Screen::DraftEditor).await?;
            }
        }
        WorkerEvent::DraftReloaded(project) => {
            if let Some(ed) = app
                .editor
                .as_mut()
                .filter(|e| e.draft_id() == project.draft_id)
            {
                ed.replace_project(project);
                app.ui.status = "Draft reloaded".into();
            }
        }
        WorkerEvent::SegmentUpdated { draft_id, segment } => {
            let index = segment.segment_index;
            match app
                .editor
                .as_mut()
                .filter(|e| e.draft_id() == draft_id)
                .map(|ed| ed.apply_segment(segment))
            {
                Some(true) => {
                    app.ui.status = format!("Segment {index} saved");
                }
                _ => tracing::debug!("segment {index} of {draft_id} no longer open"),
            }
        }

        WorkerEvent::PreviewStarted(job_id) => {
            app.preview = None;
            app.ui.status = format!("Preview {job_id} generating");
        }
        WorkerEvent::PreviewPolled { job_id, update } => match update {
            PollUpdate::Snapshot(p) => {
                if p.status.is_terminal() {
                    if p.status.is_failure() {
                        app.ui.error = Some(format!(
                            "preview {job_id} failed: {}",
                            p.error.as_deref().unwrap_or("no details")
                        ));
                    } else {
                        app.ui.status = format!("Preview {job_id} {}", p.status.label());
                    }
                    app.send(WorkerCmd::LoadRecentPreviews).await?;
                }
                app.preview = Some(p);
            }
            PollUpdate::Failed(msg) => {
                app.ui.error = Some(format!("status of {job_id} unavailable: {msg}"));
            }
        },
        WorkerEvent::PreviewsLoaded(previews) => {
            app.previews = previews;
            app.ui.selected = app.ui.selected.min(app.previews.len().saturating_sub(1));
        }

        WorkerEvent::BatchStarted(job_id) => {
            app.batch = None;
            app.ui.status = format!("Batch {job_id} started");
        }
        WorkerEvent::BatchPolled { job_id, update } => match update {
            PollUpdate::Snapshot(b) => {
                if b.status.is_terminal() {
                    if b.status.is_failure() {
                        app.ui.error = Some(format!(
                            "batch {job_id} failed: {}",
                            b.error.as_deref().unwrap_or("no details")
                        ));
                    } else {
                        app.ui.status = format!("Batch {job_id} completed");
                    }
                    app.send(WorkerCmd::LoadBatchJobs).await?;
                }
                app.batch = Some(b);
            }
            PollUpdate::Failed(msg) => {
                app.ui.error = Some(format!("status of {job_id} unavailable: {msg}"));
            }
        },
        WorkerEvent::BatchJobsLoaded(jobs) => app.batch_jobs = jobs,

        WorkerEvent::BgmLoaded { entries, moods } => {
            app.bgm = media::group_by_mood(&entries)
                .into_values()
                .flatten()
                .cloned()
                .collect();
            app.moods = moods;
            app.ui.selected = app.ui.selected.min(app.bgm.len().saturating_sub(1));
            app.ui.status = format!("{} BGM tracks", app.bgm.len());
        }
        WorkerEvent::VideosLoaded(videos) => {
            app.videos = videos;
            app.ui.selected = app.ui.selected.min(app.videos.len().saturating_sub(1));
            app.ui.status = format!("{} videos", app.videos.len());
        }
        WorkerEvent::StudioResult { title, lines } => {
            app.ui.status = format!("{title} done");
            app.studio_result = Some((title, lines));
        }

        WorkerEvent::Log(s) => {
            app.ui.status = s.clone();
            app.ui.push_log(s);
        }
        WorkerEvent::Error(s) => {
            app.ui.push_log(format!("error: {s}"));
            app.ui.error = Some(s);
        }
    }
    Ok(())
}

/// 完了したジョブの最終結果（エラー・出力先・URL）を表示する。
fn report_finished_job(app: &mut App, job: &JobRecord) {
    if job.status.is_failure() {
        let msg = format!(
            "job {} failed: {}",
            job.job_id,
            job.error_message.as_deref().unwrap_or("no details")
        );
        app.ui.push_log(msg.clone());
        app.ui.error = Some(msg);
        return;
    }
    let result = job
        .youtube_url
        .as_deref()
        .or(job.output_video_path.as_deref())
        .unwrap_or("no output reported");
    let msg = format!("job {} {}: {result}", job.job_id, job.status.label());
    app.ui.push_log(msg.clone());
    app.ui.status = msg;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// テスト用のApp。Workerの代わりに受信側を返す。
    pub fn app() -> (App, mpsc::Receiver<WorkerCmd>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let prefs = PrefsStore::open(dir.path().join("prefs.toml")).unwrap();
        let (tx, rx) = mpsc::channel(32);
        let (_ev_tx, ev_rx) = mpsc::channel(32);
        let app = App::new(Config::default(), prefs, Shortcuts::default(), tx, ev_rx);
        (app, rx, dir)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::app;
    use super::*;
    use crate::{
        api::types::{ChannelType, RecentJobs, Segment},
        status::JobStatus,
    };

    fn account(id: i64, name: &str) -> Account {
        Account {
            id,
            channel_name: name.into(),
            channel_type: ChannelType::Info,
            default_prompt_style: String::new(),
            upload_schedule: None,
            is_active: true,
            channel_id: None,
            created_at: String::new(),
        }
    }

    fn job(id: &str, status: &str) -> JobRecord {
        JobRecord {
            job_id: id.into(),
            status: JobStatus::from(status),
            topic: Some("topic".into()),
            format: None,
            duration: None,
            account_id: None,
            output_video_path: None,
            youtube_url: None,
            error_message: None,
            created_at: None,
            completed_at: None,
        }
    }

    #[tokio::test]
    async fn deleted_account_is_removed_without_refetch() {
        let (mut app, mut rx, _dir) = app();
        app.accounts = vec![account(1, "a"), account(2, "b")];
        app.ui.screen = Screen::Accounts;
        app.ui.selected = 1;

        handle_worker_event(&mut app, WorkerEvent::AccountDeleted(2))
            .await
            .unwrap();

        assert_eq!(app.accounts, vec![account(1, "a")]);
        assert_eq!(app.ui.selected, 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn leaving_a_polling_screen_stops_its_sessions() {
        let (mut app, mut rx, _dir) = app();
        navigate(&mut app, Screen::Accounts).await.unwrap();
        assert!(matches!(
            rx.try_recv(),
            Ok(WorkerCmd::StopPolling(PollKind::Job))
        ));
        assert!(matches!(rx.try_recv(), Ok(WorkerCmd::LoadAccounts)));

        navigate(&mut app, Screen::Drafts).await.unwrap();
        assert!(matches!(rx.try_recv(), Ok(WorkerCmd::LoadDrafts { status: None })));
    }

    #[tokio::test]
    async fn polled_job_updates_its_row_and_reports_the_result() {
        let (mut app, _rx, _dir) = app();
        app.jobs = vec![job("a", "editing"), job("b", "planning")];

        let mut done = job("b", "completed");
        done.youtube_url = Some("https://youtu.be/xyz".into());
        handle_worker_event(
            &mut app,
            WorkerEvent::JobPolled {
                job_id: "b".into(),
                update: PollUpdate::Snapshot(done.clone()),
            },
        )
        .await
        .unwrap();

        assert_eq!(app.jobs[1], done);
        assert_eq!(app.jobs[0].status, JobStatus::Editing);
        assert!(app.ui.status.contains("https://youtu.be/xyz"));

        let mut failed = job("a", "failed");
        failed.error_message = Some("render crashed".into());
        handle_worker_event(
            &mut app,
            WorkerEvent::JobPolled {
                job_id: "a".into(),
                update: PollUpdate::Snapshot(failed),
            },
        )
        .await
        .unwrap();
        assert!(app.ui.error.as_deref().unwrap().contains("render crashed"));
    }

    fn first_page() -> WorkerEvent {
        WorkerEvent::JobsLoaded {
            page: 1,
            recent: RecentJobs {
                jobs: (0..10).map(|i| job(&format!("p1-{i}"), "editing")).collect(),
                total: 25,
                total_pages: 3,
            },
        }
    }

    fn polled(id: &str, status: &str) -> WorkerEvent {
        WorkerEvent::JobPolled {
            job_id: id.into(),
            update: PollUpdate::Snapshot(job(id, status)),
        }
    }

    #[tokio::test]
    async fn rows_polled_from_another_page_stay_off_page_one() {
        let (mut app, _rx, _dir) = app();
        handle_worker_event(&mut app, first_page()).await.unwrap();
        handle_worker_event(&mut app, polled("p2-older", "editing"))
            .await
            .unwrap();

        assert_eq!(app.jobs.len(), 10);
        assert_eq!(app.jobs[0].job_id, "p1-0");
        assert_eq!(app.jobs[9].job_id, "p1-9");
    }

    #[tokio::test]
    async fn own_job_missing_from_page_one_is_put_on_top() {
        let (mut app, mut rx, _dir) = app();
        handle_worker_event(&mut app, first_page()).await.unwrap();
        app.watch_job("mine".into()).await.unwrap();
        assert!(matches!(rx.try_recv(), Ok(WorkerCmd::WatchJob(id)) if id == "mine"));

        handle_worker_event(&mut app, polled("mine", "planning"))
            .await
            .unwrap();
        assert_eq!(app.jobs.len(), 10);
        assert_eq!(app.jobs[0].job_id, "mine");
        assert_eq!(app.jobs[1].job_id, "p1-0");

        // 完了を報告した後は監視対象から外れる。
        handle_worker_event(&mut app, polled("mine", "completed"))
            .await
            .unwrap();
        assert_eq!(app.jobs[0].status, JobStatus::Completed);
        assert!(!app.watched_jobs.contains("mine"));
    }

    #[tokio::test]
    async fn job_started_switches_to_the_first_jobs_page() {
        let (mut app, mut rx, _dir) = app();
        app.ui.screen = Screen::CreateVideo;
        app.pager.update(3, 5);

        handle_worker_event(&mut app, WorkerEvent::JobStarted("j9".into()))
            .await
            .unwrap();

        assert_eq!(app.ui.screen, Screen::Jobs);
        assert!(app.watched_jobs.contains("j9"));
        assert!(matches!(rx.try_recv(), Ok(WorkerCmd::LoadJobs { page: 1 })));
    }

    #[tokio::test]
    async fn confirmed_segment_lands_in_the_open_editor() {
        let (mut app, _rx, _dir) = app();
        let seg = |i: u32, text: &str| Segment {
            segment_index: i,
            text: text.into(),
            keyword: None,
            image_search_query: None,
            duration: None,
            video_url: None,
            video_local_path: None,
            video_provider: None,
            tts_local_path: None,
            tts_duration: None,
        };
        let project = DraftProject {
            draft_id: "d1".into(),
            topic: String::new(),
            title: String::new(),
            description: None,
            tags: vec![],
            format: "shorts".into(),
            target_duration: 30,
            status: DraftStatus::Editing,
            segments: vec![seg(0, "a"), seg(1, "b")],
            created_at: String::new(),
            updated_at: String::new(),
        };
        app.editor = Some(DraftEditor::new(project, false));

        handle_worker_event(
            &mut app,
            WorkerEvent::SegmentUpdated {
                draft_id: "d1".into(),
                segment: seg(1, "B!"),
            },
        )
        .await
        .unwrap();

        let ed = app.editor.as_ref().unwrap();
        assert_eq!(ed.project.segments[0].text, "a");
        assert_eq!(ed.project.segments[1].text, "B!");
    }
}
