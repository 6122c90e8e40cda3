//! キー入力ハンドラー関数。

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::{
    api::types::{CreateDraftRequest, PreviewJob},
    events::Screen,
    forms::{FormError, StudioForm},
    input::{InputBoxState, InputCallbackId, PendingAction},
    shortcuts::matches_shortcut as hit,
    status::{DraftStatus, PreviewStatus, VideoStatus},
    wizard::{CreateWizard, WizardStep},
    worker::{StudioAction, WorkerCmd},
};

use super::{App, load_screen, navigate, switch_screen};

/// スタジオ画面で選べる操作（`studio_action` の順）。
pub const STUDIO_ACTION_NAMES: [&str; 8] = [
    "Trend analysis",
    "Scripts",
    "Trending videos",
    "Keyword search",
    "Download",
    "Upload",
    "TTS test",
    "Produce",
];

/// キー入力を1件処理し、終了すべきならtrueを返す。
pub async fn handle_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    // 入力ボックスが開いていれば最優先で処理する。
    if app.input_box.is_some() {
        return handle_input_box_key(app, k).await;
    }

    let g = &app.shortcuts.global;
    if hit(&k, &g.quit) {
        return Ok(true);
    } else if hit(&k, &g.next_screen) {
        let next = app.ui.screen.nav_step(1);
        navigate(app, next).await?;
        return Ok(false);
    } else if hit(&k, &g.prev_screen) {
        let prev = app.ui.screen.nav_step(-1);
        navigate(app, prev).await?;
        return Ok(false);
    } else if hit(&k, &g.refresh) {
        app.ui.error = None;
        app.ui.status = "Refreshing...".into();
        load_screen(app).await?;
        return Ok(false);
    }

    // 画面ごとのハンドラへ委譲する。
    match app.ui.screen {
        Screen::Jobs => handle_jobs_key(app, k).await?,
        Screen::Accounts => handle_accounts_key(app, k).await?,
        Screen::AccountSettings => handle_settings_panel_key(app, k).await?,
        Screen::Drafts => handle_drafts_key(app, k).await?,
        Screen::DraftEditor => handle_editor_key(app, k).await?,
        Screen::CreateVideo => handle_wizard_key(app, k).await?,
        Screen::Bgm if !app.bgm_upload => handle_bgm_key(app, k).await?,
        Screen::Videos => handle_videos_key(app, k).await?,
        Screen::AccountForm
        | Screen::Preview
        | Screen::Batch
        | Screen::Bgm
        | Screen::Studio
        | Screen::Settings => handle_form_key(app, k).await?,
    }
    Ok(false)
}

/// Ctrl+Cかどうかを判定する。
pub fn is_ctrl_c(k: &KeyEvent) -> bool {
    k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c')
}

/// ジョブ一覧のキー処理。
async fn handle_jobs_key(app: &mut App, k: KeyEvent) -> Result<()> {
    let (l, j) = (&app.shortcuts.list, &app.shortcuts.jobs);
    let selected = app.jobs.get(app.ui.selected).cloned();

    if hit(&k, &l.up) {
        app.ui.move_selection(-1, app.jobs.len());
    } else if hit(&k, &l.down) {
        app.ui.move_selection(1, app.jobs.len());
    } else if hit(&k, &j.next_page) {
        if let Some(page) = app.pager.next() {
            app.ui.selected = 0;
            app.send(WorkerCmd::LoadJobs { page }).await?;
        }
    } else if hit(&k, &j.prev_page) {
        if let Some(page) = app.pager.prev() {
            app.ui.selected = 0;
            app.send(WorkerCmd::LoadJobs { page }).await?;
        }
    } else if hit(&k, &j.open_result) {
        let Some(job) = selected else {
            return Ok(());
        };
        // 公開URLがあればそちらを優先する。
        if let Some(url) = job.youtube_url {
            app.send(WorkerCmd::Open(url)).await?;
        } else if let Some(path) = job.output_video_path {
            app.send(WorkerCmd::OpenMedia(path)).await?;
        } else {
            app.ui.error = Some(format!("job {} has no output yet", job.job_id));
        }
    } else if hit(&k, &j.watch) {
        if let Some(job) = selected {
            app.ui.status = format!("Watching {}", job.job_id);
            app.watch_job(job.job_id).await?;
        }
    } else if hit(&k, &j.watch_id) {
        app.input_box = Some(InputBoxState::new(
            "Job ID to watch:",
            "",
            InputCallbackId::WatchJobId,
        ));
    }
    Ok(())
}

/// アカウント一覧のキー処理。
async fn handle_accounts_key(app: &mut App, k: KeyEvent) -> Result<()> {
    let (l, a) = (&app.shortcuts.list, &app.shortcuts.accounts);
    let selected = app.accounts.get(app.ui.selected).cloned();

    if hit(&k, &l.up) {
        app.ui.move_selection(-1, app.accounts.len());
    } else if hit(&k, &l.down) {
        app.ui.move_selection(1, app.accounts.len());
    } else if hit(&k, &l.new) {
        app.account_form = Default::default();
        navigate(app, Screen::AccountForm).await?;
    } else if hit(&k, &a.reload_scheduler) {
        app.send(WorkerCmd::ReloadScheduler).await?;
    } else if let Some(acc) = selected {
        // 以降は選択中のアカウントが必要な操作。
        if hit(&k, &l.open) {
            app.send(WorkerCmd::LoadAccountDetail(acc.id)).await?;
        } else if hit(&k, &a.edit) {
            app.account_form = crate::forms::AccountForm::from_account(&acc);
            navigate(app, Screen::AccountForm).await?;
        } else if hit(&k, &l.delete) {
            app.input_box = Some(InputBoxState::confirm(
                format!("Delete account '{}'?", acc.channel_name),
                PendingAction::DeleteAccount(acc.id),
            ));
        } else if hit(&k, &a.settings) {
            app.settings_panel = None;
            navigate(app, Screen::AccountSettings).await?;
            app.send(WorkerCmd::LoadAccountSettings(acc.id)).await?;
            app.send(WorkerCmd::LoadVoices).await?;
        } else if hit(&k, &a.trigger) {
            app.ui.status = format!("Triggering {}...", acc.channel_name);
            app.send(WorkerCmd::TriggerSchedule(acc.id)).await?;
        } else if hit(&k, &a.remove_schedule) {
            app.send(WorkerCmd::RemoveSchedule(acc.id)).await?;
        }
    }
    Ok(())
}

/// アカウント設定パネル（スライダー）のキー処理。
async fn handle_settings_panel_key(app: &mut App, k: KeyEvent) -> Result<()> {
    let sc = &app.shortcuts.panel;
    if hit(&k, &sc.cancel) {
        navigate(app, Screen::Accounts).await?;
        return Ok(());
    }
    // 読み込み完了までは操作できない。
    let Some(panel) = app.settings_panel.as_mut() else {
        return Ok(());
    };

    if hit(&k, &sc.up) {
        panel.prev_field();
    } else if hit(&k, &sc.down) {
        panel.next_field();
    } else if hit(&k, &sc.decrease) {
        panel.adjust(-1);
    } else if hit(&k, &sc.increase) {
        panel.adjust(1);
    } else if hit(&k, &sc.save) {
        let id = panel.account_id;
        match panel.validated() {
            Ok(settings) => {
                app.ui.status = "Saving settings...".into();
                app.send(WorkerCmd::SaveAccountSettings { id, settings }).await?;
            }
            Err(e) => app.ui.error = Some(e.to_string()),
        }
    } else if hit(&k, &sc.voice_preview) {
        app.input_box = Some(InputBoxState::new(
            "Sample text:",
            "Hello! This is how this voice sounds.",
            InputCallbackId::VoiceSampleText,
        ));
    }
    Ok(())
}

/// ドラフト一覧のキー処理。
async fn handle_drafts_key(app: &mut App, k: KeyEvent) -> Result<()> {
    let l = &app.shortcuts.list;
    let selected = app.drafts.get(app.ui.selected).map(|d| d.draft_id.clone());

    if hit(&k, &l.up) {
        app.ui.move_selection(-1, app.drafts.len());
    } else if hit(&k, &l.down) {
        app.ui.move_selection(1, app.drafts.len());
    } else if hit(&k, &l.new) {
        app.input_box = Some(InputBoxState::new(
            "Draft topic (empty for a trending topic):",
            "",
            InputCallbackId::DraftTopic,
        ));
    } else if hit(&k, &l.filter) {
        app.draft_filter = next_filter(DraftStatus::filters(), &app.draft_filter);
        app.ui.selected = 0;
        load_screen(app).await?;
    } else if let Some(draft_id) = selected {
        if hit(&k, &l.open) {
            app.ui.status = format!("Opening {draft_id}...");
            app.send(WorkerCmd::OpenDraft(draft_id)).await?;
        } else if hit(&k, &l.delete) {
            app.input_box = Some(InputBoxState::confirm(
                format!("Delete draft {draft_id}?"),
                PendingAction::DeleteDraft(draft_id),
            ));
        }
    }
    Ok(())
}

/// ドラフト編集画面のキー処理。
async fn handle_editor_key(app: &mut App, k: KeyEvent) -> Result<()> {
    let sc = &app.shortcuts.editor;
    if hit(&k, &sc.back) {
        navigate(app, Screen::Drafts).await?;
        return Ok(());
    }
    let Some(ed) = app.editor.as_mut() else {
        return Ok(());
    };
    let draft_id = ed.draft_id().to_string();

    if hit(&k, &sc.up) {
        ed.select_prev();
    } else if hit(&k, &sc.down) {
        ed.select_next();
    } else if hit(&k, &sc.toggle_upload) {
        ed.upload = !ed.upload;
    } else if hit(&k, &sc.finalize) {
        let body = ed.finalize_request(&app.cfg.finalize);
        app.ui.status = format!("Finalizing {draft_id}...");
        app.send(WorkerCmd::FinalizeDraft { draft_id, body }).await?;
    } else if let Some(seg) = ed.selected_segment().cloned() {
        if hit(&k, &sc.edit_text) {
            app.input_box = Some(InputBoxState::new(
                format!("Segment {} text:", seg.segment_index),
                seg.text,
                InputCallbackId::SegmentText,
            ));
        } else if hit(&k, &sc.regenerate) {
            app.ui.status = format!("Regenerating segment {}...", seg.segment_index);
            app.send(WorkerCmd::RegenerateSegment {
                draft_id,
                segment: seg,
            })
            .await?;
        } else if hit(&k, &sc.play_tts) {
            match seg.tts_local_path {
                Some(path) => app.send(WorkerCmd::OpenMedia(path)).await?,
                None => app.ui.error = Some("segment has no narration yet".into()),
            }
        } else if hit(&k, &sc.open_media) {
            match seg.video_url.or(seg.video_local_path) {
                Some(src) => app.send(WorkerCmd::OpenMedia(src)).await?,
                None => app.ui.error = Some("segment has no visual yet".into()),
            }
        }
    }
    Ok(())
}

/// 動画作成ウィザードのキー処理。
async fn handle_wizard_key(app: &mut App, k: KeyEvent) -> Result<()> {
    let sc = &app.shortcuts.wizard;

    if hit(&k, &sc.proceed) {
        match app.wizard.step {
            WizardStep::Topic => {
                app.input_box = Some(InputBoxState::new(
                    "Topic (empty for trending):",
                    app.wizard.topic.clone(),
                    InputCallbackId::WizardTopic,
                ));
            }
            WizardStep::Duration => {
                app.input_box = Some(InputBoxState::new(
                    "Duration in seconds:",
                    app.wizard.duration.to_string(),
                    InputCallbackId::WizardDuration,
                ));
            }
            WizardStep::Format | WizardStep::Upload => app.wizard.next_step(),
            WizardStep::Confirm => {
                let prefs = app.prefs.current();
                let req = app.wizard.to_request(&prefs);
                app.wizard = CreateWizard::new(&prefs);
                app.ui.status = "Submitting video job...".into();
                app.send(WorkerCmd::CreateVideo(req)).await?;
            }
        }
    } else if hit(&k, &sc.back) {
        app.wizard.prev_step();
    } else if hit(&k, &sc.toggle) {
        app.wizard.toggle();
    }
    Ok(())
}

/// BGM一覧のキー処理。
async fn handle_bgm_key(app: &mut App, k: KeyEvent) -> Result<()> {
    let l = &app.shortcuts.list;
    if hit(&k, &l.up) {
        app.ui.move_selection(-1, app.bgm.len());
    } else if hit(&k, &l.down) {
        app.ui.move_selection(1, app.bgm.len());
    } else if hit(&k, &l.form) || hit(&k, &l.new) {
        app.bgm_upload = true;
        app.ui.field_idx = 0;
    } else if hit(&k, &l.open)
        && let Some(entry) = app.bgm.get(app.ui.selected)
    {
        app.send(WorkerCmd::OpenMedia(entry.file_path.clone())).await?;
    }
    Ok(())
}

/// ダウンロード済み動画一覧のキー処理。
async fn handle_videos_key(app: &mut App, k: KeyEvent) -> Result<()> {
    let l = &app.shortcuts.list;
    let selected = app.videos.get(app.ui.selected).map(|v| v.video_id.clone());

    if hit(&k, &l.up) {
        app.ui.move_selection(-1, app.videos.len());
    } else if hit(&k, &l.down) {
        app.ui.move_selection(1, app.videos.len());
    } else if hit(&k, &l.filter) {
        app.video_filter = next_filter(VideoStatus::filters(), &app.video_filter);
        app.ui.selected = 0;
        load_screen(app).await?;
    } else if let Some(video_id) = selected {
        if hit(&k, &l.delete) {
            app.input_box = Some(InputBoxState::confirm(
                format!("Delete video {video_id}?"),
                PendingAction::DeleteVideo(video_id),
            ));
        } else if hit(&k, &l.action) {
            app.ui.status = format!("Starting subtitles for {video_id}...");
            app.send(WorkerCmd::ProcessSubtitles(video_id)).await?;
        }
    }
    Ok(())
}

/// フォーム画面のキー処理。共通のフィールド操作の後に画面固有の操作を見る。
async fn handle_form_key(app: &mut App, k: KeyEvent) -> Result<()> {
    if handle_form_fields(app, &k) {
        return Ok(());
    }
    let f = &app.shortcuts.form;
    let submit = hit(&k, &f.submit);
    let cancel = hit(&k, &f.cancel);

    match app.ui.screen {
        Screen::AccountForm if submit => submit_account(app).await?,
        Screen::AccountForm if cancel => switch_screen(app, Screen::Accounts).await?,

        Screen::Preview if submit => match app.preview_form.to_request() {
            Ok(req) => {
                app.ui.status = "Generating preview...".into();
                app.send(WorkerCmd::GeneratePreview(req)).await?;
            }
            Err(e) => app.ui.error = Some(e.to_string()),
        },
        Screen::Preview if hit(&k, &app.shortcuts.list.action) => {
            match app.preview.as_ref() {
                Some(p) if p.status == PreviewStatus::Completed => {
                    let job_id = p.job_id.clone();
                    let upload = app.cfg.finalize.upload;
                    app.send(WorkerCmd::FinalizePreview { job_id, upload }).await?;
                }
                _ => app.ui.error = Some("no completed preview to finalize".into()),
            }
        }
        Screen::Preview if hit(&k, &app.shortcuts.jobs.open_result) => {
            if let Some(p) = &app.preview {
                app.send(WorkerCmd::OpenPreview(p.job_id.clone())).await?;
            }
        }
        Screen::Preview if hit(&k, &app.shortcuts.preview.older) => {
            app.ui.move_selection(1, app.previews.len());
        }
        Screen::Preview if hit(&k, &app.shortcuts.preview.newer) => {
            app.ui.move_selection(-1, app.previews.len());
        }
        Screen::Preview if hit(&k, &app.shortcuts.preview.load) => load_recent_preview(app).await?,

        Screen::Batch if submit => match app.batch_form.to_request() {
            Ok(req) => {
                app.input_box = Some(InputBoxState::confirm(
                    format!(
                        "Remix up to {} {} videos from {}?",
                        req.max_videos, req.category, req.region
                    ),
                    PendingAction::StartBatch,
                ));
            }
            Err(e) => app.ui.error = Some(e.to_string()),
        },

        Screen::Bgm if submit => match app.bgm_form.validated() {
            Ok(upload) => {
                app.bgm_upload = false;
                app.ui.status = format!("Uploading {}...", upload.name);
                app.send(WorkerCmd::UploadBgm(upload)).await?;
            }
            Err(e) => app.ui.error = Some(e.to_string()),
        },
        Screen::Bgm if cancel => app.bgm_upload = false,

        Screen::Studio if submit => match studio_action(&app.studio_form, app.studio_action) {
            Ok(action) => {
                app.ui.status = format!("{}...", action.title());
                app.send(WorkerCmd::Studio(action)).await?;
            }
            Err(e) => app.ui.error = Some(e.to_string()),
        },
        Screen::Studio => {
            let n = STUDIO_ACTION_NAMES.len();
            if hit(&k, &app.shortcuts.panel.decrease) {
                app.studio_action = (app.studio_action + n - 1) % n;
            } else if hit(&k, &app.shortcuts.panel.increase) {
                app.studio_action = (app.studio_action + 1) % n;
            }
        }

        Screen::Settings if submit => {
            let edited = app.prefs_form.prefs.clone();
            match app.prefs.update(|p| *p = edited) {
                Ok(saved) => {
                    app.prefs_form.prefs = saved;
                    app.ui.status = "Preferences saved".into();
                }
                Err(e) => app.ui.error = Some(format!("saving preferences failed: {e}")),
            }
        }
        Screen::Settings if cancel => {
            app.prefs_form.prefs = app.prefs.current();
            app.ui.status = "Changes discarded".into();
        }
        _ => {}
    }
    Ok(())
}

/// フィールド移動と編集。処理した場合は true。
fn handle_form_fields(app: &mut App, k: &KeyEvent) -> bool {
    let f = &app.shortcuts.form;
    let (next, prev, edit) = (
        hit(k, &f.next_field),
        hit(k, &f.prev_field),
        hit(k, &f.edit),
    );
    let Some(len) = app.form().map(|form| form.len()) else {
        return false;
    };
    let idx = app.ui.field_idx.min(len.saturating_sub(1));

    if next {
        app.ui.field_idx = (idx + 1) % len;
    } else if prev {
        app.ui.field_idx = (idx + len - 1) % len;
    } else if edit {
        let Some(form) = app.form_mut() else {
            return false;
        };
        // 選択式はその場で切り替え、自由入力は入力ボックスを開く。
        if !form.cycle(idx) {
            let prompt = format!("{}:", form.labels()[idx]);
            let value = form.value(idx);
            app.input_box = Some(InputBoxState::new(
                prompt,
                value,
                InputCallbackId::FormField(idx),
            ));
        }
    } else {
        return false;
    }
    true
}

/// 最近の一覧で選んだプレビューを表示し、状態の追跡を始める。
async fn load_recent_preview(app: &mut App) -> Result<()> {
    let Some(p) = app.previews.get(app.ui.selected) else {
        return Ok(());
    };
    let job_id = p.job_id.clone();
    // 詳細は最初のポーリング結果で埋まる。
    app.preview = Some(PreviewJob {
        job_id: job_id.clone(),
        status: p.status.clone(),
        progress: p.progress,
        preview_path: None,
        segments: None,
        metadata: None,
        error: None,
    });
    app.ui.status = format!("Preview {job_id} loaded");
    app.send(WorkerCmd::WatchPreview(job_id)).await
}

/// アカウントフォームを検証して作成/更新を送る。不正なら何も送らない。
async fn submit_account(app: &mut App) -> Result<()> {
    let form = &app.account_form;
    let cmd = match form.editing {
        Some(id) => form
            .to_update()
            .map(|body| WorkerCmd::UpdateAccount { id, body }),
        None => form.to_create().map(WorkerCmd::CreateAccount),
    };
    match cmd {
        Ok(cmd) => {
            app.send(cmd).await?;
            // 一覧はWorker側の再取得で更新される。
            switch_screen(app, Screen::Accounts).await?;
            app.ui.status = "Saving account...".into();
        }
        Err(e) => {
            tracing::debug!("account form rejected: {e}");
            app.ui.error = Some(e.to_string());
        }
    }
    Ok(())
}

/// スタジオの入力から選択中の操作を組み立てる。
fn studio_action(form: &StudioForm, idx: usize) -> Result<StudioAction, FormError> {
    Ok(match idx {
        0 => StudioAction::AnalyzeTrends,
        1 => StudioAction::GenerateScripts {
            keywords: form.keywords()?,
        },
        2 => StudioAction::SearchTrending,
        3 => StudioAction::SearchKeywords {
            keywords: form.keywords()?,
        },
        4 => StudioAction::Download { url: form.url()? },
        5 => StudioAction::Upload {
            video_path: form.video_path()?,
            keywords: form.keywords.trim().to_string(),
            script: Some(form.text.trim().to_string()).filter(|s| !s.is_empty()),
            privacy: form.privacy.clone(),
        },
        6 => StudioAction::TtsTest { text: form.text()? },
        _ => StudioAction::Produce {
            script: form.text()?,
        },
    })
}

/// フィルタ候補を1つ進める（末尾の次は「すべて」）。
fn next_filter<T: PartialEq + Clone>(filters: Vec<Option<T>>, current: &Option<T>) -> Option<T> {
    let i = filters.iter().position(|f| f == current).unwrap_or(0);
    filters[(i + 1) % filters.len()].clone()
}

/// 入力ボックスのキー処理。
async fn handle_input_box_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let Some(input_state) = &mut app.input_box else {
        return Ok(false);
    };
    let sc = &app.shortcuts.input_box;

    if hit(&k, &sc.confirm) {
        // 閉じる前に値とコールバック種別を取り出す。
        let value = input_state.value.clone();
        let callback_id = input_state.callback_id.clone();
        app.input_box = None;
        apply_input_callback(app, callback_id, value).await?;
    } else if hit(&k, &sc.cancel) {
        app.input_box = None;
    } else if hit(&k, &sc.backspace) {
        input_state.backspace();
    } else if hit(&k, &sc.delete) {
        input_state.delete();
    } else if hit(&k, &sc.left) {
        input_state.move_left();
    } else if hit(&k, &sc.right) {
        input_state.move_right();
    } else if hit(&k, &sc.home) {
        input_state.move_home();
    } else if hit(&k, &sc.end) {
        input_state.move_end();
    } else if hit(&k, &sc.clear_line) {
        input_state.clear_line();
    } else if let KeyCode::Char(c) = k.code
        && !k.modifiers.contains(KeyModifiers::CONTROL)
    {
        input_state.insert_char(c);
    }
    Ok(false)
}

/// 入力ボックスのコールバックを適用する。
async fn apply_input_callback(
    app: &mut App,
    callback_id: InputCallbackId,
    value: String,
) -> Result<()> {
    match callback_id {
        InputCallbackId::FormField(idx) => {
            let res = match app.form_mut() {
                Some(form) => form.set(idx, value),
                None => Ok(()),
            };
            if let Err(e) = res {
                app.ui.error = Some(e.to_string());
            }
        }
        InputCallbackId::SegmentText => {
            let Some(ed) = &app.editor else {
                return Ok(());
            };
            // 変更が無ければ送らない。
            match ed.text_update(&value) {
                Some((index, body)) => {
                    let draft_id = ed.draft_id().to_string();
                    app.send(WorkerCmd::UpdateSegment {
                        draft_id,
                        index,
                        body,
                    })
                    .await?;
                    app.ui.status = format!("Saving segment {index}...");
                }
                None => app.ui.status = "Text unchanged".into(),
            }
        }
        InputCallbackId::DraftTopic => {
            let prefs = app.prefs.current();
            let topic = value.trim();
            let body = CreateDraftRequest {
                topic: (!topic.is_empty()).then(|| topic.to_string()),
                format: prefs.video_format().into(),
                duration: 60,
                account_id: None,
                style: prefs.default_tone.clone(),
                collect_assets: true,
            };
            app.ui.status = "Creating draft (script and assets)...".into();
            app.send(WorkerCmd::CreateDraft(body)).await?;
        }
        InputCallbackId::WatchJobId => {
            let id = value.trim();
            if !id.is_empty() {
                app.ui.status = format!("Watching {id}");
                app.watch_job(id.to_string()).await?;
            }
        }
        InputCallbackId::VoiceSampleText => {
            if let Some(panel) = &app.settings_panel
                && !value.trim().is_empty()
            {
                let settings = panel.settings.clone();
                app.send(WorkerCmd::PreviewVoice {
                    text: value,
                    settings,
                })
                .await?;
            }
        }
        InputCallbackId::WizardTopic => {
            app.wizard.topic = value.trim().to_string();
            app.wizard.next_step();
        }
        InputCallbackId::WizardDuration => match app.wizard.set_duration(&value) {
            Ok(()) => app.wizard.next_step(),
            Err(e) => app.ui.error = Some(e.to_string()),
        },
        InputCallbackId::Confirm(action) => {
            if value.trim().eq_ignore_ascii_case("y") {
                run_confirmed(app, action).await?;
            } else {
                app.ui.status = "Cancelled".into();
            }
        }
    }
    Ok(())
}

/// 確認ダイアログで承認された操作を実行する。
async fn run_confirmed(app: &mut App, action: PendingAction) -> Result<()> {
    let cmd = match action {
        PendingAction::DeleteAccount(id) => WorkerCmd::DeleteAccount(id),
        PendingAction::DeleteDraft(draft_id) => WorkerCmd::DeleteDraft {
            draft_id,
            status: app.draft_filter.clone(),
        },
        PendingAction::DeleteVideo(video_id) => WorkerCmd::DeleteVideo {
            video_id,
            status: app.video_filter.clone(),
        },
        PendingAction::StartBatch => match app.batch_form.to_request() {
            Ok(req) => WorkerCmd::StartBatch(req),
            Err(e) => {
                app.ui.error = Some(e.to_string());
                return Ok(());
            }
        },
    };
    app.send(cmd).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::types::{Account, ChannelType, DraftProject, PreviewSummary, Segment},
        app::test_support::app,
        draft_editor::DraftEditor,
        worker::PollKind,
    };

    async fn press(app: &mut App, code: KeyCode) -> bool {
        handle_key(app, KeyEvent::new(code, KeyModifiers::empty()))
            .await
            .unwrap()
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c)).await;
        }
    }

    fn account(id: i64, name: &str) -> Account {
        Account {
            id,
            channel_name: name.into(),
            channel_type: ChannelType::News,
            default_prompt_style: String::new(),
            upload_schedule: None,
            is_active: true,
            channel_id: None,
            created_at: String::new(),
        }
    }

    #[tokio::test]
    async fn past_preview_can_be_picked_and_finalized() {
        let (mut app, mut rx, _dir) = app();
        app.ui.screen = Screen::Preview;
        let summary = |id: &str, status: &str| PreviewSummary {
            job_id: id.into(),
            status: PreviewStatus::from(status),
            progress: 100,
            topic: "topic".into(),
            created_at: String::new(),
        };
        app.previews = vec![summary("pv-new", "generating"), summary("pv-old", "completed")];

        press(&mut app, KeyCode::PageDown).await;
        press(&mut app, KeyCode::Char('L')).await;

        assert_eq!(app.preview.as_ref().map(|p| p.job_id.as_str()), Some("pv-old"));
        assert!(matches!(rx.try_recv(), Ok(WorkerCmd::WatchPreview(id)) if id == "pv-old"));

        press(&mut app, KeyCode::Char('x')).await;
        assert!(matches!(
            rx.try_recv(),
            Ok(WorkerCmd::FinalizePreview { job_id, upload: false }) if job_id == "pv-old"
        ));
        press(&mut app, KeyCode::Char('o')).await;
        assert!(matches!(rx.try_recv(), Ok(WorkerCmd::OpenPreview(id)) if id == "pv-old"));
    }

    #[tokio::test]
    async fn empty_channel_name_sends_nothing() {
        let (mut app, mut rx, _dir) = app();
        app.ui.screen = Screen::AccountForm;

        press(&mut app, KeyCode::Char('s')).await;

        assert!(rx.try_recv().is_err());
        assert_eq!(app.ui.screen, Screen::AccountForm);
        assert_eq!(app.ui.error.as_deref(), Some("Channel name is required"));
    }

    #[tokio::test]
    async fn filled_account_form_is_submitted() {
        let (mut app, mut rx, _dir) = app();
        app.ui.screen = Screen::AccountForm;

        // 1つ目のフィールド（チャンネル名）を入力ボックスで編集する。
        press(&mut app, KeyCode::Enter).await;
        assert!(app.input_box.is_some());
        type_text(&mut app, "Tech Daily").await;
        press(&mut app, KeyCode::Enter).await;
        press(&mut app, KeyCode::Char('s')).await;

        match rx.try_recv() {
            Ok(WorkerCmd::CreateAccount(body)) => assert_eq!(body.channel_name, "Tech Daily"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(app.ui.screen, Screen::Accounts);
    }

    #[tokio::test]
    async fn account_delete_needs_confirmation() {
        let (mut app, mut rx, _dir) = app();
        app.ui.screen = Screen::Accounts;
        app.accounts = vec![account(1, "a"), account(2, "b")];
        app.ui.selected = 1;

        press(&mut app, KeyCode::Char('d')).await;
        assert!(matches!(
            app.input_box.as_ref().map(|b| &b.callback_id),
            Some(InputCallbackId::Confirm(PendingAction::DeleteAccount(2)))
        ));
        press(&mut app, KeyCode::Enter).await;
        assert!(rx.try_recv().is_err(), "empty answer cancels");

        press(&mut app, KeyCode::Char('d')).await;
        type_text(&mut app, "y").await;
        press(&mut app, KeyCode::Enter).await;
        assert!(matches!(rx.try_recv(), Ok(WorkerCmd::DeleteAccount(2))));
    }

    #[tokio::test]
    async fn segment_edit_only_sends_changed_text() {
        let (mut app, mut rx, _dir) = app();
        let seg = Segment {
            segment_index: 4,
            text: "hello".into(),
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
            draft_id: "d7".into(),
            topic: String::new(),
            title: String::new(),
            description: None,
            tags: vec![],
            format: "shorts".into(),
            target_duration: 30,
            status: DraftStatus::Editing,
            segments: vec![seg],
            created_at: String::new(),
            updated_at: String::new(),
        };
        app.editor = Some(DraftEditor::new(project, false));
        app.ui.screen = Screen::DraftEditor;

        press(&mut app, KeyCode::Char('e')).await;
        press(&mut app, KeyCode::Enter).await;
        assert!(rx.try_recv().is_err());

        press(&mut app, KeyCode::Char('e')).await;
        type_text(&mut app, "!").await;
        press(&mut app, KeyCode::Enter).await;
        match rx.try_recv() {
            Ok(WorkerCmd::UpdateSegment {
                draft_id,
                index,
                body,
            }) => {
                assert_eq!((draft_id.as_str(), index), ("d7", 4));
                assert_eq!(body.text.as_deref(), Some("hello!"));
            }
            other => panic!("unexpected {other:?}"),
        }
        // ローカル状態はサーバー確認まで変わらない。
        assert_eq!(app.editor.as_ref().unwrap().project.segments[0].text, "hello");
    }

    #[tokio::test]
    async fn screen_keys_switch_screens_and_quit() {
        let (mut app, mut rx, _dir) = app();
        assert!(!press(&mut app, KeyCode::Char(']')).await);
        assert_eq!(app.ui.screen, Screen::Accounts);
        assert!(matches!(
            rx.try_recv(),
            Ok(WorkerCmd::StopPolling(PollKind::Job))
        ));
        assert!(press(&mut app, KeyCode::Char('q')).await);
    }

    #[tokio::test]
    async fn wizard_collects_answers_and_submits() {
        let (mut app, mut rx, _dir) = app();
        app.ui.screen = Screen::CreateVideo;

        press(&mut app, KeyCode::Enter).await;
        type_text(&mut app, "volcanoes").await;
        press(&mut app, KeyCode::Enter).await;
        assert_eq!(app.wizard.step, WizardStep::Format);
        press(&mut app, KeyCode::Char(' ')).await;
        press(&mut app, KeyCode::Enter).await;
        assert_eq!(app.wizard.step, WizardStep::Duration);

        // 範囲外の長さはエラーになりステップは進まない。
        press(&mut app, KeyCode::Enter).await;
        press(&mut app, KeyCode::Backspace).await;
        press(&mut app, KeyCode::Backspace).await;
        type_text(&mut app, "5").await;
        press(&mut app, KeyCode::Enter).await;
        assert_eq!(app.wizard.step, WizardStep::Duration);
        assert!(app.ui.error.is_some());

        press(&mut app, KeyCode::Enter).await;
        press(&mut app, KeyCode::Enter).await;
        assert_eq!(app.wizard.step, WizardStep::Upload);
        press(&mut app, KeyCode::Enter).await;
        press(&mut app, KeyCode::Enter).await;

        match rx.try_recv() {
            Ok(WorkerCmd::CreateVideo(req)) => {
                assert_eq!(req.topic.as_deref(), Some("volcanoes"));
                assert_eq!(req.format, "landscape");
                assert_eq!(req.duration, 60);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(app.wizard.step, WizardStep::Topic);
    }

    #[test]
    fn studio_actions_check_their_inputs() {
        let mut form = StudioForm::default();
        assert_eq!(
            studio_action(&form, 1),
            Err(FormError::Required("Keywords"))
        );
        assert_eq!(studio_action(&form, 0), Ok(StudioAction::AnalyzeTrends));
        form.video_path = "out/final.mp4".into();
        match studio_action(&form, 5) {
            Ok(StudioAction::Upload { script, privacy, .. }) => {
                assert_eq!(script, None);
                assert_eq!(privacy, "private");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn studio_names_match_action_titles() {
        let form = StudioForm {
            keywords: "k".into(),
            url: "u".into(),
            video_path: "v".into(),
            text: "t".into(),
            privacy: "private".into(),
        };
        for (i, name) in STUDIO_ACTION_NAMES.iter().enumerate() {
            assert_eq!(studio_action(&form, i).unwrap().title(), *name);
        }
    }

    #[test]
    fn filters_cycle_back_to_all() {
        let mut f = None;
        for _ in 0..DraftStatus::filters().len() {
            f = next_filter(DraftStatus::filters(), &f);
        }
        assert_eq!(f, None);
        assert_eq!(
            next_filter(DraftStatus::filters(), &None),
            Some(DraftStatus::Editing)
        );
    }
}
