//! TUI描画関連の関数。

use chrono::{DateTime, NaiveDateTime};
use ratatui::{
    Frame,
    prelude::*,
    widgets::{Block, Borders, Cell, Gauge, List, ListState, Paragraph, Row, Table, TableState, Wrap},
};

use crate::{
    api::scheduler,
    events::Screen,
    forms::{DURATION_STEP, FieldForm, SLIDER_STEP, SettingsField},
    input, layout,
    shortcuts::Shortcuts,
    status::{Lifecycle, filter_label},
    wizard::WizardStep,
};

use super::{App, handlers::STUDIO_ACTION_NAMES};

/// 選択行のハイライト（オレンジ背景に黒文字）。
fn highlight() -> Style {
    Style::default()
        .bg(Color::Rgb(255, 140, 0))
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD)
}

fn bordered(title: impl Into<String>) -> Block<'static> {
    Block::default().borders(Borders::ALL).title(title.into())
}

/// 画面全体のレイアウトを描画する。
pub fn draw(f: &mut Frame, app: &App) {
    let main_layout = layout::create_main_layout(f.area());
    let body_layout = layout::create_body_layout(main_layout.body);

    draw_sidebar(f, app, main_layout.sidebar);

    // 画面本体
    let area = body_layout.main;
    match app.ui.screen {
        Screen::Jobs => draw_jobs(f, app, area),
        Screen::Accounts => draw_accounts(f, app, area),
        Screen::AccountForm => {
            let title = match app.account_form.editing {
                Some(id) => format!("EDIT ACCOUNT #{id}"),
                None => "NEW ACCOUNT".into(),
            };
            draw_form(f, area, title, &app.account_form, Some(app.ui.field_idx));
        }
        Screen::AccountSettings => draw_settings_panel(f, app, area),
        Screen::Drafts => draw_drafts(f, app, area),
        Screen::DraftEditor => draw_editor(f, app, area),
        Screen::CreateVideo => draw_wizard(f, app, area),
        Screen::Preview => draw_preview(f, app, area),
        Screen::Batch => draw_batch(f, app, area),
        Screen::Bgm => draw_bgm(f, app, area),
        Screen::Videos => draw_videos(f, app, area),
        Screen::Studio => draw_studio(f, app, area),
        Screen::Settings => {
            draw_form(f, area, "PREFERENCES", &app.prefs_form, Some(app.ui.field_idx));
        }
    }

    // INFOパネル
    let info = Paragraph::new(build_info_text(app))
        .block(bordered("INFO"))
        .wrap(Wrap { trim: true });
    f.render_widget(info, body_layout.info_panel);

    // HELPバー
    let help_bar = Paragraph::new(get_help_text(app, &app.shortcuts))
        .block(bordered("HELP"))
        .wrap(Wrap { trim: true });
    f.render_widget(help_bar, main_layout.help_bar);

    f.render_widget(build_status_bar(app), main_layout.status_bar);

    // 入力ボックスが開いていれば重ねて描画する。
    if let Some(input_state) = &app.input_box {
        input::render_input_box(f, input_state);
    }
}

/// サイドバー（サブ画面は親画面を強調する）。
fn draw_sidebar(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<&str> = Screen::NAV.iter().map(|s| s.title()).collect();
    let current = app.ui.screen.nav_parent();
    let mut state =
        ListState::default().with_selected(Screen::NAV.iter().position(|s| *s == current));
    let list = List::new(items)
        .block(bordered("AUTOTUBE"))
        .highlight_style(highlight());
    f.render_stateful_widget(list, area, &mut state);
}

/// 状態に応じた色（失敗は赤、完了は緑、進行中は黄）。
fn status_cell<T: Lifecycle>(s: &T) -> Cell<'static> {
    let color = if s.is_failure() {
        Color::Red
    } else if s.is_terminal() {
        Color::Green
    } else {
        Color::Yellow
    };
    Cell::from(s.label().to_string()).style(Style::default().fg(color))
}

/// 一覧テーブルを選択行付きで描画する。
fn render_table<'a>(
    f: &mut Frame,
    area: Rect,
    title: impl Into<String>,
    header: Vec<&'a str>,
    rows: Vec<Row<'a>>,
    widths: Vec<Constraint>,
    selected: Option<usize>,
) {
    let empty = rows.is_empty();
    let table = Table::new(rows, widths)
        .block(bordered(title))
        .header(Row::new(header).bold())
        .row_highlight_style(highlight());
    let mut state = TableState::default();
    if !empty {
        state.select(selected);
    }
    f.render_stateful_widget(table, area, &mut state);
}

fn draw_jobs(f: &mut Frame, app: &App, area: Rect) {
    let (list_area, footer) = layout::split_footer(area);
    let rows = app
        .jobs
        .iter()
        .map(|j| {
            Row::new(vec![
                Cell::from(clip(&j.job_id, 10)),
                status_cell(&j.status),
                Cell::from(clip(j.topic.as_deref().unwrap_or("(trending)"), 28)),
                Cell::from(j.format.clone().unwrap_or_default()),
                Cell::from(j.created_at.as_deref().map(short_time).unwrap_or_default()),
            ])
        })
        .collect();
    render_table(
        f,
        list_area,
        format!("JOBS ({})", app.jobs_total),
        vec!["id", "status", "topic", "format", "created"],
        rows,
        vec![
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Min(10),
            Constraint::Length(9),
            Constraint::Length(11),
        ],
        Some(app.ui.selected),
    );
    f.render_widget(
        Paragraph::new(app.pager.line()).alignment(Alignment::Center),
        footer,
    );
}

fn draw_accounts(f: &mut Frame, app: &App, area: Rect) {
    let rows = app
        .accounts
        .iter()
        .map(|a| {
            let job_id = scheduler::account_job_id(a.id);
            let next = app
                .scheduled
                .iter()
                .find(|s| s.id == job_id)
                .and_then(|s| s.next_run_time.as_deref())
                .map(short_time)
                .unwrap_or_else(|| "-".into());
            Row::new(vec![
                Cell::from(a.id.to_string()),
                Cell::from(a.channel_name.clone()),
                Cell::from(a.channel_type.label()),
                Cell::from(a.upload_schedule.clone().unwrap_or_else(|| "-".into())),
                Cell::from(next),
                Cell::from(if a.is_active { "on" } else { "off" }),
            ])
        })
        .collect();
    render_table(
        f,
        area,
        "ACCOUNTS",
        vec!["#", "channel", "type", "schedule", "next run", "active"],
        rows,
        vec![
            Constraint::Length(4),
            Constraint::Min(12),
            Constraint::Length(7),
            Constraint::Length(14),
            Constraint::Length(11),
            Constraint::Length(6),
        ],
        Some(app.ui.selected),
    );
}

/// ラベル付きフィールドの一覧。編集中のフィールドに矢印を付ける。
fn draw_form(f: &mut Frame, area: Rect, title: impl Into<String>, form: &dyn FieldForm, focus: Option<usize>) {
    let labels = form.labels();
    let width = labels.iter().map(|l| l.len()).max().unwrap_or(0);
    let lines: Vec<Line> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let focused = focus == Some(i);
            let marker = if focused { "→" } else { " " };
            let text = format!("{marker} {label:<width$} : {}", form.value(i));
            if focused {
                Line::styled(text, Style::default().add_modifier(Modifier::BOLD))
            } else {
                Line::raw(text)
            }
        })
        .collect();
    f.render_widget(
        Paragraph::new(lines).block(bordered(title)).wrap(Wrap { trim: false }),
        area,
    );
}

fn draw_settings_panel(f: &mut Frame, app: &App, area: Rect) {
    let Some(panel) = &app.settings_panel else {
        f.render_widget(
            Paragraph::new("Loading settings...").block(bordered("ACCOUNT SETTINGS")),
            area,
        );
        return;
    };
    let lines: Vec<Line> = SettingsField::ALL
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let text = format!("{:<20} {}", field.label(), panel.display(*field));
            if i == panel.field {
                Line::styled(format!("→ {text}"), highlight())
            } else if !panel.uses_elevenlabs()
                && matches!(
                    field,
                    SettingsField::Voice
                        | SettingsField::Stability
                        | SettingsField::Similarity
                        | SettingsField::Style
                )
            {
                // gTTSでは使わない項目
                Line::styled(format!("  {text}"), Style::default().add_modifier(Modifier::DIM))
            } else {
                Line::raw(format!("  {text}"))
            }
        })
        .collect();
    let title = app
        .accounts
        .iter()
        .find(|a| a.id == panel.account_id)
        .map(|a| format!("SETTINGS: {}", a.channel_name))
        .unwrap_or_else(|| format!("SETTINGS: account {}", panel.account_id));
    f.render_widget(Paragraph::new(lines).block(bordered(title)), area);
}

fn draw_drafts(f: &mut Frame, app: &App, area: Rect) {
    let (list_area, footer) = layout::split_footer(area);
    let rows = app
        .drafts
        .iter()
        .map(|d| {
            let title = if d.title.is_empty() { &d.topic } else { &d.title };
            Row::new(vec![
                Cell::from(clip(&d.draft_id, 10)),
                status_cell(&d.status),
                Cell::from(clip(title, 30)),
                Cell::from(d.segments.len().to_string()),
                Cell::from(short_time(&d.updated_at)),
            ])
        })
        .collect();
    render_table(
        f,
        list_area,
        "DRAFTS",
        vec!["id", "status", "title", "segs", "updated"],
        rows,
        vec![
            Constraint::Length(10),
            Constraint::Length(13),
            Constraint::Min(10),
            Constraint::Length(4),
            Constraint::Length(11),
        ],
        Some(app.ui.selected),
    );
    f.render_widget(
        Paragraph::new(format!("filter: {}", filter_label(&app.draft_filter))),
        footer,
    );
}

fn draw_editor(f: &mut Frame, app: &App, area: Rect) {
    let Some(ed) = &app.editor else {
        f.render_widget(Paragraph::new("Loading draft...").block(bordered("EDITOR")), area);
        return;
    };
    let rows = ed
        .project
        .segments
        .iter()
        .map(|s| {
            let mark = |b: bool| if b { "✓" } else { "-" };
            Row::new(vec![
                Cell::from(s.segment_index.to_string()),
                Cell::from(clip(&s.text, 40)),
                Cell::from(s.keyword.clone().unwrap_or_default()),
                Cell::from(s.duration.map(|d| format!("{d:.1}s")).unwrap_or_default()),
                Cell::from(mark(s.tts_local_path.is_some())),
                Cell::from(mark(s.video_url.is_some() || s.video_local_path.is_some())),
            ])
        })
        .collect();
    let title = format!(
        "EDITOR: {} ({:.0}s / {}s)",
        if ed.project.title.is_empty() { ed.draft_id() } else { ed.project.title.as_str() },
        ed.total_duration(),
        ed.project.target_duration
    );
    render_table(
        f,
        area,
        title,
        vec!["#", "text", "keyword", "dur", "tts", "visual"],
        rows,
        vec![
            Constraint::Length(3),
            Constraint::Min(20),
            Constraint::Length(14),
            Constraint::Length(6),
            Constraint::Length(3),
            Constraint::Length(6),
        ],
        Some(ed.selected),
    );
}

fn draw_wizard(f: &mut Frame, app: &App, area: Rect) {
    let (step, total) = app.wizard.progress();
    let text = format!("Step {step}/{total}\n\n{}", app.wizard.prompt());
    f.render_widget(
        Paragraph::new(text)
            .block(bordered("CREATE VIDEO"))
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn draw_preview(f: &mut Frame, app: &App, area: Rect) {
    let form_h = app.preview_form.len() as u16 + 2;
    let [form_area, gauge_area, list_area] = Layout::vertical([
        Constraint::Length(form_h),
        Constraint::Length(3),
        Constraint::Min(3),
    ])
    .areas(area);

    draw_form(f, form_area, "PREVIEW", &app.preview_form, Some(app.ui.field_idx));

    let (label, pct, style) = match &app.preview {
        Some(p) => (
            format!("{} {}%", p.status.label(), p.progress),
            p.progress.min(100),
            if p.status.is_failure() { Color::Red } else { Color::Cyan },
        ),
        None => ("no preview running".into(), 0, Color::DarkGray),
    };
    let gauge = Gauge::default()
        .block(bordered("PROGRESS"))
        .gauge_style(Style::default().fg(style))
        .percent(u16::from(pct))
        .label(label);
    f.render_widget(gauge, gauge_area);

    let rows = app
        .previews
        .iter()
        .map(|p| {
            Row::new(vec![
                Cell::from(clip(&p.job_id, 10)),
                status_cell(&p.status),
                Cell::from(clip(&p.topic, 30)),
                Cell::from(short_time(&p.created_at)),
            ])
        })
        .collect();
    render_table(
        f,
        list_area,
        "RECENT PREVIEWS",
        vec!["id", "status", "topic", "created"],
        rows,
        vec![
            Constraint::Length(10),
            Constraint::Length(11),
            Constraint::Min(10),
            Constraint::Length(11),
        ],
        Some(app.ui.selected),
    );
}

fn draw_batch(f: &mut Frame, app: &App, area: Rect) {
    let form_h = app.batch_form.len() as u16 + 2;
    let [form_area, list_area] =
        Layout::vertical([Constraint::Length(form_h), Constraint::Min(3)]).areas(area);

    draw_form(f, form_area, "BATCH REMIX", &app.batch_form, Some(app.ui.field_idx));

    let rows = app
        .batch_jobs
        .iter()
        .map(|b| {
            let counts = b
                .result
                .as_ref()
                .map(|c| format!("{}/{}/{}", c.downloaded, c.remixed, c.failed))
                .unwrap_or_default();
            Row::new(vec![
                Cell::from(clip(&b.job_id, 10)),
                status_cell(&b.status),
                Cell::from(counts),
                Cell::from(b.created_at.as_deref().map(short_time).unwrap_or_default()),
            ])
        })
        .collect();
    render_table(
        f,
        list_area,
        "BATCH JOBS",
        vec!["id", "status", "dl/remix/fail", "created"],
        rows,
        vec![
            Constraint::Length(10),
            Constraint::Length(11),
            Constraint::Min(13),
            Constraint::Length(11),
        ],
        None,
    );
}

fn draw_bgm(f: &mut Frame, app: &App, area: Rect) {
    let form_h = app.bgm_form.len() as u16 + 2;
    let [list_area, form_area] =
        Layout::vertical([Constraint::Min(3), Constraint::Length(form_h)]).areas(area);

    let rows = app
        .bgm
        .iter()
        .map(|b| {
            Row::new(vec![
                Cell::from(b.mood.to_uppercase()),
                Cell::from(b.name.clone()),
                Cell::from(format!("{:.0}s", b.duration)),
            ])
        })
        .collect();
    render_table(
        f,
        list_area,
        format!("BGM ({})", app.bgm.len()),
        vec!["mood", "name", "length"],
        rows,
        vec![Constraint::Length(11), Constraint::Min(10), Constraint::Length(7)],
        (!app.bgm_upload).then_some(app.ui.selected),
    );

    let focus = app.bgm_upload.then_some(app.ui.field_idx);
    draw_form(f, form_area, "UPLOAD", &app.bgm_form, focus);
}

fn draw_videos(f: &mut Frame, app: &App, area: Rect) {
    let (list_area, footer) = layout::split_footer(area);
    let rows = app
        .videos
        .iter()
        .map(|v| {
            Row::new(vec![
                Cell::from(clip(&v.video_id, 12)),
                status_cell(&v.status),
                Cell::from(clip(&v.title, 40)),
            ])
        })
        .collect();
    render_table(
        f,
        list_area,
        "VIDEOS",
        vec!["id", "status", "title"],
        rows,
        vec![Constraint::Length(12), Constraint::Length(11), Constraint::Min(10)],
        Some(app.ui.selected),
    );
    f.render_widget(
        Paragraph::new(format!("filter: {}", filter_label(&app.video_filter))),
        footer,
    );
}

fn draw_studio(f: &mut Frame, app: &App, area: Rect) {
    let form_h = app.studio_form.len() as u16 + 2;
    let [form_area, action_area, result_area] = Layout::vertical([
        Constraint::Length(form_h),
        Constraint::Length(3),
        Constraint::Min(3),
    ])
    .areas(area);

    draw_form(f, form_area, "STUDIO", &app.studio_form, Some(app.ui.field_idx));

    let spans: Vec<Span> = STUDIO_ACTION_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| {
            if i == app.studio_action {
                Span::styled(format!(" {name} "), highlight())
            } else {
                Span::raw(format!(" {name} "))
            }
        })
        .collect();
    f.render_widget(
        Paragraph::new(Line::from(spans)).block(bordered("ACTION")),
        action_area,
    );

    let (title, body) = match &app.studio_result {
        Some((title, lines)) => (format!("RESULT: {title}"), lines.join("\n")),
        None => ("RESULT".into(), String::new()),
    };
    f.render_widget(
        Paragraph::new(body).block(bordered(title)).wrap(Wrap { trim: false }),
        result_area,
    );
}

/// 画面ごとのINFOパネル本文（末尾にログを付ける）。
fn build_info_text(app: &App) -> String {
    let mut lines: Vec<String> = vec![];
    match app.ui.screen {
        Screen::Jobs => {
            if let Some(j) = app.jobs.get(app.ui.selected) {
                lines.push(format!("Job: {}", j.job_id));
                lines.push(format!("Status: {}", j.status.label()));
                lines.push(format!("Topic: {}", j.topic.as_deref().unwrap_or("-")));
                if let Some(d) = j.duration {
                    lines.push(format!("Duration: {d}s"));
                }
                if let Some(id) = j.account_id {
                    lines.push(format!("Account: {id}"));
                }
                if let Some(t) = &j.completed_at {
                    lines.push(format!("Completed: {}", short_time(t)));
                }
                if let Some(p) = &j.output_video_path {
                    lines.push(format!("Output: {p}"));
                }
                if let Some(u) = &j.youtube_url {
                    lines.push(format!("YouTube: {u}"));
                }
                if let Some(e) = &j.error_message {
                    lines.push(format!("Error: {e}"));
                }
            }
        }
        Screen::Accounts => {
            if let Some(a) = app.accounts.get(app.ui.selected) {
                lines.push(format!("{} (#{})", a.channel_name, a.id));
                lines.push(format!("Style: {}", a.default_prompt_style));
                if let Some(c) = &a.channel_id {
                    lines.push(format!("Channel: {c}"));
                }
                if let Some(d) = app.account_detail.as_ref().filter(|d| d.account.id == a.id) {
                    if let Some(s) = &d.settings {
                        lines.push(format!("TTS: {} / {}", s.tts_provider, s.default_format));
                    }
                    lines.push(format!("Jobs: {}", d.jobs.len()));
                    for j in d.jobs.iter().take(5) {
                        lines.push(format!("  {} {}", clip(&j.job_id, 8), j.status.label()));
                    }
                } else {
                    lines.push("Enter: load details".into());
                }
            }
            lines.push(format!("Scheduled jobs: {}", app.scheduled.len()));
        }
        Screen::AccountForm => {
            lines.push("Schedule uses 5 cron fields,".into());
            lines.push("e.g. `0 9 * * *`. Empty disables it.".into());
        }
        Screen::AccountSettings => {
            lines.push(format!("Voices: {}", app.voices.len()));
            if let Some(p) = &app.settings_panel {
                let field = p.current();
                lines.push(format!("Field: {}", field.label()));
                if field.is_slider() {
                    lines.push(format!("Step: {SLIDER_STEP} (0.00 to 1.00)"));
                } else if field == SettingsField::Duration {
                    lines.push(format!("Step: {DURATION_STEP}s"));
                }
                if !p.uses_elevenlabs() {
                    lines.push("Voice sliders apply to ElevenLabs only.".into());
                }
            }
        }
        Screen::Drafts => {
            if let Some(d) = app.drafts.get(app.ui.selected) {
                lines.push(format!("Draft: {}", d.draft_id));
                lines.push(format!("Topic: {}", d.topic));
                lines.push(format!("Format: {} / {}s", d.format, d.target_duration));
                if !d.tags.is_empty() {
                    lines.push(format!("Tags: {}", d.tags.join(", ")));
                }
                lines.push(format!("Created: {}", short_time(&d.created_at)));
            }
        }
        Screen::DraftEditor => {
            if let Some(ed) = &app.editor {
                lines.push(format!("Upload on finalize: {}", yes_no(ed.upload)));
                if let Some(s) = ed.selected_segment() {
                    lines.push(String::new());
                    lines.push(s.text.clone());
                    lines.push(String::new());
                    lines.push(format!("Query: {}", s.search_query()));
                    if let Some(p) = &s.video_provider {
                        lines.push(format!("Visual: {p}"));
                    }
                    if let Some(d) = s.tts_duration {
                        lines.push(format!("Narration: {d:.1}s"));
                    }
                }
            }
        }
        Screen::CreateVideo => {
            let p = app.prefs.current();
            lines.push(format!("AI provider: {}", p.ai_provider));
            lines.push(format!("Language: {}", p.language));
            if app.wizard.step == WizardStep::Confirm {
                lines.push("Ready to submit.".into());
            }
        }
        Screen::Preview => {
            if let Some(p) = &app.preview {
                lines.push(format!("Preview: {}", p.job_id));
                if let Some(m) = &p.metadata {
                    lines.push(format!("Title: {}", m.title));
                    if let Some(r) = &m.resolution {
                        lines.push(format!("Resolution: {r}"));
                    }
                }
                if let Some(segs) = &p.segments {
                    lines.push(format!("Segments: {}", segs.len()));
                }
                if let Some(e) = &p.error {
                    lines.push(format!("Error: {e}"));
                }
            }
        }
        Screen::Batch => {
            if let Some(b) = &app.batch {
                lines.push(format!("Batch: {} ({})", b.job_id, b.status.label()));
                if let Some(c) = &b.result {
                    lines.push(format!("Searched: {}", c.searched));
                    lines.push(format!("Downloaded: {}", c.downloaded));
                    lines.push(format!("Translated: {}", c.translated));
                    lines.push(format!("Remixed: {}", c.remixed));
                    lines.push(format!("Skipped: {}", c.skipped));
                    lines.push(format!("Failed: {}", c.failed));
                }
                if let Some(e) = &b.error {
                    lines.push(format!("Error: {e}"));
                }
            }
        }
        Screen::Bgm => {
            for m in &app.moods {
                lines.push(format!("{}: {}", m.label, m.description));
            }
        }
        Screen::Videos => {
            if let Some(v) = app.videos.get(app.ui.selected) {
                lines.push(v.title.clone());
                if let Some(t) = &v.translated_title {
                    lines.push(format!("Translated: {t}"));
                }
                for file in &v.files {
                    lines.push(format!("  {file}"));
                }
            }
        }
        Screen::Studio => {
            lines.push("Region, tone and TTS voice come".into());
            lines.push("from Settings.".into());
        }
        Screen::Settings => {
            lines.push(format!("Backend: {}", app.cfg.api.base_url));
            lines.push(format!("Log file: {}", app.cfg.log.file));
        }
    }

    lines.push(String::new());
    lines.push("Log:".into());
    let start = app.ui.log.len().saturating_sub(8);
    lines.extend(app.ui.log[start..].iter().cloned());
    lines.join("\n")
}

/// ステータスバーを構築する。
fn build_status_bar(app: &App) -> Paragraph<'static> {
    let backend = match app.ui.backend_up {
        Some(true) => "up",
        Some(false) => "DOWN",
        None => "checking",
    };
    let text = match &app.ui.error {
        Some(err) => format!("[{}] backend: {backend} | ERROR: {err}", app.ui.screen.title()),
        None => format!(
            "[{}] backend: {backend} | {}",
            app.ui.screen.title(),
            app.ui.status
        ),
    };
    let mut bar = Paragraph::new(text)
        .block(bordered("STATUS"))
        .wrap(Wrap { trim: true });
    if app.ui.error.is_some() || app.ui.backend_up == Some(false) {
        bar = bar.style(Style::default().fg(Color::Red));
    }
    bar
}

/// 現在画面に応じたヘルプ文字列を返す。
fn get_help_text(app: &App, sc: &Shortcuts) -> String {
    let k = format_keys;
    let global = format!(
        "{}/{}: screen | {}: refresh | {}: quit",
        k(&sc.global.prev_screen),
        k(&sc.global.next_screen),
        k(&sc.global.refresh),
        k(&sc.global.quit)
    );
    let form = format!(
        "{}: next field | {}: edit | {}: submit",
        k(&sc.form.next_field),
        k(&sc.form.edit),
        k(&sc.form.submit)
    );
    let screen = match app.ui.screen {
        Screen::Jobs => format!(
            "{}/{}: page | {}: open result | {}: watch | {}: watch id",
            k(&sc.jobs.prev_page),
            k(&sc.jobs.next_page),
            k(&sc.jobs.open_result),
            k(&sc.jobs.watch),
            k(&sc.jobs.watch_id)
        ),
        Screen::Accounts => format!(
            "{}: details | {}: new | {}: edit | {}: delete | {}: settings | {}: run now | {}: reload scheduler | {}: unschedule",
            k(&sc.list.open),
            k(&sc.list.new),
            k(&sc.accounts.edit),
            k(&sc.list.delete),
            k(&sc.accounts.settings),
            k(&sc.accounts.trigger),
            k(&sc.accounts.reload_scheduler),
            k(&sc.accounts.remove_schedule)
        ),
        Screen::AccountForm => format!("{form} | {}: back", k(&sc.form.cancel)),
        Screen::AccountSettings => format!(
            "{}/{}: field | {}/{}: adjust | {}: save | {}: voice sample | {}: back",
            k(&sc.panel.up),
            k(&sc.panel.down),
            k(&sc.panel.decrease),
            k(&sc.panel.increase),
            k(&sc.panel.save),
            k(&sc.panel.voice_preview),
            k(&sc.panel.cancel)
        ),
        Screen::Drafts => format!(
            "{}: open | {}: new | {}: delete | {}: filter",
            k(&sc.list.open),
            k(&sc.list.new),
            k(&sc.list.delete),
            k(&sc.list.filter)
        ),
        Screen::DraftEditor => format!(
            "{}: edit text | {}: regenerate | {}: play narration | {}: open visual | {}: upload | {}: finalize | {}: back",
            k(&sc.editor.edit_text),
            k(&sc.editor.regenerate),
            k(&sc.editor.play_tts),
            k(&sc.editor.open_media),
            k(&sc.editor.toggle_upload),
            k(&sc.editor.finalize),
            k(&sc.editor.back)
        ),
        Screen::CreateVideo => format!(
            "{}: next | {}: toggle | {}: back",
            k(&sc.wizard.proceed),
            k(&sc.wizard.toggle),
            k(&sc.wizard.back)
        ),
        Screen::Preview => format!(
            "{form} | {}: finalize | {}: play | {}/{}: recent | {}: load",
            k(&sc.list.action),
            k(&sc.jobs.open_result),
            k(&sc.preview.newer),
            k(&sc.preview.older),
            k(&sc.preview.load)
        ),
        Screen::Batch | Screen::Settings => form,
        Screen::Bgm if app.bgm_upload => format!("{form} | {}: back", k(&sc.form.cancel)),
        Screen::Bgm => format!("{}: play | {}: upload", k(&sc.list.open), k(&sc.list.form)),
        Screen::Videos => format!(
            "{}: delete | {}: subtitles | {}: filter",
            k(&sc.list.delete),
            k(&sc.list.action),
            k(&sc.list.filter)
        ),
        Screen::Studio => format!(
            "{form} | {}/{}: action",
            k(&sc.panel.decrease),
            k(&sc.panel.increase)
        ),
    };
    format!("{screen} | {global}")
}

/// ショートカットキーの配列を表示用文字列に変換する。
fn format_keys(keys: &[String]) -> String {
    keys.join("/")
}

fn yes_no(b: bool) -> &'static str {
    if b { "yes" } else { "no" }
}

/// 文字数で切り詰める。
fn clip(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

/// `2024-05-01T09:30:00` 形式を `05-01 09:30` へ短縮する。解釈できなければそのまま返す。
fn short_time(ts: &str) -> String {
    const SHORT: &str = "%m-%d %H:%M";
    if let Ok(t) = DateTime::parse_from_rfc3339(ts) {
        return t.format(SHORT).to_string();
    }
    match NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(t) => t.format(SHORT).to_string(),
        Err(_) => ts.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::{
            Envelope,
            types::{JobRecord, RecentJobs},
        },
        app::{handle_worker_event, test_support::app},
        status::JobStatus,
        worker::WorkerEvent,
    };
    use ratatui::{Terminal, backend::TestBackend, buffer::Buffer};

    fn job(i: usize) -> JobRecord {
        JobRecord {
            job_id: format!("job-{i:02}"),
            status: JobStatus::from("completed"),
            topic: Some("topic".into()),
            format: Some("shorts".into()),
            duration: Some(60),
            account_id: None,
            output_video_path: None,
            youtube_url: None,
            error_message: None,
            created_at: Some("2024-05-01T09:30:00".into()),
            completed_at: None,
        }
    }

    fn row_text(buf: &Buffer, area: Rect, y: u16) -> String {
        (area.x..area.x + area.width)
            .map(|x| buf[(x, y)].symbol())
            .collect()
    }

    /// Renders the jobs screen and checks it shows page 1 of 3 with 25 jobs.
    fn assert_first_of_three_pages(app: &App) {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();
        let buf = terminal.backend().buffer();

        let body = layout::create_body_layout(layout::create_main_layout(Rect::new(0, 0, 120, 40)).body);
        let (list, footer) = layout::split_footer(body.main);
        let rows = (list.y..list.y + list.height)
            .filter(|y| row_text(buf, list, *y).contains("job-0"))
            .count();
        assert_eq!(rows, 10);
        assert!(row_text(buf, list, list.y).contains("JOBS (25)"));
        assert!(row_text(buf, footer, footer.y).contains("‹ [1] 2  3  ›"));
    }

    #[test]
    fn jobs_screen_shows_one_page_and_pager() {
        let (mut app, _rx, _dir) = app();
        app.jobs = (0..10).map(job).collect();
        app.jobs_total = 25;
        app.pager.update(1, 3);
        assert_first_of_three_pages(&app);
    }

    #[tokio::test]
    async fn recent_jobs_response_renders_as_first_page() {
        let jobs: Vec<String> = (0..10)
            .map(|i| {
                format!(
                    r#"{{"job_id":"job-{i:02}","status":"completed","topic":"topic","created_at":"2024-05-01T09:30:00"}}"#
                )
            })
            .collect();
        let body = format!(
            r#"{{"success":true,"data":{{"jobs":[{}],"total":25,"total_pages":3}}}}"#,
            jobs.join(",")
        );
        let env: Envelope<RecentJobs> = serde_json::from_str(&body).unwrap();
        let recent = env.into_data().unwrap();

        let (mut app, _rx, _dir) = app();
        handle_worker_event(&mut app, WorkerEvent::JobsLoaded { page: 1, recent })
            .await
            .unwrap();

        assert_eq!(app.jobs.len(), 10);
        assert_eq!(app.pager.page, 1);
        assert_first_of_three_pages(&app);
    }

    #[test]
    fn status_bar_reports_backend_down_and_errors() {
        let (mut app, _rx, _dir) = app();
        app.ui.backend_up = Some(false);
        app.ui.error = Some("load jobs failed".into());

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();
        let buf = terminal.backend().buffer();

        let bar = layout::create_main_layout(Rect::new(0, 0, 120, 40)).status_bar;
        let text = row_text(buf, bar, bar.y + 1);
        assert!(text.contains("[Jobs] backend: DOWN | ERROR: load jobs failed"));
        assert_eq!(buf[(bar.x + 1, bar.y + 1)].fg, Color::Red);
    }

    #[test]
    fn timestamps_are_shortened() {
        assert_eq!(short_time("2024-05-01T09:30:12.123456"), "05-01 09:30");
        assert_eq!(short_time("2024-05-01T09:30:00+09:00"), "05-01 09:30");
        assert_eq!(short_time("yesterday"), "yesterday");
    }

    #[test]
    fn long_text_is_clipped() {
        assert_eq!(clip("abc", 5), "abc");
        assert_eq!(clip("abcdefgh", 5), "abcd…");
    }
}
