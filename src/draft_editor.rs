//! Local state of the draft timeline editor.
//!
//! The editor never changes a segment on its own: edits are sent to the
//! backend and only the server-confirmed segment is written back.

use crate::{
    api::types::{BgmSettings, DraftProject, FinalizeDraftRequest, Segment, UpdateSegmentRequest},
    config::FinalizeCfg,
};

#[derive(Debug, Clone, PartialEq)]
pub struct DraftEditor {
    pub project: DraftProject,
    pub selected: usize,
    /// Finalize upload flag, toggled on the editor screen.
    pub upload: bool,
}

impl DraftEditor {
    pub fn new(project: DraftProject, upload: bool) -> Self {
        Self {
            project,
            selected: 0,
            upload,
        }
    }

    pub fn draft_id(&self) -> &str {
        &self.project.draft_id
    }

    pub fn selected_segment(&self) -> Option<&Segment> {
        self.project.segments.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.project.segments.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Update request for the selected segment's text, or `None` when the
    /// text did not change.
    pub fn text_update(&self, text: &str) -> Option<(u32, UpdateSegmentRequest)> {
        let seg = self.selected_segment()?;
        if seg.text == text {
            return None;
        }
        Some((
            seg.segment_index,
            UpdateSegmentRequest {
                text: Some(text.to_string()),
                ..Default::default()
            },
        ))
    }

    /// Write a server-confirmed segment back. Only the segment with the same
    /// index is touched; returns false if no such segment is loaded.
    pub fn apply_segment(&mut self, confirmed: Segment) -> bool {
        match self
            .project
            .segments
            .iter_mut()
            .find(|s| s.segment_index == confirmed.segment_index)
        {
            Some(slot) => {
                *slot = confirmed;
                true
            }
            None => false,
        }
    }

    /// Swap in a freshly fetched draft, keeping the selection in bounds.
    pub fn replace_project(&mut self, project: DraftProject) {
        self.project = project;
        let last = self.project.segments.len().saturating_sub(1);
        self.selected = self.selected.min(last);
    }

    pub fn total_duration(&self) -> f64 {
        self.project
            .segments
            .iter()
            .filter_map(|s| s.tts_duration.or(s.duration))
            .sum()
    }

    pub fn finalize_request(&self, cfg: &FinalizeCfg) -> FinalizeDraftRequest {
        FinalizeDraftRequest {
            upload: self.upload,
            template: Some(cfg.template.clone()),
            bgm_settings: BgmSettings {
                enabled: cfg.bgm_enabled,
                mood: cfg.bgm_mood.clone(),
                volume: cfg.bgm_volume,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::DraftStatus;

    fn segment(i: u32, text: &str) -> Segment {
        Segment {
            segment_index: i,
            text: text.into(),
            keyword: Some(format!("kw{i}")),
            image_search_query: None,
            duration: Some(5.0),
            video_url: None,
            video_local_path: None,
            video_provider: None,
            tts_local_path: None,
            tts_duration: None,
        }
    }

    fn editor() -> DraftEditor {
        let project = DraftProject {
            draft_id: "d1".into(),
            topic: "space".into(),
            title: "Space facts".into(),
            description: None,
            tags: vec![],
            format: "shorts".into(),
            target_duration: 15,
            status: DraftStatus::AssetsReady,
            segments: vec![segment(0, "one"), segment(1, "two"), segment(2, "three")],
            created_at: String::new(),
            updated_at: String::new(),
        };
        DraftEditor::new(project, false)
    }

    #[test]
    fn confirmed_segment_replaces_only_its_slot() {
        let mut ed = editor();
        let before = ed.project.segments.clone();

        let mut confirmed = segment(1, "two, rewritten by server");
        confirmed.tts_duration = Some(4.2);
        assert!(ed.apply_segment(confirmed.clone()));

        assert_eq!(ed.project.segments[1], confirmed);
        assert_eq!(ed.project.segments[0], before[0]);
        assert_eq!(ed.project.segments[2], before[2]);
    }

    #[test]
    fn unknown_segment_index_is_ignored() {
        let mut ed = editor();
        let before = ed.project.clone();
        assert!(!ed.apply_segment(segment(9, "x")));
        assert_eq!(ed.project, before);
    }

    #[test]
    fn unchanged_text_sends_nothing() {
        let mut ed = editor();
        ed.select_next();
        assert_eq!(ed.text_update("two"), None);
        let (idx, body) = ed.text_update("2").unwrap();
        assert_eq!(idx, 1);
        assert_eq!(body.text.as_deref(), Some("2"));
        assert_eq!(body.keyword, None);
    }

    #[test]
    fn finalize_uses_configured_defaults() {
        let ed = editor();
        let req = ed.finalize_request(&crate::config::Config::default().finalize);
        assert_eq!(req.template.as_deref(), Some("basic"));
        assert_eq!(req.bgm_settings.mood, "auto");
        assert_eq!(req.bgm_settings.volume, 0.25);
        assert!(!req.upload);
    }

    #[test]
    fn reload_keeps_selection_in_bounds() {
        let mut ed = editor();
        ed.selected = 2;
        let mut shorter = ed.project.clone();
        shorter.segments.truncate(1);
        ed.replace_project(shorter);
        assert_eq!(ed.selected, 0);
        assert!((ed.total_duration() - 5.0).abs() < f64::EPSILON);
    }
}
