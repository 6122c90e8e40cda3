//! Page navigation for the recent jobs list.

use std::ops::RangeInclusive;

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

/// Rows requested per page of `/api/jobs/recent`.
pub const PAGE_SIZE: u32 = 10;

/// Number of page buttons shown at once.
const WINDOW: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    /// 1-based current page.
    pub page: u32,
    pub total_pages: u32,
}

impl Default for Pager {
    fn default() -> Self {
        Self {
            page: 1,
            total_pages: 0,
        }
    }
}

impl Pager {
    /// Record what the backend reported for the page just loaded.
    pub fn update(&mut self, page: u32, total_pages: u32) {
        self.total_pages = total_pages;
        self.page = page.clamp(1, total_pages.max(1));
    }

    pub fn next(&self) -> Option<u32> {
        (self.page < self.total_pages).then_some(self.page + 1)
    }

    pub fn prev(&self) -> Option<u32> {
        (self.page > 1).then_some(self.page - 1)
    }

    /// Pages to show as buttons, centered on the current page.
    pub fn window(&self) -> RangeInclusive<u32> {
        let total = self.total_pages.max(1);
        if total <= WINDOW {
            return 1..=total;
        }
        let half = WINDOW / 2;
        let start = self.page.saturating_sub(half).max(1).min(total - WINDOW + 1);
        start..=start + WINDOW - 1
    }

    /// `‹ [1] 2 3 ›` with the current page highlighted.
    pub fn line(&self) -> Line<'static> {
        let dim = Style::default().add_modifier(Modifier::DIM);
        let mut spans = vec![Span::styled(
            "‹ ",
            if self.prev().is_some() { Style::default() } else { dim },
        )];
        for p in self.window() {
            if p == self.page {
                spans.push(Span::styled(
                    format!("[{p}]"),
                    Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED),
                ));
            } else {
                spans.push(Span::raw(format!(" {p} ")));
            }
        }
        spans.push(Span::styled(
            " ›",
            if self.next().is_some() { Style::default() } else { dim },
        ));
        Line::from(spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_pages_show_all_with_first_active() {
        let mut p = Pager::default();
        p.update(1, 3);
        assert_eq!(p.window(), 1..=3);
        assert_eq!(p.prev(), None);
        assert_eq!(p.next(), Some(2));
        let text: String = p.line().spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "‹ [1] 2  3  ›");
    }

    #[test]
    fn window_follows_current_page() {
        let mut p = Pager::default();
        p.update(10, 20);
        assert_eq!(p.window(), 7..=13);
        p.update(20, 20);
        assert_eq!(p.window(), 14..=20);
        p.update(2, 20);
        assert_eq!(p.window(), 1..=7);
    }

    #[test]
    fn empty_result_stays_on_page_one() {
        let mut p = Pager::default();
        p.update(4, 0);
        assert_eq!(p.page, 1);
        assert_eq!(p.window(), 1..=1);
        assert_eq!(p.next(), None);
    }
}
