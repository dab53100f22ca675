//! Page-number strip and bounds-checked page navigation for the companies list.

/// Records per page. Fixed by the server; only used for "showing X to Y".
pub const PAGE_SIZE: u64 = 10;

/// Pages shown on each side of the current page.
const WINDOW: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageToken {
    Page(u32),
    Ellipsis,
}

/// Compact page strip: first page, last page, and a window of
/// `current ± 2`, with an ellipsis wherever pages are skipped.
pub fn visible_pages(current: u32, total: u32) -> Vec<PageToken> {
    if total == 0 {
        return Vec::new();
    }
    let current = current.clamp(1, total);
    let start = current.saturating_sub(WINDOW).max(2);
    let end = (current + WINDOW).min(total.saturating_sub(1));

    let mut tokens = vec![PageToken::Page(1)];
    if current.saturating_sub(WINDOW) > 2 {
        tokens.push(PageToken::Ellipsis);
    }
    tokens.extend((start..=end).map(PageToken::Page));
    if current + WINDOW < total.saturating_sub(1) {
        tokens.push(PageToken::Ellipsis);
    }
    if total > 1 {
        tokens.push(PageToken::Page(total));
    }
    tokens
}

/// 1-based record range shown on `page`, or `None` when there is nothing to show.
pub fn showing_range(page: u32, total_count: u64) -> Option<(u64, u64)> {
    if page == 0 || total_count == 0 {
        return None;
    }
    let start = (page as u64 - 1) * PAGE_SIZE + 1;
    if start > total_count {
        return None;
    }
    let end = (page as u64 * PAGE_SIZE).min(total_count);
    Some((start, end))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    pub current: u32,
    pub total_pages: u32,
}

impl Pager {
    pub fn new(current: u32, total_pages: u32) -> Self {
        Self {
            current,
            total_pages,
        }
    }

    /// `Some(page)` when the request is allowed, `None` when it is out of bounds.
    pub fn goto(&self, page: u32) -> Option<u32> {
        (1..=self.total_pages).contains(&page).then_some(page)
    }

    pub fn previous(&self) -> Option<u32> {
        self.current.checked_sub(1).and_then(|p| self.goto(p))
    }

    pub fn next(&self) -> Option<u32> {
        self.goto(self.current.saturating_add(1))
    }

    pub fn first(&self) -> Option<u32> {
        self.goto(1)
    }

    pub fn last(&self) -> Option<u32> {
        self.goto(self.total_pages)
    }

    pub fn tokens(&self) -> Vec<PageToken> {
        visible_pages(self.current, self.total_pages)
    }
}
