//! Page navigation window
//!
//! A bar of page links shows at most `max_visible` page numbers centered on
//! the current page, with ellipses when pages are hidden on either side and
//! first/previous/next/last controls.

/// Default number of page numbers shown at once
pub const DEFAULT_MAX_VISIBLE_PAGES: usize = 5;

/// What a page navigation bar shows
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageWindow {
    /// Visible page numbers, ascending
    pub pages: Vec<usize>,
    /// Pages before the first visible one are hidden
    pub leading_ellipsis: bool,
    /// Pages after the last visible one are hidden
    pub trailing_ellipsis: bool,
    /// First and previous controls are enabled
    pub can_go_back: bool,
    /// Next and last controls are enabled
    pub can_go_forward: bool,
}

/// Visible page numbers around `current`
///
/// When `current` is near either end the window slides so that it still
/// shows `max_visible` pages (or all of them, if there are fewer).
#[must_use]
pub fn page_window(current: usize, page_count: usize, max_visible: usize) -> PageWindow {
    if page_count == 0 {
        return PageWindow::default();
    }

    let max_visible = max_visible.clamp(1, page_count);
    let current = current.clamp(1, page_count);
    let half = max_visible / 2;

    let mut start = current.saturating_sub(half).max(1);
    let end = start.saturating_add(max_visible - 1).min(page_count);
    if end - start < max_visible - 1 {
        start = end.saturating_sub(max_visible - 1).max(1);
    }

    PageWindow {
        pages: (start..=end).collect(),
        leading_ellipsis: start > 1,
        trailing_ellipsis: end < page_count,
        can_go_back: current > 1,
        can_go_forward: current < page_count,
    }
}

/// Whether `total` entities need more than one page
#[must_use]
pub const fn show_pagination(total: usize, page_size: usize) -> bool {
    let page_size = if page_size == 0 { 1 } else { page_size };
    total > page_size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_few_pages_show_all() {
        let window = page_window(1, 2, 5);
        assert_eq!(window.pages, vec![1, 2]);
        assert!(!window.leading_ellipsis);
        assert!(!window.trailing_ellipsis);
        assert!(!window.can_go_back);
        assert!(window.can_go_forward);
    }

    #[test]
    fn test_window_centered() {
        let window = page_window(6, 10, 5);
        assert_eq!(window.pages, vec![4, 5, 6, 7, 8]);
        assert!(window.leading_ellipsis);
        assert!(window.trailing_ellipsis);
        assert!(window.can_go_back);
        assert!(window.can_go_forward);
    }

    #[test]
    fn test_window_slides_at_edges() {
        assert_eq!(page_window(1, 10, 5).pages, vec![1, 2, 3, 4, 5]);
        assert_eq!(page_window(2, 10, 5).pages, vec![1, 2, 3, 4, 5]);

        let last = page_window(10, 10, 5);
        assert_eq!(last.pages, vec![6, 7, 8, 9, 10]);
        assert!(last.leading_ellipsis);
        assert!(!last.trailing_ellipsis);
        assert!(!last.can_go_forward);

        assert_eq!(page_window(9, 10, 5).pages, vec![6, 7, 8, 9, 10]);
    }

    #[test]
    fn test_even_window() {
        assert_eq!(page_window(5, 10, 4).pages, vec![3, 4, 5, 6]);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(page_window(3, 0, 5), PageWindow::default());
        assert_eq!(page_window(0, 3, 5).pages, vec![1, 2, 3]);
        assert_eq!(page_window(9, 3, 5).pages, vec![1, 2, 3]);
        assert_eq!(page_window(2, 3, 0).pages, vec![2]);
    }

    #[test]
    fn test_show_pagination() {
        assert!(!show_pagination(0, 20));
        assert!(!show_pagination(20, 20));
        assert!(show_pagination(21, 20));
        assert!(show_pagination(2, 0));
    }

    #[test]
    fn test_huge_max_visible_shows_every_page() {
        let window = page_window(4, 7, usize::MAX);
        assert_eq!(window.pages, vec![1, 2, 3, 4, 5, 6, 7]);
        assert!(!window.leading_ellipsis);
        assert!(!window.trailing_ellipsis);

        let window = page_window(usize::MAX, usize::MAX, 5);
        assert_eq!(window.pages.len(), 5);
        assert_eq!(window.pages.last(), Some(&usize::MAX));
        assert!(!window.can_go_forward);
    }
}
