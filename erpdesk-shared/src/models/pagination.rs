//! Page-number helpers shared by every paginated listing.

/// Page numbers a pager should offer around `current`.
///
/// At most `max_visible` pages are returned. The window is centred on
/// `current` and slides so it stays full near either end.
#[must_use]
pub fn page_window(current: u32, total_pages: u32, max_visible: u32) -> Vec<u32> {
    if max_visible == 0 || total_pages == 0 {
        return Vec::new();
    }
    if total_pages <= max_visible {
        return (1..=total_pages).collect();
    }

    let current = clamp_page(current, total_pages);
    let half = max_visible / 2;
    let mut start = current.saturating_sub(half).max(1);
    let mut end = current.saturating_add(half).min(total_pages);

    if current <= half + 1 {
        end = max_visible.min(total_pages);
    }
    if current >= total_pages.saturating_sub(half) {
        start = (total_pages - max_visible + 1).max(1);
    }

    (start..=end).collect()
}

/// Clamp a requested page into `1..=total_pages` (a listing always has page 1).
#[must_use]
pub fn clamp_page(page: u32, total_pages: u32) -> u32 {
    page.clamp(1, total_pages.max(1))
}
