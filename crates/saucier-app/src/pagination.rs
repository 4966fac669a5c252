//! Page arithmetic for recipe lists.

use std::ops::Range;

/// Recipes per page.
pub const PAGE_SIZE: usize = 20;

/// Page-number strips with more pages than this collapse with gaps.
const MAX_VISIBLE_PAGES: usize = 5;

/// Entry of the page-number strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(usize),
    Gap,
}

/// Number of pages for `count` items. Zero items means zero pages.
pub fn total_pages(count: usize) -> usize {
    count.div_ceil(PAGE_SIZE)
}

/// Keeps `page` inside `[1, total]`, with page 1 as the floor when there
/// are no pages at all.
pub fn clamp_page(page: usize, total: usize) -> usize {
    page.clamp(1, total.max(1))
}

/// Indices of the items shown on `page` (1-based).
pub fn page_range(page: usize, count: usize) -> Range<usize> {
    let start = page.saturating_sub(1).saturating_mul(PAGE_SIZE).min(count);
    let end = start.saturating_add(PAGE_SIZE).min(count);
    start..end
}

/// "Showing X to Y of Z": 1-based first and last item on `page`, and the
/// total. `None` when nothing is shown.
pub fn showing(page: usize, count: usize) -> Option<(usize, usize, usize)> {
    let range = page_range(page, count);
    (!range.is_empty()).then(|| (range.start + 1, range.end, count))
}

/// Page-number strip around `current`.
///
/// Short lists show every page. Longer ones keep the first and last page
/// and a window near the current one, with gaps in between.
pub fn page_numbers(current: usize, total: usize) -> Vec<PageItem> {
    if total <= MAX_VISIBLE_PAGES {
        return (1..=total).map(PageItem::Page).collect();
    }

    let pages = |range: Range<usize>| range.map(PageItem::Page);
    let mut items = Vec::with_capacity(MAX_VISIBLE_PAGES + 2);

    if current <= 3 {
        items.extend(pages(1..5));
        items.push(PageItem::Gap);
        items.push(PageItem::Page(total));
    } else if current >= total - 2 {
        items.push(PageItem::Page(1));
        items.push(PageItem::Gap);
        items.extend(pages(total - 3..total + 1));
    } else {
        items.push(PageItem::Page(1));
        items.push(PageItem::Gap);
        items.extend(pages(current - 1..current + 2));
        items.push(PageItem::Gap);
        items.push(PageItem::Page(total));
    }
    items
}
