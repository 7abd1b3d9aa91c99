//! Virtual-scroll windowing.
//!
//! Given a scroll offset, a viewport size, and per-item sizes, compute the
//! index range to render plus the pixel offset needed to align the first
//! rendered item. Only this window of a large sheet is ever materialized.

/// Fallback size for items without a measured size.
pub const DEFAULT_ITEM_SIZE: f64 = 24.0;

/// Number of off-screen items rendered on each side of the viewport.
pub const DEFAULT_BUFFER: usize = 5;

/// A renderable window: item indices `[start, end)` and the pixel offset of
/// item `start` from the top of the content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleRange {
    pub start: usize,
    pub end: usize,
    pub offset: f64,
}

fn size_of(item_sizes: &[f64], i: usize) -> f64 {
    match item_sizes.get(i) {
        Some(&s) if s > 0.0 => s,
        _ => DEFAULT_ITEM_SIZE,
    }
}

/// Compute the visible window.
///
/// Guarantees `0 <= start <= end <= item_sizes.len()`, and that both bounds
/// are monotonically non-decreasing in `scroll_offset` for fixed sizes. A
/// scroll offset past the end of the content clamps to the tail instead of
/// wrapping back to the first item.
pub fn visible_range(
    scroll_offset: f64,
    viewport_size: f64,
    item_sizes: &[f64],
    buffer: usize,
) -> VisibleRange {
    let len = item_sizes.len();

    // Walk until the running total passes the scroll offset; that item is the
    // first one (partially) on screen.
    let mut first = len;
    let mut cumulative = 0.0;
    for i in 0..len {
        let size = size_of(item_sizes, i);
        if cumulative + size > scroll_offset {
            first = i;
            break;
        }
        cumulative += size;
    }

    let start = first.saturating_sub(buffer);
    // Align to the buffered start: back off one buffered item's size at a time.
    let mut offset = cumulative;
    for i in start..first {
        offset -= size_of(item_sizes, i);
    }
    let offset = offset.max(0.0);

    // Consume items until the viewport (plus buffer slack) is covered.
    let mut end = start;
    let mut remaining = viewport_size + buffer as f64 * DEFAULT_ITEM_SIZE;
    while end < len && remaining > 0.0 {
        remaining -= size_of(item_sizes, end);
        end += 1;
    }

    VisibleRange { start, end: (end + buffer).min(len), offset }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(n: usize) -> Vec<f64> {
        vec![24.0; n]
    }

    #[test]
    fn test_top_of_list() {
        let sizes = uniform(100);
        let range = visible_range(0.0, 240.0, &sizes, 5);
        assert_eq!(range.start, 0);
        assert_eq!(range.offset, 0.0);
        // 240px viewport + 5*24 slack = 15 items, + 5 buffer after
        assert_eq!(range.end, 20);
    }

    #[test]
    fn test_scrolled_window() {
        let sizes = uniform(100);
        // 480px down = item 20 first visible, minus 5 buffer
        let range = visible_range(480.0, 240.0, &sizes, 5);
        assert_eq!(range.start, 15);
        assert!(range.end > range.start);
        assert_eq!(range.offset, 15.0 * 24.0);
    }

    #[test]
    fn test_bounds_invariant() {
        let sizes = uniform(10);
        for step in 0..60 {
            let range = visible_range(step as f64 * 10.0, 120.0, &sizes, 5);
            assert!(range.start <= range.end);
            assert!(range.end <= sizes.len());
        }
    }

    #[test]
    fn test_past_end_clamps_to_tail() {
        let sizes = uniform(10); // 240px of content
        let range = visible_range(10_000.0, 120.0, &sizes, 2);
        assert_eq!(range.start, 8);
        assert_eq!(range.end, 10);
    }

    #[test]
    fn test_monotonic_in_scroll_offset() {
        let sizes: Vec<f64> = (0..200).map(|i| 16.0 + (i % 7) as f64 * 8.0).collect();
        let mut prev_start = 0;
        let mut prev_end = 0;
        for step in 0..500 {
            let range = visible_range(step as f64 * 13.0, 300.0, &sizes, 5);
            assert!(range.start >= prev_start, "start regressed at step {step}");
            assert!(range.end >= prev_end, "end regressed at step {step}");
            prev_start = range.start;
            prev_end = range.end;
        }
    }

    #[test]
    fn test_unsized_items_default() {
        let sizes = vec![0.0; 20];
        let range = visible_range(48.0, 96.0, &sizes, 0);
        // zero-size entries count as 24px each
        assert_eq!(range.start, 2);
        assert_eq!(range.end, 6);
    }

    #[test]
    fn test_empty_list() {
        let range = visible_range(100.0, 240.0, &[], 5);
        assert_eq!(range, VisibleRange { start: 0, end: 0, offset: 0.0 });
    }
}
