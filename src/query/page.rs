//! Offset/limit arithmetic for SCIM list pagination (RFC 7644 §3.4.2.4).

use serde::Serialize;

/// Page size used when the client does not send a positive `count`.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// The window a list request reads from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    /// 1-based index echoed back as `startIndex`
    pub start_index: usize,
    pub offset: usize,
    pub limit: usize,
    pub total: usize,
}

impl PageWindow {
    /// Compute a window with the default page size.
    ///
    /// Inputs are signed because they come straight from query strings;
    /// a `start_index` below 1 reads from the beginning and a `count` that is
    /// absent, zero or negative falls back to [`DEFAULT_PAGE_SIZE`].
    pub fn compute(start_index: Option<i64>, count: Option<i64>, total: usize) -> Self {
        Self::compute_with_default(start_index, count, total, DEFAULT_PAGE_SIZE)
    }

    pub fn compute_with_default(
        start_index: Option<i64>,
        count: Option<i64>,
        total: usize,
        default_limit: usize,
    ) -> Self {
        let start_index = start_index.unwrap_or(1);
        let offset = usize::try_from(start_index.saturating_sub(1)).unwrap_or(0);
        let limit = count
            .filter(|count| *count > 0)
            .and_then(|count| usize::try_from(count).ok())
            .unwrap_or(default_limit);

        Self {
            start_index: offset + 1,
            offset,
            limit,
            total,
        }
    }

    /// Apply an upper bound to the limit, if one is configured.
    pub fn capped(mut self, max_limit: Option<usize>) -> Self {
        if let Some(max_limit) = max_limit {
            self.limit = self.limit.min(max_limit);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_defaults() {
        let window = PageWindow::compute(None, None, 300);
        assert_eq!(window.offset, 0);
        assert_eq!(window.limit, 100);
        assert_eq!(window.total, 300);
        assert_eq!(window.start_index, 1);
    }

    #[test]
    fn test_explicit_start_and_count() {
        let window = PageWindow::compute(Some(101), Some(200), 400);
        assert_eq!(
            window,
            PageWindow {
                start_index: 101,
                offset: 100,
                limit: 200,
                total: 400
            }
        );
    }

    #[test]
    fn test_non_positive_inputs() {
        let window = PageWindow::compute(Some(0), Some(0), 5);
        assert_eq!((window.offset, window.limit, window.start_index), (0, 100, 1));

        let window = PageWindow::compute(Some(-4), Some(-1), 5);
        assert_eq!((window.offset, window.limit), (0, 100));
    }

    #[test]
    fn test_capped() {
        let window = PageWindow::compute(None, Some(500), 10).capped(Some(50));
        assert_eq!(window.limit, 50);
        assert_eq!(PageWindow::compute(None, Some(5), 10).capped(None).limit, 5);
    }

    proptest! {
        #[test]
        fn prop_offset_is_start_minus_one(start in 1i64..1_000_000, count in 1i64..10_000, total in 0usize..1_000_000) {
            let window = PageWindow::compute(Some(start), Some(count), total);
            prop_assert_eq!(window.offset as i64, start - 1);
            prop_assert_eq!(window.limit as i64, count);
            prop_assert_eq!(window.total, total);
        }
    }
}
