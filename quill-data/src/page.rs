use serde::Serialize;

use crate::model::Limit;

/// Pagination window over a counted result set.
///
/// Page indices are 1-based. When the set is empty or the requested page
/// is past the end, the window collapses to page 1 with a zero limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub item_count: u64,
    pub page_index: u64,
    pub page_size: u64,
    pub page_count: u64,
    pub offset: u64,
    pub limit: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl Page {
    pub const DEFAULT_SIZE: u64 = 10;

    pub fn new(item_count: u64, page_index: u64, page_size: u64) -> Self {
        let page_size = page_size.max(1);
        let page_count = item_count.div_ceil(page_size);
        let (page_index, offset, limit) = if item_count == 0 || page_index > page_count {
            (1, 0, 0)
        } else {
            let index = page_index.max(1);
            (index, page_size * (index - 1), page_size)
        };
        Self {
            item_count,
            page_index,
            page_size,
            page_count,
            offset,
            limit,
            has_next: page_index < page_count,
            has_previous: page_index > 1,
        }
    }

    /// True when there is nothing to fetch for this page.
    pub fn is_empty(&self) -> bool {
        self.limit == 0
    }

    /// The `find_all` limit selecting this page.
    pub fn to_limit(&self) -> Limit {
        Limit::Range {
            offset: self.offset,
            count: self.limit,
        }
    }
}

/// A page of results with its pagination window.
#[derive(Debug, Clone, Serialize)]
pub struct Paged<T> {
    pub page: Page,
    pub items: Vec<T>,
}

impl<T> Paged<T> {
    pub fn new(page: Page, items: Vec<T>) -> Self {
        Self { page, items }
    }

    pub fn empty(page: Page) -> Self {
        Self {
            page,
            items: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middle_page() {
        let page = Page::new(91, 3, 10);
        assert_eq!(page.page_count, 10);
        assert_eq!(page.offset, 20);
        assert_eq!(page.limit, 10);
        assert!(page.has_next);
        assert!(page.has_previous);
        assert_eq!(page.to_limit(), Limit::Range { offset: 20, count: 10 });
    }

    #[test]
    fn last_page() {
        let page = Page::new(91, 10, 10);
        assert_eq!(page.offset, 90);
        assert!(!page.has_next);
    }

    #[test]
    fn empty_or_out_of_range() {
        for page in [Page::new(0, 1, 10), Page::new(5, 4, 10)] {
            assert_eq!(page.page_index, 1);
            assert_eq!(page.offset, 0);
            assert!(page.is_empty());
            assert!(!page.has_next);
            assert!(!page.has_previous);
        }
    }
}
