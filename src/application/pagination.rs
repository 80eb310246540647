//! Offset pagination shared by repository implementations.

use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// One page of results plus the totals needed to render a pager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

/// Slice an already filtered and ordered list.
///
/// `page` and `page_size` of zero fall back to 1 and [`DEFAULT_PAGE_SIZE`].
/// `total_pages` is never below 1, and a page past the end is empty.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> PaginatedResult<T> {
    let page = page.max(1);
    let page_size = if page_size == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size
    };

    let total = items.len();
    let total_pages = total.div_ceil(page_size).max(1);
    let start = (page - 1).saturating_mul(page_size).min(total);
    let end = start.saturating_add(page_size).min(total);

    let items = items.into_iter().skip(start).take(end - start).collect();

    PaginatedResult {
        items,
        total,
        page,
        page_size,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_of_five() {
        let page = paginate((1..=5).collect(), 1, 2);
        assert_eq!(page.items, vec![1, 2]);
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn last_partial_page() {
        let page = paginate((1..=5).collect(), 3, 2);
        assert_eq!(page.items, vec![5]);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let page = paginate((1..=5).collect::<Vec<i32>>(), 9, 2);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 5);
        assert_eq!(page.page, 9);
    }

    #[test]
    fn empty_input_has_one_page() {
        let page = paginate(Vec::<i32>::new(), 1, 10);
        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
    }

    #[test]
    fn zero_values_fall_back_to_defaults() {
        let page = paginate((1..=30).collect::<Vec<i32>>(), 0, 0);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(page.items.len(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn unbounded_page_size_does_not_overflow() {
        let page = paginate((1..=3).collect::<Vec<i32>>(), 2, usize::MAX);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
    }
}
