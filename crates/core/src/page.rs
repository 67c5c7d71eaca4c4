//! In-memory pagination helper.

use serde::Serialize;

use crate::error::{DomainError, DomainResult};

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub size: usize,
    pub total_elements: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Slice `items` into page `page` (1-based) of `size` elements.
    ///
    /// Requesting a page past the end is rejected, except page 1 of an empty
    /// result set, which returns an empty page.
    pub fn slice(items: Vec<T>, page: usize, size: usize) -> DomainResult<Self> {
        if page == 0 || size == 0 {
            return Err(DomainError::validation("page and size must be positive"));
        }

        let total_elements = items.len();
        let total_pages = total_elements.div_ceil(size);
        if page > total_pages && !(page == 1 && total_elements == 0) {
            return Err(DomainError::PageOutOfBounds {
                requested: page,
                total: total_pages,
            });
        }

        let start = (page - 1) * size;
        let items = items
            .into_iter()
            .skip(start)
            .take(size)
            .collect();

        Ok(Self {
            items,
            page,
            size,
            total_elements,
            total_pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_and_counts_pages() {
        let page = Page::slice((0..10).collect(), 2, 4).unwrap();
        assert_eq!(page.items, vec![4, 5, 6, 7]);
        assert_eq!(page.total_elements, 10);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn rejects_page_out_of_bounds() {
        let err = Page::slice(vec![1, 2, 3], 5, 2).unwrap_err();
        assert!(matches!(err, DomainError::PageOutOfBounds { .. }));
    }

    #[test]
    fn first_page_of_empty_set_is_allowed() {
        let page = Page::<i32>::slice(vec![], 1, 10).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn rejects_zero_page_or_size() {
        assert!(Page::slice(vec![1], 0, 10).is_err());
        assert!(Page::slice(vec![1], 1, 0).is_err());
    }
}
