//! Page-number pagination shared by every feed.
//!
//! Out-of-range requests are clamped to the nearest valid page instead of failing: a
//! missing or non-numeric `?page=` is page 1, anything below 1 is page 1 and anything past
//! the end is the last page. An empty feed still has one (empty) page.

use serde::Serialize;

/// Posts per page on every feed.
pub const PAGE_SIZE: i64 = 10;

/// Parse the raw `?page=` query value.
pub fn parse_page_number(raw: Option<&str>) -> i64 {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .unwrap_or(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    per_page: i64,
    total_count: i64,
}

impl Paginator {
    pub fn new(total_count: i64) -> Self {
        Self::with_page_size(total_count, PAGE_SIZE)
    }

    pub fn with_page_size(total_count: i64, per_page: i64) -> Self {
        Self {
            per_page: per_page.max(1),
            total_count: total_count.max(0),
        }
    }

    pub fn num_pages(&self) -> i64 {
        if self.total_count == 0 {
            1
        } else {
            (self.total_count + self.per_page - 1) / self.per_page
        }
    }

    pub fn clamp(&self, requested: i64) -> i64 {
        requested.clamp(1, self.num_pages())
    }

    pub fn per_page(&self) -> i64 {
        self.per_page
    }

    /// Row offset of an already clamped page number.
    pub fn offset(&self, number: i64) -> i64 {
        (number - 1) * self.per_page
    }

    pub fn page<T>(&self, number: i64, items: Vec<T>) -> Page<T> {
        let num_pages = self.num_pages();
        Page {
            items,
            number,
            num_pages,
            total_count: self.total_count,
            has_next: number < num_pages,
            has_previous: number > 1,
        }
    }
}

/// A bounded slice of a feed plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: i64,
    pub num_pages: i64,
    pub total_count: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thirteen_items_make_two_pages() {
        let paginator = Paginator::new(13);
        assert_eq!(paginator.num_pages(), 2);
        assert_eq!(paginator.offset(2), 10);

        let page = paginator.page(2, vec![(); 3]);
        assert_eq!(page.len(), 3);
        assert!(page.has_previous);
        assert!(!page.has_next);
    }

    #[test]
    fn empty_feed_has_a_single_page() {
        let paginator = Paginator::new(0);
        assert_eq!(paginator.num_pages(), 1);
        assert_eq!(paginator.clamp(5), 1);
    }

    #[test]
    fn out_of_range_numbers_clamp_to_nearest_page() {
        let paginator = Paginator::new(25);
        assert_eq!(paginator.clamp(0), 1);
        assert_eq!(paginator.clamp(-3), 1);
        assert_eq!(paginator.clamp(99), 3);
        assert_eq!(paginator.clamp(2), 2);
    }

    #[test]
    fn page_parameter_parsing() {
        assert_eq!(parse_page_number(None), 1);
        assert_eq!(parse_page_number(Some("abc")), 1);
        assert_eq!(parse_page_number(Some(" 3 ")), 3);
        assert_eq!(parse_page_number(Some("-2")), -2);
    }
}
