//! Pagination state for the logs page

use chrono::{DateTime, NaiveDate, Utc};

/// 1-based pager over a server-side total.
///
/// Page requests past the last page are unrepresentable: `next()` refuses to
/// advance when `has_next()` is false.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

impl Pager {
    /// A pager positioned on the first page
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            total: 0,
        }
    }

    /// Number of pages; an empty result set still has one page
    pub fn page_count(&self) -> u32 {
        let size = self.page_size as u64;
        let pages = self.total.div_ceil(size);
        pages.max(1) as u32
    }

    /// Offset to request for the current page
    pub fn offset(&self) -> u32 {
        (self.page - 1) * self.page_size
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count()
    }

    /// Move one page forward if possible
    pub fn next(&mut self) -> bool {
        if self.has_next() {
            self.page += 1;
            true
        } else {
            false
        }
    }

    /// Move one page back if possible
    pub fn prev(&mut self) -> bool {
        if self.has_prev() {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    /// Record a fresh total, clamping the current page into range
    pub fn set_total(&mut self, total: u64) {
        self.total = total;
        self.page = self.page.min(self.page_count());
    }

    /// Change the page size and reset to the first page
    pub fn set_page_size(&mut self, page_size: u32) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }
}

/// Expand a calendar date to the start-of-day bound used by the date-from
/// filter.
pub fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc()
}

/// Expand a calendar date to the end-of-day bound used by the date-to filter.
pub fn day_end(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(23, 59, 59)
        .expect("23:59:59 is always valid")
        .and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count_rounds_up() {
        let pager = Pager {
            page: 1,
            page_size: 25,
            total: 57,
        };
        assert_eq!(pager.page_count(), 3);
    }

    #[test]
    fn test_page_past_last_is_unreachable() {
        let mut pager = Pager {
            page: 3,
            page_size: 25,
            total: 57,
        };
        assert!(!pager.has_next());
        assert!(!pager.next());
        assert_eq!(pager.page, 3);
    }

    #[test]
    fn test_prev_disabled_on_first_page() {
        let mut pager = Pager::new(25);
        assert!(!pager.has_prev());
        assert!(!pager.prev());
        assert_eq!(pager.page, 1);
    }

    #[test]
    fn test_offset_follows_page() {
        let mut pager = Pager {
            page: 1,
            page_size: 25,
            total: 57,
        };
        assert_eq!(pager.offset(), 0);
        pager.next();
        assert_eq!(pager.offset(), 25);
        pager.next();
        assert_eq!(pager.offset(), 50);
    }

    #[test]
    fn test_empty_total_still_one_page() {
        let pager = Pager::new(25);
        assert_eq!(pager.page_count(), 1);
        assert!(!pager.has_next());
    }

    #[test]
    fn test_set_total_clamps_current_page() {
        let mut pager = Pager {
            page: 3,
            page_size: 25,
            total: 57,
        };
        pager.set_total(30);
        assert_eq!(pager.page, 2);
    }

    #[test]
    fn test_day_bounds() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(day_start(date).to_rfc3339(), "2024-03-05T00:00:00+00:00");
        assert_eq!(day_end(date).to_rfc3339(), "2024-03-05T23:59:59+00:00");
    }
}
