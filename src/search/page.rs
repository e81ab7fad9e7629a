//! Page requests and page results.

use serde::{Deserialize, Serialize};

/// The window `[offset, offset + limit)` of an ordered result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    pub offset: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// Zero-based page number `page` of pages holding `size` rows
    pub fn of(page: u64, size: u64) -> Self {
        Self {
            offset: page.saturating_mul(size),
            limit: size,
        }
    }

    pub fn page_number(&self) -> u64 {
        if self.limit == 0 {
            0
        } else {
            self.offset / self.limit
        }
    }

    pub fn next(&self) -> Self {
        Self {
            offset: self.offset.saturating_add(self.limit),
            limit: self.limit,
        }
    }
}

/// One page of results and the size of the whole unpaged result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_count: u64,
    pub offset: u64,
    pub limit: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, total_count: u64, request: PageRequest) -> Self {
        Self {
            content,
            total_count,
            offset: request.offset,
            limit: request.limit,
        }
    }

    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.offset, self.limit)
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn page_number(&self) -> u64 {
        self.request().page_number()
    }

    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total_count.div_ceil(self.limit)
    }

    /// Whether rows remain after this page
    pub fn has_next(&self) -> bool {
        self.offset.saturating_add(self.content.len() as u64) < self.total_count
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total_count: self.total_count,
            offset: self.offset,
            limit: self.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_of() {
        assert_eq!(PageRequest::of(0, 10), PageRequest::new(0, 10));
        assert_eq!(PageRequest::of(3, 5), PageRequest::new(15, 5));
        assert_eq!(PageRequest::of(3, 5).page_number(), 3);
        assert_eq!(PageRequest::of(1, 5).next(), PageRequest::of(2, 5));
    }

    #[test]
    fn test_page_helpers() {
        let page = Page::new(vec![1, 2, 3], 7, PageRequest::of(1, 3));
        assert_eq!(page.total_pages(), 3);
        assert_eq!(page.page_number(), 1);
        assert!(page.has_next());

        let last = Page::new(vec![7], 7, PageRequest::of(2, 3));
        assert!(!last.has_next());
        assert_eq!(last.map(|v| v * 10).content, vec![70]);

        let past_end: Page<i32> = Page::new(Vec::new(), 7, PageRequest::new(100, 3));
        assert!(past_end.is_empty());
        assert!(!past_end.has_next());
    }
}
