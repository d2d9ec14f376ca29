//! Page requests and their clamped windows

use crate::errors::{GraphError, GraphResult};
use tracing::debug;

use super::links::{build_links, PageLinks};

/// Page size used when a request omits `count`
pub const DEFAULT_COUNT: usize = 20;

/// Offset and count as requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: usize,
    pub count: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            count: DEFAULT_COUNT,
        }
    }
}

impl PageRequest {
    /// `count` must be at least 1
    pub fn new(offset: usize, count: usize) -> GraphResult<Self> {
        if count == 0 {
            return Err(GraphError::BadRequest("count must be at least 1".to_string()));
        }
        Ok(Self { offset, count })
    }

    /// Parse raw query values. Absent values take their defaults; present
    /// values must be non-negative integers.
    pub fn parse(
        offset: Option<&str>,
        count: Option<&str>,
        default_count: usize,
    ) -> GraphResult<Self> {
        let offset = match offset {
            Some(raw) => parse_param("offset", raw)?,
            None => 0,
        };
        let count = match count {
            Some(raw) => parse_param("count", raw)?,
            None => default_count,
        };
        Self::new(offset, count)
    }
}

fn parse_param(name: &str, raw: &str) -> GraphResult<usize> {
    raw.trim().parse::<usize>().map_err(|_| {
        debug!(param = name, value = raw, "Rejected paging parameter");
        GraphError::BadRequest(format!("{} must be a non-negative integer, got {:?}", name, raw))
    })
}

/// A request clamped against a collection total
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// The request as received; links echo it
    pub request: PageRequest,
    /// Effective start, `min(offset, total)`
    pub start: usize,
    /// Items on this page
    pub len: usize,
    pub total: usize,
}

impl PageWindow {
    pub fn compute(request: PageRequest, total: usize) -> Self {
        let start = request.offset.min(total);
        let len = request.count.min(total - start);
        Self {
            request,
            start,
            len,
            total,
        }
    }

    pub fn has_next(&self) -> bool {
        self.start + self.len < self.total
    }

    pub fn has_prev(&self) -> bool {
        self.request.offset > 0
    }

    pub fn next_offset(&self) -> Option<usize> {
        self.has_next().then_some(self.start + self.len)
    }

    pub fn prev_offset(&self) -> Option<usize> {
        self.has_prev()
            .then(|| self.start.saturating_sub(self.request.count))
    }
}

/// Turns query parameters and collection totals into windows and links
#[derive(Debug, Clone, Copy)]
pub struct PaginationEngine {
    default_count: usize,
}

impl Default for PaginationEngine {
    fn default() -> Self {
        Self::new(DEFAULT_COUNT)
    }
}

impl PaginationEngine {
    pub fn new(default_count: usize) -> Self {
        Self {
            default_count: default_count.max(1),
        }
    }

    pub fn default_count(&self) -> usize {
        self.default_count
    }

    pub fn parse_request(&self, offset: Option<&str>, count: Option<&str>) -> GraphResult<PageRequest> {
        PageRequest::parse(offset, count, self.default_count)
    }

    pub fn window(&self, request: PageRequest, total: usize) -> PageWindow {
        PageWindow::compute(request, total)
    }

    /// Navigation links for `window` under the collection URL `base`
    pub fn links(&self, base: &str, window: &PageWindow) -> PageLinks {
        build_links(base, window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(offset: usize, count: usize, total: usize) -> PageWindow {
        PageWindow::compute(PageRequest::new(offset, count).unwrap(), total)
    }

    #[test]
    fn test_default_request() {
        let request = PageRequest::parse(None, None, DEFAULT_COUNT).unwrap();
        assert_eq!(request, PageRequest::default());
        assert_eq!(request.count, 20);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["abc", "-1", "1.5", ""] {
            assert!(PageRequest::parse(Some(bad), None, 20).is_err(), "offset {:?}", bad);
            assert!(PageRequest::parse(None, Some(bad), 20).is_err(), "count {:?}", bad);
        }
        let err = PageRequest::parse(None, Some("0"), 20).unwrap_err();
        assert!(matches!(err, GraphError::BadRequest(_)));
    }

    #[test]
    fn test_first_page_of_hundred() {
        let w = window(0, 20, 100);
        assert_eq!((w.start, w.len), (0, 20));
        assert_eq!(w.next_offset(), Some(20));
        assert_eq!(w.prev_offset(), None);
    }

    #[test]
    fn test_count_beyond_total() {
        let w = window(0, 200, 100);
        assert_eq!(w.len, 100);
        assert!(!w.has_next());
        assert!(!w.has_prev());
    }

    #[test]
    fn test_interior_page() {
        let w = window(20, 20, 100);
        assert_eq!(w.next_offset(), Some(40));
        assert_eq!(w.prev_offset(), Some(0));
    }

    #[test]
    fn test_offset_past_end() {
        let w = window(150, 20, 100);
        assert_eq!((w.start, w.len), (100, 0));
        assert!(!w.has_next());
        assert_eq!(w.prev_offset(), Some(80));
    }

    #[test]
    fn test_empty_collection() {
        let w = window(0, 20, 0);
        assert_eq!(w.len, 0);
        assert!(!w.has_next());
        assert!(!w.has_prev());
    }

    #[test]
    fn test_engine_uses_configured_default() {
        let engine = PaginationEngine::new(5);
        let request = engine.parse_request(Some("10"), None).unwrap();
        assert_eq!(request, PageRequest { offset: 10, count: 5 });
        assert_eq!(PaginationEngine::new(0).default_count(), 1);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_page_length(total in 0usize..500, offset in 0usize..600, count in 1usize..250) {
            let w = PageWindow::compute(PageRequest::new(offset, count).unwrap(), total);
            if offset <= total {
                prop_assert_eq!(w.len, count.min(total - offset));
            } else {
                prop_assert_eq!(w.len, 0);
            }
        }

        #[test]
        fn prop_link_presence(total in 0usize..500, offset in 0usize..600, count in 1usize..250) {
            let w = PageWindow::compute(PageRequest::new(offset, count).unwrap(), total);
            prop_assert_eq!(w.has_next(), offset + w.len < total);
            prop_assert_eq!(w.has_prev(), offset > 0);
        }

        #[test]
        fn prop_next_pages_cover_collection(total in 0usize..300, count in 1usize..50) {
            let mut offset = 0;
            let mut seen = 0;
            loop {
                let w = PageWindow::compute(PageRequest::new(offset, count).unwrap(), total);
                seen += w.len;
                match w.next_offset() {
                    Some(next) => offset = next,
                    None => break,
                }
            }
            prop_assert_eq!(seen, total);
        }
    }
}
