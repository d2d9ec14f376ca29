//! Collection navigation links

use serde::{Deserialize, Serialize};

use super::page::PageWindow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
}

impl Link {
    fn paged(base: &str, offset: usize, count: usize) -> Self {
        Link {
            href: format!("{}?offset={}&count={}", base, offset, count),
        }
    }
}

/// `self` and `current` always point at the request itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLinks {
    #[serde(rename = "self")]
    pub self_link: Link,
    pub current: Link,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub next: Option<Link>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub prev: Option<Link>,
}

pub fn build_links(base: &str, window: &PageWindow) -> PageLinks {
    let count = window.request.count;
    let own = Link::paged(base, window.request.offset, count);
    PageLinks {
        self_link: own.clone(),
        current: own,
        next: window.next_offset().map(|offset| Link::paged(base, offset, count)),
        prev: window.prev_offset().map(|offset| Link::paged(base, offset, count)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_pagination::PageRequest;

    const BASE: &str = "http://localhost:4815/api/user/nymeria/followers";

    #[test]
    fn test_interior_links() {
        let window = PageWindow::compute(PageRequest::new(20, 20).unwrap(), 100);
        let links = build_links(BASE, &window);

        assert_eq!(links.self_link.href, format!("{}?offset=20&count=20", BASE));
        assert_eq!(links.current, links.self_link);
        assert_eq!(links.next.unwrap().href, format!("{}?offset=40&count=20", BASE));
        assert_eq!(links.prev.unwrap().href, format!("{}?offset=0&count=20", BASE));
    }

    #[test]
    fn test_absent_links_are_omitted() {
        let window = PageWindow::compute(PageRequest::new(0, 200).unwrap(), 100);
        let json = serde_json::to_value(build_links(BASE, &window)).unwrap();

        assert!(json.get("self").is_some());
        assert!(json.get("current").is_some());
        assert!(json.get("next").is_none());
        assert!(json.get("prev").is_none());
    }
}
