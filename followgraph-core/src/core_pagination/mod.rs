//! Offset/count paging over ordered adjacency scans
//!
//! A [`PageRequest`] comes from query parameters, [`PageWindow`] clamps it
//! against the collection total, and [`PageLinks`] carries the navigation
//! hrefs rendered into a collection.

mod links;
mod page;

pub use links::{build_links, Link, PageLinks};
pub use page::{PageRequest, PageWindow, PaginationEngine, DEFAULT_COUNT};
