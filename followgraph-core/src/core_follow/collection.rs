//! Collection wire shape

use serde::{Deserialize, Serialize};

use crate::core_graph::{EdgeDirection, Person, PERSON_OBJECT_TYPE};
use crate::core_pagination::PageLinks;

/// Which of an actor's two collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Followers,
    Following,
}

impl CollectionKind {
    pub fn direction(&self) -> EdgeDirection {
        match self {
            CollectionKind::Followers => EdgeDirection::Followers,
            CollectionKind::Following => EdgeDirection::Following,
        }
    }

    /// Path segment under `/api/user/{nickname}/`
    pub fn path_segment(&self) -> &'static str {
        self.direction().as_str()
    }

    fn title_prefix(&self) -> &'static str {
        match self {
            CollectionKind::Followers => "Followers for",
            CollectionKind::Following => "Following for",
        }
    }

    pub fn display_name(&self, subject: &str) -> String {
        format!("{} {}", self.title_prefix(), subject)
    }
}

/// One page of an actor's followers or following. Built per request,
/// never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub display_name: String,
    pub author: Person,
    pub total_items: usize,
    pub items: Vec<Person>,
    pub items_per_page: usize,
    pub start_index: usize,
    pub links: PageLinks,
    pub object_types: Vec<String>,
}

impl Collection {
    pub(crate) fn person_object_types() -> Vec<String> {
        vec![PERSON_OBJECT_TYPE.to_string()]
    }
}
