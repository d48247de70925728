//! Result envelope of an entity search.

use serde_json::{Map, Value};

/// Total count, aggregations and the entities of one page.
///
/// `total` and `aggregations` describe the full matched set; `entities` may be
/// narrowed afterwards with [`EntitySearchResult::map_entities`] without
/// touching either.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySearchResult<C> {
    pub total: u64,
    pub aggregations: Map<String, Value>,
    pub page: u32,
    pub limit: Option<u32>,
    pub entities: C,
}

impl<C> EntitySearchResult<C> {
    pub fn new(
        total: u64,
        aggregations: Map<String, Value>,
        page: u32,
        limit: Option<u32>,
        entities: C,
    ) -> Self {
        Self {
            total,
            aggregations,
            page,
            limit,
            entities,
        }
    }

    pub fn entities(&self) -> &C {
        &self.entities
    }

    /// Replace the entity collection in place, keeping total and aggregations.
    pub fn map_entities(self, f: impl FnOnce(C) -> C) -> Self {
        Self {
            entities: f(self.entities),
            ..self
        }
    }
}
