// ============================
// storefront-backend-lib/src/catalog.rs
// ============================
//! Store catalog with keyset pagination.
//!
//! A cursor is the id of the last store on the previous page. The next page
//! starts strictly after that store's `(sort key, id)` position, so pages
//! never overlap or skip entries.
use std::cmp::Ordering;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use storefront_common::{Page, Store};
use thiserror::Error;

use crate::storage::StoreError;

/// Column a listing is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Id,
    Name,
    CreatedAt,
}

/// Listing direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// A validated page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: usize,
    pub cursor: Option<u64>,
    pub sort: SortKey,
    pub order: SortOrder,
}

/// Rejected listing parameters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    #[error("limit must be between 1 and {max}")]
    InvalidLimit { max: usize },

    #[error("cursor is not valid")]
    InvalidCursor,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Trait for catalog backends
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn list_stores(&self, request: &PageRequest) -> Result<Page<Store>, PageError>;
}

/// Catalog held fully in memory
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    stores: Vec<Store>,
}

impl MemoryCatalog {
    pub fn new(stores: Vec<Store>) -> Self {
        Self { stores }
    }

    /// Load stores from a JSON array file
    pub async fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        let stores: Vec<Store> = serde_json::from_str(&raw)?;
        Ok(Self::new(stores))
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

fn compare(a: &Store, b: &Store, sort: SortKey) -> Ordering {
    let primary = match sort {
        SortKey::Id => Ordering::Equal,
        SortKey::Name => a.name.cmp(&b.name),
        SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
    };
    // id breaks ties so the order is total
    primary.then(a.id.cmp(&b.id))
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn list_stores(&self, request: &PageRequest) -> Result<Page<Store>, PageError> {
        let ordered = |a: &Store, b: &Store| match request.order {
            SortOrder::Asc => compare(a, b, request.sort),
            SortOrder::Desc => compare(b, a, request.sort),
        };

        let mut sorted: Vec<&Store> = self.stores.iter().collect();
        sorted.sort_by(|a, b| ordered(a, b));

        let start = match request.cursor {
            None => 0,
            Some(id) => {
                let anchor = self
                    .stores
                    .iter()
                    .find(|s| s.id == id)
                    .ok_or(PageError::InvalidCursor)?;
                sorted.partition_point(|s| ordered(s, anchor) != Ordering::Greater)
            },
        };

        let items: Vec<Store> = sorted
            .iter()
            .skip(start)
            .take(request.limit)
            .map(|s| (*s).clone())
            .collect();

        let next_cursor = if start + items.len() < sorted.len() {
            items.last().map(|s| s.id.to_string())
        } else {
            None
        };

        Ok(Page { items, next_cursor })
    }
}
