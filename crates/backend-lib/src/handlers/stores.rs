// ============================
// crates/backend-lib/src/handlers/stores.rs
// ============================
//! Store listing handler.
use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;
use storefront_common::{Page, Store};

use crate::catalog::{PageError, PageRequest, SortKey, SortOrder};
use crate::config::CatalogSettings;
use crate::error::AppError;
use crate::AppState;

/// Query string of `GET /stores`
#[derive(Debug, Default, Deserialize)]
pub struct StoresQuery {
    pub limit: Option<usize>,
    pub cursor: Option<String>,
    pub sort: Option<SortKey>,
    pub order: Option<SortOrder>,
}

impl StoresQuery {
    /// Check the raw query against the catalog limits
    pub fn into_request(self, settings: &CatalogSettings) -> Result<PageRequest, PageError> {
        let limit = self.limit.unwrap_or(settings.default_page_size);
        if limit == 0 || limit > settings.max_page_size {
            return Err(PageError::InvalidLimit {
                max: settings.max_page_size,
            });
        }

        // An empty cursor is the same as none.
        let cursor = match self.cursor.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<u64>().map_err(|_| PageError::InvalidCursor)?),
        };

        Ok(PageRequest {
            limit,
            cursor,
            sort: self.sort.unwrap_or_default(),
            order: self.order.unwrap_or_default(),
        })
    }
}

/// `GET /stores`
pub async fn list_stores(
    State(state): State<Arc<AppState>>,
    query: Result<Query<StoresQuery>, QueryRejection>,
) -> Result<Json<Page<Store>>, AppError> {
    let Query(query) = query.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    let request = query.into_request(&state.settings.catalog)?;
    let page = state.catalog.list_stores(&request).await?;
    Ok(Json(page))
}
