//! File listing and work-zone group handlers.

use crate::error::{ApiError, ApiResult};
use crate::group::{self, GroupResult};
use crate::metrics::{FILE_LISTINGS_TOTAL, GROUP_FETCHES_TOTAL};
use crate::select::{select, ListQuery, SelectionMode, SelectionResult};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use flagger_core::FileKind;

fn parse_kind(raw: &str) -> ApiResult<FileKind> {
    raw.parse()
        .map_err(|_| ApiError::NotFound(format!("unknown file type: {raw}")))
}

/// GET /{kind}
///
/// List the work-zone files of one kind, optionally filtered by
/// distance from a center point or by county/state/zip metadata.
pub async fn list_files(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<SelectionResult>> {
    let kind = parse_kind(&kind)?;
    let mode = SelectionMode::from_query(&query);

    let mode_label = match &mode {
        SelectionMode::All => "all",
        SelectionMode::ByDistance { .. } => "distance",
        SelectionMode::ByMetadata(_) => "metadata",
    };
    FILE_LISTINGS_TOTAL
        .with_label_values(&[kind.as_str(), mode_label])
        .inc();

    let entries = state
        .storage
        .list_with_metadata(&kind.listing_prefix())
        .await?;

    Ok(Json(select(kind, &entries, &mode)))
}

/// GET /{kind}/{public_id}
///
/// Fetch every file of the work-zone group named by a public id.
pub async fn fetch_group(
    State(state): State<AppState>,
    Path((kind, public_id)): Path<(String, String)>,
) -> ApiResult<Json<GroupResult>> {
    let kind = parse_kind(&kind)?;
    GROUP_FETCHES_TOTAL.with_label_values(&[kind.as_str()]).inc();

    let result = group::resolve(state.storage.as_ref(), kind, &public_id).await?;
    Ok(Json(result))
}
