//! HTTP request handlers

use super::state::AppState;
use crate::analysis::Scorer;
use crate::auth::AuthUser;
use crate::error::{Error, Result};
use crate::export::{export, ExportArtifact, ExportFormat, ExportOptions};
use crate::history::SearchHistoryEntry;
use crate::results::{filter_results, select_by_ids, ContentType, Filter, SearchResult, Sentiment};
use crate::search::SearchConfig;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

/// Unwrap a JSON body, reporting malformed input as a validation error
fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| Error::validation(rejection.body_text()))
}

fn success() -> Json<serde_json::Value> {
    Json(json!({ "success": true }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub search_id: String,
}

/// Run a search, store it and start background analysis
pub async fn search(
    State(state): State<AppState>,
    user: AuthUser,
    payload: std::result::Result<Json<SearchConfig>, JsonRejection>,
) -> Result<Json<SearchResponse>> {
    let config = json_body(payload)?;
    config.validate()?;
    // check and count in one step, before any provider call
    state.usage.try_consume_search(&user.id).await?;

    let entry = match execute_and_store(&state, &user.id, config).await {
        Ok(entry) => entry,
        Err(e) => {
            if let Err(release) = state.usage.release_search(&user.id).await {
                warn!("Could not release search quota for {}: {}", user.id, release);
            }
            return Err(e);
        }
    };
    state.start_enrichment(&user.id, &entry.id, entry.results.clone());

    Ok(Json(SearchResponse {
        results: entry.results,
        search_id: entry.id,
    }))
}

async fn execute_and_store(
    state: &AppState,
    user_id: &str,
    config: SearchConfig,
) -> Result<SearchHistoryEntry> {
    let outcome = state.search.execute(&config).await?;
    info!(
        "Search '{}' for {} returned {} results ({:?})",
        config.query,
        user_id,
        outcome.results.len(),
        outcome.origin
    );
    state
        .history
        .insert(SearchHistoryEntry::new(user_id, config, outcome.results))
        .await
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStatus {
    pub entry: SearchHistoryEntry,
    pub progress: f64,
    pub enriching: bool,
}

/// Snapshot of a stored search, polled while enrichment runs
pub async fn search_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<SearchStatus>> {
    let entry = state.history.get(&id, &user.id).await?;
    Ok(Json(SearchStatus {
        progress: entry.analysis_progress(),
        enriching: state.is_enriching(&user.id, &id),
        entry,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub result: SearchResult,
}

/// Score a single result on demand
pub async fn analyze(
    State(state): State<AppState>,
    _user: AuthUser,
    payload: std::result::Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let request = json_body(payload)?;
    let analysis = state.enricher.scorer().score(&request.result).await?;
    Ok(Json(json!({ "analysis": analysis })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    pub search_id: Option<String>,
}

/// Publish a stored search under a fresh token
pub async fn share(
    State(state): State<AppState>,
    user: AuthUser,
    payload: std::result::Result<Json<ShareRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let search_id = json_body(payload)?
        .search_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| Error::BadRequest("Search ID required".into()))?;

    let token = state.history.share(&search_id, &user.id).await?;
    debug!("Shared search {} for {}", search_id, user.id);
    Ok(Json(json!({
        "shareToken": token,
        "shareUrl": state.share_url(&token),
    })))
}

#[derive(Debug, Deserialize)]
pub struct UnshareParams {
    pub id: Option<String>,
}

/// Revoke a share link
pub async fn unshare(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<UnshareParams>,
) -> Result<impl IntoResponse> {
    let search_id = params
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| Error::BadRequest("Search ID required".into()))?;

    state.history.unshare(&search_id, &user.id).await?;
    Ok(success())
}

/// Public view of a shared search
pub async fn shared(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse> {
    let entry = state.history.find_shared(&token).await?;
    Ok(Json(json!({
        "query": entry.query,
        "createdAt": entry.created_at,
        "results": entry.results,
    })))
}

/// Most recent searches of the caller
pub async fn history(State(state): State<AppState>, user: AuthUser) -> Result<impl IntoResponse> {
    let history = state
        .history
        .list_recent(&user.id, state.settings.history.display_limit)
        .await?;
    Ok(Json(json!({ "history": history })))
}

/// Remove a stored search
pub async fn delete_history(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    state.history.delete(&id, &user.id).await?;
    Ok(success())
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub search_id: Option<String>,
    pub results: Option<Vec<SearchResult>>,
    pub format: ExportFormat,
    #[serde(default)]
    pub sentiment_filter: Filter<Sentiment>,
    #[serde(default)]
    pub content_type_filter: Filter<ContentType>,
    pub selected_ids: Option<Vec<String>>,
    #[serde(default = "default_true")]
    pub include_analysis: bool,
}

/// Render a stored search (or posted results) as a download
pub async fn export_results(
    State(state): State<AppState>,
    user: AuthUser,
    payload: std::result::Result<Json<ExportRequest>, JsonRejection>,
) -> Result<Response> {
    let request = json_body(payload)?;
    state.usage.try_consume_export(&user.id).await?;

    match render_export(&state, &user.id, request).await {
        Ok(artifact) => {
            let disposition = format!("attachment; filename=\"{}\"", artifact.file_name);
            Ok((
                [
                    (CONTENT_TYPE, artifact.content_type.to_string()),
                    (CONTENT_DISPOSITION, disposition),
                ],
                artifact.bytes,
            )
                .into_response())
        }
        Err(e) => {
            if let Err(release) = state.usage.release_export(&user.id).await {
                warn!("Could not release export quota for {}: {}", user.id, release);
            }
            Err(e)
        }
    }
}

async fn render_export(
    state: &AppState,
    user_id: &str,
    request: ExportRequest,
) -> Result<ExportArtifact> {
    let results = match (request.search_id.as_deref(), request.results) {
        (Some(id), _) if !id.trim().is_empty() => state.history.get(id, user_id).await?.results,
        (_, Some(results)) => results,
        _ => return Err(Error::BadRequest("Search ID or results required".into())),
    };

    let filtered: Vec<SearchResult> =
        filter_results(&results, request.sentiment_filter, request.content_type_filter)
            .into_iter()
            .cloned()
            .collect();
    let selected: Vec<SearchResult> = match request.selected_ids {
        Some(ids) => select_by_ids(&filtered, ids).into_iter().cloned().collect(),
        None => filtered,
    };

    let options = ExportOptions {
        include_analysis: request.include_analysis,
        title: format!("{} - Search Results", state.settings.general.instance_name),
    };
    let artifact = export(&selected, request.format, &options)?;
    info!(
        "Exported {} results as {} for {}",
        selected.len(),
        request.format,
        user_id
    );
    Ok(artifact)
}

/// Quota state of the caller
pub async fn usage(State(state): State<AppState>, user: AuthUser) -> Result<impl IntoResponse> {
    let limits = state.usage.get_limits(&user.id).await?;
    Ok(Json(json!({ "limits": limits })))
}

/// Provider statistics
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.snapshot())
}

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
        "instance": state.settings.general.instance_name,
    }))
}
