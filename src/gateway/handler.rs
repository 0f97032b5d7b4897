use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::PRISM_STATUS_HEADER;
use super::error::GatewayError;
use super::state::AppState;
use crate::index::VectorIndex;
use crate::ingest::{FragmentStored, IngestOutcome};
use crate::modality::Modality;
use crate::retrieval::{QueryError, RankedResults};

/// `GET /query/text` parameters.
#[derive(Debug, Deserialize)]
pub struct QueryTextParams {
    pub user: String,
    pub text: String,
    pub top_n: usize,
    /// Comma-separated modality tags to skip (e.g. `"IMAGE,VIDEO"`).
    #[serde(default)]
    pub exclude: Option<String>,
}

fn parse_exclusions(raw: Option<&str>) -> Result<Vec<Modality>, GatewayError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(|tag| {
            tag.parse()
                .map_err(|_| GatewayError::InvalidRequest(format!("unknown modality tag: {tag}")))
        })
        .collect()
}

#[instrument(skip(state), fields(user = %params.user, top_n = params.top_n))]
pub async fn query_text_handler<I>(
    State(state): State<AppState<I>>,
    Query(params): Query<QueryTextParams>,
) -> Result<Json<RankedResults>, GatewayError>
where
    I: VectorIndex + 'static,
{
    let exclude = parse_exclusions(params.exclude.as_deref())?;

    debug!(excluded = exclude.len(), "Handling text query");

    let results = state
        .retriever
        .query(&params.user, &params.text, params.top_n, &exclude)
        .await
        .map_err(|e| match e {
            QueryError::InvalidUser { .. } | QueryError::EmptyQuery => {
                GatewayError::InvalidRequest(e.to_string())
            }
            QueryError::QueryEmbedding { .. } => GatewayError::QueryFailed(e.to_string()),
        })?;

    Ok(Json(results))
}

/// Body of a dropped-notification response.
#[derive(Debug, Serialize)]
pub struct DroppedResponse {
    pub status: &'static str,
    pub key: String,
    pub reason: String,
}

#[instrument(skip(state, note), fields(key = %note.key))]
pub async fn ingest_handler<I>(
    State(state): State<AppState<I>>,
    Json(note): Json<FragmentStored>,
) -> Result<Response, GatewayError>
where
    I: VectorIndex + 'static,
{
    let outcome = state
        .ingestor
        .process(note)
        .await
        .map_err(|e| GatewayError::IndexUnavailable(e.to_string()))?;

    // Both terminal outcomes answer 2xx so an at-least-once transport
    // stops redelivering; only the retryable error path above maps to 5xx.
    match outcome {
        IngestOutcome::Indexed(receipt) => {
            let mut headers = HeaderMap::new();
            headers.insert(PRISM_STATUS_HEADER, HeaderValue::from_static("indexed"));
            Ok((StatusCode::ACCEPTED, headers, Json(receipt)).into_response())
        }
        IngestOutcome::Dropped { key, reason } => {
            let mut headers = HeaderMap::new();
            headers.insert(PRISM_STATUS_HEADER, HeaderValue::from_static("dropped"));
            Ok((
                StatusCode::OK,
                headers,
                Json(DroppedResponse {
                    status: "dropped",
                    key,
                    reason,
                }),
            )
                .into_response())
        }
    }
}
