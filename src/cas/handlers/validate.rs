use axum::{
    extract::{Extension, Query},
    http::{header::CONTENT_TYPE, HeaderMap},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::IntoParams;

use super::client_ip;
use crate::{
    cas::{
        protocol::{self, ValidationFailure, Version},
        state::CasState,
    },
    tickets::Ticket,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ValidateQuery {
    /// Service the ticket was issued for.
    #[serde(default)]
    pub service: String,
    /// Service ticket to validate.
    #[serde(default)]
    pub ticket: String,
}

#[utoipa::path(
    get,
    path = "/validate",
    params(ValidateQuery),
    responses(
        (status = 200, description = "`yes\\n<user>\\n` or `no\\n`", content_type = "text/plain")
    ),
    tag = "cas"
)]
// axum handler for CAS v1 validation
pub async fn validate(
    headers: HeaderMap,
    Query(query): Query<ValidateQuery>,
    state: Extension<Arc<CasState>>,
) -> impl IntoResponse {
    let result = protocol::validate(state.store(), Version::V1, &query.service, &query.ticket);
    log_result(&headers, &query, &result);

    (
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        protocol::v1_body(&result),
    )
}

#[utoipa::path(
    get,
    path = "/serviceValidate",
    params(ValidateQuery),
    responses(
        (status = 200, description = "CAS v2 service response", content_type = "application/xml")
    ),
    tag = "cas"
)]
// axum handler for CAS v2 validation
pub async fn service_validate(
    headers: HeaderMap,
    Query(query): Query<ValidateQuery>,
    state: Extension<Arc<CasState>>,
) -> impl IntoResponse {
    let result = protocol::validate(state.store(), Version::V2, &query.service, &query.ticket);
    log_result(&headers, &query, &result);

    (
        [(CONTENT_TYPE, "application/xml; charset=utf-8")],
        protocol::v2_body(&result),
    )
}

fn log_result(headers: &HeaderMap, query: &ValidateQuery, result: &Result<Ticket, ValidationFailure>) {
    match result {
        Ok(ticket) => info!(
            "{} - valid AUTHENTICATION for {} on {}",
            client_ip(headers),
            ticket.user,
            query.service
        ),
        Err(failure) => info!(
            "{} - {} {} on {}",
            client_ip(headers),
            failure.code(),
            failure.message(),
            query.service
        ),
    }
}
