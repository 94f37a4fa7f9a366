use crate::config::ResponseMode;
use crate::error::IssueArenaError;
use crate::render_template;

use actix_web::http::StatusCode;
use actix_web::Result as ActixResult;
use actix_web::{HttpRequest, HttpResponse, Responder};
use anyhow::Result;
use log::debug;
use serde_json::json;
use tera::Context;
use tracing::instrument;

async fn api_not_found() -> Result<HttpResponse> {
    Ok(HttpResponse::NotFound().json(json!({
        "error": "Not found"
    })))
}

async fn web_not_found(request: HttpRequest) -> Result<HttpResponse> {
    let mut context = Context::new();
    context.try_insert("path", request.path())?;

    render_template!(StatusCode::NOT_FOUND, "error/404.html", context)
}

#[instrument(skip_all)]
pub(crate) async fn default_handler(request: HttpRequest, mode: ResponseMode) -> ActixResult<impl Responder> {
    debug!("Got request for non-existent resource: {}", request.path());

    Ok(match mode {
        ResponseMode::Api => api_not_found().await,
        ResponseMode::Web => web_not_found(request).await
    }.map_err(|err| -> IssueArenaError { err.into() }))
}
