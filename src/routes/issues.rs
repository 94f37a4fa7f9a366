use crate::config::ResponseMode;
use crate::error::IssueArenaError;
use crate::issue::Issue;
use crate::prelude::ContextExtensions;
use crate::routes::redirect;
use crate::{die, err, redirect_or_json, render_or_json};

use actix_web::Result as ActixResult;
use actix_web::{web, Either, HttpResponse, Responder};
use anyhow::Result;
use log::info;
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use tera::Context;
use tracing::instrument;

#[actix_web::route("/issues/{id}", method = "GET")]
#[instrument(skip_all)]
pub(crate) async fn show_issue(id: web::Path<i32>, mode: ResponseMode, db_pool: web::Data<PgPool>) -> ActixResult<impl Responder> {
    Ok(show(id.into_inner(), mode, &db_pool).await.map_err(|err| -> IssueArenaError { err.into() }))
}

async fn show(id: i32, mode: ResponseMode, db_pool: &PgPool) -> Result<HttpResponse> {
    let mut transaction = db_pool.begin().await?;

    let issue = Issue::find(id, &mut transaction).await?.ok_or_else(|| err!(NOT_FOUND, "Issue not found"))?;

    let mut context = Context::new();
    context.insert_issue(&issue)?;

    render_or_json!(mode, &issue, "issue/show.html", context, transaction)
}

#[actix_web::route("/issues/{id}", method = "PUT")]
#[instrument(skip_all)]
pub(crate) async fn update_status(id: web::Path<i32>, body: Either<web::Json<StatusForm>, web::Form<StatusForm>>, mode: ResponseMode, db_pool: web::Data<PgPool>) -> ActixResult<impl Responder> {
    Ok(replace_status(id.into_inner(), body.into_inner(), mode, &db_pool).await.map_err(|err| -> IssueArenaError { err.into() }))
}

async fn replace_status(id: i32, form: StatusForm, mode: ResponseMode, db_pool: &PgPool) -> Result<HttpResponse> {
    let open = matches!(form.status.as_deref(), Some("open"));

    let mut transaction = db_pool.begin().await?;

    if !Issue::replace_status(id, open, &mut transaction).await? {
        if mode == ResponseMode::Api {
            die!(NOT_FOUND, "Issue not found");
        }

        transaction.commit().await?;
        return Ok(redirect("/"));
    }

    redirect_or_json!(mode, &json!({ "message": "Issue successfully updated" }), format!("/issues/{}", id), transaction)
}

#[actix_web::route("/issues/{id}", method = "DELETE")]
#[instrument(skip_all)]
pub(crate) async fn delete_issue(id: web::Path<i32>, mode: ResponseMode, db_pool: web::Data<PgPool>) -> ActixResult<impl Responder> {
    Ok(delete(id.into_inner(), mode, &db_pool).await.map_err(|err| -> IssueArenaError { err.into() }))
}

async fn delete(id: i32, mode: ResponseMode, db_pool: &PgPool) -> Result<HttpResponse> {
    let mut transaction = db_pool.begin().await?;

    if !Issue::delete(id, &mut transaction).await? {
        if mode == ResponseMode::Api {
            die!(NOT_FOUND, "Issue not found");
        }

        transaction.commit().await?;
        return Ok(redirect("/"));
    }

    info!("Issue {} deleted", id);

    redirect_or_json!(mode, &json!({ "message": "Issue successfully deleted" }), "/", transaction)
}

#[actix_web::route("/issues", method = "GET")]
#[instrument(skip_all)]
pub(crate) async fn without_id() -> impl Responder {
    redirect("/")
}

#[actix_web::route("/issues", method = "DELETE")]
#[instrument(skip_all)]
pub(crate) async fn delete_without_id(mode: ResponseMode) -> ActixResult<impl Responder> {
    Ok(delete_empty(mode).await.map_err(|err| -> IssueArenaError { err.into() }))
}

async fn delete_empty(mode: ResponseMode) -> Result<HttpResponse> {
    // Short-circuits before ever reaching the store
    match mode {
        ResponseMode::Api => die!(BAD_REQUEST, "Cannot delete issue with empty id"),
        ResponseMode::Web => Ok(redirect("/"))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusForm {
    status: Option<String>
}
