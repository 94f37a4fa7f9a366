use crate::changeset::{Changeset, EditSubmission};
use crate::config::ResponseMode;
use crate::error::IssueArenaError;
use crate::issue::Issue;
use crate::prelude::ContextExtensions;
use crate::routes::redirect;
use crate::{die, err, redirect_or_json, render_template};

use actix_web::Result as ActixResult;
use actix_web::{web, Either, HttpResponse, Responder};
use anyhow::Result;
use serde_json::json;
use sqlx::PgPool;
use tera::Context;
use tracing::instrument;

#[actix_web::route("/edit/{id}", method = "GET")]
#[instrument(skip_all)]
pub(crate) async fn edit_form(id: web::Path<i32>, db_pool: web::Data<PgPool>) -> ActixResult<impl Responder> {
    Ok(form(id.into_inner(), &db_pool).await.map_err(|err| -> IssueArenaError { err.into() }))
}

async fn form(id: i32, db_pool: &PgPool) -> Result<HttpResponse> {
    let mut transaction = db_pool.begin().await?;

    let issue = Issue::find(id, &mut transaction).await?.ok_or_else(|| err!(NOT_FOUND, "Issue not found"))?;

    let mut context = Context::new();
    context.insert_issue(&issue)?;

    render_template!("issue/edit.html", context, transaction)
}

#[actix_web::route("/edit/{id}", method = "PUT")]
#[instrument(skip_all)]
pub(crate) async fn update_issue(id: web::Path<i32>, body: Either<web::Json<EditSubmission>, web::Form<EditSubmission>>, mode: ResponseMode, db_pool: web::Data<PgPool>) -> ActixResult<impl Responder> {
    Ok(update(id.into_inner(), body.into_inner(), mode, &db_pool).await.map_err(|err| -> IssueArenaError { err.into() }))
}

async fn update(id: i32, submission: EditSubmission, mode: ResponseMode, db_pool: &PgPool) -> Result<HttpResponse> {
    let changeset = Changeset::resolve(submission);

    if changeset.is_empty() {
        // Nothing usable was submitted, so the store is not touched and
        // the modification stamp stays as it is
        return match mode {
            ResponseMode::Api => Ok(HttpResponse::Ok().json(json!({ "message": "No fields to update" }))),
            ResponseMode::Web => Ok(redirect(format!("/issues/{}", id)))
        };
    }

    let mut transaction = db_pool.begin().await?;

    let issue = match changeset.apply(id, &mut transaction).await? {
        Some(issue) => issue,
        None => {
            if mode == ResponseMode::Api {
                die!(NOT_FOUND, "Issue not found");
            }

            transaction.commit().await?;
            return Ok(redirect("/"));
        }
    };

    redirect_or_json!(mode, &issue, format!("/issues/{}", issue.id), transaction)
}
