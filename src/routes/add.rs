use crate::config::ResponseMode;
use crate::error::{IssueArenaError, IssueErrors};
use crate::issue::{Issue, IssueSubmission};
use crate::{redirect_or_json, render_template};

use actix_web::Result as ActixResult;
use actix_web::{web, Either, HttpResponse, Responder};
use anyhow::{Error as AnyhowError, Result};
use log::info;
use sqlx::PgPool;
use tera::Context;
use tracing::instrument;

#[actix_web::route("/add", method = "GET")]
#[instrument(skip_all)]
pub(crate) async fn add_form() -> ActixResult<impl Responder> {
    Ok(form().await.map_err(|err| -> IssueArenaError { err.into() }))
}

async fn form() -> Result<HttpResponse> {
    let context = Context::new();

    render_template!("issue/add.html", context)
}

#[actix_web::route("/add", method = "POST")]
#[instrument(skip_all)]
pub(crate) async fn create_issue(body: Either<web::Json<IssueSubmission>, web::Form<IssueSubmission>>, mode: ResponseMode, db_pool: web::Data<PgPool>) -> ActixResult<impl Responder> {
    Ok(create(body.into_inner(), mode, &db_pool).await.map_err(|err| -> IssueArenaError { err.into() }))
}

async fn create(submission: IssueSubmission, mode: ResponseMode, db_pool: &PgPool) -> Result<HttpResponse> {
    let new_issue = match submission.validate() {
        Ok(new_issue) => new_issue,
        Err(errors) => {
            if mode == ResponseMode::Api {
                return Err(AnyhowError::new(IssueErrors::Validation(errors)));
            }

            // Re-render the form so the user can fix the offending fields
            let mut context = Context::new();
            context.try_insert("errors", &errors)?;

            return render_template!("issue/add.html", context);
        }
    };

    let mut transaction = db_pool.begin().await?;
    let issue = Issue::create(new_issue, &mut transaction).await?;

    info!("New issue created: {} (id {})", &issue, issue.id);

    redirect_or_json!(mode, &issue, "/", transaction)
}
