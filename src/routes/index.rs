use crate::error::IssueArenaError;
use crate::issue::Issue;
use crate::prelude::ContextExtensions;
use crate::render_template;

use actix_web::Result as ActixResult;
use actix_web::{web, HttpResponse, Responder};
use anyhow::Result;
use sqlx::PgPool;
use tera::Context;
use tracing::instrument;

#[actix_web::route("/", method = "GET")]
#[instrument(skip_all)]
pub(crate) async fn index(db_pool: web::Data<PgPool>) -> ActixResult<impl Responder> {
    Ok(list(&db_pool).await.map_err(|err| -> IssueArenaError { err.into() }))
}

async fn list(db_pool: &PgPool) -> Result<HttpResponse> {
    let mut transaction = db_pool.begin().await?;

    let issues = Issue::all(&mut transaction).await?;

    let mut context = Context::new();
    context.insert_issues(&issues)?;

    render_template!("index.html", context, transaction)
}
