use crate::config::ResponseMode;
use crate::error::IssueArenaError;
use crate::prelude::ContextExtensions;
use crate::render_or_json;
use crate::search::{FieldSearchQuery, IssueQuery, QuickSearchForm};

use actix_web::Result as ActixResult;
use actix_web::{web, Either, HttpResponse, Responder};
use anyhow::Result;
use sqlx::PgPool;
use tera::Context;
use tracing::instrument;

#[actix_web::route("/search", method = "POST")]
#[instrument(skip_all)]
pub(crate) async fn quick_search(body: Either<web::Json<QuickSearchForm>, web::Form<QuickSearchForm>>, mode: ResponseMode, db_pool: web::Data<PgPool>) -> ActixResult<impl Responder> {
    Ok(quick(body.into_inner(), mode, &db_pool).await.map_err(|err| -> IssueArenaError { err.into() }))
}

async fn quick(form: QuickSearchForm, mode: ResponseMode, db_pool: &PgPool) -> Result<HttpResponse> {
    let mut transaction = db_pool.begin().await?;

    let query = IssueQuery::quick(form.search.as_deref().unwrap_or_default());
    let issues = query.fetch(&mut transaction).await?;

    let mut context = Context::new();
    context.insert_issues(&issues)?;

    render_or_json!(mode, &issues, "issue/search.html", context, transaction)
}

#[actix_web::route("/search", method = "GET")]
#[instrument(skip_all)]
pub(crate) async fn field_search(query: web::Query<FieldSearchQuery>, mode: ResponseMode, db_pool: web::Data<PgPool>) -> ActixResult<impl Responder> {
    Ok(by_fields(query.into_inner(), mode, &db_pool).await.map_err(|err| -> IssueArenaError { err.into() }))
}

async fn by_fields(query: FieldSearchQuery, mode: ResponseMode, db_pool: &PgPool) -> Result<HttpResponse> {
    let mut transaction = db_pool.begin().await?;

    let issues = IssueQuery::fields(&query).fetch(&mut transaction).await?;

    let mut context = Context::new();
    context.insert_issues(&issues)?;

    render_or_json!(mode, &issues, "issue/search.html", context, transaction)
}
