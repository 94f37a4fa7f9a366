use crate::error::IssueArenaError;

use std::env;
use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::web::Data;
use actix_web::{FromRequest, HttpRequest};
use anyhow::{anyhow, bail, Context, Result};
use derive_more::Display;
use log::info;
use sqlx::postgres::PgDatabaseError;
use sqlx::{Executor, PgPool};

/// Which representation the data endpoints answer with.
///
/// Read once at process start from the `ISSUEARENA_MODE` environment variable
/// and shared as app data; `api` (or `test`) selects structured Json, anything
/// else the rendered pages.
#[derive(Display, Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ResponseMode {
    #[display(fmt = "api")]
    Api,
    #[display(fmt = "web")]
    Web
}

impl ResponseMode {
    pub(crate) fn from_env() -> ResponseMode {
        ResponseMode::from_value(env::var("ISSUEARENA_MODE").ok().as_deref())
    }

    pub(crate) fn from_value(value: Option<&str>) -> ResponseMode {
        match value {
            Some("api") | Some("test") => ResponseMode::Api,
            _ => ResponseMode::Web
        }
    }
}

impl FromRequest for ResponseMode {
    type Error = IssueArenaError;
    type Future = Ready<Result<ResponseMode, IssueArenaError>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.app_data::<Data<ResponseMode>>()
                .map(|mode| ***mode)
                .ok_or_else(|| anyhow!("No response mode is configured").into())
        )
    }
}

pub(crate) async fn init(db_pool: &PgPool) -> Result<()> {
    if let Some(err) = sqlx::query("select exists(select 1 from issues limit 1)").execute(db_pool).await.err() {
        if let Some(db_err) = err.as_database_error() {
            let pg_err = db_err.downcast_ref::<PgDatabaseError>();

            // 42P01: relation issues does not exist
            // If we receive this error code we know the table has not yet been
            // generated, so we insert our schema and if that succeeds we're ready to go
            if pg_err.code() == "42P01" {
                return create_tables(db_pool).await;
            }
        }

        bail!(err);
    }

    Ok(())
}

async fn create_tables(db_pool: &PgPool) -> Result<()> {
    const DATABASE_INIT_DATA: &str = include_str!("../schema.sql");
    let mut connection = db_pool.acquire().await?;

    connection.execute(DATABASE_INIT_DATA)
        .await
        .context("Failed to create initial database setup")?;

    info!("Successfully created initial database tables");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::ResponseMode;

    #[test]
    fn api_and_test_select_json() {
        assert_eq!(ResponseMode::from_value(Some("api")), ResponseMode::Api);
        assert_eq!(ResponseMode::from_value(Some("test")), ResponseMode::Api);
    }

    #[test]
    fn everything_else_selects_pages() {
        assert_eq!(ResponseMode::from_value(Some("web")), ResponseMode::Web);
        assert_eq!(ResponseMode::from_value(Some("")), ResponseMode::Web);
        assert_eq!(ResponseMode::from_value(None), ResponseMode::Web);
    }
}
