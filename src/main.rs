#![forbid(unsafe_code)]

use std::path::Path;
use std::time::Duration;
use std::{env, io};

use actix_files::Files;
use actix_web::dev::Service;
use actix_web::http::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN};
use actix_web::http::Method;
use actix_web::middleware::NormalizePath;
use actix_web::web::{to, Data};
use actix_web::{App, HttpServer};
use anyhow::{anyhow, Context, Result};
use fs_extra::dir;
use log::info;
use qstring::QString;
use sqlx::postgres::PgPoolOptions;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use tracing_unwrap::ResultExt;

use crate::config::ResponseMode;

mod changeset;
mod config;
mod error;
mod issue;
mod prelude;
mod routes;
mod search;
mod templates;

#[actix_web::main]
async fn main() -> Result<()> {
    let _log_guards = init_logger()?;

    let db_url = env::var("DATABASE_URL").context("Unable to read mandatory DATABASE_URL environment variable")?;
    env::remove_var("DATABASE_URL"); // Remove the env variable now to prevent it from being passed to a untrusted child process later

    let db_pool = PgPoolOptions::new()
        .max_connections(num_cpus::get() as u32)
        .connect_timeout(Duration::from_secs(10))
        .connect(db_url.as_str())
        .await?;

    config::init(&db_pool).await.context("Unable to initialize database schema")?;

    let _watcher = templates::init().await?;

    let bind_address = env::var("BIND_ADDRESS").context("Unable to read mandatory BIND_ADDRESS environment variable")?;

    let mode = ResponseMode::from_env();
    info!("Responding with {} representations", mode);

    let server = HttpServer::new(move || {
        let mut app = App::new()
            .app_data(Data::new(db_pool.clone()))
            .app_data(Data::new(mode))
            .wrap(NormalizePath::trim())
            .wrap_fn(|mut req, srv| {
                // Html forms can only submit GET and POST, so the edit and delete
                // forms tunnel the real verb through a `_method` query parameter
                if req.method() == Method::POST {
                    let query_string = QString::from(req.query_string());

                    match query_string.get("_method") {
                        Some(method) if method.eq_ignore_ascii_case("put") => req.head_mut().method = Method::PUT,
                        Some(method) if method.eq_ignore_ascii_case("delete") => req.head_mut().method = Method::DELETE,
                        _ => {}
                    }
                }

                let fut = srv.call(req);
                async {
                    let mut res = fut.await?;

                    res.headers_mut().insert(
                        ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"),
                    );

                    Ok(res)
                }
            })
            .default_service(to(routes::not_found::default_handler))
            .configure(routes::init);

        if cfg!(debug_assertions) {
            app = app.service(
                Files::new("/static", "./static")
                    .use_etag(false)
                    .use_last_modified(false)
            );
        }

        app
    }).bind(bind_address.as_str()).context("Unable to bind HTTP server.")?;

    server.run().await.context("Unable to start HTTP server.")?;

    info!("Thank you and goodbye.");

    Ok(())
}

fn init_logger() -> Result<Vec<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if cfg!(debug_assertions) {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        };

        EnvFilter::default()
            .add_directive(level.into())
            .add_directive("actix_server=info".parse().unwrap_or_log())
            .add_directive("sqlx=warn".parse().unwrap_or_log())
    });

    let mut results = Vec::<WorkerGuard>::with_capacity(2);

    // In debug mode we only write to stdout (pretty), in production to stdout and to a file (json)
    if cfg!(debug_assertions) {
        let (writer, guard) = tracing_appender::non_blocking(io::stdout());
        results.push(guard);

        FmtSubscriber::builder()
            .with_writer(writer)
            .with_env_filter(env_filter)
            .with_thread_ids(true)
            .try_init()
            .map_err(|err| anyhow!(err))?; // https://github.com/dtolnay/anyhow/issues/83
    } else {
        let logs_dir = Path::new("logs");

        if !logs_dir.exists() {
            dir::create_all(logs_dir, false)?;
        }

        let appender = rolling::daily("logs", "issuearena");
        let (file_writer, file_guard) = tracing_appender::non_blocking(appender);

        let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(io::stdout());

        results.push(file_guard);
        results.push(stdout_guard);

        FmtSubscriber::builder()
            .with_writer(stdout_writer.and(file_writer))
            .with_env_filter(env_filter)
            .with_thread_ids(true)
            .json()
            .try_init()
            .map_err(|err| anyhow!(err))?; // https://github.com/dtolnay/anyhow/issues/83
    }

    results.shrink_to_fit();
    Ok(results)
}
