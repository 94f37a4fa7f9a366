use std::path::Path;
use std::sync::RwLock;

use anyhow::Result;
use log::{error, info};
use notify::{Config as NotifyConfig, Error as NotifyError, Event, RecommendedWatcher, RecursiveMode, Watcher};
use once_cell::sync::Lazy;
use tera::Tera;

mod filters;
mod tests;

pub(crate) static TERA: Lazy<RwLock<Tera>> = Lazy::new(|| RwLock::new(init_tera()));

pub(crate) async fn init() -> Result<RecommendedWatcher> {
    info!("Loading templates...");

    drop(TERA.read().unwrap());

    info!("Successfully loaded templates.");

    let mut watcher = RecommendedWatcher::new(|result: std::result::Result<Event, NotifyError>| {
        let event = match result {
            Ok(event) => event,
            Err(err) => {
                error!("Failed to unwrap file system notify event: {}", err);
                return;
            }
        };

        if !event.kind.is_modify() {
            return;
        }

        for path in &event.paths {
            if path.is_dir() {
                return;
            }

            match path.file_name() {
                Some(file_name) => match file_name.to_str() {
                    Some(file_name) => if !file_name.ends_with(".html") {
                        return
                    }
                    None => return
                }
                None => return
            }
        }

        info!("Detected modification in templates directory, reloading...");

        match TERA.write() {
            Ok(mut lock) => match lock.full_reload() {
                Ok(_) => info!("Successfully reloaded templates."),
                Err(err) => error!("Failed to reload templates: {}", err)
            }
            Err(err) => error!("Lock is poisoned: {}", err)
        }
    }, NotifyConfig::default())?;

    watcher.watch(Path::new("templates/html"), RecursiveMode::Recursive)?;

    info!("Started watching ./templates/html for changes...");

    Ok(watcher)
}

fn init_tera() -> Tera {
    let mut tera = match Tera::new("templates/html/**/*") {
        Ok(tera) => tera,
        Err(err) => panic!("{}", err)
    };

    tera.register_filter("human_prefix", filters::human_prefix);
    tera.register_filter("human_time", filters::human_time);

    tera.register_tester("none", tests::none);
    tera.register_tester("some", tests::some);

    tera
}

#[macro_export]
macro_rules! render_template {
    ($template_name:literal, $context:expr) => {{
        $crate::render_template!(actix_web::http::StatusCode::OK, $template_name, $context)
    }};
    ($template_name:literal, $context:expr, $transaction:expr) => {{
        $crate::render_template!(actix_web::http::StatusCode::OK, $template_name, $context, $transaction)
    }};
    ($status:expr, $template_name:literal, $context:expr) => {{
        let template = $crate::templates::TERA.read().unwrap().render($template_name, &$context)?;

        Ok(actix_web::HttpResponseBuilder::new($status)
            .content_type("text/html; charset=utf-8")
            .body(template))
    }};
    ($status:expr, $template_name:literal, $context:expr, $transaction:expr) => {{
        let template = $crate::templates::TERA.read().unwrap().render($template_name, &$context)?;

        $transaction.commit().await?;

        Ok(actix_web::HttpResponseBuilder::new($status)
            .content_type("text/html; charset=utf-8")
            .body(template))
    }};
}

/// Answers with structured data in api mode and a rendered page otherwise.
/// The transaction is committed either way.
#[macro_export]
macro_rules! render_or_json {
    ($mode:expr, $data:expr, $template_name:literal, $context:expr, $transaction:expr) => {{
        match $mode {
            $crate::config::ResponseMode::Api => {
                $transaction.commit().await?;

                Ok(actix_web::HttpResponse::Ok().json($data))
            }
            $crate::config::ResponseMode::Web => $crate::render_template!($template_name, $context, $transaction)
        }
    }};
}

/// Answers with structured data in api mode and a redirect otherwise.
/// The transaction is committed either way.
#[macro_export]
macro_rules! redirect_or_json {
    ($mode:expr, $data:expr, $location:expr, $transaction:expr) => {{
        $transaction.commit().await?;

        match $mode {
            $crate::config::ResponseMode::Api => Ok(actix_web::HttpResponse::Ok().json($data)),
            $crate::config::ResponseMode::Web => Ok($crate::routes::redirect($location))
        }
    }};
}
