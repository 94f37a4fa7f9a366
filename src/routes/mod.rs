use actix_web::http::header::LOCATION;
use actix_web::web::ServiceConfig;
use actix_web::HttpResponse;

mod add;
mod edit;
mod index;
mod issues;
mod search;
pub(crate) mod not_found;

pub(crate) fn init(config: &mut ServiceConfig) {
    config.service(index::index);

    config.service(add::add_form);
    config.service(add::create_issue);

    config.service(issues::show_issue);
    config.service(issues::update_status);
    config.service(issues::delete_issue);
    config.service(issues::without_id);
    config.service(issues::delete_without_id);

    config.service(search::quick_search);
    config.service(search::field_search);

    config.service(edit::edit_form);
    config.service(edit::update_issue);
}

/// 302 to the given location, the answer html forms expect after a mutation.
pub(crate) fn redirect(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((LOCATION, location.as_ref()))
        .finish()
}
