use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::error::InternalError;
use actix_web::{HttpResponse, web};
use serde_json::json;

use crate::{
    api::{employee, health, leave},
    config::Config,
};

/// Per-IP limiter for the REST scope. `None` when the budget is 0.
fn build_limiter(requests_per_min: u32) -> Option<Governor<PeerIpKeyExtractor, NoOpMiddleware>> {
    if requests_per_min == 0 {
        return None;
    }
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()?;
    Some(Governor::new(&cfg))
}

fn bad_request<E>(err: E) -> actix_web::Error
where
    E: std::fmt::Display + std::fmt::Debug + 'static,
{
    let body = json!({ "message": err.to_string() });
    InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
}

fn api_scope(prefix: &str) -> actix_web::Scope {
    web::scope(prefix)
        .service(
            web::scope("/employees")
                // /employees
                .service(
                    web::resource("")
                        .route(web::post().to(employee::create_employee))
                        .route(web::get().to(employee::list_employees)),
                )
                // /employees/{id}
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(employee::get_employee))
                        .route(web::put().to(employee::update_employee))
                        .route(web::delete().to(employee::delete_employee)),
                ),
        )
        .service(
            web::scope("/leaves")
                // /leaves
                .service(
                    web::resource("")
                        .route(web::post().to(leave::create_leave))
                        .route(web::get().to(leave::list_leaves)),
                )
                // /leaves/{id}
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(leave::get_leave))
                        .route(web::delete().to(leave::delete_leave)),
                )
                // /leaves/{id}/status
                .service(
                    web::resource("/{id}/status")
                        .route(web::put().to(leave::update_leave_status)),
                )
                // /leaves/{id}/cancel
                .service(
                    web::resource("/{id}/cancel").route(web::put().to(leave::cancel_leave)),
                ),
        )
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    // Malformed ids, bodies and query strings answer 400 with a JSON body
    cfg.app_data(web::PathConfig::default().error_handler(|err, _| bad_request(err)))
        .app_data(web::JsonConfig::default().error_handler(|err, _| bad_request(err)))
        .app_data(web::QueryConfig::default().error_handler(|err, _| bad_request(err)));

    cfg.route("/ping", web::get().to(health::ping));

    match build_limiter(config.rate_protected_per_min) {
        Some(limiter) => {
            cfg.service(api_scope(&config.api_prefix).wrap(limiter));
        }
        None => {
            cfg.service(api_scope(&config.api_prefix));
        }
    }
}
