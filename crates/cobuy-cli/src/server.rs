//! HTTP front-end
//!
//! Thin actix-web layer over [`cobuy_engine::service`]. Engine calls are
//! CPU-bound, so every handler hands them to the blocking pool.

use std::sync::Arc;

use actix_web::error::{BlockingError, InternalError, JsonPayloadError};
use actix_web::http::StatusCode;
use actix_web::middleware::Logger;
use actix_web::web;
use actix_web::App;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::HttpServer;
use serde::Serialize;

use cobuy_engine::history::HistoryStore;
use cobuy_engine::service::{self, ErrorResponse, RecommendationRequest, ServiceError};
use cobuy_engine::RecommendationEngine;

/// Shared by every worker.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RecommendationEngine>,
    pub history: Option<Arc<dyn HistoryStore>>,
}

impl AppState {
    pub fn new(engine: Arc<RecommendationEngine>, history: Option<Arc<dyn HistoryStore>>) -> Self {
        Self { engine, history }
    }
}

pub async fn recommend(state: web::Data<AppState>, req: web::Json<RecommendationRequest>) -> HttpResponse {
    let request = req.into_inner();
    log::debug!("Recommendation request for {:?}", request.input);
    let result = web::block(move || {
        service::recommend(&state.engine, state.history.as_deref(), &request)
    })
    .await;
    respond(result)
}

pub async fn train(state: web::Data<AppState>) -> HttpResponse {
    let result = web::block(move || service::train(&state.engine)).await;
    respond(result)
}

pub async fn products(state: web::Data<AppState>) -> HttpResponse {
    let result = web::block(move || service::products(&state.engine)).await;
    respond(result)
}

fn respond<T: Serialize>(result: Result<Result<T, ServiceError>, BlockingError>) -> HttpResponse {
    match result {
        Ok(Ok(body)) => HttpResponse::Ok().json(body),
        Ok(Err(e)) => error_response(&e),
        Err(e) => error_response(&ServiceError::internal(e.to_string())),
    }
}

fn error_response(error: &ServiceError) -> HttpResponse {
    if error.is_client_error() {
        log::debug!("Rejected request: {}", error);
    } else {
        log::error!("{}", error);
    }
    let status = StatusCode::from_u16(error.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).json(error.body())
}

/// Malformed or mistyped JSON bodies get the same error shape as every
/// other failure.
fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let body = ErrorResponse {
        error: format!("Invalid request body: {}", err),
    };
    InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
}

/// Register the `/api` routes; shared by the server and the tests.
#[rustfmt::skip]
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .service(
            web::scope("/api")
                .route("/recommendations/", web::post().to(recommend))
                .route("/recommendations", web::post().to(recommend))
                .route("/train/", web::get().to(train))
                .route("/train", web::get().to(train))
                .route("/products/", web::get().to(products))
                .route("/products", web::get().to(products)),
        );
}

pub async fn run(state: AppState, bind: &str) -> std::io::Result<()> {
    let state = web::Data::new(state);
    log::info!("Serving recommendations on http://{}", bind);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%r %s %Ts"))
            .app_data(state.clone())
            .configure(configure)
    })
    .bind(bind)?
    .run()
    .await
}
