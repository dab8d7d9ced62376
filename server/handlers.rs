use actix_web::{web, HttpResponse};
use transit_map::models::{MarkerPatch, NewMarker, RouteSearchRequest};

use crate::error::ServerError;
use crate::mock_routes;
use crate::store::MarkerStore;

/// Mount the JSON API under `/api`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).service(
        web::scope("/api")
            .service(
                web::resource("/markers")
                    .route(web::get().to(list_markers))
                    .route(web::post().to(create_marker)),
            )
            .service(
                web::resource("/markers/{id}")
                    .route(web::get().to(get_marker))
                    .route(web::put().to(update_marker))
                    .route(web::delete().to(delete_marker)),
            )
            .route("/routes/search", web::post().to(search_routes)),
    );
}

/// Malformed or mistyped bodies get the same `{error, details}` shape as validation failures
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| ServerError::BadBody(err.to_string()).into())
}

async fn list_markers(store: web::Data<MarkerStore>) -> Result<HttpResponse, ServerError> {
    let markers = store.list().await?;
    Ok(HttpResponse::Ok().json(markers))
}

async fn get_marker(store: web::Data<MarkerStore>, id: web::Path<String>) -> Result<HttpResponse, ServerError> {
    let marker = store.get(&id).await?.ok_or(ServerError::NotFound)?;
    Ok(HttpResponse::Ok().json(marker))
}

async fn create_marker(
    store: web::Data<MarkerStore>,
    body: web::Json<NewMarker>,
) -> Result<HttpResponse, ServerError> {
    let new = body.into_inner();
    new.validate().map_err(ServerError::InvalidMarker)?;

    let marker = store.create(new).await?;
    log::info!("Created marker {} ({})", marker.id, marker.title);
    Ok(HttpResponse::Created().json(marker))
}

async fn update_marker(
    store: web::Data<MarkerStore>,
    id: web::Path<String>,
    body: web::Json<MarkerPatch>,
) -> Result<HttpResponse, ServerError> {
    let patch = body.into_inner();
    patch.validate().map_err(ServerError::InvalidMarker)?;

    let marker = store.update(&id, patch).await?.ok_or(ServerError::NotFound)?;
    Ok(HttpResponse::Ok().json(marker))
}

async fn delete_marker(store: web::Data<MarkerStore>, id: web::Path<String>) -> Result<HttpResponse, ServerError> {
    if store.delete(&id).await? {
        log::info!("Deleted marker {id}");
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(ServerError::NotFound)
    }
}

async fn search_routes(body: web::Json<RouteSearchRequest>) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    mock_routes::validate(&request).map_err(ServerError::InvalidSearch)?;

    let routes = mock_routes::search(&request);
    log::debug!("Route search ({}) returned {} itineraries", request.mode, routes.len());
    Ok(HttpResponse::Ok().json(routes))
}
