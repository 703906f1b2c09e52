//! HTTP surface: the list page and the four form actions.
//!
//! Every action redirects back to `/` with 303 regardless of whether it
//! changed anything. Malformed add forms (including a blank name) get a 4xx;
//! storage failures surface as a 500.

use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, error};

use citytemp_core::{Refresher, StoreFactory, sort_for_display};

use crate::render;

/// Application shared state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub stores: StoreFactory,
    pub refresher: Refresher,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/cities/update", post(update))
        .route("/cities/reset", post(reset))
        .route("/cities/remove/{id}", post(remove))
        .route("/cities/add", post(add))
        .with_state(state)
}

/// Internal failure, logged and reported as a bare 500.
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(error = %format!("{:#}", self.0), "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct AddCityForm {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let mut cities = state.stores.open()?.list_cities()?;
    sort_for_display(&mut cities);
    Ok(Html(render::index_page(&cities)))
}

async fn update(State(state): State<AppState>) -> Result<Redirect, AppError> {
    let mut store = state.stores.open()?;
    state.refresher.refresh(&mut store, Utc::now()).await?;
    Ok(Redirect::to("/"))
}

async fn reset(State(state): State<AppState>) -> Result<Redirect, AppError> {
    let count = state.stores.open()?.reset_cities()?;
    debug!(count, "city list reset to defaults");
    Ok(Redirect::to("/"))
}

async fn remove(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Redirect, AppError> {
    let removed = state.stores.open()?.remove_city(id)?;
    debug!(id, removed, "remove city");
    Ok(Redirect::to("/"))
}

async fn add(
    State(state): State<AppState>,
    Form(form): Form<AddCityForm>,
) -> Result<Response, AppError> {
    if form.name.trim().is_empty() {
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, "city name must not be empty").into_response());
    }

    let added = state.stores.open()?.add_city(&form.name, form.lat, form.lon)?;
    debug!(name = %form.name, added, "add city");
    Ok(Redirect::to("/").into_response())
}
