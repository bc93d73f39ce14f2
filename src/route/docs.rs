use std::sync::Arc;

use aide::{
	axum::{
		routing::{get, get_with},
		ApiRouter, IntoApiResponse,
	},
	openapi::OpenApi,
};
use axum::{
	response::{Html, IntoResponse},
	Extension,
};

use crate::{extract::Json, AppState};

/// The API reference page, rendered at build time.
const REFERENCE: &str = include_str!(concat!(env!("OUT_DIR"), "/scalar.html"));

pub fn routes() -> ApiRouter<AppState> {
	ApiRouter::new()
		.api_route(
			"/",
			get_with(serve_reference, |op| op.description("This documentation page.")),
		)
		.route("/private/api.json", get(serve_docs))
}

async fn serve_reference() -> Html<&'static str> {
	Html(REFERENCE)
}

async fn serve_docs(Extension(api): Extension<Arc<OpenApi>>) -> impl IntoApiResponse {
	Json(api.as_ref()).into_response()
}
