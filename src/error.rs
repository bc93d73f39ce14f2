use std::borrow::Cow;

use aide::OperationOutput;
use axum::{
	body::Body,
	extract::{
		multipart::{MultipartError, MultipartRejection},
		rejection,
	},
	http::{Response, StatusCode},
	response::IntoResponse,
	Json,
};
use schemars::JsonSchema;
use serde::Serialize;
use tower_governor::GovernorError;

use crate::{session, store::StoreError, upload};

pub type Map = serde_json::Map<String, serde_json::Value>;

/// A single error message presented to the client.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Message<'a> {
	/// A human-readable description of the error.
	pub content: Cow<'a, str>,
	/// The input field that caused the error, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<Cow<'a, str>>,
	/// Additional structured details about the error.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Cow<'a, Map>>,
}

impl<'a> Message<'a> {
	pub fn new(content: impl Into<Cow<'a, str>>) -> Self {
		Self {
			content: content.into(),
			field: None,
			details: None,
		}
	}

	pub fn field(mut self, field: impl Into<Cow<'a, str>>) -> Self {
		self.field = Some(field.into());
		self
	}

	pub fn detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
		self.details
			.get_or_insert_with(|| Cow::Owned(Map::new()))
			.to_mut()
			.insert(key.into(), value.into());
		self
	}

	pub fn into_vec(self) -> Vec<Self> {
		vec![self]
	}
}

/// The body of every error response.
///
/// `message` repeats the first entry of `errors` so simple clients
/// can display it without walking the list.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorResponse<'a> {
	pub success: bool,
	pub message: Cow<'a, str>,
	pub errors: Vec<Message<'a>>,
}

/// Describes how an error is presented to the client.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;

	fn errors(&self) -> Vec<Message<'_>> {
		Message::new(self.to_string()).into_vec()
	}
}

fn render<E: ErrorShape + ?Sized>(error: &E) -> Response<Body> {
	let status = error.status();

	if status.is_server_error() {
		tracing::error!(error = %error, "request failed");
	}

	let errors = error.errors();
	let message = errors
		.first()
		.map_or(Cow::Borrowed("unexpected error"), |message| {
			message.content.clone()
		});

	(
		status,
		Json(ErrorResponse {
			success: false,
			message,
			errors,
		}),
	)
		.into_response()
}

/// Errors shared by every route: input rejections, authentication,
/// storage and upload failures.
///
/// The Display trait is not sent to the client for server errors,
/// so it can show sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("{field}: {message}")]
	Input {
		field: &'static str,
		message: String,
	},
	#[error("json error: {0}")]
	Json(#[from] rejection::JsonRejection),
	#[error("query error: {0}")]
	Query(#[from] rejection::QueryRejection),
	#[error("path error: {0}")]
	Path(#[from] rejection::PathRejection),
	#[error("multipart error: {0}")]
	MultipartRejection(#[from] MultipartRejection),
	#[error("multipart error: {0}")]
	Multipart(#[from] MultipartError),
	#[error(transparent)]
	Session(#[from] session::Error),
	#[error(transparent)]
	Upload(#[from] upload::Error),
	#[error("store error: {0}")]
	Store(#[from] StoreError),
	#[error("too many requests")]
	RateLimit(GovernorError),
	#[error("route not found")]
	NotFound,
}

impl From<GovernorError> for AppError {
	fn from(error: GovernorError) -> Self {
		Self::RateLimit(error)
	}
}

impl AppError {
	pub fn input(field: &'static str, message: impl Into<String>) -> Self {
		Self::Input {
			field,
			message: message.into(),
		}
	}
}

impl ErrorShape for AppError {
	fn status(&self) -> StatusCode {
		match self {
			Self::Validation(..)
			| Self::Input { .. }
			| Self::Json(..)
			| Self::Query(..)
			| Self::Path(..)
			| Self::MultipartRejection(..)
			| Self::Multipart(..) => StatusCode::BAD_REQUEST,
			Self::Session(error) => error.status(),
			Self::Upload(error) => error.status(),
			Self::Store(StoreError::Conflict(..)) => StatusCode::CONFLICT,
			Self::Store(..) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::RateLimit(GovernorError::UnableToExtractKey) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::RateLimit(..) => StatusCode::TOO_MANY_REQUESTS,
			Self::NotFound => StatusCode::NOT_FOUND,
		}
	}

	fn errors(&self) -> Vec<Message<'_>> {
		match self {
			Self::Validation(errors) => errors
				.field_errors()
				.into_iter()
				.flat_map(|(field, errors)| {
					errors.iter().map(move |error| {
						Message::new(error.message.clone().unwrap_or_else(|| error.code.clone()))
							.field(field)
					})
				})
				.collect(),
			Self::Input { field, message } => Message::new(message.as_str()).field(*field).into_vec(),
			Self::Store(StoreError::Conflict(field)) => Message::new(format!("{field} is already in use"))
				.field(*field)
				.into_vec(),
			Self::Store(..) | Self::RateLimit(GovernorError::UnableToExtractKey) => {
				Message::new("internal server error").into_vec()
			}
			Self::Session(error) => error.errors(),
			Self::Upload(error) => error.errors(),
			_ => Message::new(self.to_string()).into_vec(),
		}
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		render(&self)
	}
}

impl OperationOutput for AppError {
	type Inner = Self;
}

/// The error type returned by route handlers.
///
/// It is either one of the shared [`AppError`]s, or an error specific
/// to the group of routes (`E`).
#[derive(Debug)]
pub enum RouteError<E> {
	App(AppError),
	Route(E),
}

impl<E> From<AppError> for RouteError<E> {
	fn from(error: AppError) -> Self {
		Self::App(error)
	}
}

macro_rules! forward_app_error {
	($($source:ty),* $(,)?) => {
		$(
			impl<E> From<$source> for RouteError<E> {
				fn from(error: $source) -> Self {
					Self::App(AppError::from(error))
				}
			}
		)*
	};
}

forward_app_error!(
	validator::ValidationErrors,
	session::Error,
	upload::Error,
	StoreError,
);

impl<E: ErrorShape> IntoResponse for RouteError<E> {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::App(error) => render(&error),
			Self::Route(error) => render(&error),
		}
	}
}

impl<E> OperationOutput for RouteError<E> {
	type Inner = Self;
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_conflict_is_409() {
		let error = AppError::from(StoreError::Conflict("email"));

		assert_eq!(error.status(), StatusCode::CONFLICT);
		assert_eq!(error.errors()[0].field.as_deref(), Some("email"));
	}

	#[test]
	fn test_validation_errors_name_their_field() {
		let mut errors = validator::ValidationErrors::new();
		errors.add("email", validator::ValidationError::new("email"));

		let error = AppError::from(errors);
		let messages = error.errors();

		assert_eq!(error.status(), StatusCode::BAD_REQUEST);
		assert_eq!(messages[0].field.as_deref(), Some("email"));
		assert_eq!(messages[0].content, "email");
	}

	#[test]
	fn test_message_details() {
		let message = Message::new("unknown_job").detail("job", "abc");

		assert_eq!(
			message.details.unwrap().get("job"),
			Some(&serde_json::json!("abc"))
		);
	}
}
