mod form;
mod session;

pub use form::Form;
pub use session::Session;

use aide::OperationIo;
use axum::{
	body::Body,
	extract::{FromRequest, FromRequestParts, Request},
	http::{request, Response},
	response::IntoResponse,
};
use schemars::JsonSchema;
use serde::de;

use crate::error::AppError;

/// Runs the `validator` rules of an extracted value.
pub(crate) fn validated<T: validator::Validate>(value: T) -> Result<T, AppError> {
	value.validate()?;

	Ok(value)
}

/// Validating JSON body, for both requests and responses.
///
/// Deserialization failures and failed `validator` rules are both
/// rejected as 400 with the standard error body.
///
/// ```rust
/// async fn route(Json(input): Json<LoginInput>) {
///   // ...
/// }
/// ```
#[derive(OperationIo)]
#[aide(
	input_with = "axum_jsonschema::Json<T>",
	output_with = "axum_jsonschema::Json<T>",
	json_schema
)]
pub struct Json<T>(pub T);

impl<T> IntoResponse for Json<T>
where
	T: serde::Serialize,
{
	fn into_response(self) -> Response<Body> {
		axum::extract::Json(self.0).into_response()
	}
}

#[axum::async_trait]
impl<T, S> FromRequest<S> for Json<T>
where
	T: de::DeserializeOwned + validator::Validate + JsonSchema + 'static,
	S: Send + Sync,
{
	type Rejection = AppError;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let axum::extract::Json(input) = axum::extract::Json::<T>::from_request(req, state).await?;

		validated(input).map(Self)
	}
}

/// Declares a validating wrapper around an axum extractor that reads from
/// the request parts.
macro_rules! validated_parts {
	($(#[$doc:meta])* $name:ident, $inner:ident, $schema:tt) => {
		$(#[$doc])*
		#[derive(OperationIo)]
		#[aide(input_with = $schema, json_schema)]
		pub struct $name<T>(pub T);

		#[axum::async_trait]
		impl<T, S> FromRequestParts<S> for $name<T>
		where
			T: de::DeserializeOwned + validator::Validate + Send,
			S: Send + Sync,
		{
			type Rejection = AppError;

			async fn from_request_parts(
				parts: &mut request::Parts,
				state: &S,
			) -> Result<Self, Self::Rejection> {
				let axum::extract::$inner(input) =
					axum::extract::$inner::<T>::from_request_parts(parts, state).await?;

				validated(input).map(Self)
			}
		}
	};
}

validated_parts!(
	/// Validating query string, such as the job filters.
	Query,
	Query,
	"axum::extract::Query<T>"
);

validated_parts!(
	/// Validating path parameters, such as `/jobs/:id`.
	Path,
	Path,
	"axum::extract::Path<T>"
);
