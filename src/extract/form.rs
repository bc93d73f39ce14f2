use aide::OperationInput;
use axum::{
	extract::{FromRequest, Multipart, Request},
	http::header,
};
use schemars::JsonSchema;
use serde::de;

use super::validated;
use crate::{error::AppError, upload::UploadedFile};

/// Extractor for profile-style bodies that may carry files.
///
/// `multipart/form-data` requests have their text parts collected into
/// a JSON object (one string per field) and their file parts returned in
/// [`Form::files`]. Any other content type is read as a plain JSON body.
/// Either way the input is validated before the handler runs.
pub struct Form<T> {
	pub input: T,
	pub files: Vec<UploadedFile>,
}

fn is_multipart(req: &Request) -> bool {
	req.headers()
		.get(header::CONTENT_TYPE)
		.and_then(|value| value.to_str().ok())
		.is_some_and(|value| value.starts_with("multipart/form-data"))
}

#[axum::async_trait]
impl<T, S> FromRequest<S> for Form<T>
where
	T: de::DeserializeOwned + validator::Validate + 'static,
	S: Send + Sync,
{
	type Rejection = AppError;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		if !is_multipart(&req) {
			let axum::extract::Json(input) = axum::extract::Json::<T>::from_request(req, state).await?;

			return Ok(Self {
				input: validated(input)?,
				files: Vec::new(),
			});
		}

		let mut multipart = Multipart::from_request(req, state).await?;
		let mut fields = serde_json::Map::new();
		let mut files = Vec::new();

		while let Some(field) = multipart.next_field().await? {
			let Some(name) = field.name().map(str::to_owned) else {
				continue;
			};

			if let Some(file_name) = field.file_name().map(str::to_owned) {
				let content_type = field
					.content_type()
					.unwrap_or("application/octet-stream")
					.to_owned();
				let bytes = field.bytes().await?;

				// Browsers send an empty part for untouched file inputs.
				if file_name.is_empty() && bytes.is_empty() {
					continue;
				}

				files.push(UploadedFile {
					field: name,
					file_name,
					content_type,
					bytes,
				});
			} else {
				fields.insert(name, serde_json::Value::String(field.text().await?));
			}
		}

		let input = serde_json::from_value::<T>(serde_json::Value::Object(fields))
			.map_err(|error| AppError::input("body", error.to_string()))?;

		Ok(Self {
			input: validated(input)?,
			files,
		})
	}
}

impl<T: JsonSchema> OperationInput for Form<T> {
	fn operation_input(ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		axum_jsonschema::Json::<T>::operation_input(ctx, operation);
	}
}
