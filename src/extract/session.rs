use std::sync::Arc;

use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request},
};

use crate::{
	error::AppError,
	openapi::SECURITY_SCHEME_BEARER,
	route::auth::model::{Role, User},
	session, Database,
};

pub const AUTHORIZATION_PREFIX: &str = "Bearer ";

/// Extracts the bearer token and related user from the request.
///
/// If there is no token, a [`session::Error::NoToken`] is returned.
/// If the token is invalid or expired, a [`session::Error::InvalidToken`] is returned.
/// If the user no longer exists, a [`session::Error::UnknownUser`] is returned.
///
/// ```rust
/// async fn route(session: Session) {
///   println!("{:?}", session.user);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub user: User,
}

impl Session {
	/// Checks that the authenticated user has one of the given roles.
	pub fn authorize(&self, roles: &[Role]) -> Result<&User, session::Error> {
		if roles.contains(&self.user.role) {
			Ok(&self.user)
		} else {
			Err(session::Error::Forbidden {
				role: self.user.role,
			})
		}
	}
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	Database: FromRef<S>,
	Arc<session::Keys>: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = AppError;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let token = parts
			.headers
			.get(header::AUTHORIZATION)
			.and_then(|value| value.to_str().ok())
			.and_then(|value| value.strip_prefix(AUTHORIZATION_PREFIX))
			.map(str::trim)
			.filter(|token| !token.is_empty())
			.ok_or(session::Error::NoToken)?;

		let claims = Arc::<session::Keys>::from_ref(state).verify(token)?;

		let database = Database::from_ref(state);
		let user = database
			.find_user(claims.sub)
			.await?
			.ok_or(session::Error::UnknownUser)?;

		Ok(Session { user })
	}
}

impl OperationInput for Session {
	/// Operation input for the session extractor.
	///
	/// This adds a bearer token requirement to the `OpenAPI` operation.
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		operation.security.push(
			[(SECURITY_SCHEME_BEARER.to_string(), Vec::new())]
				.into_iter()
				.collect(),
		);
	}
}
