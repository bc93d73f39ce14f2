use axum::http::StatusCode;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error, route::auth::model::Role};

/// An error that can occur while authenticating a request.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("not authorized, no token")]
	NoToken,
	#[error("not authorized, token failed")]
	InvalidToken,
	#[error("not authorized, user not found")]
	UnknownUser,
	#[error("access denied, role {role} is not allowed to access this route")]
	Forbidden { role: Role },
	#[error("token could not be signed")]
	Signing(#[source] jsonwebtoken::errors::Error),
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::NoToken | Self::InvalidToken | Self::UnknownUser => StatusCode::UNAUTHORIZED,
			Self::Forbidden { .. } => StatusCode::FORBIDDEN,
			Self::Signing(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::Forbidden { role } => error::Message::new(self.to_string())
				.detail("role", role.as_str())
				.into_vec(),
			Self::Signing(..) => error::Message::new("internal server error").into_vec(),
			_ => error::Message::new(self.to_string()).into_vec(),
		}
	}
}

/// The payload of a bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
	/// The id of the authenticated user.
	pub sub: Uuid,
	pub iat: i64,
	pub exp: i64,
}

/// Signs and verifies bearer tokens with a shared HMAC secret.
pub struct Keys {
	encoding: EncodingKey,
	decoding: DecodingKey,
	validation: Validation,
	ttl: Duration,
}

impl Keys {
	pub fn new(secret: &[u8], ttl: Duration) -> Self {
		Self {
			encoding: EncodingKey::from_secret(secret),
			decoding: DecodingKey::from_secret(secret),
			validation: Validation::default(),
			ttl,
		}
	}

	/// Issues a token for the user that expires after the configured lifetime.
	pub fn issue(&self, user_id: Uuid) -> Result<String, Error> {
		let now = Utc::now();
		let claims = Claims {
			sub: user_id,
			iat: now.timestamp(),
			exp: (now + self.ttl).timestamp(),
		};

		jsonwebtoken::encode(&Header::default(), &claims, &self.encoding).map_err(Error::Signing)
	}

	/// Verifies the signature and expiry of a token, returning its claims.
	pub fn verify(&self, token: &str) -> Result<Claims, Error> {
		jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
			.map(|data| data.claims)
			.map_err(|_| Error::InvalidToken)
	}
}
