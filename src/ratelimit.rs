use std::{sync::Arc, time::Duration};

use axum::{
	body::Body,
	response::{IntoResponse, Response},
};
use governor::{
	clock::QuantaInstant,
	middleware::{RateLimitingMiddleware, StateInformationMiddleware},
};
use tower_governor::{
	governor::{GovernorConfig, GovernorConfigBuilder},
	key_extractor::{KeyExtractor, PeerIpKeyExtractor},
	GovernorError,
};

use crate::error::AppError;

pub type Config = Arc<GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>>;

/// The limiters applied to the router.
#[derive(Clone)]
pub struct Limits {
	/// Applied to every route.
	pub default: Config,
	/// Applied to `/auth` on top of the default.
	pub auth: Config,
}

impl Limits {
	pub fn new() -> Option<Self> {
		Some(Self {
			default: default()?,
			auth: secure()?,
		})
	}

	/// Starts the background cleanup of both limiters.
	pub fn cleanup(&self) {
		cleanup_old_limits(&[&self.default, &self.auth]);
	}
}

/// Limits every route to 10 requests per second per IP, with bursts of up to 50.
pub fn default() -> Option<Config> {
	GovernorConfigBuilder::default()
		.per_second(10)
		.burst_size(50)
		.use_headers()
		.error_handler(error_handler)
		.finish()
		.map(Arc::new)
}

/// Limits the authentication routes, which hash passwords and send email,
/// to one request every two seconds per IP, with bursts of up to 5.
pub fn secure() -> Option<Config> {
	GovernorConfigBuilder::default()
		.per_second(2)
		.burst_size(5)
		.use_headers()
		.error_handler(error_handler)
		.finish()
		.map(Arc::new)
}

fn error_handler(error: GovernorError) -> Response<Body> {
	AppError::from(error).into_response()
}

/// Periodically drops the state of clients that have not been limited recently.
pub fn cleanup_old_limits<T, M>(configs: &[&Arc<GovernorConfig<T, M>>])
where
	T: KeyExtractor,
	<T as KeyExtractor>::Key: Send + Sync + 'static,
	M: RateLimitingMiddleware<QuantaInstant> + Send + Sync + 'static,
{
	let limiters = configs
		.iter()
		.map(|config| config.limiter().clone())
		.collect::<Vec<_>>();
	let interval = Duration::from_secs(60);

	std::thread::spawn(move || loop {
		std::thread::sleep(interval);

		for limiter in &limiters {
			tracing::debug!("rate limiting storage size: {}", limiter.len());

			limiter.retain_recent();
		}
	});
}

#[cfg(test)]
mod test {
	use axum::http::StatusCode;

	use super::*;

	#[test]
	fn test_configs_are_valid() {
		assert!(Limits::new().is_some());
	}

	#[test]
	fn test_limited_requests_are_429() {
		let response = error_handler(GovernorError::TooManyRequests {
			wait_time: 1,
			headers: None,
		});

		assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
	}
}
