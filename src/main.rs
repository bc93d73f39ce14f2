#![warn(clippy::pedantic)]

mod config;
mod error;
mod extract;
mod mail;
mod openapi;
mod ratelimit;
mod route;
mod session;
mod store;
#[cfg(test)]
mod test;
mod trace;
mod upload;

use std::{net::SocketAddr, process::ExitCode, sync::Arc};

use aide::{
	axum::{routing::get_with, ApiRouter},
	openapi::OpenApi,
};
use argon2::Argon2;
use axum::{extract::DefaultBodyLimit, Extension, Router};
use clap::{Parser, Subcommand};
use tower_governor::GovernorLayer;
use tower_http::{
	compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer,
};

use crate::{config::Config, store::StoreError};

pub type Database = Arc<dyn store::Store>;
pub type AppState = State;

/// The largest accepted request body. Fits a resume, a picture and the text fields.
const BODY_LIMIT: usize = 8 * 1024 * 1024;

/// The shared application state.
///
/// Handlers extract the parts they need, such as `State<Database>`.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub hasher: Argon2<'static>,
	pub keys: Arc<session::Keys>,
	pub mailer: Arc<dyn mail::Mailer>,
	pub uploads: Arc<upload::Storage>,
	pub config: Arc<Config>,
}

#[derive(Parser)]
#[command(version, about = "Job board API server")]
struct Cli {
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
	/// Serves the API. This is the default.
	Serve {
		/// Overrides `HOST`.
		#[arg(long)]
		host: Option<String>,
		/// Overrides `PORT`.
		#[arg(long)]
		port: Option<u16>,
	},
	/// Replaces every category with the standard list.
	SeedCategories,
}

#[derive(Debug, thiserror::Error)]
enum Error {
	#[error(transparent)]
	Store(#[from] StoreError),
	#[error(transparent)]
	Mail(#[from] mail::Error),
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
	#[error("could not create the administrator: {0}")]
	Admin(String),
}

/// Builds the application router, including the OpenAPI document and docs.
///
/// Without `limits` no rate limiting is applied, which also means no peer
/// address is needed.
pub fn router(state: AppState, limits: Option<ratelimit::Limits>) -> Router {
	aide::gen::extract_schemas(true);

	let mut api = OpenApi::default();
	let uploads = ServeDir::new(state.uploads.root());

	let app = ApiRouter::new()
		.api_route(
			"/",
			get_with(liveness, |op| op.description("Answers while the server is up.")),
		)
		.merge(route::routes(limits.as_ref().map(|limits| limits.auth.clone())))
		.nest("/docs", route::docs::routes())
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
		.nest_service(upload::PUBLIC_PREFIX, uploads)
		.fallback(not_found);

	let app = match limits {
		Some(limits) => app.layer(GovernorLayer {
			config: limits.default,
		}),
		None => app,
	};

	app.layer(DefaultBodyLimit::max(BODY_LIMIT))
		.layer(CompressionLayer::new())
		.layer(CorsLayer::permissive())
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

async fn liveness() -> &'static str {
	"Job board API is running"
}

async fn not_found() -> error::AppError {
	error::AppError::NotFound
}

async fn connect(config: &Config) -> Result<Database, StoreError> {
	match &config.database_url {
		Some(url) => {
			let store = store::PgStore::connect(url).await?;
			tracing::info!("connected to the database");

			Ok(Arc::new(store))
		}
		None => {
			tracing::warn!("DATABASE_URL is not set, data is kept in memory");

			Ok(Arc::new(store::MemoryStore::new()))
		}
	}
}

fn mailer(config: &Config) -> Result<Arc<dyn mail::Mailer>, mail::Error> {
	match &config.smtp {
		Some(smtp) => Ok(Arc::new(mail::SmtpMailer::new(smtp, &config.sender)?)),
		None => {
			tracing::warn!("EMAIL_HOST is not set, email is kept in an outbox");

			Ok(Arc::new(mail::Outbox::default()))
		}
	}
}

async fn serve(config: Config, database: Database) -> Result<(), Error> {
	let hasher = Argon2::default();

	if let Some(admin) = &config.admin {
		route::auth::bootstrap_admin(&database, &hasher, admin)
			.await
			.map_err(|error| Error::Admin(format!("{error:?}")))?;
	}

	let uploads = upload::Storage::new(&config.upload_dir);
	uploads.prepare().await?;

	let limits = if config.rate_limit {
		ratelimit::Limits::new()
	} else {
		None
	};

	if let Some(limits) = &limits {
		limits.cleanup();
	}

	let state = State {
		database,
		hasher,
		keys: Arc::new(session::Keys::new(
			config.jwt_secret.as_bytes(),
			config.jwt_expiry,
		)),
		mailer: mailer(&config)?,
		uploads: Arc::new(uploads),
		config: Arc::new(config.clone()),
	};

	let app = router(state, limits);
	let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;

	tracing::info!("listening on {}:{}", config.host, config.port);

	axum::serve(
		listener,
		app.into_make_service_with_connect_info::<SocketAddr>(),
	)
	.await?;

	Ok(())
}

async fn run(command: Command, mut config: Config) -> Result<(), Error> {
	let database = connect(&config).await?;

	match command {
		Command::Serve { host, port } => {
			if let Some(host) = host {
				config.host = host;
			}

			if let Some(port) = port {
				config.port = port;
			}

			serve(config, database).await
		}
		Command::SeedCategories => {
			route::category::seed(&database).await?;

			Ok(())
		}
	}
}

#[tokio::main]
async fn main() -> ExitCode {
	dotenvy::dotenv().ok();

	let cli = Cli::parse();
	let config = match Config::from_env() {
		Ok(config) => config,
		Err(error) => {
			eprintln!("configuration error: {error}");
			return ExitCode::FAILURE;
		}
	};

	let _guard = trace::init(config.otel_export);
	let command = cli.command.unwrap_or(Command::Serve {
		host: None,
		port: None,
	});

	match run(command, config).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(error) => {
			tracing::error!(%error, "shutting down");
			ExitCode::FAILURE
		}
	}
}
