use std::sync::atomic::{AtomicBool, Ordering};

use lettre::{
	message::{header::ContentType, Mailbox},
	transport::smtp::authentication::Credentials,
	AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
};
use tokio::sync::Mutex;

use crate::config;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid address: {0}")]
	Address(#[from] lettre::address::AddressError),
	#[error("failed to build message: {0}")]
	Build(#[from] lettre::error::Error),
	#[error("smtp error: {0}")]
	Smtp(#[from] lettre::transport::smtp::Error),
	#[error("mail delivery is unavailable")]
	Unavailable,
}

/// An email ready to be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
	pub to: String,
	pub subject: String,
	pub html: String,
}

/// Delivers outgoing email.
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
	async fn send(&self, mail: Mail) -> Result<(), Error>;
}

/// Delivers email through an SMTP relay using STARTTLS.
pub struct SmtpMailer {
	transport: AsyncSmtpTransport<Tokio1Executor>,
	from: Mailbox,
}

impl SmtpMailer {
	pub fn new(smtp: &config::Smtp, from: &config::Sender) -> Result<Self, Error> {
		let mut transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)?.port(smtp.port);

		if let (Some(username), Some(password)) = (&smtp.username, &smtp.password) {
			transport = transport.credentials(Credentials::new(username.clone(), password.clone()));
		}

		let transport = transport.build();

		Ok(Self {
			transport,
			from: Mailbox::new(Some(from.name.clone()), from.address.parse()?),
		})
	}
}

#[async_trait::async_trait]
impl Mailer for SmtpMailer {
	async fn send(&self, mail: Mail) -> Result<(), Error> {
		let message = lettre::Message::builder()
			.from(self.from.clone())
			.to(mail.to.parse()?)
			.subject(mail.subject)
			.header(ContentType::TEXT_HTML)
			.body(mail.html)?;

		self.transport.send(message).await?;

		Ok(())
	}
}

/// Keeps outgoing email in memory instead of delivering it.
///
/// Used when no SMTP relay is configured, and by tests to read what
/// would have been sent.
#[derive(Default)]
pub struct Outbox {
	sent: Mutex<Vec<Mail>>,
	failing: AtomicBool,
}

impl Outbox {
	/// Makes every following delivery fail with [`Error::Unavailable`].
	pub fn fail(&self, failing: bool) {
		self.failing.store(failing, Ordering::SeqCst);
	}

	pub async fn sent(&self) -> Vec<Mail> {
		self.sent.lock().await.clone()
	}
}

#[async_trait::async_trait]
impl Mailer for Outbox {
	async fn send(&self, mail: Mail) -> Result<(), Error> {
		if self.failing.load(Ordering::SeqCst) {
			return Err(Error::Unavailable);
		}

		tracing::info!(to = %mail.to, subject = %mail.subject, "email kept in outbox");
		self.sent.lock().await.push(mail);

		Ok(())
	}
}

/// Builds the password reset email pointing at the client's reset page.
pub fn password_reset(to: &str, reset_url: &str) -> Mail {
	Mail {
		to: to.to_owned(),
		subject: "Password reset request".into(),
		html: format!(
			r#"<h1>Password reset</h1>
<p>You are receiving this email because a password reset was requested for your account.</p>
<p>Follow the link below to choose a new password. The link is valid for 10 minutes.</p>
<p><a href="{reset_url}" clicktracking="off">{reset_url}</a></p>
<p>If you did not request this, you can ignore this email.</p>"#
		),
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[tokio::test]
	async fn test_outbox_keeps_mail() {
		let outbox = Outbox::default();

		outbox
			.send(password_reset("a@b.com", "http://client/reset-password/abc"))
			.await
			.unwrap();

		let sent = outbox.sent().await;
		assert_eq!(sent.len(), 1);
		assert!(sent[0].html.contains("http://client/reset-password/abc"));
	}

	#[tokio::test]
	async fn test_outbox_can_fail() {
		let outbox = Outbox::default();
		outbox.fail(true);

		assert!(matches!(
			outbox.send(password_reset("a@b.com", "x")).await,
			Err(Error::Unavailable)
		));
		assert!(outbox.sent().await.is_empty());
	}
}
