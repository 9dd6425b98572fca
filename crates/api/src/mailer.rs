//! Outbound email via SMTP (OTP delivery for password reset).
//!
//! Wraps the `lettre` async SMTP transport. Configuration is loaded from
//! environment variables; if `SMTP_HOST` is not set the mailer is disabled
//! and sends are logged and skipped, which keeps local development working
//! without an SMTP server.

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@mailblocks.local";

/// Configuration for the SMTP mailer.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    /// Optional SMTP username.
    pub smtp_user: Option<String>,
    /// Optional SMTP password.
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set, signalling that email
    /// delivery is not configured and should be skipped.
    ///
    /// | Variable        | Required | Default                     |
    /// |-----------------|----------|-----------------------------|
    /// | `SMTP_HOST`     | yes      | --                          |
    /// | `SMTP_PORT`     | no       | `587`                       |
    /// | `SMTP_FROM`     | no       | `noreply@mailblocks.local`  |
    /// | `SMTP_USER`     | no       | --                          |
    /// | `SMTP_PASSWORD` | no       | --                          |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// Mailer
// ---------------------------------------------------------------------------

/// Sends password-reset OTP emails via SMTP.
pub struct Mailer {
    config: Option<EmailConfig>,
}

impl Mailer {
    /// Create a mailer from the environment; disabled when `SMTP_HOST` is unset.
    pub fn from_env() -> Self {
        let config = EmailConfig::from_env();
        if config.is_none() {
            tracing::warn!("SMTP_HOST not set; outbound email is disabled");
        }
        Self { config }
    }

    /// Create an explicitly disabled mailer (used by tests).
    pub fn disabled() -> Self {
        Self { config: None }
    }

    /// Send a password-reset OTP to the given address.
    ///
    /// When the mailer is disabled this logs and returns `Ok(())`. Callers in
    /// the forgot-password flow must treat an `Err` as log-only: the HTTP
    /// response is the same generic success either way, so a delivery failure
    /// cannot be used to probe which emails exist.
    pub async fn send_otp_email(
        &self,
        to_email: &str,
        name: &str,
        otp: &str,
        expiry_mins: i64,
    ) -> Result<(), MailerError> {
        use lettre::{
            message::header::ContentType, transport::smtp::authentication::Credentials,
            AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
        };

        let Some(config) = &self.config else {
            tracing::info!(to = %to_email, "Mailer disabled; skipping OTP email");
            return Ok(());
        };

        let body = format!(
            "Hi {name},\n\n\
             Your password reset code is: {otp}\n\n\
             This code expires in {expiry_mins} minutes. If you did not request\n\
             a password reset, you can ignore this email.\n\n\
             -- mailblocks"
        );

        let email = Message::builder()
            .from(config.from_address.parse()?)
            .to(to_email.parse()?)
            .subject("Your password reset code")
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| MailerError::Build(e.to_string()))?;

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
                .port(config.smtp_port);

        if let (Some(user), Some(password)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        let transport = builder.build();
        transport.send(email).await?;

        tracing::info!(to = %to_email, "OTP email sent");
        Ok(())
    }
}
