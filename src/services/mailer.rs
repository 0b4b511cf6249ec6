//! Outgoing email for password reset codes.
//!
//! [`SmtpMailer`] wraps the `lettre` async SMTP transport. When `SMTP_HOST` is
//! not configured the app runs with [`DisabledMailer`], which refuses to send.

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::{
    config::Config,
    error::{AppError, AppResult},
};

const RESET_SUBJECT: &str = "Your OTP Code";

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send_reset_code(&self, to: &str, code: &str) -> AppResult<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpMailer {
    /// Builds a mailer from config; `None` when no SMTP host is set
    pub fn from_config(config: &Config) -> AppResult<Option<Self>> {
        let Some(host) = config.smtp_host.as_deref() else {
            return Ok(None);
        };

        let sender_address = config.email_sender.as_deref().ok_or_else(|| {
            AppError::Internal("EMAIL_SENDER is required when SMTP_HOST is set".to_string())
        })?;
        let sender: Mailbox = sender_address
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid EMAIL_SENDER: {}", e)))?;

        let builder = if config.smtp_use_ssl {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        }
        .map_err(|e| AppError::Mail(e.to_string()))?
        .port(config.smtp_port);

        let builder = match &config.email_password {
            Some(password) => builder.credentials(Credentials::new(
                sender_address.to_string(),
                password.clone(),
            )),
            None => builder,
        };

        tracing::info!(
            host = %host,
            port = config.smtp_port,
            implicit_tls = config.smtp_use_ssl,
            "SMTP mailer configured"
        );

        Ok(Some(Self {
            transport: builder.build(),
            sender,
        }))
    }
}

#[async_trait::async_trait]
impl Mailer for SmtpMailer {
    async fn send_reset_code(&self, to: &str, code: &str) -> AppResult<()> {
        let recipient: Mailbox = to
            .parse()
            .map_err(|_| AppError::InvalidInput(format!("Invalid email address '{}'", to)))?;

        let message = reset_code_message(self.sender.clone(), recipient, code)?;

        self.transport.send(message).await.map_err(|e| {
            tracing::error!(error = %e, "SMTP send failed");
            AppError::Mail(e.to_string())
        })?;

        tracing::info!(to = %to, "Reset code email sent");
        Ok(())
    }
}

/// Stands in for SMTP when it is not configured
pub struct DisabledMailer;

#[async_trait::async_trait]
impl Mailer for DisabledMailer {
    async fn send_reset_code(&self, to: &str, _code: &str) -> AppResult<()> {
        tracing::warn!(to = %to, "Email delivery requested but SMTP is not configured");
        Err(AppError::Mail("Email delivery is not configured".to_string()))
    }
}

fn reset_code_message(from: Mailbox, to: Mailbox, code: &str) -> AppResult<Message> {
    Message::builder()
        .from(from)
        .to(to)
        .subject(RESET_SUBJECT)
        .header(ContentType::TEXT_PLAIN)
        .body(format!(
            "Your OTP code is {}. It is valid for 10 minutes.",
            code
        ))
        .map_err(|e| AppError::Mail(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(pairs: &[(&str, &str)]) -> Config {
        let mut vars = vec![
            ("TMDB_API_KEY".to_string(), "k".to_string()),
            ("JWT_SECRET".to_string(), "s".to_string()),
        ];
        vars.extend(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        Config::from_vars(vars).unwrap()
    }

    #[test]
    fn test_reset_message_contents() {
        let message = reset_code_message(
            "noreply@cinematch.test".parse().unwrap(),
            "neo@example.com".parse().unwrap(),
            "123456",
        )
        .unwrap();

        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Your OTP Code"));
        assert!(raw.contains("To: neo@example.com"));
        assert!(raw.contains("Your OTP code is 123456."));
    }

    #[test]
    fn test_no_smtp_host_means_no_mailer() {
        let mailer = SmtpMailer::from_config(&config_with(&[])).unwrap();
        assert!(mailer.is_none());
    }

    #[tokio::test]
    async fn test_smtp_host_without_sender_rejected() {
        let result = SmtpMailer::from_config(&config_with(&[("SMTP_HOST", "smtp.example.com")]));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_disabled_mailer_refuses() {
        let err = DisabledMailer
            .send_reset_code("neo@example.com", "123456")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Mail(_)));
    }
}
