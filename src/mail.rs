//! Outbound e-mail.

use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

use crate::auth::repo_types::OtpPurpose;
use crate::config::MailConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(cfg: &MailConfig) -> anyhow::Result<Self> {
        let smtp = cfg.smtp.as_ref().context("smtp is not configured")?;
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
            .context("smtp relay")?
            .port(smtp.port)
            .timeout(Some(std::time::Duration::from_secs(15)));
        if let (Some(user), Some(pass)) = (&smtp.username, &smtp.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        let from = cfg.from.parse().context("SMTP_FROM is not a valid mailbox")?;
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: Email) -> anyhow::Result<()> {
        let to: Mailbox = email.to.parse().context("invalid recipient")?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.body)
            .context("build message")?;
        self.transport.send(message).await.context("smtp send")?;
        Ok(())
    }
}

/// Development mailer: writes the message to the log instead of sending it.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> anyhow::Result<()> {
        info!(to = %email.to, subject = %email.subject, body = %email.body, "mail (not sent)");
        Ok(())
    }
}

pub fn otp_email(to: &str, code: &str, purpose: OtpPurpose, ttl_minutes: i64) -> Email {
    let (subject, action) = match purpose {
        OtpPurpose::Signup => (
            "Verify your ClosetAI account",
            "verify your ClosetAI account",
        ),
        OtpPurpose::PasswordReset => (
            "Password Reset Request for ClosetAI",
            "reset your ClosetAI password",
        ),
    };
    let body = format!(
        "Hello,\n\n\
         Use the code below to {action}:\n\n\
         {code}\n\n\
         The code expires in {ttl_minutes} minutes. \
         If you did not request it, please ignore this email.\n\n\
         Thanks,\nThe ClosetAI Team"
    );
    Email {
        to: to.to_string(),
        subject: subject.to_string(),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_email_carries_code_and_expiry() {
        let mail = otp_email("a@b.co", "042917", OtpPurpose::Signup, 10);
        assert_eq!(mail.to, "a@b.co");
        assert!(mail.subject.contains("Verify"));
        assert!(mail.body.contains("042917"));
        assert!(mail.body.contains("10 minutes"));
    }

    #[test]
    fn reset_email_has_reset_subject() {
        let mail = otp_email("a@b.co", "000001", OtpPurpose::PasswordReset, 10);
        assert_eq!(mail.subject, "Password Reset Request for ClosetAI");
        assert!(mail.body.contains("reset your ClosetAI password"));
    }

    #[tokio::test]
    async fn log_mailer_never_fails() {
        let mail = otp_email("a@b.co", "123456", OtpPurpose::Signup, 10);
        assert!(LogMailer.send(mail).await.is_ok());
    }
}
