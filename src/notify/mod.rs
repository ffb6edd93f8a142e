// 访客凭据通知：SMTP 发送，未配置邮箱时只记录日志

mod template;

pub use template::{CREDENTIALS_SUBJECT, CredentialsEmail, CredentialsTemplates};

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::Config;
use crate::guest::{CredentialNotifier, GuestUser, NotifyError};

pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    templates: CredentialsTemplates,
}

impl SmtpNotifier {
    pub fn new(host: &str, user: &str, password: &str, from: &str) -> Result<Self, NotifyError> {
        let from = from
            .parse::<Mailbox>()
            .map_err(|e| NotifyError::Address(e.to_string()))?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| NotifyError::Transport(e.to_string()))?
            .credentials(Credentials::new(user.to_string(), password.to_string()))
            .build();

        Ok(Self {
            transport,
            from,
            templates: CredentialsTemplates::new()?,
        })
    }

    /// 检查 SMTP 连接和认证是否可用
    pub async fn verify(&self) -> Result<bool, NotifyError> {
        self.transport
            .test_connection()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))
    }
}

#[async_trait]
impl CredentialNotifier for SmtpNotifier {
    async fn send_credentials(
        &self,
        account: &GuestUser,
        plaintext_password: &str,
    ) -> Result<(), NotifyError> {
        let to = account
            .email
            .parse::<Mailbox>()
            .map_err(|e| NotifyError::Address(e.to_string()))?;
        let body = self.templates.render(account, plaintext_password)?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(CREDENTIALS_SUBJECT)
            .multipart(MultiPart::alternative_plain_html(body.text, body.html))
            .map_err(|e| NotifyError::Message(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        tracing::info!(guest_id = %account.id, to = %account.email, "Credentials email sent");
        Ok(())
    }
}

/// 未配置邮箱时使用：记录一条日志代替发送，不写入密码
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl CredentialNotifier for LogNotifier {
    async fn send_credentials(
        &self,
        account: &GuestUser,
        _plaintext_password: &str,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            guest_id = %account.id,
            to = %account.email,
            username = %account.username,
            expires_at = %account.expires_at,
            subject = CREDENTIALS_SUBJECT,
            "Email not configured, credentials email logged instead of sent"
        );
        Ok(())
    }
}

/// 根据配置选择通知实现，SMTP 可用性只做检查，失败时仍然使用 SMTP
pub async fn from_config(config: &Config) -> Result<Arc<dyn CredentialNotifier>, NotifyError> {
    let credentials = (
        config.email_user.as_deref(),
        config.email_password.as_deref(),
        config.sender(),
    );
    let (true, (Some(user), Some(password), Some(from))) = (config.email_configured(), credentials)
    else {
        tracing::warn!("Email not configured, set EMAIL_USER and EMAIL_PASSWORD to send credentials");
        return Ok(Arc::new(LogNotifier));
    };

    let notifier = SmtpNotifier::new(&config.smtp_host, user, password, from)?;
    match notifier.verify().await {
        Ok(true) => tracing::info!(host = %config.smtp_host, "Email configuration is valid"),
        Ok(false) => tracing::warn!(host = %config.smtp_host, "SMTP server rejected connection test"),
        Err(e) => tracing::error!(host = %config.smtp_host, error = %e, "Email configuration failed"),
    }

    Ok(Arc::new(notifier))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn placeholder_config_uses_log_notifier() {
        let mut config = Config::default();
        config.email_user = Some("test@example.com".into());
        config.email_password = Some("test-password".into());

        // 占位配置不会建立 SMTP 连接
        assert!(from_config(&config).await.is_ok());
    }

    #[test]
    fn invalid_sender_is_rejected() {
        let result = SmtpNotifier::new("smtp.example.com", "u", "p", "not an address");
        assert!(matches!(result, Err(NotifyError::Address(_))));
    }
}
