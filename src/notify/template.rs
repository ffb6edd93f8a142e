use handlebars::Handlebars;
use serde_json::json;

use crate::guest::{GuestUser, NotifyError};

pub const CREDENTIALS_SUBJECT: &str = "Your Guest Access Credentials";

const TEXT_TEMPLATE: &str = "credentials_text";
const HTML_TEMPLATE: &str = "credentials_html";

// 纯文本正文使用三重花括号，不做 HTML 转义
const CREDENTIALS_TEXT: &str = "Dear {{{name}}},\n\n\
     Your guest access has been created successfully.\n\n\
     LOGIN CREDENTIALS:\n\
     Username: {{{username}}}\n\
     Password: {{{password}}}\n\
     Access Expires: {{{expires}}}\n\n\
     IMPORTANT NOTES:\n\
     - Please keep your credentials secure\n\
     - Your access will expire on {{{expires}}}\n\
     - Contact the administrator if you need assistance\n\n\
     This is an automated message. Please do not reply.\n";

const CREDENTIALS_HTML: &str = r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
  <h1 style="font-size: 24px;">Welcome, {{name}}!</h1>
  <p>Your guest access has been created successfully.</p>
  <h2>Your Login Credentials</h2>
  <p><strong>Username:</strong> <code>{{username}}</code></p>
  <p><strong>Password:</strong> <code>{{password}}</code></p>
  <p><strong>Access Expires:</strong> {{expires}}</p>
  <ul>
    <li>Please keep your credentials secure</li>
    <li>Your access will expire on {{expires}}</li>
    <li>Contact the administrator if you need assistance</li>
  </ul>
  <p style="color: #6c757d; font-size: 14px;">This is an automated message. Please do not reply to this email.</p>
</div>"#;

/// 凭据邮件正文
pub struct CredentialsEmail {
    pub text: String,
    pub html: String,
}

/// 凭据邮件模板，创建时注册一次
pub struct CredentialsTemplates {
    registry: Handlebars<'static>,
}

impl CredentialsTemplates {
    pub fn new() -> Result<Self, NotifyError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry
            .register_template_string(TEXT_TEMPLATE, CREDENTIALS_TEXT)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        registry
            .register_template_string(HTML_TEMPLATE, CREDENTIALS_HTML)
            .map_err(|e| NotifyError::Template(e.to_string()))?;

        Ok(Self { registry })
    }

    pub fn render(
        &self,
        account: &GuestUser,
        plaintext_password: &str,
    ) -> Result<CredentialsEmail, NotifyError> {
        let name = if account.full_name.trim().is_empty() {
            "User"
        } else {
            account.full_name.as_str()
        };
        let data = json!({
            "name": name,
            "username": account.username,
            "password": plaintext_password,
            "expires": account.expires_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        });

        let text = self
            .registry
            .render(TEXT_TEMPLATE, &data)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        let html = self
            .registry
            .render(HTML_TEMPLATE, &data)
            .map_err(|e| NotifyError::Template(e.to_string()))?;

        Ok(CredentialsEmail { text, html })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn guest(full_name: &str) -> GuestUser {
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        GuestUser {
            id: Uuid::new_v4(),
            username: "bob_sub".into(),
            password_hash: "hash".into(),
            full_name: full_name.into(),
            email: "bob@example.org".into(),
            phone_number: "123".into(),
            expires_at: Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap(),
            is_active: true,
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn includes_credentials_and_expiry() {
        let templates = CredentialsTemplates::new().unwrap();
        let email = templates.render(&guest("Bob"), "p@ss<1>").unwrap();

        assert!(email.text.contains("Username: bob_sub"));
        assert!(email.text.contains("Password: p@ss<1>"));
        assert!(email.text.contains("2024-02-29 00:00 UTC"));
        assert!(email.html.contains("Welcome, Bob!"));
        assert!(email.html.contains("p@ss&lt;1&gt;"));
    }

    #[test]
    fn html_body_escapes_guest_name() {
        let templates = CredentialsTemplates::new().unwrap();
        let email = templates
            .render(&guest("<script>alert(1)</script>"), "x")
            .unwrap();

        assert!(!email.html.contains("<script>"));
        assert!(email.html.contains("&lt;script&gt;"));
        assert!(email.text.starts_with("Dear <script>alert(1)</script>,"));
    }

    #[test]
    fn blank_name_falls_back_to_user() {
        let templates = CredentialsTemplates::new().unwrap();
        let email = templates.render(&guest("  "), "x").unwrap();
        assert!(email.text.starts_with("Dear User,"));
    }
}
