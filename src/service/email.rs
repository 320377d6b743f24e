use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use log::error;
use std::error::Error;
use std::fs;
use std::sync::Arc;

use crate::cli::Args;
use crate::constants;
use crate::models::chat::Conversation;
use crate::models::result::OperationResult;
use crate::repository::ChatRepository;
use crate::text;

#[derive(Clone)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub template_path: String,
}

impl MailConfig {
    pub fn from_args(args: &Args) -> Self {
        Self {
            host: args.smtp_host.clone(),
            port: args.smtp_port,
            username: args.smtp_username.clone(),
            password: args.smtp_password.clone(),
            template_path: args.mail_template_path.clone(),
        }
    }
}

/// Sends a conversation transcript as a templated HTML mail over SMTP with
/// STARTTLS. Delivery failures are logged and swallowed: the returned result
/// is not a delivery confirmation.
pub struct EmailService {
    repository: Arc<ChatRepository>,
    config: MailConfig,
}

impl EmailService {
    pub fn new(repository: Arc<ChatRepository>, config: MailConfig) -> Self {
        Self { repository, config }
    }

    pub async fn send_email(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<OperationResult, Box<dyn Error + Send + Sync>> {
        let Some(conversation) = self
            .repository
            .get_conversation_by_id(user_id, conversation_id)
            .await?
        else {
            // Unlike the chat paths this sentinel rides a 200 message.
            return Ok(OperationResult::new(
                true,
                constants::MSJ_200,
                Some(serde_json::Value::String(constants::CONV_NO_EXIST.into())),
            ));
        };

        match self.deliver(user_id, &conversation).await {
            Ok(()) => Ok(OperationResult::ok(None)),
            Err(e) => {
                error!("Failed to send transcript mail to {}: {}", user_id, e);
                Ok(OperationResult::new(false, "", None))
            }
        }
    }

    async fn deliver(
        &self,
        user_id: &str,
        conversation: &Conversation,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let date = conversation
            .date
            .map(text::format_display_date)
            .unwrap_or_default();
        let html = self.render_template(user_id, conversation, &date)?;

        let email = Message::builder()
            .from(self.config.username.parse()?)
            .to(user_id.parse()?)
            .subject(format!("Conversación chatbot {}", date))
            .header(ContentType::TEXT_HTML)
            .body(html)?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)?
            .port(self.config.port)
            .credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
            .build();
        mailer.send(email).await?;
        Ok(())
    }

    fn render_template(
        &self,
        user_id: &str,
        conversation: &Conversation,
        date: &str,
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        let template = fs::read_to_string(&self.config.template_path)?;
        let (status, status_class) = if conversation.estado {
            (constants::STATUS_ACTIVE, "status-activo")
        } else {
            (constants::STATUS_INACTIVE, "status-inactivo")
        };

        Ok(template
            .replace("{{status}}", status)
            .replace("{{statusClass}}", status_class)
            .replace("{{date}}", date)
            .replace("{{userName}}", user_id)
            .replace("{{messages}}", &build_messages_html(conversation)))
    }
}

/// One block per message, framed as Consulta or Respuesta depending on the
/// case-insensitive bot sender sentinel, with the text rendered from
/// markdown.
fn build_messages_html(conversation: &Conversation) -> String {
    let mut out = String::new();
    for message in conversation.messages.as_deref().unwrap_or_default() {
        let body = text::markdown_to_html(&message.message);
        if message.id_persona.to_lowercase() == constants::ID_CHATBOT {
            out.push_str(&format!(
                "\n<div class='section response'>\n    <h3>Respuesta:</h3>\n    <p>{}</p>\n</div>",
                body
            ));
        } else {
            out.push_str(&format!(
                "\n<div class='section'>\n    <h3>Consulta:</h3>\n    <p>{}</p>\n</div>",
                body
            ));
        }
    }
    out
}
