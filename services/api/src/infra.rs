use edumarket::config::{MailConfig, SmtpSecurity, UploadConfig};
use edumarket::mail::{LogMailer, MailError, Mailer, OutboundEmail};
use edumarket::Marketplace;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::AsyncSmtpTransportBuilder;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Router state: the wired services plus where uploads land.
pub(crate) struct ApiState<S> {
    pub(crate) market: Arc<Marketplace<S>>,
    pub(crate) uploads: Arc<UploadConfig>,
}

impl<S> ApiState<S> {
    pub(crate) fn new(market: Arc<Marketplace<S>>, uploads: UploadConfig) -> Self {
        Self {
            market,
            uploads: Arc::new(uploads),
        }
    }
}

// Derived Clone would demand `S: Clone`.
impl<S> Clone for ApiState<S> {
    fn clone(&self) -> Self {
        Self {
            market: self.market.clone(),
            uploads: self.uploads.clone(),
        }
    }
}

/// SMTP relay adapter. Messages are built synchronously so address errors reach the caller;
/// delivery runs on a spawned task.
#[derive(Clone)]
pub(crate) struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub(crate) fn new(config: &MailConfig) -> Result<Self, MailError> {
        let from = config
            .from
            .parse::<Mailbox>()
            .map_err(|err| MailError::Address(format!("{}: {err}", config.from)))?;

        let mut builder = transport_builder(config)?.port(config.port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    fn build(&self, email: OutboundEmail) -> Result<Message, MailError> {
        let to = email
            .to
            .parse::<Mailbox>()
            .map_err(|err| MailError::Address(format!("{}: {err}", email.to)))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.body)
            .map_err(|err| MailError::Transport(err.to_string()))
    }
}

/// TLS unless the relay is explicitly configured as plain.
fn transport_builder(config: &MailConfig) -> Result<AsyncSmtpTransportBuilder, MailError> {
    let builder = match config.security {
        SmtpSecurity::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host),
        SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host),
        SmtpSecurity::Plain => {
            tracing::warn!(host = %config.host, "smtp relay configured without TLS");
            return Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(
                &config.host,
            ));
        }
    };
    builder.map_err(|err| MailError::Transport(err.to_string()))
}

impl Mailer for SmtpMailer {
    fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|err| MailError::Transport(err.to_string()))?;
        let recipient = email.to.clone();
        let message = self.build(email)?;
        let transport = self.transport.clone();

        runtime.spawn(async move {
            match transport.send(message).await {
                Ok(_) => tracing::debug!(%recipient, "email delivered"),
                Err(err) => tracing::warn!(%recipient, error = %err, "smtp delivery failed"),
            }
        });
        Ok(())
    }
}

/// Chooses the SMTP relay when configured, otherwise logs outgoing mail.
pub(crate) fn mailer(config: Option<&MailConfig>) -> Result<Arc<dyn Mailer>, MailError> {
    match config {
        Some(config) => {
            tracing::info!(
                host = %config.host,
                port = config.port,
                security = ?config.security,
                "smtp relay configured"
            );
            Ok(Arc::new(SmtpMailer::new(config)?))
        }
        None => {
            tracing::warn!("SMTP_HOST not set; outgoing email is only logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relay() -> MailConfig {
        MailConfig {
            host: "localhost".to_string(),
            port: 1025,
            username: None,
            password: None,
            from: "Edumarket <no-reply@edumarket.test>".to_string(),
            security: SmtpSecurity::Plain,
        }
    }

    #[test]
    fn tls_relays_build_for_a_named_host() {
        for security in [SmtpSecurity::StartTls, SmtpSecurity::Tls] {
            let config = MailConfig {
                host: "smtp.gmail.com".to_string(),
                port: 587,
                security,
                ..relay()
            };
            assert!(SmtpMailer::new(&config).is_ok(), "{security:?}");
        }
    }

    #[test]
    fn rejects_malformed_sender() {
        let config = MailConfig {
            from: "not an address".to_string(),
            ..relay()
        };
        assert!(matches!(
            SmtpMailer::new(&config),
            Err(MailError::Address(_))
        ));
    }

    #[test]
    fn malformed_recipient_is_reported_before_dispatch() {
        let mailer = SmtpMailer::new(&relay()).expect("relay builds");
        let result = mailer.build(OutboundEmail::password_reset("nobody", "123456"));
        assert!(matches!(result, Err(MailError::Address(_))));
    }

    #[tokio::test]
    async fn send_hands_off_to_a_background_task() {
        let mailer = SmtpMailer::new(&relay()).expect("relay builds");
        mailer
            .send(OutboundEmail::password_reset("student@example.com", "123456"))
            .expect("queued");
    }
}
