//! Servicio de notificaciones por correo
//!
//! SMTP con `lettre` cuando hay configuración; en su defecto los correos
//! sólo se registran en el log. Un fallo de envío nunca hace fallar la
//! petición que lo originó.

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::SmtpConfig;
use crate::utils::errors::AppError;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError>;
}

/// Envío real vía SMTP
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| AppError::Mail(e.to_string()))?
            .port(config.port)
            .credentials(Credentials::new(config.username.clone(), config.password.clone()))
            .build();

        let from = config
            .from
            .parse()
            .map_err(|e| AppError::Mail(format!("invalid MAIL_FROM: {}", e)))?;

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        let to: Mailbox = to
            .parse()
            .map_err(|e| AppError::Mail(format!("invalid recipient '{}': {}", to, e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AppError::Mail(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Mail(e.to_string()))?;
        Ok(())
    }
}

/// Sin SMTP configurado: sólo deja constancia en el log
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), AppError> {
        info!("📧 (sin SMTP) correo para {}: {}", to, subject);
        Ok(())
    }
}

pub fn build_mailer(config: Option<&SmtpConfig>) -> Result<Arc<dyn Mailer>, AppError> {
    match config {
        Some(smtp) => {
            info!("📧 SMTP configurado en {}:{}", smtp.host, smtp.port);
            Ok(Arc::new(SmtpMailer::new(smtp)?))
        }
        None => {
            warn!("📧 SMTP_HOST no definido, los correos sólo se registrarán");
            Ok(Arc::new(LogMailer))
        }
    }
}

/// Envía sin propagar errores
pub async fn notify(mailer: &dyn Mailer, message: Notification) {
    if let Err(e) = mailer.send(&message.to, &message.subject, &message.body).await {
        warn!("⚠️ No se pudo enviar '{}' a {}: {}", message.subject, message.to, e);
    }
}

/// Aviso posterior a una escritura ya confirmada. Si preparar el mensaje
/// falla (por ejemplo al leer el destinatario) sólo se registra; devuelve
/// si llegó a intentarse el envío.
pub async fn notify_after_commit<F>(mailer: &dyn Mailer, prepare: F) -> bool
where
    F: Future<Output = Result<Option<Notification>, AppError>>,
{
    match prepare.await {
        Ok(Some(message)) => {
            notify(mailer, message).await;
            true
        }
        Ok(None) => false,
        Err(e) => {
            error!("❌ No se pudo preparar una notificación: {}", e);
            false
        }
    }
}

/// Correo listo para enviar
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn trip_assigned(to: &str, driver_name: &str, trip_number: &str, route: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: format!("PRO FLEET: trip {} assigned to you", trip_number),
            body: format!(
                "Hello {},\n\nTrip {} ({}) has been assigned to you. \
                 Open the driver dashboard to start it.\n\nPRO FLEET",
                driver_name, trip_number, route
            ),
        }
    }

    pub fn invoice_sent(to: &str, customer_name: &str, invoice_number: &str, total: &str, due: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: format!("PRO FLEET: invoice {}", invoice_number),
            body: format!(
                "Hello {},\n\nInvoice {} for {} SAR is now available. Due date: {}.\n\nPRO FLEET",
                customer_name, invoice_number, total, due
            ),
        }
    }

    pub fn document_reviewed(to: &str, document_type: &str, status: &str, notes: Option<&str>) -> Self {
        Self {
            to: to.to_string(),
            subject: format!("PRO FLEET: customs document {}", status),
            body: format!(
                "Your {} document was reviewed: {}.\n{}\n\nPRO FLEET",
                document_type,
                status,
                notes.unwrap_or_default()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), AppError> {
            if self.fail {
                return Err(AppError::Mail("smtp down".to_string()));
            }
            self.sent.lock().unwrap().push(format!("{}|{}", to, subject));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_notify_delivers() {
        let mailer = RecordingMailer::default();
        notify(&mailer, Notification::trip_assigned("d@x.com", "Omar", "TRP-1", "Riyadh → Jeddah")).await;
        assert_eq!(mailer.sent.lock().unwrap().as_slice(), ["d@x.com|PRO FLEET: trip TRP-1 assigned to you"]);
    }

    #[tokio::test]
    async fn test_notify_swallows_errors() {
        let mailer = RecordingMailer { fail: true, ..Default::default() };
        notify(&mailer, Notification::invoice_sent("c@x.com", "Sara", "INV-1", "1150.00", "2026-01-01")).await;
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_notify_after_commit_survives_lookup_failure() {
        let mailer = RecordingMailer::default();
        let attempted = notify_after_commit(&mailer, async {
            Err::<Option<Notification>, _>(AppError::Internal("recipient lookup failed".to_string()))
        })
        .await;
        assert!(!attempted);
        assert!(mailer.sent.lock().unwrap().is_empty());

        let attempted = notify_after_commit(&mailer, async {
            Ok::<_, AppError>(Some(Notification::document_reviewed("b@x.com", "INVOICE", "APPROVED", None)))
        })
        .await;
        assert!(attempted);
        assert_eq!(mailer.sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_build_log_mailer_without_smtp() {
        assert!(build_mailer(None).is_ok());
    }

    #[test]
    fn test_document_reviewed_includes_notes() {
        let n = Notification::document_reviewed("b@x.com", "BILL_OF_LADING", "REJECTED", Some("blurry scan"));
        assert!(n.body.contains("blurry scan"));
        assert!(n.subject.ends_with("REJECTED"));
    }
}
