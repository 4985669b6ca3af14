// Notificador de e-mail: POST JSON para o relay configurado em
// MAIL_API_URL. O serviço só conhece a fronteira (destinatário, template,
// payload); entrega em si é responsabilidade do relay.
use crate::utils::error::AppError;
use serde::Serialize;

const IMPORT_TEMPLATE: &str = "collaborator_processed";
const IMPORT_SUBJECT: &str = "Colaboradores Processados";

/// Payload do e-mail de resultado de importação. Uma execução bem-sucedida
/// envia os contadores; uma falha de pipeline envia apenas `error`.
#[derive(Debug, Serialize)]
pub struct ImportNotification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_processed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_failed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicated_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failures: Option<Vec<RowFailureDetail>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowFailureDetail {
    /// Número da linha no arquivo (header = linha 1)
    pub line: usize,
    pub row: Vec<String>,
    pub error: String,
}

impl ImportNotification {
    pub fn success(
        total_processed: u32,
        total_failed: u32,
        duplicated_count: u32,
        failures: Vec<RowFailureDetail>,
    ) -> Self {
        ImportNotification {
            total_processed: Some(total_processed),
            total_failed: Some(total_failed),
            duplicated_count: Some(duplicated_count),
            failures: Some(failures),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn failure(error: String) -> Self {
        ImportNotification {
            total_processed: None,
            total_failed: None,
            duplicated_count: None,
            failures: None,
            error: Some(error),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
struct MailRequest<'a, T: Serialize> {
    to: &'a str,
    subject: &'a str,
    template: &'a str,
    payload: &'a T,
}

async fn send<T: Serialize>(
    to_email: &str,
    subject: &str,
    template: &str,
    payload: &T,
) -> Result<(), AppError> {
    let api_url = std::env::var("MAIL_API_URL")
        .map_err(|_| AppError::Mail("MAIL_API_URL not configured".to_string()))?;
    let api_key = std::env::var("MAIL_API_KEY").unwrap_or_default();

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/messages", api_url.trim_end_matches('/')))
        .bearer_auth(api_key)
        .timeout(std::time::Duration::from_secs(10))
        .json(&MailRequest {
            to: to_email,
            subject,
            template,
            payload,
        })
        .send()
        .await
        .map_err(|e| AppError::Mail(format!("Failed to reach mail relay: {}", e)))?;

    if !response.status().is_success() {
        return Err(AppError::Mail(format!(
            "Mail relay error: {}",
            response.status()
        )));
    }

    Ok(())
}

/// Envia o e-mail de resultado de importação. Exatamente uma notificação
/// por tarefa, nas duas ramificações (sucesso ou erro de pipeline).
pub async fn send_import_report(
    to_email: &str,
    notification: &ImportNotification,
) -> Result<(), AppError> {
    send(to_email, IMPORT_SUBJECT, IMPORT_TEMPLATE, notification).await?;
    log::info!("📧 Import report sent to {}", to_email);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_payload_omits_error() {
        let notification = ImportNotification::success(3, 1, 2, vec![]);
        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["total_processed"], 3);
        assert_eq!(json["total_failed"], 1);
        assert_eq!(json["duplicated_count"], 2);
        assert!(json.get("error").is_none());
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_failure_payload_omits_counters() {
        let notification = ImportNotification::failure("Invalid CSV header format".to_string());
        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["error"], "Invalid CSV header format");
        assert!(json.get("total_processed").is_none());
        assert!(json.get("duplicated_count").is_none());
    }
}
