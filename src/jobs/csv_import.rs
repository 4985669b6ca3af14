// ==================== CSV IMPORT PIPELINE ====================
// Tarefa em background que processa um CSV de colaboradores enviado por um
// gestor: valida o cabeçalho, processa linha a linha com três contadores
// mutuamente exclusivos (processed/failed/duplicated), invalida o cache da
// lista do dono, envia exatamente um e-mail de resultado e apaga o arquivo
// temporário em todos os caminhos de saída.

use crate::{
    database::MongoDB,
    models::CollaboratorInput,
    services::{collaborator_service, mailer_service, user_service},
    services::mailer_service::{ImportNotification, RowFailureDetail},
    utils::{cache, error::AppError, error::is_duplicate_key_error, validation},
};
use lazy_static::lazy_static;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

const REQUIRED_COLUMNS: [&str; 5] = ["name", "email", "cpf", "city", "state"];

/// Janela de deduplicação de tarefas por arquivo: um segundo enqueue da
/// mesma chave dentro da janela é descartado, não enfileirado.
const DEDUP_WINDOW_SECS: u64 = 3600;

lazy_static! {
    static ref IN_FLIGHT: Mutex<HashMap<String, Instant>> = Mutex::new(HashMap::new());
}

#[derive(Debug, PartialEq)]
pub enum EnqueueOutcome {
    Accepted,
    Deduped,
}

/// Resultado agregado de uma execução. Cada linha contribui para no máximo
/// um dos três contadores.
#[derive(Debug, Default)]
pub struct ImportSummary {
    pub processed: u32,
    pub failed: u32,
    pub duplicated: u32,
    pub failures: Vec<RowFailureDetail>,
}

/// Resultado de uma linha individual
#[derive(Debug, PartialEq)]
enum RowOutcome {
    Inserted,
    Invalid(String),
    Duplicate(String),
}

impl ImportSummary {
    fn record(&mut self, outcome: RowOutcome, line: usize, row: Vec<String>) {
        match outcome {
            RowOutcome::Inserted => self.processed += 1,
            RowOutcome::Invalid(reason) => {
                self.failed += 1;
                log::error!("❌ CSV row {} failed: {}", line, reason);
                self.failures.push(RowFailureDetail { line, row, error: reason });
            }
            RowOutcome::Duplicate(email) => {
                self.duplicated += 1;
                log::warn!("⚠️  CSV row {}: collaborator already exists ({})", line, email);
            }
        }
    }
}

/// Guard do arquivo temporário: a remoção acontece no Drop, ou seja, em
/// qualquer caminho de saída da tarefa, inclusive aborto precoce.
struct TempFile {
    path: PathBuf,
}

impl TempFile {
    fn new(path: PathBuf) -> Self {
        TempFile { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(_) => log::info!("🗑️  Temp CSV removed: {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::error!("❌ Failed to remove temp CSV {}: {}", self.path.display(), e),
        }
    }
}

/// Admissão na janela de dedup. Retorna false se a mesma chave já foi
/// aceita dentro da janela.
fn try_admit(key: &str) -> bool {
    try_admit_within(key, DEDUP_WINDOW_SECS)
}

fn try_admit_within(key: &str, window_secs: u64) -> bool {
    let mut in_flight = match IN_FLIGHT.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    in_flight.retain(|_, accepted_at| accepted_at.elapsed().as_secs() < window_secs);
    if in_flight.contains_key(key) {
        return false;
    }
    in_flight.insert(key.to_string(), Instant::now());
    true
}

/// Agenda o processamento de um CSV. Retorna imediatamente: a tarefa roda
/// desacoplada da request que a criou.
pub fn enqueue(db: MongoDB, file_path: PathBuf, owner_id: String) -> EnqueueOutcome {
    let key = file_path.to_string_lossy().to_string();
    if !try_admit(&key) {
        log::warn!("⚠️  Import for {} already accepted within the dedup window, dropping", key);
        return EnqueueOutcome::Deduped;
    }

    log::info!("📥 Import task accepted: {} (user {})", key, owner_id);
    tokio::spawn(async move {
        run(db, file_path, owner_id).await;
    });

    EnqueueOutcome::Accepted
}

/// Executa a tarefa até o fim. Nunca propaga erro: cada ramificação
/// termina em log + (quando há destinatário) notificação, e o guard
/// garante a limpeza do arquivo.
async fn run(db: MongoDB, file_path: PathBuf, owner_id: String) {
    let file = TempFile::new(file_path);

    // 1. Resolve o dono. Sem dono não há destinatário: aborta logado.
    let owner = match user_service::find_by_user_id(&db, &owner_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            log::error!("❌ Import aborted: user {} not found, nothing to notify", owner_id);
            return;
        }
        Err(e) => {
            log::error!("❌ Import aborted: failed to resolve user {}: {}", owner_id, e);
            return;
        }
    };

    log::info!("🚀 Processing CSV {} for user {}", file.path().display(), owner_id);

    // 2-4. Importa; erros de pipeline (I/O, header) abortam a execução inteira
    let outcome = import_file(&db, file.path(), &owner_id).await;

    let notification = match outcome {
        Ok(summary) => {
            // 5. A lista do dono mudou (ou pode ter mudado): invalida
            cache::invalidate(&cache::collaborators_key(&owner_id));
            log::info!(
                "📊 Import summary for user {}: {} processed, {} failed, {} duplicated",
                owner_id, summary.processed, summary.failed, summary.duplicated
            );
            ImportNotification::success(
                summary.processed,
                summary.failed,
                summary.duplicated,
                summary.failures,
            )
        }
        Err(e) => {
            log::error!("❌ Import failed for user {}: {}", owner_id, e);
            ImportNotification::failure(e.to_string())
        }
    };

    // 6. Exatamente uma notificação por tarefa
    if let Err(e) = mailer_service::send_import_report(&owner.email, &notification).await {
        log::error!("❌ Failed to send import report to {}: {}", owner.email, e);
    }

    // 7. O guard remove o arquivo aqui, em qualquer ramificação acima
}

async fn import_file(
    db: &MongoDB,
    path: &Path,
    owner_id: &str,
) -> Result<ImportSummary, AppError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::Io(format!("cannot read uploaded file: {}", e)))?;

    let mut lines = content.lines();
    let header = match lines.next() {
        Some(line) => parse_record(line),
        None => return Err(AppError::InvalidFormat("the uploaded file is empty".to_string())),
    };

    validate_header(&header)?;

    let mut summary = ImportSummary::default();
    for (index, line) in lines.enumerate() {
        let row = parse_record(line);
        // Header é a linha 1 do arquivo
        let line_number = index + 2;
        let outcome = process_row(db, &header, &row, owner_id).await;
        summary.record(outcome, line_number, row);
    }

    Ok(summary)
}

/// Cabeçalho comparado como conjunto: ordem livre, nomes case-sensitive,
/// exatamente os cinco campos requeridos.
fn validate_header(header: &[String]) -> Result<(), AppError> {
    let found: HashSet<&str> = header.iter().map(|s| s.as_str()).collect();
    let expected: HashSet<&str> = REQUIRED_COLUMNS.iter().copied().collect();
    if header.len() != REQUIRED_COLUMNS.len() || found != expected {
        return Err(AppError::InvalidFormat(format!(
            "invalid CSV header: expected columns {:?}, got {:?}",
            REQUIRED_COLUMNS, header
        )));
    }
    Ok(())
}

/// Divide um registro CSV respeitando aspas duplas ("" escapa aspas).
fn parse_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

/// Associa os rótulos do cabeçalho aos valores posicionais da linha.
fn assemble_row(header: &[String], row: &[String]) -> Result<CollaboratorInput, String> {
    if header.len() != row.len() {
        return Err(format!(
            "row has {} columns, header has {}",
            row.len(),
            header.len()
        ));
    }
    let by_name: HashMap<&str, &str> = header
        .iter()
        .map(|h| h.as_str())
        .zip(row.iter().map(|v| v.as_str()))
        .collect();
    Ok(CollaboratorInput {
        name: by_name["name"].to_string(),
        email: by_name["email"].to_string(),
        cpf: by_name["cpf"].to_string(),
        city: by_name["city"].to_string(),
        state: by_name["state"].to_string(),
    })
}

/// Processa uma linha. As checagens re-consultam o banco a cada linha, de
/// modo que inserções de linhas anteriores desta mesma execução contam
/// como duplicatas para as seguintes.
async fn process_row(
    db: &MongoDB,
    header: &[String],
    row: &[String],
    owner_id: &str,
) -> RowOutcome {
    // a. contagem de colunas
    let input = match assemble_row(header, row) {
        Ok(input) => input,
        Err(reason) => return RowOutcome::Invalid(reason),
    };

    // b. regras de campo compartilhadas com o POST síncrono
    let normalized = match validation::validate_collaborator(&input) {
        Ok(normalized) => normalized,
        Err(reason) => return RowOutcome::Invalid(reason),
    };

    // c. email já cadastrado é duplicata, não falha
    match collaborator_service::email_exists(db, &normalized.email).await {
        Ok(true) => return RowOutcome::Duplicate(normalized.email),
        Ok(false) => {}
        Err(e) => return RowOutcome::Invalid(e.to_string()),
    }

    // CPF já cadastrado conta como falha da linha
    match collaborator_service::cpf_exists(db, &normalized.cpf).await {
        Ok(true) => {
            return RowOutcome::Invalid(format!(
                "CPF '{}' is already registered",
                normalized.cpf
            ))
        }
        Ok(false) => {}
        Err(e) => return RowOutcome::Invalid(e.to_string()),
    }

    // d. insere; corrida de duplicate key equivale ao resultado do pre-check
    let email = normalized.email.clone();
    match collaborator_service::insert_imported(db, owner_id, normalized).await {
        Ok(_) => RowOutcome::Inserted,
        Err(e) if is_duplicate_key_error(&e) => {
            if e.to_string().contains("email") {
                RowOutcome::Duplicate(email)
            } else {
                RowOutcome::Invalid("CPF is already registered".to_string())
            }
        }
        Err(e) => RowOutcome::Invalid(format!("insert failed: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_header_accepts_any_order() {
        assert!(validate_header(&header(&["name", "email", "cpf", "city", "state"])).is_ok());
        assert!(validate_header(&header(&["email", "name", "cpf", "state", "city"])).is_ok());
    }

    #[test]
    fn test_header_missing_column_fails() {
        let result = validate_header(&header(&["name", "email", "cpf", "city"]));
        assert!(matches!(result, Err(AppError::InvalidFormat(_))));
    }

    #[test]
    fn test_header_is_case_sensitive() {
        let result = validate_header(&header(&["Name", "email", "cpf", "city", "state"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_header_with_duplicate_column_fails() {
        let result = validate_header(&header(&["name", "name", "email", "cpf", "city", "state"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_record_simple() {
        assert_eq!(parse_record("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(parse_record(" a , b "), vec!["a", "b"]);
    }

    #[test]
    fn test_parse_record_quoted_comma() {
        assert_eq!(
            parse_record(r#""Silva, João",joao@email.com"#),
            vec!["Silva, João", "joao@email.com"]
        );
    }

    #[test]
    fn test_parse_record_escaped_quote() {
        assert_eq!(parse_record(r#""say ""hi""",x"#), vec![r#"say "hi""#, "x"]);
    }

    #[test]
    fn test_assemble_row_respects_header_order() {
        let header = header(&["email", "name", "cpf", "state", "city"]);
        let row: Vec<String> = ["a@b.com", "Ana", "12345678909", "PE", "Recife"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let input = assemble_row(&header, &row).unwrap();
        assert_eq!(input.name, "Ana");
        assert_eq!(input.email, "a@b.com");
        assert_eq!(input.city, "Recife");
        assert_eq!(input.state, "PE");
    }

    #[test]
    fn test_assemble_row_column_count_mismatch() {
        let header = header(&["name", "email", "cpf", "city", "state"]);
        let row: Vec<String> = ["only", "four", "values", "here"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(assemble_row(&header, &row).is_err());
    }

    #[test]
    fn test_summary_counters_are_mutually_exclusive() {
        let mut summary = ImportSummary::default();
        summary.record(RowOutcome::Inserted, 2, vec![]);
        summary.record(RowOutcome::Invalid("bad cpf".into()), 3, vec!["x".into()]);
        summary.record(RowOutcome::Duplicate("a@b.com".into()), 4, vec![]);
        summary.record(RowOutcome::Inserted, 5, vec![]);
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.duplicated, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].line, 3);
        assert!(summary.failures[0].error.contains("bad cpf"));
    }

    #[test]
    fn test_dedup_window_admission() {
        assert!(try_admit("uploads/dedup-test-a.csv"));
        // Mesma chave dentro da janela: descartada
        assert!(!try_admit("uploads/dedup-test-a.csv"));
        // Chave diferente não é afetada
        assert!(try_admit("uploads/dedup-test-b.csv"));
        // Com janela zero a entrada anterior já está vencida
        assert!(try_admit_within("uploads/dedup-test-a.csv", 0));
    }

    #[tokio::test]
    async fn test_temp_file_guard_removes_file() {
        let path = std::env::temp_dir().join("csv-import-guard-test.csv");
        tokio::fs::write(&path, "name,email,cpf,city,state\n").await.unwrap();
        assert!(path.exists());
        {
            let _guard = TempFile::new(path.clone());
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_temp_file_guard_tolerates_missing_file() {
        let path = std::env::temp_dir().join("csv-import-guard-missing.csv");
        let _ = std::fs::remove_file(&path);
        // Não entra em pânico quando o arquivo já não existe
        let guard = TempFile::new(path);
        drop(guard);
    }
}
