// Validação de campos compartilhada entre o CRUD síncrono e o pipeline de
// importação CSV: as duas portas aceitam exatamente as mesmas regras.
use crate::models::CollaboratorInput;

const MAX_FIELD_LEN: usize = 255;

pub fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.len() > MAX_FIELD_LEN {
        return false;
    }
    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return false,
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

/// Normaliza um CPF para exatamente 11 dígitos, aceitando a forma
/// pontuada (123.456.789-09) ou crua (12345678909).
pub fn normalize_cpf(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let separators_only = raw
        .chars()
        .all(|c| c.is_ascii_digit() || c == '.' || c == '-' || c.is_whitespace());
    if digits.len() == 11 && separators_only {
        Some(digits)
    } else {
        None
    }
}

/// Sigla de estado: exatamente 2 letras, normalizada para maiúsculas.
pub fn normalize_state(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.chars().count() == 2 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(trimmed.to_uppercase())
    } else {
        None
    }
}

fn valid_text_field(value: &str) -> bool {
    !value.is_empty() && value.chars().count() <= MAX_FIELD_LEN
}

/// Valida e normaliza um registro de colaborador. Retorna a cópia
/// normalizada (cpf só dígitos, estado maiúsculo, campos aparados) ou a
/// primeira regra violada.
pub fn validate_collaborator(input: &CollaboratorInput) -> Result<CollaboratorInput, String> {
    let name = input.name.trim();
    if !valid_text_field(name) {
        return Err("name must be a non-empty string of at most 255 characters".to_string());
    }

    let email = input.email.trim();
    if !is_valid_email(email) {
        return Err(format!("'{}' is not a valid email address", input.email));
    }

    let cpf = normalize_cpf(input.cpf.trim())
        .ok_or_else(|| format!("'{}' is not a valid CPF (11 digits expected)", input.cpf))?;

    let city = input.city.trim();
    if !valid_text_field(city) {
        return Err("city must be a non-empty string of at most 255 characters".to_string());
    }

    let state = normalize_state(&input.state)
        .ok_or_else(|| format!("'{}' is not a valid state code (2 letters expected)", input.state))?;

    Ok(CollaboratorInput {
        name: name.to_string(),
        email: email.to_string(),
        cpf,
        city: city.to_string(),
        state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, email: &str, cpf: &str, city: &str, state: &str) -> CollaboratorInput {
        CollaboratorInput {
            name: name.to_string(),
            email: email.to_string(),
            cpf: cpf.to_string(),
            city: city.to_string(),
            state: state.to_string(),
        }
    }

    #[test]
    fn test_valid_record_is_normalized() {
        let result = validate_collaborator(&input(
            " João Silva ",
            "joao.silva@email.com",
            "123.456.789-09",
            "São Paulo",
            "sp",
        ))
        .unwrap();
        assert_eq!(result.name, "João Silva");
        assert_eq!(result.cpf, "12345678909");
        assert_eq!(result.state, "SP");
    }

    #[test]
    fn test_cpf_with_ten_digits_is_rejected() {
        assert!(normalize_cpf("1234567890").is_none());
        let result = validate_collaborator(&input(
            "Ana",
            "ana@email.com",
            "1234567890",
            "Recife",
            "PE",
        ));
        assert!(result.unwrap_err().contains("CPF"));
    }

    #[test]
    fn test_cpf_with_letters_is_rejected() {
        assert!(normalize_cpf("1234567890a").is_none());
    }

    #[test]
    fn test_cpf_punctuation_is_stripped() {
        assert_eq!(normalize_cpf("123.456.789-09").unwrap(), "12345678909");
        assert_eq!(normalize_cpf("12345678909").unwrap(), "12345678909");
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("user@example.com"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("user @example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_state_must_be_two_letters() {
        assert_eq!(normalize_state("sp").unwrap(), "SP");
        assert_eq!(normalize_state(" RJ ").unwrap(), "RJ");
        assert!(normalize_state("S").is_none());
        assert!(normalize_state("SPX").is_none());
        assert!(normalize_state("1A").is_none());
    }

    #[test]
    fn test_empty_name_and_city_rejected() {
        assert!(validate_collaborator(&input("", "a@b.com", "12345678909", "X", "SP")).is_err());
        assert!(validate_collaborator(&input("A", "a@b.com", "12345678909", "  ", "SP")).is_err());
    }

    #[test]
    fn test_name_over_255_chars_rejected() {
        let long_name = "x".repeat(256);
        assert!(
            validate_collaborator(&input(&long_name, "a@b.com", "12345678909", "X", "SP")).is_err()
        );
    }
}
