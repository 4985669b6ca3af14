// Política de acesso a colaboradores: predicados puros, sem efeito
// colateral. Uma negação aqui vira `Forbidden`, distinta de `NotFound`
// (checado antes) e de erro de validação.
use crate::models::Collaborator;

/// Um gestor só altera ou remove os próprios colaboradores.
pub fn can_modify(acting_user_id: &str, collaborator: &Collaborator) -> bool {
    acting_user_id == collaborator.user_id
}

/// Qualquer gestor autenticado pode listar; a query do banco é quem
/// restringe o resultado aos registros do dono.
pub fn can_view(_acting_user_id: &str) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collaborator_owned_by(user_id: &str) -> Collaborator {
        Collaborator {
            id: None,
            collaborator_id: "c1".to_string(),
            name: "João Silva".to_string(),
            email: "joao@email.com".to_string(),
            cpf: "12345678909".to_string(),
            city: "São Paulo".to_string(),
            state: "SP".to_string(),
            user_id: user_id.to_string(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_owner_can_modify() {
        let collaborator = collaborator_owned_by("owner-1");
        assert!(can_modify("owner-1", &collaborator));
    }

    #[test]
    fn test_non_owner_cannot_modify() {
        let collaborator = collaborator_owned_by("owner-1");
        assert!(!can_modify("owner-2", &collaborator));
    }

    #[test]
    fn test_any_user_can_view() {
        assert!(can_view("anyone"));
    }
}
