pub mod auth_service;
pub mod collaborator_service;
pub mod mailer_service;
pub mod user_service;
