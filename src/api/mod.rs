pub mod auth;
pub mod collaborators;
pub mod health;
pub mod swagger;
pub mod users;
