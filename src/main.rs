mod api;
mod database;
mod jobs;
mod middleware;
mod models;
mod policies;
mod seeds;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::env;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Get configuration from environment
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3002".to_string());
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    log::info!("🚀 Starting Collaborator Service...");
    log::info!("📊 Database: {}", database_url);

    // Initialize MongoDB connection (índices únicos criados aqui)
    let db = database::MongoDB::new(&database_url)
        .await
        .expect("Failed to connect to MongoDB");

    let db_data = web::Data::new(db.clone());

    log::info!("✅ MongoDB connected successfully");

    // 🌱 Seed default manager account (se configurado via env)
    seeds::user_seed::seed_default_user(&db).await;

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin("http://localhost:3000")
            .allowed_origin("http://127.0.0.1:3000")
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .supports_credentials()
            .max_age(3600);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            // Uploads de CSV chegam como corpo bruto; o limite default (256KB) é baixo demais
            .app_data(web::PayloadConfig::new(api::collaborators::MAX_UPLOAD_BYTES))
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
            // Health check
            .route("/health", web::get().to(api::health::health_check))
            // Auth endpoints
            .service(
                web::scope("/api/v1/auth")
                    .route("/login", web::post().to(api::auth::login))
                    .route("/logout", web::post().to(api::auth::logout)),
            )
            // Users: manager accounts - Requires JWT
            .service(
                web::scope("/api/v1/users")
                    .wrap(middleware::auth::AuthMiddleware)
                    .route("", web::post().to(api::users::create_user))
                    .route("", web::get().to(api::users::list_users)),
            )
            // Collaborators: CRUD + CSV import, scoped to the authenticated manager
            .service(
                web::scope("/api/v1/collaborators")
                    .wrap(middleware::auth::AuthMiddleware)
                    .route("", web::post().to(api::collaborators::create_collaborator))
                    .route("", web::get().to(api::collaborators::list_collaborators))
                    .route("/upload", web::post().to(api::collaborators::upload_csv))
                    .route("/{id}", web::put().to(api::collaborators::update_collaborator))
                    .route("/{id}", web::delete().to(api::collaborators::delete_collaborator)),
            )
    })
    .bind(format!("{}:{}", host, port))?
    .run()
    .await
}
