use mongodb::{Client, Collection, Database};
use std::error::Error;

#[derive(Clone)]
pub struct MongoDB {
    client: Client,
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        // Connection pool
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        // Timeouts
        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        // Extract database name from URI or use default
        let db_name = uri
            .split('/')
            .last()
            .and_then(|s| s.split('?').next())
            .filter(|s| !s.is_empty())
            .unwrap_or("CollaboratorService");

        let db = client.database(db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { client, db };
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Cria os índices do serviço. Os índices únicos são a garantia final
    /// de unicidade: todo pre-check de duplicidade é check-then-act e a
    /// violação (E11000) é mapeada para `Conflict` pelos serviços.
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        use mongodb::bson::doc;
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        log::info!("🔧 Creating database indexes...");

        let unique = || IndexOptions::builder().unique(true).build();

        let users = self.database().collection::<mongodb::bson::Document>("users");
        for (name, keys) in [
            ("users(email) unique", doc! { "email": 1 }),
            ("users(user_id) unique", doc! { "user_id": 1 }),
        ] {
            let index = IndexModel::builder().keys(keys).options(unique()).build();
            match users.create_index(index).await {
                Ok(_) => log::info!("   ✅ Index created: {}", name),
                Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
            }
        }

        let collaborators = self
            .database()
            .collection::<mongodb::bson::Document>("collaborators");
        for (name, keys) in [
            ("collaborators(email) unique", doc! { "email": 1 }),
            ("collaborators(cpf) unique", doc! { "cpf": 1 }),
            ("collaborators(collaborator_id) unique", doc! { "collaborator_id": 1 }),
        ] {
            let index = IndexModel::builder().keys(keys).options(unique()).build();
            match collaborators.create_index(index).await {
                Ok(_) => log::info!("   ✅ Index created: {}", name),
                Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
            }
        }

        // Índice de listagem por dono (não-único)
        let owner_index = IndexModel::builder().keys(doc! { "user_id": 1 }).build();
        match collaborators.create_index(owner_index).await {
            Ok(_) => log::info!("   ✅ Index created: collaborators(user_id)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}
