use mongodb::bson::doc;
use mongodb::{options::ClientOptions, Client, Database};

use crate::config::Config;

pub async fn connect(config: &Config) -> Result<Database, mongodb::error::Error> {
    let mut client_options = ClientOptions::parse(&config.database_url).await?;
    client_options.app_name = Some("estoque-api".to_string());

    let client = Client::with_options(client_options)?;
    let db = client.database(&config.database_name);

    // The driver connects lazily; fail at startup rather than on first request.
    db.run_command(doc! { "ping": 1 }, None).await?;
    log::info!("Connected to MongoDB database {}", config.database_name);

    Ok(db)
}
