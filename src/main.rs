use clap::{Parser, Subcommand};
use delivery_provider::clients::ClientDirectory;
use delivery_provider::config::Config;
use delivery_provider::counterparty::CounterpartyLookup;
use delivery_provider::domain::{
    ClientRecord, ComponentGroup, ComponentType, Delivery, LocationRecord, ANY_VERSION,
};
use delivery_provider::logging;
use delivery_provider::provider::DeliveryProvider;
use delivery_provider::server::{start_server, AppState};
use delivery_provider::storage::InMemoryStore;
use chrono::{Duration, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "delivery_provider")]
#[command(about = "Delivery search and file provenance service")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// Port override; falls back to PROVIDER_PORT, then 8080
        #[arg(long)]
        port: Option<u16>,
        /// Seed the in-memory store with demo records
        #[arg(long)]
        demo: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, demo } => {
            let config = Config::from_env()?;
            let port = port.unwrap_or(config.port);

            let store = Arc::new(InMemoryStore::new());
            if demo {
                seed_demo_data(&store);
                info!("Seeded demo records into the in-memory store");
            }

            let state = Arc::new(AppState {
                provider: DeliveryProvider::new(store.clone(), store.clone(), store.clone()),
                directory: ClientDirectory::new(store.clone()),
                counterparty: CounterpartyLookup::new(
                    config.counterparty_enabled,
                    &config.counterparty_path,
                ),
            });

            println!("Starting delivery provider on port {port}...");
            start_server(state, port).await?;
        }
    }

    Ok(())
}

fn seed_demo_data(store: &InMemoryStore) {
    let mut client = ClientRecord {
        id: None,
        code: "CLIENT_A".to_string(),
        country: "DE".to_string(),
        language: Some("de".to_string()),
        is_active: true,
    };
    store.add_client(&mut client);

    store.add_component_type(ComponentType {
        code: "DSTR".to_string(),
        name: "Distribution archive".to_string(),
        templates: BTreeMap::from([(ANY_VERSION.to_string(), r"distr/.+\.zip".to_string())]),
    });
    store.add_component_group(ComponentGroup {
        code: "RELEASE".to_string(),
        members: vec!["DSTR".to_string()],
    });

    let mut delivery = Delivery {
        id: None,
        group_id: "com.example.CLIENT_A".to_string(),
        artifact_id: "billing".to_string(),
        version: "1.2".to_string(),
        creation_date: Utc::now() - Duration::days(1),
        author: "jdoe".to_string(),
        comment: "Demo delivery".to_string(),
        file_list: "distr/billing-1.2.zip\ncom.example:billing:1.2:zip".to_string(),
        tag_root: "tags/billing-1.2".to_string(),
        business_status: None,
        flag_uploaded: true,
        flag_approved: false,
        flag_failed: false,
    };
    store.add_delivery(&mut delivery);

    store.add_location(LocationRecord {
        path: "tags/billing-1.2/distr/billing-1.2.zip".to_string(),
        citype_code: "DSTR".to_string(),
        citype_name: "Distribution archive".to_string(),
        location_kind: "SVN".to_string(),
        effective_date: Utc::now() - Duration::days(2),
        historical: true,
    });
}
