use anyhow::Context as _;
use tokio::net::TcpListener;
use tracing::info;

use person_registry::configuration::{get_static_configuration, StorageBackend};
use person_registry::get_database_connection;
use person_registry::store::{MemoryStore, MongoStore};
use person_registry::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("person-registry".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber)?;

    let configuration = get_static_configuration().context("failed to load configuration")?;
    let address = configuration.address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    info!("Starting server at {address} with {:?} storage...", configuration.storage);

    let served = match configuration.storage {
        StorageBackend::Mongodb => {
            let database = get_database_connection(&configuration.database)
                .await
                .context("failed to connect to mongodb")?;
            person_registry::run(listener, MongoStore::new(&database)).await
        }
        StorageBackend::Memory => person_registry::run(listener, MemoryStore::new()).await,
    };

    served.context("server error")
}
