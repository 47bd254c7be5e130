#[derive(serde::Deserialize, Clone)]
pub struct StaticConfiguration {
    pub database: DatabaseConfiguration,
    #[serde(default = "default_host")]
    pub application_host: String,
    pub application_port: u16,
    #[serde(default)]
    pub storage: StorageBackend,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseConfiguration {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

/// Which [`crate::store::PersonStore`] the server is wired to at startup.
#[derive(serde::Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Mongodb,
    Memory,
}

impl StaticConfiguration {
    pub fn address(&self) -> String {
        format!("{}:{}", self.application_host, self.application_port)
    }
}

impl DatabaseConfiguration {
    pub fn connection_string(&self) -> String {
        format!(
            "mongodb://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

fn default_host() -> String {
    String::from("127.0.0.1")
}

/// Reads `configuration.yaml`, then applies `APP_`-prefixed environment
/// overrides (`APP_DATABASE__HOST=mongo`, `APP_STORAGE=memory`, ...).
pub fn get_static_configuration() -> Result<StaticConfiguration, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::new("configuration.yaml", config::FileFormat::Yaml))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<StaticConfiguration>()
}
