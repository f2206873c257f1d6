pub mod config {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct Config {
        /// Full connection string. Takes precedence over the `db_*` parts.
        #[serde(default)]
        pub db_url: Option<String>,
        #[serde(default)]
        pub db_user: Option<String>,
        #[serde(default)]
        pub db_password: Option<String>,
        #[serde(default)]
        pub db_host: Option<String>,
        #[serde(default)]
        pub db_port: Option<String>,
        #[serde(default)]
        pub db_name: Option<String>,
        #[serde(default = "default_port")]
        pub port: u16,
    }

    impl Config {
        /// Loads configuration from environment variables.
        pub fn from_env() -> anyhow::Result<Self> {
            let settings = config::Config::builder()
                .add_source(config::Environment::default())
                .build()?;

            let config: Config = settings.try_deserialize()?;
            Ok(config)
        }

        /// Returns `db_url`, or a Postgres URL assembled from the `db_*` parts.
        pub fn database_url(&self) -> anyhow::Result<String> {
            if let Some(url) = &self.db_url {
                return Ok(url.clone());
            }

            match (
                &self.db_user,
                &self.db_password,
                &self.db_host,
                &self.db_port,
                &self.db_name,
            ) {
                (Some(user), Some(password), Some(host), Some(port), Some(name)) => {
                    Ok(format!("postgres://{user}:{password}@{host}:{port}/{name}"))
                }
                _ => anyhow::bail!(
                    "Set DB_URL, or all of DB_USER, DB_PASSWORD, DB_HOST, DB_PORT and DB_NAME"
                ),
            }
        }
    }

    fn default_port() -> u16 {
        8080
    }

}
pub mod entities;
pub mod error;
pub mod task;
pub mod web;
