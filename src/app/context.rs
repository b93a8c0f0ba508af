use std::path::Path;

use crate::app::error::Result;
use crate::config::{Config, ConfigError};
use crate::probe::HttpProbe;
use crate::remote::PiHoleClient;

pub struct AppContext {
    pub config: Config,
    pub remote: PiHoleClient,
    pub probe: HttpProbe,
}

impl AppContext {
    /// Load configuration and build the clients. Does not authenticate.
    pub fn new(config_path: Option<&Path>, env_file: &Path) -> Result<Self> {
        let mut config = Config::load(config_path)?;
        config.apply_env_file(env_file)?;
        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self> {
        let remote = PiHoleClient::new(&config.pihole)?;
        let probe = HttpProbe::new(&config.probe)?;

        Ok(Self {
            config,
            remote,
            probe,
        })
    }

    /// Log in to the admin interface with the configured password.
    pub async fn authenticate(&mut self) -> Result<()> {
        let password = self
            .config
            .pihole
            .password
            .clone()
            .ok_or(ConfigError::MissingPassword)?;
        self.remote.auth(&password).await
    }
}
