use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use reqwest::Client;

use crate::app::Result;
use crate::config::ProbeConfig;
use crate::probe::{DeadReason, Liveness, LivenessProbe};

pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(config: &ProbeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(Policy::none())
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl LivenessProbe for HttpProbe {
    async fn check(&self, url: &str) -> Liveness {
        let response = match self.client.head(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("HEAD {} failed: {}", url, e);
                return Liveness::Dead(DeadReason::Error(e.to_string()));
            }
        };

        let status = response.status().as_u16();
        match status {
            200 => Liveness::Live,
            301 | 302 => {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .map(String::from);

                match location {
                    Some(location) => Liveness::Redirect { location, status },
                    None => Liveness::Dead(DeadReason::Status(status)),
                }
            }
            _ => Liveness::Dead(DeadReason::Status(status)),
        }
    }
}
