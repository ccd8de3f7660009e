use crate::client::{Client, HOUNDIFY_TEXT_URL, HOUNDIFY_VOICE_URL};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

pub const ENV_PREFIX: &str = "HOUNDIFY";

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_key: String,
    /// End-user ID; many exist per client ID
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default = "default_text_url")]
    pub text_url: String,
    #[serde(default = "default_voice_url")]
    pub voice_url: String,
    #[serde(default)]
    pub request_info_in_body: bool,
    #[serde(default = "default_conversation_state")]
    pub conversation_state: bool,
    pub connect_timeout_secs: Option<u64>,
}

fn default_user_id() -> String {
    "exampleUser".to_string()
}

fn default_text_url() -> String {
    HOUNDIFY_TEXT_URL.to_string()
}

fn default_voice_url() -> String {
    HOUNDIFY_VOICE_URL.to_string()
}

fn default_conversation_state() -> bool {
    true
}

impl Config {
    /// Load from an optional config file, overridden by `HOUNDIFY_*` environment variables
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }

        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("Failed to load configuration")?;

        Ok(settings.try_deserialize()?)
    }

    /// Check that credentials are present, naming every missing setting
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.client_id.is_empty() {
            missing.push(format!(
                "must set the client ID in environment variable: \"{}_CLIENT_ID\" or via command line flag: --id",
                ENV_PREFIX
            ));
        }
        if self.client_key.is_empty() {
            missing.push(format!(
                "must set the client key in environment variable: \"{}_CLIENT_KEY\" or via command line flag: --key",
                ENV_PREFIX
            ));
        }
        if !missing.is_empty() {
            anyhow::bail!(missing.join("\n"));
        }
        Ok(())
    }

    pub fn into_client(self) -> Result<Client> {
        self.validate()?;

        let mut http = reqwest::Client::builder();
        if let Some(secs) = self.connect_timeout_secs {
            http = http.connect_timeout(Duration::from_secs(secs));
        }
        let http = http.build().context("Failed to create HTTP client")?;

        let mut client = Client::new(self.client_id, self.client_key)
            .with_http_client(http)
            .with_text_url(self.text_url)
            .with_voice_url(self.voice_url)
            .with_request_info_in_body(self.request_info_in_body);
        if self.conversation_state {
            client.enable_conversation_state();
        }

        Ok(client)
    }
}
