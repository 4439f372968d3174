use config::{Config, ConfigError, Environment as ConfigEnvironment};
use secrecy::Secret;
use serde_aux::field_attributes::deserialize_number_from_string;
use tracing::info;

#[derive(serde::Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationSettings,
    #[serde(default)]
    pub azure_openai: AzureOpenAiSettings,
    #[serde(default)]
    pub session_pool: SessionPoolSettings,
    #[serde(default)]
    pub credentials: CredentialSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(
        default = "default_port",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub port: u16,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct AzureOpenAiSettings {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_deployment")]
    pub deployment: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl Default for AzureOpenAiSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            deployment: default_deployment(),
            api_version: default_api_version(),
        }
    }
}

#[derive(serde::Deserialize, Clone, Default)]
pub struct SessionPoolSettings {
    #[serde(default)]
    pub endpoint: Option<String>,
}

#[derive(serde::Deserialize, Clone, Default)]
pub struct CredentialSettings {
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<Secret<String>>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_deployment() -> String {
    "gpt-35-turbo".to_string()
}

fn default_api_version() -> String {
    "2024-02-15-preview".to_string()
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = Config::builder()
        .add_source(
            ConfigEnvironment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let mut settings = settings.try_deserialize::<Settings>()?;

    // Bare variable names kept for parity with existing deployments.
    if settings.azure_openai.endpoint.is_none() {
        settings.azure_openai.endpoint = std::env::var("AZURE_OPENAI_ENDPOINT").ok();
    }
    if settings.session_pool.endpoint.is_none() {
        settings.session_pool.endpoint = std::env::var("POOL_MANAGEMENT_ENDPOINT").ok();
    }

    info!(
        azure_openai = settings.azure_openai.endpoint.is_some(),
        session_pool = settings.session_pool.endpoint.is_some(),
        "Configuration loaded"
    );

    Ok(settings)
}
