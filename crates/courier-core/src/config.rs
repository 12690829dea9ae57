use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    pub api_url: String,
    /// Overrides the default credentials location under the user config dir.
    pub credentials_path: Option<String>,
    pub trace: TraceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceConfig {
    pub path: String,
    pub channel_capacity: usize,
    pub connect_timeout_secs: u64,
    pub on_parse_error: ParseErrorPolicy,
    pub max_reconnect_attempts: u32,
}

/// What the reader does after a line fails to decode as JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseErrorPolicy {
    /// Surface the error and end the stream.
    #[default]
    Terminate,
    /// Surface the error and keep reading.
    Skip,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            credentials_path: None,
            trace: TraceConfig::default(),
        }
    }
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            path: "/admin/trace".to_string(),
            channel_capacity: 64,
            connect_timeout_secs: 10,
            on_parse_error: ParseErrorPolicy::Terminate,
            max_reconnect_attempts: 5,
        }
    }
}

impl ConsoleConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(ConsoleConfig::default()));

        if let Some(path) = config_path {
            tracing::debug!(path, "Merging console config file");
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("COURIER_").split("__"));

        figment.extract()
    }

    /// Full URL of the trace endpoint.
    pub fn trace_url(&self) -> String {
        format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            self.trace.path.trim_start_matches('/')
        )
    }
}
