use std::collections::HashMap;
use std::fs;
use std::path::Path;
use serde::Deserialize;
use tracing::{info, warn};
use crate::error::error::{Error, Result};

pub fn read_config(file_path: &str) -> Result<Config> {

    let contents = fs::read_to_string(file_path)
        .map_err(|e| Error::ConfigRead { path: file_path.to_string(), cause: e.to_string() })?;

    let config = read_config_str(&contents, file_path)?;
    info!("Loaded configuration from {}", file_path);
    Ok(config)
}

/// Parses configuration text; the format (JSON or YAML) follows the extension of `file_path`.
pub fn read_config_str(contents: &str, file_path: &str) -> Result<Config> {

    let extension = Path::new(file_path)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("json")
        .to_ascii_lowercase();

    match extension.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(contents)
            .map_err(|e| Error::ConfigParse { path: file_path.to_string(), cause: e.to_string() }),
        _ => serde_json::from_str(contents)
            .map_err(|e| Error::ConfigParse { path: file_path.to_string(), cause: e.to_string() }),
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub config: ServerConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub host: HostConfig,
    pub gateways: GatewaysConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub redis: Option<RedisConfig>,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub agents: AgentsConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub prompts: Vec<CustomPromptConfig>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GatewaysConfig {
    #[serde(rename = "registry")]
    pub registry: HashMap<String, GatewayConfig>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GatewayConfig {
    #[serde(rename = "baseurl")]
    pub baseurl: String,
    #[serde(rename = "apiKey", default)]
    pub api_key: String,
    #[serde(rename = "model")]
    pub model: String,
    /// Wire protocol spoken by the gateway: `openai`, `anthropic` or `scripted`.
    #[serde(rename = "provider", default = "default_provider")]
    pub provider: String,
}

fn default_provider() -> String {
    String::from("openai")
}

#[derive(Clone, Debug, Deserialize)]
pub struct LlmConfig {
    /// Key into `gateways.registry`.
    pub gateway: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(rename = "maxTokens", default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(rename = "timeoutSecs", default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_llm_timeout() -> u64 {
    30
}

#[derive(Clone, Debug, Deserialize)]
pub struct DirectoryConfig {
    #[serde(rename = "baseurl", default = "default_directory_url")]
    pub baseurl: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// When set, employees/devices/agents are served from this JSON file instead of the REST service.
    #[serde(rename = "seedFile", default)]
    pub seed_file: Option<String>,
}

fn default_directory_url() -> String {
    String::from("http://127.0.0.1:5000/api")
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self { baseurl: default_directory_url(), username: String::new(), password: String::new(), seed_file: None }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct HostConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self { host: String::from("0.0.0.0"), port: 8000 }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct RedisConfig {
    pub host: String,
    #[serde(rename = "ttlSecs", default)]
    pub ttl_secs: Option<u64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MemoryConfig {
    /// `buffer` keeps everything, `window` keeps the last `windowSize` exchanges.
    #[serde(rename = "memoryType", default = "default_memory_type")]
    pub memory_type: String,
    #[serde(rename = "windowSize", default = "default_window_size")]
    pub window_size: usize,
    /// `none` or `redis`.
    #[serde(default = "default_persistence")]
    pub persistence: String,
}

fn default_memory_type() -> String {
    String::from("buffer")
}

fn default_window_size() -> usize {
    10
}

fn default_persistence() -> String {
    String::from("none")
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { memory_type: default_memory_type(), window_size: default_window_size(), persistence: default_persistence() }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AgentsConfig {
    #[serde(rename = "maxIterations", default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(rename = "defaultAgent", default = "default_agent")]
    pub default_agent: String,
    #[serde(rename = "enableMfa", default)]
    pub enable_mfa: bool,
}

fn default_max_iterations() -> usize {
    5
}

fn default_agent() -> String {
    String::from("Hardware")
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self { max_iterations: default_max_iterations(), default_agent: default_agent(), enable_mfa: false }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct SessionConfig {
    #[serde(rename = "idleTimeoutSecs", default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

fn default_idle_timeout() -> u64 {
    3600
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { idle_timeout_secs: default_idle_timeout() }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AssistantConfig {
    pub name: String,
    #[serde(rename = "defaultLanguage", default = "default_language")]
    pub default_language: String,
}

fn default_language() -> String {
    String::from("english")
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self { name: String::from("Helpdesk Assistant"), default_language: default_language() }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: String::from("info") }
    }
}

/// Prompt template registered over the compiled one at startup.
#[derive(Clone, Debug, Deserialize)]
pub struct CustomPromptConfig {
    pub kind: String,
    #[serde(default = "default_language")]
    pub language: String,
    pub template: String,
}

impl Config {

    /// Applies environment overrides on top of the file configuration.
    ///
    /// `lookup` is normally `std::env::var(..).ok()`; tests pass a map.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let server = &mut self.config;

        if let Some(host) = lookup("HELPDESK_HOST") {
            server.host.host = host;
        }
        if let Some(port) = lookup("HELPDESK_PORT") {
            match port.parse::<u16>() {
                Ok(port) => server.host.port = port,
                Err(_) => warn!("Ignoring invalid HELPDESK_PORT value: {}", port),
            }
        }
        if let Some(level) = lookup("HELPDESK_LOG_LEVEL") {
            server.logging.level = level;
        }

        for (name, gateway) in server.gateways.registry.iter_mut() {
            if let Some(api_key) = lookup(&gateway_api_key_var(name)) {
                gateway.api_key = api_key;
            }
        }

        if let Some(url) = lookup("DIRECTORY_URL") {
            server.directory.baseurl = url;
        }
        if let Some(username) = lookup("DIRECTORY_USERNAME") {
            server.directory.username = username;
        }
        if let Some(password) = lookup("DIRECTORY_PASSWORD") {
            server.directory.password = password;
        }

        if let Some(url) = lookup("REDIS_URL") {
            match server.redis.as_mut() {
                Some(redis) => redis.host = url,
                None => server.redis = Some(RedisConfig { host: url, ttl_secs: None }),
            }
        }
    }

    pub fn gateway(&self, name: &str) -> Result<&GatewayConfig> {
        self.config.gateways.registry
            .get(name)
            .ok_or_else(|| Error::GatewayNotConfigured { name: name.to_string() })
    }
}

/// `deepseek_gateway` -> `DEEPSEEK_GATEWAY_API_KEY`
pub fn gateway_api_key_var(gateway_name: &str) -> String {
    let normalized: String = gateway_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("{}_API_KEY", normalized)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;
    use super::*;

    const SAMPLE: &str = r#"{
  "config": {
    "host": { "host": "127.0.0.1", "port": 8080 },
    "gateways": {
      "registry": {
        "deepseek_gateway": { "baseurl": "https://api.deepseek.com", "apiKey": "", "model": "deepseek-chat" },
        "anthropic_gateway": { "baseurl": "https://api.anthropic.com", "apiKey": "k", "model": "claude-3-5-sonnet-20240620", "provider": "anthropic" }
      }
    },
    "llm": { "gateway": "deepseek_gateway" }
  }
}"#;

    fn sample() -> Config {
        serde_json::from_str(SAMPLE).unwrap()
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = sample();

        assert_eq!(config.config.llm.max_tokens, 1000);
        assert_eq!(config.config.llm.timeout_secs, 30);
        assert_eq!(config.config.agents.max_iterations, 5);
        assert_eq!(config.config.agents.default_agent, "Hardware");
        assert_eq!(config.config.memory.memory_type, "buffer");
        assert_eq!(config.config.directory.baseurl, "http://127.0.0.1:5000/api");
        assert!(config.config.redis.is_none());
        assert!(config.config.prompts.is_empty());
        assert_eq!(config.gateway("deepseek_gateway").unwrap().provider, "openai");
        assert_eq!(config.gateway("anthropic_gateway").unwrap().provider, "anthropic");
    }

    #[test]
    fn test_custom_prompts_section() {
        let source = r#"{"config": {"gateways": {"registry": {}}, "llm": {"gateway": "offline"},
          "prompts": [
            {"kind": "greeting", "template": "Hi {employee_name}!"},
            {"kind": "greeting", "language": "spanish", "template": "Hola {employee_name}!"}
          ]}}"#;
        let config = read_config_str(source, "config.json").unwrap();
        let prompts = &config.config.prompts;
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0].language, "english");
        assert_eq!(prompts[1].language, "spanish");
        assert_eq!(prompts[1].template, "Hola {employee_name}!");
    }

    #[test]
    fn test_missing_gateway_is_an_error() {
        let config = sample();
        match config.gateway("nope") {
            Err(Error::GatewayNotConfigured { name }) => assert_eq!(name, "nope"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_env_overrides() {
        let mut config = sample();
        let env: HashMap<&str, &str> = HashMap::from([
            ("HELPDESK_PORT", "9000"),
            ("DEEPSEEK_GATEWAY_API_KEY", "sk-test"),
            ("DIRECTORY_URL", "http://directory:5000/api"),
            ("REDIS_URL", "redis://cache:6379/0"),
        ]);

        config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.config.host.port, 9000);
        assert_eq!(config.gateway("deepseek_gateway").unwrap().api_key, "sk-test");
        assert_eq!(config.gateway("anthropic_gateway").unwrap().api_key, "k");
        assert_eq!(config.config.directory.baseurl, "http://directory:5000/api");
        assert_eq!(config.config.redis.unwrap().host, "redis://cache:6379/0");
    }

    #[test]
    fn test_invalid_port_override_is_ignored() {
        let mut config = sample();
        config.apply_env_overrides(|key| if key == "HELPDESK_PORT" { Some("eighty".into()) } else { None });
        assert_eq!(config.config.host.port, 8080);
    }

    #[test]
    fn test_gateway_api_key_var() {
        assert_eq!(gateway_api_key_var("deepseek_gateway"), "DEEPSEEK_GATEWAY_API_KEY");
        assert_eq!(gateway_api_key_var("qwen-gateway"), "QWEN_GATEWAY_API_KEY");
    }

    #[test]
    fn test_read_yaml_config() -> anyhow::Result<()> {
        let path = std::env::temp_dir().join(format!("helpdesk-config-{}.yaml", std::process::id()));
        let mut file = fs::File::create(&path)?;
        writeln!(file, "config:\n  gateways:\n    registry:\n      local:\n        baseurl: http://localhost:1234\n        model: scripted\n        provider: scripted\n  llm:\n    gateway: local\n")?;

        let config = read_config(path.to_str().unwrap())?;
        fs::remove_file(&path)?;

        assert_eq!(config.config.llm.gateway, "local");
        assert_eq!(config.gateway("local")?.provider, "scripted");
        assert_eq!(config.config.host.port, 8000);
        Ok(())
    }

    #[test]
    fn test_read_missing_file() {
        match read_config("/definitely/not/here.json") {
            Err(Error::ConfigRead { path, .. }) => assert_eq!(path, "/definitely/not/here.json"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
