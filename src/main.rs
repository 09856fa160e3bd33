use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use helpdesk_agent::llm::llm_factory::LLMFactory;
use helpdesk_common::config::config::{read_config, Config};
use helpdesk_common::error::error::Result;
use helpdesk_common::model::model::Language;
use helpdesk_common::telemetry::telemetry::init_tracing;
use helpdesk_interface::server::server::{serve, AppState};
use helpdesk_orchestrator::memory::session_memory::MemoryFactory;
use helpdesk_orchestrator::orchestrator::orchestrator::Orchestrator;
use helpdesk_orchestrator::session::session_manager::SessionManager;
use helpdesk_prompt::prompt::prompt::PromptCatalog;
use helpdesk_toolbox::directory::directory::Directory;
use helpdesk_toolbox::directory::http_directory::HttpDirectory;
use helpdesk_toolbox::directory::memory_directory::InMemoryDirectory;
use helpdesk_toolbox::knowledge::knowledge::KnowledgeBase;

const DEFAULT_CONFIG: &str = "./config.json";
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

fn load_config() -> Result<Config> {
    let path = std::env::var("HELPDESK_CONFIG").unwrap_or_else(|_| String::from(DEFAULT_CONFIG));
    let mut config = read_config(&path)?;
    config.apply_env_overrides(|key| std::env::var(key).ok());
    Ok(config)
}

fn directory(config: &Config) -> Result<Arc<dyn Directory>> {
    match config.config.directory.seed_file.as_deref() {
        Some(seed_file) => {
            info!("Using in-memory directory seeded from {}", seed_file);
            Ok(Arc::new(InMemoryDirectory::from_seed_file(seed_file)?))
        }
        None => Ok(Arc::new(HttpDirectory::new(&config.config.directory)?)),
    }
}

async fn orchestrator(config: &Config) -> Result<Orchestrator> {
    let server = &config.config;
    let language = Language::parse(&server.assistant.default_language).unwrap_or_else(|| {
        warn!("Unsupported default language {}, using English", server.assistant.default_language);
        Language::English
    });

    let llm = LLMFactory::new(config.clone()).default_instance()?;
    let knowledge = Arc::new(KnowledgeBase::embedded()?);
    let catalog = PromptCatalog::new(language);
    catalog.load_custom(&server.prompts)?;

    let memory = MemoryFactory::from_config(server).await;
    let sessions = Arc::new(SessionManager::new(
        memory,
        language,
        Duration::from_secs(server.session.idle_timeout_secs),
    ));
    sessions.spawn_sweeper(SWEEP_INTERVAL);

    Ok(Orchestrator::new(config, llm, knowledge, directory(config)?, catalog, sessions))
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    init_tracing(&config.config.logging.level);

    let orchestrator = match orchestrator(&config).await {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            error!("Failed to initialize helpdesk: {}", e);
            std::process::exit(1);
        }
    };

    let host = &config.config.host;
    if let Err(e) = serve(&host.host, host.port, AppState::new(Arc::new(orchestrator))).await {
        error!("Server stopped: {}", e);
        std::process::exit(1);
    }
}
