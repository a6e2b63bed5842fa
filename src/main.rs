use anyhow::{Context, bail};
use cloudvox::agents::{AgentRegistry, Router};
use cloudvox::cli::output::Output;
use cloudvox::cli::{Cli, Commands, is_exit_command, join_query};
use cloudvox::utils::logging::{self, LogFormat};
use cloudvox::utils::toml_config::{CloudvoxConfig, InvoiceStoreConfig, ProviderConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    // Validation happens per command; `route` and `config` work on a partial setup
    let config = match CloudvoxConfig::read(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            output.error(&e.to_string());
            output.hint("Copy cloudvox.example.toml to cloudvox.toml to get started");
            bail!("could not load {}", cli.config.display());
        }
    };

    let level = if cli.verbose {
        "debug"
    } else {
        config.app.log_level.as_str()
    };
    logging::init(level, LogFormat::from_flag(cli.json_logs || config.app.json_logs));

    match cli.command {
        Commands::Ask { query } => {
            let router = start_router(&config).await?;
            output.answer(&router.route(&join_query(&query)).await);
        }
        Commands::Chat => {
            let router = start_router(&config).await?;
            chat(&router, &output).await;
        }
        Commands::Route { query, json } => {
            // Classification needs no live agents
            let registry = Arc::new(AgentRegistry::builder().build());
            let router = Router::new(registry, &config.router);
            let decision = router.classify(&join_query(&query));

            if json {
                println!("{}", serde_json::to_string_pretty(&decision)?);
            } else {
                output.kv("agent", decision.agent.as_str());
                output.kv("rule", decision.matched_rule.as_deref().unwrap_or("(default)"));
                if let Some(keyword) = &decision.matched_keyword {
                    output.kv("keyword", keyword);
                }
            }
        }
        Commands::Config { validate } => {
            show_config(&config, &cli.config.display().to_string(), &output);
            if validate {
                validate_config(&config, &output)?;
            }
        }
        Commands::Agents => show_agents(&config, &output),
    }

    Ok(())
}

async fn start_router(config: &CloudvoxConfig) -> anyhow::Result<Router> {
    config.validate().context("invalid configuration")?;

    let registry = AgentRegistry::from_config(config)
        .await
        .context("failed to start agents")?;
    tracing::info!(agents = registry.len(), "Router ready");

    Ok(Router::new(Arc::new(registry), &config.router))
}

async fn chat(router: &Router, output: &Output) {
    output.banner();

    while let Some(line) = output.prompt() {
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if is_exit_command(query) {
            break;
        }

        output.answer(&router.route(query).await);
        output.newline();
    }

    output.info("Goodbye");
}

fn show_config(config: &CloudvoxConfig, path: &str, output: &Output) {
    output.header("Configuration");
    output.kv("file", path);
    output.kv("log level", &config.app.log_level);
    output.kv("aws region", &config.aws.region);
    output.kv(
        "aws profile",
        config.aws.profile.as_deref().unwrap_or("(default chain)"),
    );

    output.header("Providers");
    let mut providers: Vec<_> = config.providers.iter().collect();
    providers.sort_by_key(|(name, _)| name.as_str());
    for (name, provider) in providers {
        let detail = match provider {
            ProviderConfig::OpenAI { api_base, .. } => format!("openai ({})", api_base),
            ProviderConfig::Ollama { base_url, .. } => format!("ollama ({})", base_url),
        };
        output.kv(name, &detail);
    }

    output.header("Models");
    let mut models: Vec<_> = config.models.iter().collect();
    models.sort_by_key(|(name, _)| name.as_str());
    for (name, model) in models {
        output.kv(name, &format!("{} via {}", model.model, model.provider));
    }

    output.header("Invoice store");
    let store = match &config.invoice_store {
        InvoiceStoreConfig::Postgrest { schema, table, .. } => {
            format!("postgrest ({}.{})", schema, table)
        }
        InvoiceStoreConfig::Memory => "memory".to_string(),
    };
    output.kv("backend", &store);
}

fn validate_config(config: &CloudvoxConfig, output: &Output) -> anyhow::Result<()> {
    match config.validate_with_warnings() {
        Ok(warnings) => {
            for warning in &warnings {
                output.warning(&format!("{}: {}", warning.kind, warning.message));
            }
            output.success("Configuration is valid");
            Ok(())
        }
        Err(e) => {
            output.error(&e.to_string());
            bail!("configuration is invalid");
        }
    }
}

fn show_agents(config: &CloudvoxConfig, output: &Output) {
    output.header("Agents");
    for &name in &config.router.enabled_agents {
        let model = config
            .get_agent(name)
            .map(|agent| agent.model.as_str())
            .unwrap_or("(not configured)");
        let marker = if name == config.router.default_agent {
            " [default]"
        } else {
            ""
        };
        output.list_item(&format!("{} -> {}{}", name, model, marker));
    }

    output.header("Routing rules (first match wins)");
    output.table_header(&["Rule", "Agent", "Keywords"]);
    for rule in &config.router.rules {
        let agent = if config.router.is_enabled(rule.agent) {
            rule.agent.to_string()
        } else {
            format!("{} (off)", rule.agent)
        };
        let keywords = rule.keywords.join(", ");
        output.table_row(&[rule.name.as_str(), agent.as_str(), keywords.as_str()]);
    }
}
