use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use azure_translator::{
    init_tracing, ConnectorSettings, MemoryCredentialStore, MemoryPreferences, ServiceConfig,
    TranslationService,
};

/// Translate one segment with Microsoft Translator.
#[derive(Debug, Parser)]
#[command(name = "azure-translate", version)]
struct Cli {
    /// Source language tag, e.g. `en` or `zh-CN`
    #[arg(long, short = 'f')]
    from: String,

    /// Target language tag
    #[arg(long, short = 't')]
    to: String,

    /// Subscription key
    #[arg(long, env = "AZURE_TRANSLATOR_KEY", hide_env_values = true)]
    key: String,

    /// Resource region sent with V3 requests
    #[arg(long, env = "AZURE_TRANSLATOR_REGION", default_value = "")]
    region: String,

    /// Use the legacy V2 protocol
    #[arg(long)]
    legacy: bool,

    /// Request the neural engine (V2 only)
    #[arg(long, requires = "legacy")]
    neural: bool,

    /// JSON service configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print pipeline metrics to stderr when done
    #[arg(long)]
    metrics: bool,

    /// Text to translate
    text: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("azure_translator=info,azure_translate=info");
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ServiceConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ServiceConfig::default(),
    };

    let service = TranslationService::new(
        &config,
        Arc::new(MemoryPreferences::new()),
        Arc::new(MemoryCredentialStore::new()),
    )?;
    service.apply_settings(&ConnectorSettings {
        subscription_key: cli.key.clone(),
        temporary: true,
        region: cli.region.clone(),
        use_legacy: cli.legacy,
        neural: cli.neural,
    });
    info!(protocol = %service.selected_protocol(), "translating");

    let result = service.translate(&cli.from, &cli.to, &cli.text).await?;

    if cli.metrics {
        eprintln!("{}", serde_json::to_string_pretty(&service.metrics().snapshot())?);
    }

    match result {
        Some(translation) => println!("{translation}"),
        None => eprintln!("no translation returned"),
    }
    Ok(())
}
