//! `docqa status`: Show the effective configuration.

use docqa_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("📄 docqa Status");
    println!("===============");
    println!("  Config dir:     {}", AppConfig::config_dir().display());
    println!("  Provider:       {}", config.default_provider);
    println!("  Model:          {}", config.default_model);
    println!("  Temperature:    {}", config.default_temperature);
    println!("  Gateway:        {}:{}", config.gateway.host, config.gateway.port);
    println!(
        "  Bearer token:   {}",
        if config.gateway.bearer_token.is_some() { "set" } else { "not set" }
    );
    println!("  CORS origins:   {}", config.gateway.cors_origins.join(", "));
    println!("  Text budget:    {} chars", config.documents.text_budget_chars);
    println!("  Download limit: {} bytes / {}s", config.documents.max_document_bytes, config.documents.download_timeout_secs);
    println!("  Failure mode:   {:?}", config.pipeline.failure_mode);
    println!(
        "  Model calls:    {} concurrent, {}s timeout",
        config.pipeline.max_concurrent_model_calls, config.pipeline.model_timeout_secs
    );

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `docqa onboard` first");
    }

    Ok(())
}
