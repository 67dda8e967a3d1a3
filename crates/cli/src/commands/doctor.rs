//! `docqa doctor`: Diagnose system health.

use docqa_config::AppConfig;
use docqa_core::Provider;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 docqa Doctor — System Diagnostics");
    println!("====================================\n");

    let mut issues = 0;

    let config = match AppConfig::load() {
        Ok(config) => {
            let config_path = AppConfig::config_dir().join("config.toml");
            if config_path.exists() {
                println!("  ✅ Config file valid");
            } else {
                println!("  ⚠️  No config file — using defaults and environment");
            }
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  1 issue(s) found. See above for details.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ❌ No API key — set GEMINI_API_KEY or api_key in config.toml");
        issues += 1;
    }

    match config.validate_for_serving() {
        Ok(()) => println!("  ✅ Ready to serve"),
        Err(e) => {
            println!("  ❌ {e}");
            issues += 1;
        }
    }

    let router = docqa_providers::build_from_config(&config);
    println!("  Providers: {}", router.list().join(", "));
    match router.default() {
        Some(provider) if config.has_api_key() => match provider.health_check().await {
            Ok(true) => println!("  ✅ Provider '{}' reachable", provider.name()),
            Ok(false) => {
                println!("  ❌ Provider '{}' rejected the health check", provider.name());
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Provider '{}' unreachable: {e}", provider.name());
                issues += 1;
            }
        },
        Some(provider) => println!("  ⏭️  Skipping '{}' health check (no API key)", provider.name()),
        None => {
            println!("  ❌ No default provider registered");
            issues += 1;
        }
    }

    let temp_dir = config
        .documents
        .temp_dir
        .clone()
        .unwrap_or_else(std::env::temp_dir);
    if temp_dir.is_dir() {
        println!("  ✅ Temp directory usable: {}", temp_dir.display());
    } else {
        println!("  ❌ Temp directory missing: {}", temp_dir.display());
        issues += 1;
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
