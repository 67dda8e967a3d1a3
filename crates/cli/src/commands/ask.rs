//! `docqa ask`: Answer questions about one document from the terminal.

use std::path::PathBuf;

use docqa_config::AppConfig;
use docqa_core::DocumentSource;
use docqa_pipeline::Pipeline;

pub async fn run(
    url: Option<String>,
    file: Option<PathBuf>,
    questions: Vec<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        return Err("No API key configured. Set GEMINI_API_KEY or run `docqa onboard`.".into());
    }

    let source = match (url, file) {
        (Some(url), _) => DocumentSource::url(url),
        (None, Some(path)) => {
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            DocumentSource::upload(bytes, filename)
        }
        (None, None) => return Err("Pass --url or --file".into()),
    };

    let provider = docqa_providers::build_from_config(&config)
        .default()
        .ok_or("No default provider configured")?;
    let pipeline = Pipeline::from_config(&config, provider);

    let result = pipeline.run(source, &questions).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("📄 {}", result.metadata.source);
    println!(
        "   {} chars extracted, {} sent to {}\n",
        result.metadata.model_info.text_length,
        result.metadata.model_info.budgeted_length,
        result.metadata.model_info.llm
    );
    for (question, answer) in questions.iter().zip(&result.answers) {
        println!("❓ {question}");
        println!("💬 {answer}\n");
    }
    if result.metadata.failed_questions > 0 {
        println!("⚠️  {} question(s) failed", result.metadata.failed_questions);
    }

    Ok(())
}
