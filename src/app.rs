use anyhow::{Context, Result};
use genai::chat::ToolCall;
use serde_json::Value;
use std::time::Duration;

use crate::api_key::get_api_key;
use crate::cli::Config;
use crate::constants::SYSTEM_PROMPT;
use crate::gemini::GeminiClient;
use crate::logging::{
    log_error, log_info, log_run_summary, log_tool_call, log_warn, setup_run_file_logging,
};
use crate::provider::{AiResponse, ProviderConfig, ProviderFactory};
use crate::tools::{SandboxContext, ToolCallRequest, ToolExecutor, ToolRegistry};

pub async fn run_app(config: Config) -> Result<()> {
    if config.prompt.trim().is_empty() {
        log_error("No prompt provided");
        eprintln!("Error: No prompt provided.");
        eprintln!("Usage: sandcall <prompt> [--verbose]");
        std::process::exit(1);
    }

    let run_id = uuid::Uuid::new_v4().to_string();
    setup_run_file_logging(&run_id).context("Failed to set up file logging")?;
    log_info(&format!("Starting run {}", run_id));

    let api_key = get_api_key().context("Failed to get API key")?;

    let sandbox = SandboxContext::new(&config.working_dir)
        .context("Failed to initialize working directory")?
        .with_script_timeout(Duration::from_secs(config.script_timeout));
    log_info(&format!("Tools confined to {}", sandbox.root().display()));

    let registry = ToolRegistry::new().without(&config.tool_disable);
    if registry.is_empty() {
        log_warn("All tools are disabled; the model can only answer with text");
    } else {
        log_info(&format!("Advertising {} tool(s)", registry.len()));
    }

    let provider = ProviderFactory::create_provider(ProviderConfig {
        model: config.model.clone(),
        api_key,
    })
    .context("Failed to initialize AI provider")?;

    let request =
        GeminiClient::build_request(&config.prompt, SYSTEM_PROMPT, registry.to_genai_tools());

    log_info(&format!(
        "Sending request to {} API using model: {}",
        provider.provider_name(),
        provider.model_name()
    ));

    let response = provider
        .generate_content_with_request(request)
        .await
        .context("Failed to generate content")?;

    let executor = ToolExecutor::new(&registry, &sandbox);
    handle_response(&executor, &response, config.verbose).await;

    if config.verbose {
        print_usage_report(&config.prompt, &response);
    }

    log_info("Successfully completed request");
    Ok(())
}

async fn handle_response(
    executor: &ToolExecutor<'_>,
    response: &AiResponse,
    verbose: bool,
) {
    if let Some(text) = &response.text {
        println!("{}", text);
    }

    let mut failures = 0;
    for call in &response.tool_calls {
        if !handle_tool_call(executor, call, verbose).await {
            failures += 1;
        }
    }

    if response.text.is_none() && response.tool_calls.is_empty() {
        log_warn("Model returned neither text nor tool calls");
    }

    log_run_summary(
        response.tool_calls.len(),
        failures,
        &response.usage.format_short(),
    );
}

async fn handle_tool_call(
    executor: &ToolExecutor<'_>,
    call: &ToolCall,
    verbose: bool,
) -> bool {
    let request = ToolCallRequest::from(call);

    if verbose {
        println!(
            "Calling function: {}({})",
            request.name,
            Value::Object(request.arguments.clone())
        );
    } else {
        println!(" - Calling function: {}", request.name);
    }

    // The envelope always carries exactly one of result/error, so there is
    // no empty response to reject here
    let envelope = executor.execute(&request).await;
    let summary = envelope.display_text();
    let failed = envelope.result.is_err();
    log_tool_call(
        &envelope.name,
        &Value::Object(request.arguments.clone()).to_string(),
        &summary,
        failed,
    );

    if verbose {
        println!("-> {}", envelope.into_tool_response().content);
    } else {
        println!("{}", summary);
    }

    !failed
}

fn print_usage_report(prompt: &str, response: &AiResponse) {
    println!("User prompt: {}", prompt);
    println!("Prompt tokens: {}", response.usage.prompt_tokens.unwrap_or(0));
    println!(
        "Response tokens: {}",
        response.usage.completion_tokens.unwrap_or(0)
    );
}
