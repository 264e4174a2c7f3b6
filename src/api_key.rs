use anyhow::Result;
use std::env;

use crate::constants::{API_KEY_LENGTH, API_KEY_PREFIX, GEMINI_API_KEY_URL, GEMINI_DOCS_URL};
use crate::logging::{log_error, log_info, log_warn};

/// Load `.env` from the invocation directory, if present
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => log_info(&format!("Loaded environment from {}", path.display())),
        Err(e) if e.not_found() => {}
        Err(e) => log_warn(&format!("Failed to load .env: {e}")),
    }
}

pub fn get_api_key() -> Result<String> {
    match env::var("GEMINI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => {
            log_info("Found GEMINI_API_KEY environment variable");
            let key = key.trim().to_string();
            if !validate_api_key_format(&key) {
                eprintln!("Warning: API key format seems incorrect.");
                eprintln!("   Expected format: AIzaSy... (39 characters)");
            }
            Ok(key)
        }
        Ok(_) => {
            log_error("GEMINI_API_KEY environment variable is empty");
            Err(api_key_error())
        }
        Err(_) => {
            log_error("GEMINI_API_KEY environment variable not found");
            Err(api_key_error())
        }
    }
}

fn api_key_error() -> anyhow::Error {
    eprintln!();
    eprintln!("API Key Required");
    eprintln!("================");
    eprintln!();
    eprintln!("The Google Gemini API key is missing or empty.");
    eprintln!("Get a key at: {}", GEMINI_API_KEY_URL);
    eprintln!();
    eprintln!("Then set it as an environment variable or in a .env file:");
    eprintln!("  export GEMINI_API_KEY=\"your_api_key_here\"");
    eprintln!();
    eprintln!("Documentation: {}", GEMINI_DOCS_URL);
    eprintln!();

    anyhow::anyhow!(
        "GEMINI_API_KEY environment variable is required. Visit {} to get your API key.",
        GEMINI_API_KEY_URL
    )
}

pub fn validate_api_key_format(api_key: &str) -> bool {
    if api_key.len() != API_KEY_LENGTH {
        log_warn("API key length is not 39 characters (expected for Google API keys)");
        return false;
    }

    if !api_key.starts_with(API_KEY_PREFIX) {
        log_warn("API key does not start with 'AIza' (expected for Google API keys)");
        return false;
    }

    if !api_key
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        log_warn("API key contains invalid characters");
        return false;
    }

    true
}
