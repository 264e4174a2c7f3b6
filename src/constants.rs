/// API key validation constants
pub const API_KEY_LENGTH: usize = 39;
pub const API_KEY_PREFIX: &str = "AIza";

/// Default model constants
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-001";

/// Get default model from environment variable or default
pub fn get_default_model() -> String {
    std::env::var("SANDCALL_DEFAULT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string())
}

/// Confinement root used when `--working-dir` is not given
pub const DEFAULT_WORKING_DIR: &str = "./calculator";

/// Read cap for `get_file_content`
pub const DEFAULT_MAX_CHARS: usize = 10000;

/// Get read cap from environment variable or default
pub fn get_max_chars() -> usize {
    std::env::var("SANDCALL_MAX_CHARS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_MAX_CHARS)
}

/// Script runner constants
pub const DEFAULT_SCRIPT_TIMEOUT_SECS: u64 = 30;
pub const PYTHON_EXTENSION: &str = "py";
pub const DEFAULT_PYTHON: &str = "python3";

/// Get script interpreter from environment variable or default
pub fn get_python() -> String {
    std::env::var("SANDCALL_PYTHON").unwrap_or_else(|_| DEFAULT_PYTHON.to_string())
}

/// URLs for user guidance
pub const GEMINI_API_KEY_URL: &str = "https://makersuite.google.com/app/apikey";
pub const GEMINI_DOCS_URL: &str = "https://ai.google.dev/gemini-api/docs/api-key";

pub const SYSTEM_PROMPT: &str = "\
You are a helpful AI coding agent.

When a user asks a question or makes a request, make a function call plan. You can perform the following operations:

- List files and directories
- Read file contents
- Execute Python files with optional arguments
- Write or overwrite files

All paths you provide should be relative to the working directory. You do not need to specify the working directory in your function calls as it is automatically injected for security reasons.";
