use genai::chat::{ToolCall, ToolResponse};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::logging::{log_debug, log_error, log_info};

use super::error::{ToolError, ToolResult};
use super::implementations::{list_directory, read_file, run_script, write_file};
use super::registry::{ToolKind, ToolRegistry};
use super::security::SandboxContext;

/// A tool call as it arrives from the model
#[derive(Debug, Clone)]
pub struct ToolCallRequest {
    pub call_id: String,
    pub name: String,
    pub arguments: Map<String, Value>,
}

impl ToolCallRequest {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            call_id: String::new(),
            name: name.into(),
            arguments: match arguments {
                Value::Object(map) => map,
                _ => Map::new(),
            },
        }
    }
}

impl From<&ToolCall> for ToolCallRequest {
    fn from(call: &ToolCall) -> Self {
        let mut request = Self::new(call.fn_name.clone(), call.fn_arguments.clone());
        request.call_id = call.call_id.clone();
        request
    }
}

/// Uniform response envelope, tagged with the tool name
#[derive(Debug)]
pub struct ToolEnvelope {
    pub call_id: String,
    pub name: String,
    pub result: ToolResult,
}

impl ToolEnvelope {
    /// `{"result": ...}` on success, `{"error": "Error: ..."}` on failure
    pub fn response(&self) -> Value {
        match &self.result {
            Ok(value) => json!({ "result": value }),
            Err(e) => json!({ "error": format!("Error: {e}") }),
        }
    }

    /// Text shown to the user: the value, or `Error: ...`
    pub fn display_text(&self) -> String {
        match &self.result {
            Ok(value) => value.clone(),
            Err(e) => format!("Error: {e}"),
        }
    }

    pub fn into_tool_response(self) -> ToolResponse {
        let content = self.response().to_string();
        ToolResponse::new(self.call_id, content)
    }
}

#[derive(Deserialize)]
struct ListDirectoryArgs {
    #[serde(default = "default_directory")]
    directory: String,
}

fn default_directory() -> String {
    ".".to_string()
}

#[derive(Deserialize)]
struct ReadFileArgs {
    file_path: String,
}

#[derive(Deserialize)]
struct WriteFileArgs {
    file_path: String,
    content: String,
}

#[derive(Deserialize)]
struct RunScriptArgs {
    file_path: String,
    #[serde(default)]
    args: Vec<Value>,
}

/// Tool dispatcher: routes a request to the matching sandboxed operation
pub struct ToolExecutor<'a> {
    registry: &'a ToolRegistry,
    sandbox: &'a SandboxContext,
}

impl<'a> ToolExecutor<'a> {
    pub fn new(registry: &'a ToolRegistry, sandbox: &'a SandboxContext) -> Self {
        Self { registry, sandbox }
    }

    /// Execute a single request; errors are returned inside the envelope
    pub async fn execute(&self, request: &ToolCallRequest) -> ToolEnvelope {
        log_info(&format!(
            "Executing tool: {} (call_id: {})",
            request.name, request.call_id
        ));
        log_debug(&format!("Tool arguments: {:?}", request.arguments));

        let result = match self.registry.get(&request.name) {
            Some(kind) => {
                let arguments = kind.normalize_arguments(&request.arguments);
                self.run(kind, arguments).await
            }
            None => Err(ToolError::UnknownTool(request.name.clone())),
        };

        match &result {
            Ok(output) => log_info(&format!(
                "Tool {} succeeded, output length: {}",
                request.name,
                output.len()
            )),
            Err(e) => log_error(&format!("Tool {} failed: {}", request.name, e)),
        }

        ToolEnvelope {
            call_id: request.call_id.clone(),
            name: request.name.clone(),
            result,
        }
    }

    async fn run(&self, kind: ToolKind, arguments: Map<String, Value>) -> ToolResult {
        match kind {
            ToolKind::ListDirectory => {
                let args: ListDirectoryArgs = parse_arguments(kind, arguments)?;
                list_directory(self.sandbox, &args.directory).await
            }
            ToolKind::ReadFile => {
                let args: ReadFileArgs = parse_arguments(kind, arguments)?;
                read_file(self.sandbox, &args.file_path).await
            }
            ToolKind::WriteFile => {
                let args: WriteFileArgs = parse_arguments(kind, arguments)?;
                write_file(self.sandbox, &args.file_path, &args.content).await
            }
            ToolKind::RunScript => {
                let args: RunScriptArgs = parse_arguments(kind, arguments)?;
                let script_args: Vec<String> = args.args.iter().map(stringify_argument).collect();
                run_script(self.sandbox, &args.file_path, &script_args).await
            }
        }
    }
}

fn parse_arguments<T: DeserializeOwned>(
    kind: ToolKind,
    arguments: Map<String, Value>,
) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(arguments)).map_err(|e| ToolError::InvalidArguments {
        tool: kind.name().to_string(),
        message: e.to_string(),
    })
}

/// Models sometimes send numbers or booleans as script arguments
fn stringify_argument(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
