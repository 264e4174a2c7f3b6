/// Tools module for function calling / tool use capabilities
///
/// This module provides the sandboxed tools the model may call:
/// - Registry of tool kinds and their advertised schemas
/// - Sandbox context confining every path to the working directory
/// - Tool executor dispatching calls and wrapping results in envelopes
/// - The four operations (list, read, write, run a Python script)
mod error;
mod executor;
mod implementations;
mod registry;
mod security;

pub use executor::{ToolCallRequest, ToolExecutor};
pub use registry::ToolRegistry;
pub use security::SandboxContext;
