use genai::chat::Tool;
use serde_json::{Map, Value, json};

/// The four sandboxed operations the model may call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    ListDirectory,
    ReadFile,
    WriteFile,
    RunScript,
}

/// Name lookup table; wire names are what the model sees.
const TOOL_NAMES: &[(&str, ToolKind)] = &[
    ("get_files_info", ToolKind::ListDirectory),
    ("get_file_content", ToolKind::ReadFile),
    ("write_file", ToolKind::WriteFile),
    ("run_python_file", ToolKind::RunScript),
];

const DIRECTORY_ALIASES: &[(&str, &str)] = &[
    ("path", "directory"),
    ("dir", "directory"),
    ("directory_path", "directory"),
    ("file_path", "directory"),
];

const FILE_PATH_ALIASES: &[(&str, &str)] = &[
    ("path", "file_path"),
    ("file", "file_path"),
    ("filepath", "file_path"),
    ("filename", "file_path"),
    ("directory", "file_path"),
];

const CONTENT_ALIASES: &[(&str, &str)] = &[
    ("text", "content"),
    ("data", "content"),
    ("contents", "content"),
];

const SCRIPT_ARGS_ALIASES: &[(&str, &str)] = &[("arguments", "args"), ("argv", "args")];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    StringArray,
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub param_type: ParamType,
    pub description: &'static str,
    pub required: bool,
}

/// Capability advertisement for a single tool
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: &'static [ParamSpec],
}

impl ToolSpec {
    /// JSON Schema for the parameters, in declaration order
    pub fn schema(&self) -> Value {
        let mut properties = Map::new();
        for param in self.parameters {
            let schema = match param.param_type {
                ParamType::String => json!({
                    "type": "string",
                    "description": param.description,
                }),
                ParamType::StringArray => json!({
                    "type": "array",
                    "items": { "type": "string" },
                    "description": param.description,
                }),
            };
            properties.insert(param.name.to_string(), schema);
        }

        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|param| param.required)
            .map(|param| param.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    pub fn to_genai_tool(&self) -> Tool {
        Tool::new(self.name)
            .with_description(self.description)
            .with_schema(self.schema())
    }
}

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [
        ToolKind::ListDirectory,
        ToolKind::ReadFile,
        ToolKind::WriteFile,
        ToolKind::RunScript,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        TOOL_NAMES
            .iter()
            .find(|(tool_name, _)| *tool_name == name)
            .map(|(_, kind)| *kind)
    }

    pub fn name(self) -> &'static str {
        TOOL_NAMES
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(name, _)| *name)
            .unwrap_or("unknown")
    }

    pub fn spec(self) -> ToolSpec {
        match self {
            ToolKind::ListDirectory => ToolSpec {
                name: self.name(),
                description: "Lists files in the specified directory along with their sizes, \
                              constrained to the working directory.",
                parameters: &[ParamSpec {
                    name: "directory",
                    param_type: ParamType::String,
                    description: "The directory to list files from, relative to the working \
                                  directory. If not provided, lists files in the working \
                                  directory itself.",
                    required: false,
                }],
            },
            ToolKind::ReadFile => ToolSpec {
                name: self.name(),
                description: "Reads the contents of a file, constrained to the working \
                              directory. Long files are truncated.",
                parameters: &[ParamSpec {
                    name: "file_path",
                    param_type: ParamType::String,
                    description: "Path of the file to read, relative to the working directory.",
                    required: true,
                }],
            },
            ToolKind::WriteFile => ToolSpec {
                name: self.name(),
                description: "Writes content to a file, constrained to the working directory. \
                              Creates missing parent directories and overwrites existing files.",
                parameters: &[
                    ParamSpec {
                        name: "file_path",
                        param_type: ParamType::String,
                        description: "Path of the file to write, relative to the working \
                                      directory.",
                        required: true,
                    },
                    ParamSpec {
                        name: "content",
                        param_type: ParamType::String,
                        description: "The full content to write to the file.",
                        required: true,
                    },
                ],
            },
            ToolKind::RunScript => ToolSpec {
                name: self.name(),
                description: "Executes a Python file with optional arguments, constrained to \
                              the working directory. Returns stdout, stderr and the exit code.",
                parameters: &[
                    ParamSpec {
                        name: "file_path",
                        param_type: ParamType::String,
                        description: "Path of the Python file to execute, relative to the \
                                      working directory.",
                        required: true,
                    },
                    ParamSpec {
                        name: "args",
                        param_type: ParamType::StringArray,
                        description: "Optional command-line arguments passed to the script.",
                        required: false,
                    },
                ],
            },
        }
    }

    /// Generic argument names accepted for this tool, as `(alias, canonical)`
    pub fn argument_aliases(self) -> Vec<(&'static str, &'static str)> {
        let (path, extra): (&[(&str, &str)], &[(&str, &str)]) = match self {
            ToolKind::ListDirectory => (DIRECTORY_ALIASES, &[]),
            ToolKind::ReadFile => (FILE_PATH_ALIASES, &[]),
            ToolKind::WriteFile => (FILE_PATH_ALIASES, CONTENT_ALIASES),
            ToolKind::RunScript => (FILE_PATH_ALIASES, SCRIPT_ARGS_ALIASES),
        };
        path.iter().chain(extra).copied().collect()
    }

    /// Rename generic argument keys to this tool's parameter names
    ///
    /// A canonical key that is already present wins over any alias. The
    /// confinement root is never caller-supplied, so `working_directory` is
    /// dropped.
    pub fn normalize_arguments(self, arguments: &Map<String, Value>) -> Map<String, Value> {
        let aliases = self.argument_aliases();
        let mut normalized = Map::new();

        for (key, value) in arguments {
            if key == "working_directory" {
                continue;
            }
            if aliases.iter().any(|(_, canonical)| *canonical == key.as_str()) {
                normalized.insert(key.clone(), value.clone());
            }
        }

        for (key, value) in arguments {
            match aliases.iter().find(|(alias, _)| *alias == key.as_str()) {
                Some((_, canonical)) => {
                    if !normalized.contains_key(*canonical) {
                        normalized.insert(canonical.to_string(), value.clone());
                    }
                }
                None if key != "working_directory" && !normalized.contains_key(key) => {
                    normalized.insert(key.clone(), value.clone());
                }
                None => {}
            }
        }

        normalized
    }
}

/// Registry of enabled tools
pub struct ToolRegistry {
    tools: Vec<ToolKind>,
}

impl ToolRegistry {
    /// Create a registry with all four tools enabled
    pub fn new() -> Self {
        Self {
            tools: ToolKind::ALL.to_vec(),
        }
    }

    /// Disable tools by wire name (builder pattern)
    pub fn without(mut self, names: &[String]) -> Self {
        self.tools
            .retain(|kind| !names.iter().any(|name| name.trim() == kind.name()));
        self
    }

    /// Look up an enabled tool by name
    pub fn get(&self, name: &str) -> Option<ToolKind> {
        ToolKind::from_name(name).filter(|kind| self.tools.contains(kind))
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|kind| kind.spec()).collect()
    }

    /// Convert all enabled tools to genai::Tool format
    pub fn to_genai_tools(&self) -> Vec<Tool> {
        self.specs().iter().map(ToolSpec::to_genai_tool).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
