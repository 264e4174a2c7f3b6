use crate::constants::{DEFAULT_SCRIPT_TIMEOUT_SECS, DEFAULT_WORKING_DIR, get_default_model};
use clap::{Arg, ArgMatches, Command};
use clap_complete::{generate, shells};

#[derive(Debug, Clone)]
pub struct Config {
    pub prompt: String,
    pub verbose: bool,
    pub model: String,
    pub working_dir: String, // confinement root for every tool call
    pub script_timeout: u64, // seconds
    pub tool_disable: Vec<String>,
}

impl Config {
    pub fn from_args() -> Self {
        let matches = Self::build_cli().get_matches();

        if let Some(shell) = matches.get_one::<String>("completions") {
            Self::handle_completions(shell);
            std::process::exit(0);
        }

        Self::from_matches(&matches)
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        let prompt_parts: Vec<String> = matches
            .get_many::<String>("prompt")
            .unwrap_or_default()
            .cloned()
            .collect();

        Self {
            prompt: prompt_parts.join(" "),
            verbose: matches.get_flag("verbose"),
            model: matches
                .get_one::<String>("model")
                .cloned()
                .unwrap_or_else(get_default_model),
            working_dir: matches
                .get_one::<String>("working-dir")
                .cloned()
                .unwrap_or_else(|| DEFAULT_WORKING_DIR.to_string()),
            script_timeout: matches
                .get_one::<u64>("script-timeout")
                .copied()
                .unwrap_or(DEFAULT_SCRIPT_TIMEOUT_SECS),
            tool_disable: matches
                .get_many::<String>("tool-disable")
                .unwrap_or_default()
                .cloned()
                .collect(),
        }
    }

    fn build_cli() -> Command {
        Command::new("sandcall")
            .version(env!("SANDCALL_VERSION"))
            .about("AI coding agent using Google Gemini API with sandboxed file tools")
            .arg(
                Arg::new("prompt")
                    .help("Prompt text for the AI")
                    .num_args(0..)
                    .required(false),
            )
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .help("Print the prompt, token usage and full tool call details")
                    .action(clap::ArgAction::SetTrue),
            )
            .arg(
                Arg::new("model")
                    .short('m')
                    .long("model")
                    .help("Specify the model to use. Format: 'gemini::model' or just 'model'. Can be set via SANDCALL_DEFAULT_MODEL environment variable.")
                    .value_name("MODEL")
                    .default_value(get_default_model())
                    .action(clap::ArgAction::Set),
            )
            .next_help_heading("Tool Options")
            .arg(
                Arg::new("working-dir")
                    .short('w')
                    .long("working-dir")
                    .help("Directory all tool calls are confined to")
                    .value_name("DIR")
                    .default_value(DEFAULT_WORKING_DIR)
                    .action(clap::ArgAction::Set),
            )
            .arg(
                Arg::new("script-timeout")
                    .long("script-timeout")
                    .help("Python script execution timeout in seconds (default: 30)")
                    .value_name("SECS")
                    .default_value("30")
                    .value_parser(clap::value_parser!(u64).range(1..))
                    .action(clap::ArgAction::Set),
            )
            .arg(
                Arg::new("tool-disable")
                    .long("tool-disable")
                    .help("Disable specific tools (comma-separated: get_files_info,get_file_content,write_file,run_python_file)")
                    .value_name("TOOLS")
                    .value_delimiter(',')
                    .action(clap::ArgAction::Append),
            )
            .next_help_heading("Other Options")
            .arg(
                Arg::new("completions")
                    .long("completions")
                    .help("Generate shell completion script")
                    .value_name("SHELL")
                    .value_parser(["bash", "zsh", "fish", "powershell"])
                    .action(clap::ArgAction::Set),
            )
    }

    fn handle_completions(shell: &str) {
        let mut cmd = Self::build_cli();
        let bin_name = "sandcall";

        match shell {
            "bash" => generate(shells::Bash, &mut cmd, bin_name, &mut std::io::stdout()),
            "zsh" => generate(shells::Zsh, &mut cmd, bin_name, &mut std::io::stdout()),
            "fish" => generate(shells::Fish, &mut cmd, bin_name, &mut std::io::stdout()),
            "powershell" => generate(
                shells::PowerShell,
                &mut cmd,
                bin_name,
                &mut std::io::stdout(),
            ),
            _ => eprintln!("Unsupported shell: {}", shell),
        }
    }
}
