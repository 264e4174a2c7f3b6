//! Tool implementations
//!
//! Every operation follows the same pattern:
//! 1. Resolve the caller path through the SandboxContext
//! 2. Check the target kind
//! 3. Perform the operation
//! 4. Return the text for the model, or a ToolError
use std::process::Stdio;

use tokio::io::AsyncReadExt;
use tokio::process::Command;

use super::error::{ToolError, ToolResult};
use super::security::SandboxContext;

// ============================================================================
// get_files_info
// ============================================================================

/// One immediate child of a listed directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: String,
    pub size: u64,
    pub is_dir: bool,
}

impl DirEntryInfo {
    fn render(&self) -> String {
        format!(
            "- {}: file_size={} bytes, is_dir={}",
            self.name, self.size, self.is_dir
        )
    }
}

/// Collect the immediate entries of `directory`, sorted by name
pub async fn collect_entries(
    context: &SandboxContext,
    directory: &str,
) -> Result<Vec<DirEntryInfo>, ToolError> {
    let path = context.resolve(directory, "list")?;

    let is_dir = tokio::fs::metadata(&path)
        .await
        .map(|metadata| metadata.is_dir())
        .unwrap_or(false);
    if !is_dir {
        return Err(ToolError::NotADirectory(directory.to_string()));
    }

    let mut reader = tokio::fs::read_dir(&path)
        .await
        .map_err(|e| ToolError::failed(format!("Failed to read directory \"{directory}\""), e))?;

    let mut entries = Vec::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .map_err(|e| ToolError::failed("Failed to read directory entry", e))?
    {
        // Follow symlinks only when the target stays inside the root, so the
        // listing never reports on files the other tools refuse to touch
        let entry_path = entry.path();
        let followed = match tokio::fs::canonicalize(&entry_path).await {
            Ok(target) if target.starts_with(context.root()) => {
                tokio::fs::metadata(&target).await.ok()
            }
            _ => None,
        };
        let metadata = match followed {
            Some(metadata) => metadata,
            None => entry
                .metadata()
                .await
                .map_err(|e| ToolError::failed("Failed to stat directory entry", e))?,
        };

        entries.push(DirEntryInfo {
            name: entry.file_name().to_string_lossy().to_string(),
            size: metadata.len(),
            is_dir: metadata.is_dir(),
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

pub async fn list_directory(context: &SandboxContext, directory: &str) -> ToolResult {
    let entries = collect_entries(context, directory).await?;
    Ok(entries
        .iter()
        .map(DirEntryInfo::render)
        .collect::<Vec<_>>()
        .join("\n"))
}

// ============================================================================
// get_file_content
// ============================================================================

pub async fn read_file(context: &SandboxContext, file_path: &str) -> ToolResult {
    let path = context.resolve(file_path, "read")?;

    let is_file = tokio::fs::metadata(&path)
        .await
        .map(|metadata| metadata.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(ToolError::NotAFile(file_path.to_string()));
    }

    let max_chars = context.max_chars();
    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|e| ToolError::failed(format!("Failed to open \"{file_path}\""), e))?;

    // A char is at most 4 bytes, so this always holds max_chars + 1 whole chars
    let byte_budget = (max_chars as u64).saturating_add(1).saturating_mul(4);
    let mut bytes = Vec::new();
    file.take(byte_budget)
        .read_to_end(&mut bytes)
        .await
        .map_err(|e| ToolError::failed(format!("Failed to read \"{file_path}\""), e))?;

    let text = String::from_utf8_lossy(&bytes);
    let mut chars = text.chars();
    let mut content: String = chars.by_ref().take(max_chars).collect();

    if chars.next().is_some() {
        content.push_str(&format!(
            "[...File \"{file_path}\" truncated at {max_chars} characters]"
        ));
    }

    Ok(content)
}

// ============================================================================
// write_file
// ============================================================================

pub async fn write_file(context: &SandboxContext, file_path: &str, content: &str) -> ToolResult {
    let path = context.resolve(file_path, "write to")?;

    match tokio::fs::metadata(&path).await {
        Ok(metadata) if metadata.is_dir() => {
            return Err(ToolError::NotAFile(file_path.to_string()));
        }
        Ok(_) => {}
        Err(_) => {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    ToolError::failed(
                        format!("Failed to create parent directories for \"{file_path}\""),
                        e,
                    )
                })?;
            }
        }
    }

    tokio::fs::write(&path, content)
        .await
        .map_err(|e| ToolError::failed(format!("Failed to write \"{file_path}\""), e))?;

    Ok(format!(
        "Successfully wrote to \"{}\" ({} characters written)",
        file_path,
        content.chars().count()
    ))
}

// ============================================================================
// run_python_file
// ============================================================================

pub async fn run_script(context: &SandboxContext, file_path: &str, args: &[String]) -> ToolResult {
    let path = context.resolve(file_path, "execute")?;

    if tokio::fs::metadata(&path).await.is_err() {
        return Err(ToolError::NotFound(file_path.to_string()));
    }

    let has_extension = path
        .extension()
        .is_some_and(|ext| ext == context.script_extension());
    if !has_extension {
        return Err(ToolError::WrongFileType(file_path.to_string()));
    }

    let mut command = Command::new(context.interpreter());
    command
        .arg(&path)
        .args(args)
        .current_dir(context.root())
        .stdin(Stdio::null())
        .kill_on_drop(true);

    // Dropping the output future on timeout kills the child
    let output = tokio::time::timeout(context.script_timeout(), command.output())
        .await
        .map_err(|_| {
            ToolError::OperationFailed(format!(
                "executing Python file: \"{}\" timed out after {} seconds",
                file_path,
                context.script_timeout().as_secs_f64()
            ))
        })?
        .map_err(|e| ToolError::failed("executing Python file", e))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    if stdout.is_empty() && stderr.is_empty() {
        return Ok("No output produced.".to_string());
    }

    let mut result = format!("STDOUT: {stdout}STDERR: {stderr}");
    match output.status.code() {
        Some(0) => {}
        Some(code) => result.push_str(&format!("\nProcess exited with code {code}")),
        None => result.push_str("\nProcess terminated by a signal"),
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn sandbox() -> (TempDir, SandboxContext) {
        let temp_dir = TempDir::new().unwrap();
        let context = SandboxContext::new(temp_dir.path())
            .unwrap()
            .with_max_chars(10000)
            .with_interpreter("python3");
        (temp_dir, context)
    }

    fn python_available() -> bool {
        std::process::Command::new("python3")
            .arg("--version")
            .output()
            .is_ok_and(|output| output.status.success())
    }

    macro_rules! skip_without_python {
        () => {
            if !python_available() {
                eprintln!("Skipping test: python3 not available");
                return;
            }
        };
    }

    #[tokio::test]
    async fn test_list_directory_reports_files_and_dirs() {
        let (_dir, context) = sandbox();
        fs::write(context.root().join("a.txt"), "hello").unwrap();
        fs::create_dir(context.root().join("b")).unwrap();

        let entries = collect_entries(&context, ".").await.unwrap();
        assert_eq!(entries.len(), 2);

        let file = entries.iter().find(|e| e.name == "a.txt").unwrap();
        assert!(!file.is_dir);
        assert_eq!(file.size, 5);

        let dir = entries.iter().find(|e| e.name == "b").unwrap();
        assert!(dir.is_dir);
    }

    #[tokio::test]
    async fn test_list_directory_output_is_sorted() {
        let (_dir, context) = sandbox();
        fs::write(context.root().join("zeta.py"), "").unwrap();
        fs::write(context.root().join("alpha.py"), "12").unwrap();

        let output = list_directory(&context, "").await.unwrap();
        assert_eq!(
            output,
            "- alpha.py: file_size=2 bytes, is_dir=false\n- zeta.py: file_size=0 bytes, is_dir=false"
        );
    }

    #[tokio::test]
    async fn test_list_directory_subdirectory() {
        let (_dir, context) = sandbox();
        fs::create_dir_all(context.root().join("pkg")).unwrap();
        fs::write(context.root().join("pkg").join("render.py"), "x").unwrap();

        let output = list_directory(&context, "pkg").await.unwrap();
        assert!(output.contains("render.py: file_size=1 bytes, is_dir=false"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_list_directory_does_not_follow_escaping_symlink() {
        let outer = TempDir::new().unwrap();
        fs::create_dir(outer.path().join("root")).unwrap();
        let target = outer.path().join("outside.txt");
        fs::write(&target, "0123456789").unwrap();
        let context = SandboxContext::new(outer.path().join("root")).unwrap();
        let link = context.root().join("ln");
        std::os::unix::fs::symlink(&target, &link).unwrap();
        fs::write(context.root().join("inside.txt"), "abc").unwrap();
        std::os::unix::fs::symlink(context.root().join("inside.txt"), context.root().join("near"))
            .unwrap();

        let entries = collect_entries(&context, ".").await.unwrap();

        let escaping = entries.iter().find(|e| e.name == "ln").unwrap();
        assert_eq!(escaping.size, fs::symlink_metadata(&link).unwrap().len());
        assert_ne!(escaping.size, 10);

        let inside = entries.iter().find(|e| e.name == "near").unwrap();
        assert_eq!(inside.size, 3);
    }

    #[tokio::test]
    async fn test_list_directory_not_a_directory() {
        let (_dir, context) = sandbox();
        fs::write(context.root().join("main.py"), "").unwrap();

        let err = list_directory(&context, "main.py").await.unwrap_err();
        assert_eq!(err, ToolError::NotADirectory("main.py".to_string()));
    }

    #[tokio::test]
    async fn test_list_directory_escape() {
        let (_dir, context) = sandbox();
        let err = list_directory(&context, "../").await.unwrap_err();
        assert!(matches!(err, ToolError::PathEscape { action: "list", .. }));
    }

    #[tokio::test]
    async fn test_read_file_success() {
        let (_dir, context) = sandbox();
        fs::write(context.root().join("main.py"), "print('hi')\n").unwrap();

        let content = read_file(&context, "main.py").await.unwrap();
        assert_eq!(content, "print('hi')\n");
    }

    #[tokio::test]
    async fn test_read_file_exactly_at_cap_is_not_truncated() {
        let (_dir, context) = sandbox();
        let context = context.with_max_chars(16);
        fs::write(context.root().join("exact.txt"), "a".repeat(16)).unwrap();

        let content = read_file(&context, "exact.txt").await.unwrap();
        assert_eq!(content, "a".repeat(16));
    }

    #[tokio::test]
    async fn test_read_file_over_cap_is_truncated() {
        let (_dir, context) = sandbox();
        let context = context.with_max_chars(16);
        fs::write(context.root().join("long.txt"), "a".repeat(17)).unwrap();

        let content = read_file(&context, "long.txt").await.unwrap();
        let marker = "[...File \"long.txt\" truncated at 16 characters]";
        assert!(content.ends_with(marker));
        assert_eq!(content.strip_suffix(marker).unwrap(), "a".repeat(16));
    }

    #[tokio::test]
    async fn test_read_file_unbounded_cap() {
        let (_dir, context) = sandbox();
        let context = context.with_max_chars(usize::MAX);
        fs::write(context.root().join("a.txt"), "hello").unwrap();

        let content = read_file(&context, "a.txt").await.unwrap();
        assert_eq!(content, "hello");
    }

    #[tokio::test]
    async fn test_read_file_counts_characters_not_bytes() {
        let (_dir, context) = sandbox();
        let context = context.with_max_chars(3);
        fs::write(context.root().join("umlaut.txt"), "äöü").unwrap();

        let content = read_file(&context, "umlaut.txt").await.unwrap();
        assert_eq!(content, "äöü");
    }

    #[tokio::test]
    async fn test_read_file_directory_is_not_a_file() {
        let (_dir, context) = sandbox();
        fs::create_dir(context.root().join("pkg")).unwrap();

        let err = read_file(&context, "pkg").await.unwrap_err();
        assert_eq!(err, ToolError::NotAFile("pkg".to_string()));
        let err = read_file(&context, "missing.txt").await.unwrap_err();
        assert_eq!(err, ToolError::NotAFile("missing.txt".to_string()));
    }

    #[tokio::test]
    async fn test_read_file_escape() {
        let (_dir, context) = sandbox();
        let err = read_file(&context, "../secret.txt").await.unwrap_err();
        assert!(matches!(err, ToolError::PathEscape { action: "read", .. }));
    }

    #[tokio::test]
    async fn test_write_file_creates_parents() {
        let (_dir, context) = sandbox();

        let result = write_file(&context, "pkg/morelorem.txt", "lorem ipsum")
            .await
            .unwrap();
        assert_eq!(
            result,
            "Successfully wrote to \"pkg/morelorem.txt\" (11 characters written)"
        );

        let written = fs::read_to_string(context.root().join("pkg/morelorem.txt")).unwrap();
        assert_eq!(written, "lorem ipsum");
    }

    #[tokio::test]
    async fn test_write_file_overwrites() {
        let (_dir, context) = sandbox();
        write_file(&context, "notes.txt", "a much longer first version")
            .await
            .unwrap();

        let result = write_file(&context, "notes.txt", "short").await.unwrap();
        assert!(result.contains("(5 characters written)"));

        let written = fs::read_to_string(context.root().join("notes.txt")).unwrap();
        assert_eq!(written, "short");
    }

    #[tokio::test]
    async fn test_write_file_to_directory_is_not_a_file() {
        let (_dir, context) = sandbox();
        fs::create_dir(context.root().join("pkg")).unwrap();

        let err = write_file(&context, "pkg", "x").await.unwrap_err();
        assert_eq!(err, ToolError::NotAFile("pkg".to_string()));
    }

    #[tokio::test]
    async fn test_write_file_escape_does_not_touch_disk() {
        let outer = TempDir::new().unwrap();
        fs::create_dir(outer.path().join("root")).unwrap();
        let context = SandboxContext::new(outer.path().join("root")).unwrap();

        let err = write_file(&context, "../evil/tmp.txt", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::PathEscape { action: "write to", .. }));
        assert!(!outer.path().join("evil").exists());
    }

    #[tokio::test]
    async fn test_run_script_escape() {
        let (_dir, context) = sandbox();
        let err = run_script(&context, "../main.py", &[]).await.unwrap_err();
        assert!(matches!(err, ToolError::PathEscape { action: "execute", .. }));
    }

    #[tokio::test]
    async fn test_run_script_not_found() {
        let (_dir, context) = sandbox();
        let err = run_script(&context, "nonexistent.py", &[]).await.unwrap_err();
        assert_eq!(err, ToolError::NotFound("nonexistent.py".to_string()));
    }

    #[tokio::test]
    async fn test_run_script_wrong_file_type() {
        let (_dir, context) = sandbox();
        fs::write(context.root().join("lorem.txt"), "lorem").unwrap();

        let err = run_script(&context, "lorem.txt", &[]).await.unwrap_err();
        assert_eq!(err, ToolError::WrongFileType("lorem.txt".to_string()));
    }

    #[tokio::test]
    async fn test_run_script_stdout_only() {
        skip_without_python!();
        let (_dir, context) = sandbox();
        fs::write(
            context.root().join("main.py"),
            "import sys\nprint('args:', ' '.join(sys.argv[1:]))\n",
        )
        .unwrap();

        let output = run_script(&context, "main.py", &["3".to_string(), "+".to_string()])
            .await
            .unwrap();
        assert_eq!(output, "STDOUT: args: 3 +\nSTDERR: ");
        assert!(!output.contains("Process exited"));
    }

    #[tokio::test]
    async fn test_run_script_nonzero_exit() {
        skip_without_python!();
        let (_dir, context) = sandbox();
        fs::write(
            context.root().join("fail.py"),
            "import sys\nsys.stderr.write('boom\\n')\nsys.exit(2)\n",
        )
        .unwrap();

        let output = run_script(&context, "fail.py", &[]).await.unwrap();
        assert!(output.starts_with("STDOUT: STDERR: boom\n"));
        assert!(output.ends_with("Process exited with code 2"));
    }

    #[tokio::test]
    async fn test_run_script_no_output() {
        skip_without_python!();
        let (_dir, context) = sandbox();
        fs::write(context.root().join("quiet.py"), "x = 1\n").unwrap();

        let output = run_script(&context, "quiet.py", &[]).await.unwrap();
        assert_eq!(output, "No output produced.");
    }

    #[tokio::test]
    async fn test_run_script_runs_in_root() {
        skip_without_python!();
        let (_dir, context) = sandbox();
        fs::create_dir(context.root().join("pkg")).unwrap();
        fs::write(
            context.root().join("pkg").join("cwd.py"),
            "import os\nprint(os.getcwd())\n",
        )
        .unwrap();

        let output = run_script(&context, "pkg/cwd.py", &[]).await.unwrap();
        assert!(output.contains(&context.root().to_string_lossy().to_string()));
    }

    #[tokio::test]
    async fn test_run_script_timeout() {
        skip_without_python!();
        let (_dir, context) = sandbox();
        let context = context.with_script_timeout(Duration::from_millis(300));
        fs::write(
            context.root().join("slow.py"),
            "import time\ntime.sleep(10)\n",
        )
        .unwrap();

        let err = run_script(&context, "slow.py", &[]).await.unwrap_err();
        assert!(matches!(err, ToolError::OperationFailed(_)));
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_run_script_timeout_kills_child() {
        skip_without_python!();
        let (_dir, context) = sandbox();
        let context = context.with_script_timeout(Duration::from_millis(300));
        fs::write(
            context.root().join("late.py"),
            "import time\ntime.sleep(1)\nopen('marker', 'w').close()\n",
        )
        .unwrap();

        let err = run_script(&context, "late.py", &[]).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!context.root().join("marker").exists());
    }

    #[tokio::test]
    async fn test_run_script_missing_interpreter() {
        let (_dir, context) = sandbox();
        let context = context.with_interpreter("sandcall-no-such-interpreter");
        fs::write(context.root().join("main.py"), "print(1)\n").unwrap();

        let err = run_script(&context, "main.py", &[]).await.unwrap_err();
        assert!(matches!(err, ToolError::OperationFailed(_)));
    }
}
