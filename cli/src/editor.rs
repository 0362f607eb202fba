//! Launching the user's editor on the config file.

use std::{env, path::Path, process::Command};

use anyhow::{Context, Result, bail};

const FALLBACK_EDITOR: &str = "vi";

/// Pick an editor command: explicit flag, then `$VISUAL`, then `$EDITOR`.
fn choose_editor(
    explicit: Option<&str>,
    visual: Option<String>,
    editor: Option<String>,
) -> String {
    explicit
        .map(ToOwned::to_owned)
        .into_iter()
        .chain(visual)
        .chain(editor)
        .find(|cmd| !cmd.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_EDITOR.to_string())
}

pub fn resolve_editor(explicit: Option<&str>) -> String {
    choose_editor(explicit, env::var("VISUAL").ok(), env::var("EDITOR").ok())
}

/// Split an editor command such as `code --wait` into program and arguments.
fn split_command(command: &str) -> Option<(&str, Vec<&str>)> {
    let mut parts = command.split_whitespace();
    let program = parts.next()?;
    Some((program, parts.collect()))
}

/// Run `command` on `path` and wait for it to exit.
pub fn open(command: &str, path: &Path) -> Result<()> {
    let Some((program, args)) = split_command(command) else {
        bail!("editor command is empty");
    };

    tracing::info!(editor = %command, path = %path.display(), "Opening config in editor");
    let status = Command::new(program)
        .args(args)
        .arg(path)
        .status()
        .with_context(|| format!("failed to launch editor `{command}`"))?;

    if !status.success() {
        bail!("editor `{command}` exited with {status}");
    }
    Ok(())
}
