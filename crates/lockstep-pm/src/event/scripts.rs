//! Root package scripts as hook listeners.

use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;

use super::{EventContext, HookDispatcher};
use crate::package::RootPackage;

/// Runs the commands the root package registered for an event.
///
/// Supports `@putenv KEY=value` and `@other-script` references; anything else
/// is a shell command run from the working directory. A non-zero exit code
/// fails the event.
#[derive(Debug, Clone, Default)]
pub struct ScriptListener {
    scripts: IndexMap<String, Vec<String>>,
}

/// Environment collected while running one event
#[derive(Default)]
struct ScriptContext {
    env_vars: HashMap<String, String>,
}

impl ScriptListener {
    pub fn new(scripts: IndexMap<String, Vec<String>>) -> Self {
        Self { scripts }
    }

    pub fn from_root(root: &RootPackage) -> Self {
        Self::new(root.scripts().clone())
    }

    fn run_command(&self, cmd: &str, working_dir: &Path, ctx: &mut ScriptContext, depth: usize) -> Result<()> {
        if let Some(env_assignment) = cmd.strip_prefix("@putenv ") {
            if let Some((key, value)) = env_assignment.split_once('=') {
                ctx.env_vars.insert(key.to_string(), value.to_string());
            }
            return Ok(());
        }

        if let Some(script_ref) = cmd.strip_prefix('@') {
            let Some(commands) = self.scripts.get(script_ref) else {
                bail!("Referenced script '{}' not found", script_ref);
            };
            if depth > 16 {
                bail!("Script '{}' references itself too deeply", script_ref);
            }
            log::debug!("Running referenced script: {}", script_ref);
            for ref_cmd in commands {
                self.run_command(ref_cmd, working_dir, ctx, depth + 1)?;
            }
            return Ok(());
        }

        execute_shell_command(cmd, working_dir, &ctx.env_vars)
    }
}

impl HookDispatcher for ScriptListener {
    fn dispatch(&self, event: &str, context: &EventContext<'_>) -> Result<()> {
        let Some(commands) = self.scripts.get(event) else {
            return Ok(());
        };

        log::info!("> {}: {} command(s)", event, commands.len());

        let mut ctx = ScriptContext::default();
        ctx.env_vars.insert(
            "COMPOSER_DEV_MODE".to_string(),
            if context.dev_mode { "1" } else { "0" }.to_string(),
        );

        for cmd in commands {
            log::info!("> {}", cmd);
            self.run_command(cmd, context.working_dir, &mut ctx, 0)
                .with_context(|| format!("Script of event '{}' failed", event))?;
        }

        Ok(())
    }
}

fn execute_shell_command(cmd: &str, working_dir: &Path, env_vars: &HashMap<String, String>) -> Result<()> {
    #[cfg(unix)]
    let mut command = Command::new("sh");
    #[cfg(unix)]
    command.arg("-c").arg(cmd);

    #[cfg(windows)]
    let mut command = Command::new("cmd");
    #[cfg(windows)]
    command.arg("/C").arg(cmd);

    command.current_dir(working_dir);
    for (key, value) in env_vars {
        command.env(key, value);
    }

    let status = command
        .status()
        .with_context(|| format!("Failed to execute command: {}", cmd))?;

    if !status.success() {
        bail!("Command '{}' returned exit code {}", cmd, status.code().unwrap_or(1));
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn listener(entries: &[(&str, &[&str])]) -> ScriptListener {
        ScriptListener::new(
            entries
                .iter()
                .map(|(event, cmds)| (event.to_string(), cmds.iter().map(|c| c.to_string()).collect()))
                .collect(),
        )
    }

    #[test]
    fn test_runs_commands_with_env_and_references() {
        let dir = tempdir().unwrap();
        let scripts = listener(&[
            ("post-install-cmd", &["@putenv GREETING=hello", "@write"]),
            ("write", &["echo \"$GREETING $COMPOSER_DEV_MODE\" > out.txt"]),
        ]);

        let context = EventContext::new(false, dir.path());
        scripts.dispatch("post-install-cmd", &context).unwrap();

        let out = std::fs::read_to_string(dir.path().join("out.txt")).unwrap();
        assert_eq!(out.trim(), "hello 0");
    }

    #[test]
    fn test_non_zero_exit_fails_the_event() {
        let dir = tempdir().unwrap();
        let scripts = listener(&[("pre-update-cmd", &["exit 3"])]);

        let err = scripts
            .dispatch("pre-update-cmd", &EventContext::new(true, dir.path()))
            .unwrap_err();
        assert!(format!("{:#}", err).contains("exit code 3"));
    }

    #[test]
    fn test_unknown_event_and_missing_reference() {
        let dir = tempdir().unwrap();
        let scripts = listener(&[("post-update-cmd", &["@missing"])]);
        let context = EventContext::new(true, dir.path());

        scripts.dispatch("pre-install-cmd", &context).unwrap();
        assert!(scripts.dispatch("post-update-cmd", &context).is_err());
    }
}
