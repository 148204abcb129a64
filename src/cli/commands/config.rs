//! Config command implementation.
//!
//! The `deployer config` command shows the resolved configuration.

use std::io::Write;

use crate::cli::args::ConfigArgs;
use crate::config::resolve_files;
use crate::error::Result;

use super::dispatcher::{Command, CommandResult};

/// The config command implementation.
pub struct ConfigCommand {
    args: ConfigArgs,
}

impl ConfigCommand {
    /// Create a new config command.
    pub fn new(args: ConfigArgs) -> Self {
        Self { args }
    }
}

impl Command for ConfigCommand {
    fn execute(&self, out: &mut dyn Write) -> Result<CommandResult> {
        let config = resolve_files(&self.args.inputs.template, &self.args.inputs.data)?;

        if self.args.steps {
            for step in config.steps() {
                writeln!(out, "#{} {}", step.ordinal, step.label)?;
            }
        } else {
            let json = serde_json::to_string_pretty(config.document()).map_err(anyhow::Error::from)?;
            writeln!(out, "{}", json)?;
        }

        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::InputArgs;
    use std::fs;
    use tempfile::TempDir;

    fn command(steps_only: bool) -> (TempDir, ConfigCommand) {
        let temp = TempDir::new().unwrap();
        let template = temp.path().join("t.json");
        let data = temp.path().join("d.json");
        fs::write(
            &template,
            r#"{"dir": "{{outDir}}", "steps": [
                {"kind": "mkdir", "path": "{{outDir}}/bin"},
                {"kind": "run", "command": "make", "label": "Compile"}
            ]}"#,
        )
        .unwrap();
        fs::write(&data, r#"{"outDir": "build"}"#).unwrap();

        let args = ConfigArgs {
            inputs: InputArgs { template, data },
            steps: steps_only,
        };
        (temp, ConfigCommand::new(args))
    }

    #[test]
    fn prints_resolved_document() {
        let (_temp, cmd) = command(false);
        let mut out = Vec::new();
        cmd.execute(&mut out).unwrap();

        let printed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(printed["dir"], "build");
        assert_eq!(printed["steps"][0]["path"], "build/bin");
    }

    #[test]
    fn prints_step_labels() {
        let (_temp, cmd) = command(true);
        let mut out = Vec::new();
        cmd.execute(&mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "#1 mkdir build/bin\n#2 Compile\n"
        );
    }
}
