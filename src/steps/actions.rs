//! Side effects for each step kind.
//!
//! Every parameter struct implements [`StepAction`]; the executor only sees
//! the trait, never the kind-specific logic.

use crate::config::interpolation::{expand_text, MissingKey};
use crate::config::settings::ExecutionSettings;
use crate::error::{DeployerError, Result};
use crate::shell::{execute, CommandOptions, CommandSpec};
use crate::steps::step::{
    CopyStep, DeleteStep, MkdirStep, RunStep, StepKind, TemplateStep, WriteStep,
};
use anyhow::{anyhow, Context};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Working context shared by all steps of a run.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub settings: &'a ExecutionSettings,
}

impl<'a> StepContext<'a> {
    pub fn new(settings: &'a ExecutionSettings) -> Self {
        Self { settings }
    }

    /// Resolve a step path against the working directory.
    pub fn path(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.settings.workdir.join(p)
        }
    }
}

/// The capability every step kind provides.
pub trait StepAction {
    /// Parameters shown in verbose output, in display order.
    fn parameters(&self) -> Vec<(&'static str, String)>;

    /// Apply the step's side effect, returning optional output for display.
    fn apply(&self, ctx: &StepContext<'_>) -> Result<Option<String>>;
}

impl StepKind {
    /// The action implementing this kind.
    pub fn action(&self) -> &dyn StepAction {
        match self {
            StepKind::Mkdir(s) => s,
            StepKind::Copy(s) => s,
            StepKind::Delete(s) => s,
            StepKind::Write(s) => s,
            StepKind::Template(s) => s,
            StepKind::Run(s) => s,
        }
    }
}

impl StepAction for MkdirStep {
    fn parameters(&self) -> Vec<(&'static str, String)> {
        vec![
            ("path", self.path.clone()),
            ("parents", self.parents.to_string()),
        ]
    }

    fn apply(&self, ctx: &StepContext<'_>) -> Result<Option<String>> {
        let path = ctx.path(&self.path);
        let created = if self.parents {
            fs::create_dir_all(&path)
        } else {
            fs::create_dir(&path)
        };
        created.with_context(|| format!("cannot create directory {}", path.display()))?;
        Ok(None)
    }
}

impl StepAction for CopyStep {
    fn parameters(&self) -> Vec<(&'static str, String)> {
        vec![
            ("from", self.from.clone()),
            ("to", self.to.clone()),
            ("overwrite", self.overwrite.to_string()),
        ]
    }

    fn apply(&self, ctx: &StepContext<'_>) -> Result<Option<String>> {
        let from = ctx.path(&self.from);
        let to = ctx.path(&self.to);

        let meta = fs::metadata(&from)
            .with_context(|| format!("cannot read source {}", from.display()))?;

        let copied = if meta.is_dir() {
            let source_root = fs::canonicalize(&from)
                .with_context(|| format!("cannot resolve source {}", from.display()))?;
            let target_root = canonical_target(&to)
                .with_context(|| format!("cannot resolve destination {}", to.display()))?;
            if target_root.starts_with(&source_root) {
                return Err(anyhow!(
                    "cannot copy directory {} into itself at {}",
                    from.display(),
                    to.display()
                )
                .into());
            }
            copy_dir(&from, &to, self.overwrite)?
        } else {
            let dest = if to.is_dir() {
                match from.file_name() {
                    Some(name) => to.join(name),
                    None => {
                        return Err(anyhow!("source {} has no file name", from.display()).into())
                    }
                }
            } else {
                to
            };
            copy_file(&from, &dest, self.overwrite)?;
            1
        };

        Ok(Some(format!("{} file(s) copied", copied)))
    }
}

fn copy_file(from: &Path, to: &Path, overwrite: bool) -> Result<()> {
    if !overwrite && to.exists() {
        return Err(anyhow!("destination {} already exists", to.display()).into());
    }
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("cannot create directory {}", parent.display()))?;
    }
    fs::copy(from, to)
        .with_context(|| format!("cannot copy {} to {}", from.display(), to.display()))?;
    Ok(())
}

/// Canonical form of a path that may not exist yet: the deepest existing
/// ancestor is canonicalized and the missing components are appended.
fn canonical_target(path: &Path) -> std::io::Result<PathBuf> {
    let mut existing = path;
    let mut missing = Vec::new();
    loop {
        match fs::canonicalize(existing) {
            Ok(base) => {
                return Ok(missing
                    .iter()
                    .rev()
                    .fold(base, |acc: PathBuf, part| acc.join(part)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                match (existing.parent(), existing.file_name()) {
                    (Some(parent), Some(name)) => {
                        missing.push(name.to_os_string());
                        existing = if parent.as_os_str().is_empty() {
                            Path::new(".")
                        } else {
                            parent
                        };
                    }
                    _ => return Err(e),
                }
            }
            Err(e) => return Err(e),
        }
    }
}

fn copy_dir(from: &Path, to: &Path, overwrite: bool) -> Result<usize> {
    fs::create_dir_all(to).with_context(|| format!("cannot create directory {}", to.display()))?;

    let entries =
        fs::read_dir(from).with_context(|| format!("cannot read directory {}", from.display()))?;

    let mut copied = 0;
    for entry in entries {
        let entry = entry.with_context(|| format!("cannot read directory {}", from.display()))?;
        let source = entry.path();
        let dest = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copied += copy_dir(&source, &dest, overwrite)?;
        } else {
            copy_file(&source, &dest, overwrite)?;
            copied += 1;
        }
    }
    Ok(copied)
}

impl StepAction for DeleteStep {
    fn parameters(&self) -> Vec<(&'static str, String)> {
        vec![
            ("path", self.path.clone()),
            ("must_exist", self.must_exist.to_string()),
        ]
    }

    fn apply(&self, ctx: &StepContext<'_>) -> Result<Option<String>> {
        let path = ctx.path(&self.path);

        let meta = match fs::symlink_metadata(&path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !self.must_exist => {
                return Ok(Some("nothing to delete".to_string()));
            }
            Err(e) => {
                return Err(anyhow!(e)
                    .context(format!("cannot delete {}", path.display()))
                    .into())
            }
        };

        let removed = if meta.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.with_context(|| format!("cannot delete {}", path.display()))?;
        Ok(None)
    }
}

impl StepAction for WriteStep {
    fn parameters(&self) -> Vec<(&'static str, String)> {
        vec![
            ("path", self.path.clone()),
            ("bytes", self.content.len().to_string()),
        ]
    }

    fn apply(&self, ctx: &StepContext<'_>) -> Result<Option<String>> {
        let path = ctx.path(&self.path);
        write_with_parents(&path, &self.content)?;
        Ok(None)
    }
}

fn write_with_parents(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("cannot create directory {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("cannot write {}", path.display()))?;
    Ok(())
}

impl StepAction for TemplateStep {
    fn parameters(&self) -> Vec<(&'static str, String)> {
        vec![
            ("source", self.source.clone()),
            ("target", self.target.clone()),
        ]
    }

    fn apply(&self, ctx: &StepContext<'_>) -> Result<Option<String>> {
        let source = ctx.path(&self.source);
        let target = ctx.path(&self.target);

        let text = fs::read_to_string(&source)
            .with_context(|| format!("cannot read template {}", source.display()))?;
        let expanded = expand_text(&text, &self.data).map_err(|MissingKey(name)| {
            anyhow!(
                "unresolved reference '{{{{{}}}}}' in {}",
                name,
                source.display()
            )
        })?;

        write_with_parents(&target, &expanded)?;
        Ok(None)
    }
}

/// A `run` step whose process failed or timed out.
///
/// Carries whatever the process wrote to stdout before it stopped.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ProcessFailure {
    pub message: String,
    pub output: Option<String>,
}

impl From<ProcessFailure> for DeployerError {
    fn from(failure: ProcessFailure) -> Self {
        DeployerError::Other(anyhow::Error::new(failure))
    }
}

impl ProcessFailure {
    /// Output captured by a failed process, if the error came from one.
    pub fn output_of(err: &DeployerError) -> Option<&str> {
        match err {
            DeployerError::Other(inner) => inner
                .downcast_ref::<ProcessFailure>()
                .and_then(|failure| failure.output.as_deref()),
            _ => None,
        }
    }
}

impl RunStep {
    fn spec(&self) -> CommandSpec {
        if self.args.is_empty() {
            CommandSpec::Shell(self.command.clone())
        } else {
            CommandSpec::Program {
                program: self.command.clone(),
                args: self.args.clone(),
            }
        }
    }
}

impl StepAction for RunStep {
    fn parameters(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("command", self.spec().display())];
        if let Some(cwd) = &self.cwd {
            params.push(("cwd", cwd.clone()));
        }
        if !self.env.is_empty() {
            let keys: Vec<_> = self.env.keys().map(String::as_str).collect();
            params.push(("env", keys.join(", ")));
        }
        if let Some(timeout) = self.timeout {
            params.push(("timeout", format!("{}s", timeout)));
        }
        params
    }

    fn apply(&self, ctx: &StepContext<'_>) -> Result<Option<String>> {
        let spec = self.spec();
        let timeout = self
            .timeout
            .map(Duration::from_secs)
            .or(ctx.settings.step_timeout);

        let options = CommandOptions {
            cwd: Some(ctx.path(self.cwd.as_deref().unwrap_or("."))),
            env: self.env.clone(),
            timeout,
        };

        let result = execute(&spec, &options)?;

        let stdout = Some(result.stdout.clone()).filter(|out| !out.trim().is_empty());

        if result.timed_out {
            let limit = timeout.unwrap_or_default();
            return Err(ProcessFailure {
                message: format!("'{}' timed out after {:?}", spec.display(), limit),
                output: stdout,
            }
            .into());
        }
        if !result.success {
            let stderr = result.stderr.trim();
            let mut message = format!(
                "'{}' exited with code {}",
                spec.display(),
                result
                    .exit_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "none".to_string())
            );
            if !stderr.is_empty() {
                message.push_str(": ");
                message.push_str(stderr);
            }
            return Err(ProcessFailure {
                message,
                output: stdout,
            }
            .into());
        }

        let output = format!("{}{}", result.stdout, result.stderr);
        Ok(if output.trim().is_empty() {
            None
        } else {
            Some(output)
        })
    }
}
