// src/resolve.rs

//! Command-line resolution: turn the raw token list into the set of paths to
//! watch and the command chain to run.
//!
//! Both outputs are fixed at startup:
//! - [`WatchSet`]: every token of the *first* command segment that names an
//!   existing path contributes its base name, deduplicated. If nothing
//!   matches, the whole working directory is watched instead.
//! - [`CommandSpec`]: the tokens split at `&&` / `||` into [`CommandStep`]s,
//!   each carrying the gate that decides whether the next step runs.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::SetupError;

/// Ordered, deduplicated set of filesystem paths to monitor.
///
/// Never empty once resolution succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSet(Vec<PathBuf>);

impl WatchSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert a path, keeping first-seen order and skipping duplicates.
    pub fn insert(&mut self, path: PathBuf) {
        if !self.0.contains(&path) {
            self.0.push(path);
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl Default for WatchSet {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<PathBuf> for WatchSet {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        let mut set = Self::new();
        for path in iter {
            set.insert(path);
        }
        set
    }
}

/// How a step's exit outcome gates the next step in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// No operator followed this step; always proceed (last step ends here).
    None,
    /// `&&`: proceed only if this step succeeded.
    And,
    /// `||`: proceed only if this step failed.
    Or,
}

impl Gate {
    /// Whether the chain continues past a step that ended with `success`.
    pub fn continues(self, success: bool) -> bool {
        match self {
            Gate::None => true,
            Gate::And => success,
            Gate::Or => !success,
        }
    }

    fn operator(self) -> Option<&'static str> {
        match self {
            Gate::None => None,
            Gate::And => Some("&&"),
            Gate::Or => Some("||"),
        }
    }
}

/// One command segment of the chain: an argv plus its gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandStep {
    pub argv: Vec<String>,
    pub gate: Gate,
}

/// The full command chain to execute on every trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub steps: Vec<CommandStep>,
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for step in &self.steps {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            f.write_str(&step.argv.join(" "))?;
            if let Some(op) = step.gate.operator() {
                write!(f, " {op}")?;
            }
        }
        Ok(())
    }
}

/// Result of resolving the command line: what to watch and what to run.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub watch_set: WatchSet,
    pub command: CommandSpec,
}

/// Resolve the raw argument tokens against the current working directory.
pub fn resolve(tokens: Vec<String>) -> Result<Invocation, SetupError> {
    let cwd = std::env::current_dir().map_err(SetupError::WorkingDir)?;
    resolve_in(tokens, &cwd)
}

/// Resolve the raw argument tokens, checking path existence against `dir`.
///
/// `dir` is also the fallback watch target when no token names an existing
/// file.
pub fn resolve_in(tokens: Vec<String>, dir: &Path) -> Result<Invocation, SetupError> {
    // Heuristic: a single whitespace-containing argument means the caller
    // quoted the whole command; re-split it.
    let tokens: Vec<String> = if tokens.len() == 1 && tokens[0].contains(char::is_whitespace) {
        tokens[0].split_whitespace().map(str::to_string).collect()
    } else {
        tokens
    };

    if tokens.is_empty() {
        return Err(SetupError::Usage("missing command".to_string()));
    }
    if tokens.iter().any(|t| t == "|") {
        return Err(SetupError::Usage(
            "watchrun does not support pipes".to_string(),
        ));
    }

    let command = parse_chain(&tokens)?;
    let watch_set = build_watch_set(&command.steps[0], dir)?;

    debug!(?watch_set, command = %command, "resolved invocation");

    Ok(Invocation { watch_set, command })
}

/// Split tokens at `&&` / `||` into gated steps.
fn parse_chain(tokens: &[String]) -> Result<CommandSpec, SetupError> {
    let mut steps = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for tok in tokens {
        match tok.as_str() {
            "&&" | "||" => {
                if current.is_empty() {
                    return Err(SetupError::Usage(format!(
                        "empty command before '{tok}'"
                    )));
                }
                let gate = if tok == "&&" { Gate::And } else { Gate::Or };
                steps.push(CommandStep {
                    argv: std::mem::take(&mut current),
                    gate,
                });
            }
            _ => current.push(tok.clone()),
        }
    }

    if current.is_empty() {
        return Err(SetupError::Usage(
            "empty command after '&&' or '||'".to_string(),
        ));
    }
    steps.push(CommandStep {
        argv: current,
        gate: Gate::None,
    });

    Ok(CommandSpec { steps })
}

/// Watch membership: only the first step's tokens are considered, and only
/// those that name an existing path. Non-existent tokens are command words.
fn build_watch_set(first: &CommandStep, dir: &Path) -> Result<WatchSet, SetupError> {
    let mut watch_set = WatchSet::new();

    for tok in &first.argv {
        match std::fs::metadata(dir.join(tok)) {
            Ok(_) => {
                if let Some(name) = Path::new(tok).file_name() {
                    watch_set.insert(PathBuf::from(name));
                }
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(SetupError::Stat {
                    path: tok.clone(),
                    source: err,
                });
            }
        }
    }

    if watch_set.is_empty() {
        watch_set.insert(dir.to_path_buf());
    }

    Ok(watch_set)
}
