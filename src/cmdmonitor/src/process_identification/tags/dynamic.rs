use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::warn;

use super::script::command_matches_script_name;
use crate::utils::write_atomic;

/// Parsed contents of the dynamic tag file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DynamicTags {
    pids: Vec<u32>,
    scripts: Vec<String>,
}

impl DynamicTags {
    /// Blank and `#` lines are skipped. Decimal lines are PIDs, everything else a script token.
    pub fn parse(content: &str) -> Self {
        let mut tags = Self::default();
        for line in content.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_pid(line) {
                Some(pid) => tags.pids.push(pid),
                None => tags.scripts.push(line.to_string()),
            }
        }
        tags
    }

    /// A missing file means no dynamic tags.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Self::parse(&content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    /// Like [`DynamicTags::load`], logging and returning no tags on failure.
    pub fn load_or_empty(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            warn!("Ignoring dynamic tag file: {e:#}");
            Self::default()
        })
    }

    pub fn pids(&self) -> &[u32] {
        &self.pids
    }

    pub fn scripts(&self) -> &[String] {
        &self.scripts
    }

    pub fn is_empty(&self) -> bool {
        self.pids.is_empty() && self.scripts.is_empty()
    }

    pub fn contains_pid(&self, pid: u32) -> bool {
        self.pids.contains(&pid)
    }

    pub fn matching_script(&self, command: &str) -> Option<&str> {
        self.scripts
            .iter()
            .find(|name| command_matches_script_name(command, name))
            .map(String::as_str)
    }
}

fn parse_pid(line: &str) -> Option<u32> {
    if !line.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    line.parse().ok()
}

/// Editing access to the dynamic tag file, used by the `tag` and `untag` commands.
pub struct DynamicTagFile {
    path: PathBuf,
}

impl DynamicTagFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fails when the path exists but cannot be read as a regular file.
    pub fn check_readable(&self) -> Result<bool> {
        match fs::metadata(&self.path) {
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => {
                Err(e).with_context(|| format!("cannot access {}", self.path.display()))
            }
            Ok(meta) if !meta.is_file() => {
                bail!("{} is not a regular file", self.path.display())
            }
            Ok(_) => {
                fs::read_to_string(&self.path)
                    .with_context(|| format!("cannot read {}", self.path.display()))?;
                Ok(true)
            }
        }
    }

    /// Appends an entry. Returns false when it was already present.
    pub fn add(&self, entry: &str) -> Result<bool> {
        let entry = validate_entry(entry)?;
        let mut content = self.read_raw()?;
        if content.lines().any(|line| line.trim() == entry) {
            return Ok(false);
        }

        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(entry);
        content.push('\n');

        self.write(&content)?;
        Ok(true)
    }

    /// Removes every line equal to the entry. Returns false when nothing matched.
    pub fn remove(&self, entry: &str) -> Result<bool> {
        let entry = validate_entry(entry)?;
        let content = self.read_raw()?;
        let kept: Vec<&str> = content.lines().filter(|line| line.trim() != entry).collect();
        if kept.len() == content.lines().count() {
            return Ok(false);
        }

        let mut rewritten = kept.join("\n");
        if !rewritten.is_empty() {
            rewritten.push('\n');
        }
        self.write(&rewritten)?;
        Ok(true)
    }

    fn read_raw(&self) -> Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", self.path.display())),
        }
    }

    fn write(&self, content: &str) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        write_atomic(&self.path, content.as_bytes())
    }
}

fn validate_entry(entry: &str) -> Result<&str> {
    let entry = entry.trim();
    if entry.is_empty() || entry.starts_with('#') || entry.contains(char::is_whitespace) {
        bail!("tag entry must be a single PID or script name, got '{entry}'");
    }
    Ok(entry)
}
