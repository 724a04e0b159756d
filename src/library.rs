//! Named macros stored as JSON, in the format the desktop builder
//! imports and exports:
//!
//! ```json
//! [
//!   { "name": "Jump", "trigger": "!jump", "chat_command": "!jump",
//!     "steps": ["Button:A", "Wait:200"] }
//! ]
//! ```

use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};
use thiserror::Error;

use crate::parser::MacroSeq;
use crate::step::MacroStep;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid macro file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid macro file: expected a macro object or a list of macros")]
    UnexpectedShape,

    #[error("Macro name is required")]
    MissingName,

    #[error("Macro '{0}' needs a trigger")]
    MissingTrigger(String),

    #[error("Macro '{0}' has no steps")]
    NoSteps(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EntryRepr", into = "EntryRepr")]
pub struct MacroEntry {
    pub name: String,
    /// Chat command that starts the macro, e.g. `!jump`.
    pub trigger: String,
    pub steps: Vec<MacroStep>,
}

impl MacroEntry {
    pub fn new(name: impl Into<String>, trigger: impl Into<String>, steps: Vec<MacroStep>) -> Self {
        Self {
            name: name.into(),
            trigger: trigger.into(),
            steps,
        }
    }

    pub fn validate(&self) -> Result<(), LibraryError> {
        if self.name.trim().is_empty() {
            return Err(LibraryError::MissingName);
        }
        if self.trigger.trim().is_empty() {
            return Err(LibraryError::MissingTrigger(self.name.clone()));
        }
        if self.steps.is_empty() {
            return Err(LibraryError::NoSteps(self.name.clone()));
        }
        Ok(())
    }

    pub fn to_seq(&self) -> MacroSeq {
        MacroSeq::from(self.steps.clone())
    }
}

// `chat_command` is an older name for `trigger`; files may carry either or both.
#[derive(Serialize, Deserialize)]
struct EntryRepr {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trigger: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    chat_command: Option<String>,
    #[serde(default)]
    steps: Vec<MacroStep>,
}

impl From<EntryRepr> for MacroEntry {
    fn from(repr: EntryRepr) -> Self {
        Self {
            name: repr.name,
            trigger: repr.trigger.or(repr.chat_command).unwrap_or_default(),
            steps: repr.steps,
        }
    }
}

impl From<MacroEntry> for EntryRepr {
    fn from(entry: MacroEntry) -> Self {
        Self {
            name: entry.name,
            chat_command: Some(entry.trigger.clone()),
            trigger: Some(entry.trigger),
            steps: entry.steps,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroLibrary {
    macros: Vec<MacroEntry>,
}

impl MacroLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Missing file means an empty library.
    pub fn load(path: &Path) -> Result<Self, LibraryError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Accepts a single macro object or a list of them.
    pub fn from_json(text: &str) -> Result<Self, LibraryError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let macros = match value {
            serde_json::Value::Array(_) => serde_json::from_value(value)?,
            serde_json::Value::Object(_) => vec![serde_json::from_value(value)?],
            _ => return Err(LibraryError::UnexpectedShape),
        };
        Ok(Self { macros })
    }

    pub fn to_json(&self) -> Result<String, LibraryError> {
        Ok(serde_json::to_string_pretty(&self.macros)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), LibraryError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn macros(&self) -> &[MacroEntry] {
        &self.macros
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    /// Match on name first, then on trigger. Case-insensitive.
    pub fn find(&self, key: &str) -> Option<&MacroEntry> {
        let key = key.trim();
        self.macros
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(key))
            .or_else(|| {
                self.macros
                    .iter()
                    .find(|m| m.trigger.eq_ignore_ascii_case(key))
            })
    }

    /// Add a macro, replacing any macro with the same name (ignoring case) in place.
    pub fn insert(&mut self, entry: MacroEntry) -> Result<(), LibraryError> {
        entry.validate()?;
        match self
            .macros
            .iter_mut()
            .find(|m| m.name.eq_ignore_ascii_case(&entry.name))
        {
            Some(existing) => *existing = entry,
            None => self.macros.push(entry),
        }
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<MacroEntry> {
        let name = name.trim();
        let idx = self
            .macros
            .iter()
            .position(|m| m.name.eq_ignore_ascii_case(name))?;
        Some(self.macros.remove(idx))
    }

    /// Append everything from `other`, as an import does. Returns how many were added.
    pub fn extend(&mut self, other: MacroLibrary) -> usize {
        let added = other.macros.len();
        self.macros.extend(other.macros);
        added
    }
}
