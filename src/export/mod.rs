#[cfg(test)]
#[path = "export_test.rs"]
mod tests;

use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    app::Repository,
    models::{Conversation, Folder, FolderKind, Prompt},
    storage::clean::{Defaults, clean_conversation_history},
};

pub const EXPORT_VERSION: u32 = 4;

/// Latest export document shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportData {
    pub version: u32,
    pub history: Vec<Conversation>,
    pub folders: Vec<Folder>,
    pub prompts: Vec<Prompt>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ImportError {
    #[error("invalid JSON: {0}")]
    Json(String),
    #[error("unrecognized import document")]
    UnknownFormat,
    #[error("unsupported export version {0}")]
    UnknownVersion(u64),
    #[error("import is missing `{0}`")]
    MissingField(&'static str),
    #[error("malformed `{field}`: {reason}")]
    Malformed { field: &'static str, reason: String },
}

/// Older numeric-id folder shape.
#[derive(Debug, Deserialize)]
struct LegacyFolder {
    id: Value,
    name: String,
}

pub fn parse_import(text: &str, defaults: &Defaults) -> Result<ExportData, ImportError> {
    let raw: Value = serde_json::from_str(text).map_err(|err| ImportError::Json(err.to_string()))?;
    import_data(raw, defaults)
}

/// Detect the shape of `raw` and normalize it to the latest version.
///
/// Accepted shapes:
/// - a bare array of conversations
/// - `{ history, folders }` with numeric folder ids
/// - `{ version: 3, history, folders }`
/// - `{ version: 4, history, folders, prompts }`
pub fn import_data(raw: Value, defaults: &Defaults) -> Result<ExportData, ImportError> {
    let mut doc = match raw {
        Value::Array(history) => {
            log::debug!("Importing unversioned conversation list");
            return Ok(ExportData {
                version: EXPORT_VERSION,
                history: clean_conversation_history(history, defaults),
                folders: vec![],
                prompts: vec![],
            });
        }
        Value::Object(doc) => doc,
        _ => return Err(ImportError::UnknownFormat),
    };

    let version = match doc.get("version") {
        None => 2,
        Some(Value::Number(n)) => match n.as_u64() {
            Some(v @ (3 | 4)) => v,
            Some(v) => return Err(ImportError::UnknownVersion(v)),
            None => return Err(ImportError::UnknownFormat),
        },
        Some(_) => return Err(ImportError::UnknownFormat),
    };
    log::debug!("Importing export document version {}", version);

    let history = take_array(&mut doc, "history")?;
    let folders = take_array(&mut doc, "folders")?;
    let folders = if version == 2 {
        legacy_folders(folders)?
    } else {
        from_values(folders, "folders")?
    };
    let prompts = if version == 4 {
        from_values(take_array(&mut doc, "prompts")?, "prompts")?
    } else {
        vec![]
    };

    Ok(ExportData {
        version: EXPORT_VERSION,
        history: clean_conversation_history(history, defaults),
        folders,
        prompts,
    })
}

pub fn export_data(repository: &Repository) -> ExportData {
    ExportData {
        version: EXPORT_VERSION,
        history: repository.conversations().to_vec(),
        folders: repository.folders().to_vec(),
        prompts: repository.prompts().to_vec(),
    }
}

pub fn export_file_name(date: chrono::NaiveDate) -> String {
    format!("chatty_history_{}.json", date.format("%Y-%m-%d"))
}

/// Write `data` into `dir` under the dated export file name.
pub async fn write_export(data: &ExportData, dir: &Path, date: chrono::NaiveDate) -> Result<PathBuf> {
    let path = dir.join(export_file_name(date));
    let content = serde_json::to_string_pretty(data).wrap_err("serializing export")?;
    tokio::fs::write(&path, content)
        .await
        .wrap_err(format!("writing {}", path.display()))?;
    Ok(path)
}

pub async fn read_import(path: &Path, defaults: &Defaults) -> Result<ExportData> {
    let text = tokio::fs::read_to_string(path)
        .await
        .wrap_err(format!("reading {}", path.display()))?;
    Ok(parse_import(&text, defaults)?)
}

fn take_array(
    doc: &mut serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<Vec<Value>, ImportError> {
    match doc.remove(field) {
        Some(Value::Array(values)) => Ok(values),
        Some(_) => Err(ImportError::Malformed {
            field,
            reason: "expected an array".to_string(),
        }),
        None => Err(ImportError::MissingField(field)),
    }
}

fn from_values<T: serde::de::DeserializeOwned>(
    values: Vec<Value>,
    field: &'static str,
) -> Result<Vec<T>, ImportError> {
    serde_json::from_value(Value::Array(values)).map_err(|err| ImportError::Malformed {
        field,
        reason: err.to_string(),
    })
}

fn legacy_folders(values: Vec<Value>) -> Result<Vec<Folder>, ImportError> {
    let legacy: Vec<LegacyFolder> = from_values(values, "folders")?;
    Ok(legacy
        .into_iter()
        .map(|f| {
            let id = match f.id {
                Value::String(id) => id,
                other => other.to_string(),
            };
            Folder::new(f.name, FolderKind::Chat).with_id(id)
        })
        .collect())
}
