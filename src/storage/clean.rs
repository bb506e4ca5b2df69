#[cfg(test)]
#[path = "clean_test.rs"]
mod tests;

use eyre::{Result, bail};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{
    config::{
        Configuration,
        constants::{NEW_CONVERSATION_NAME, NEW_FOLDER_NAME, NEW_PROMPT_NAME},
    },
    models::{Conversation, Folder, Model, Prompt},
};

/// Values used to fill fields that older persisted shapes lack.
#[derive(Debug, Clone)]
pub struct Defaults {
    pub model: Model,
    pub prompt: String,
}

type Repair = fn(&mut Map<String, Value>, &Defaults) -> Result<()>;

/// Applied in order to every conversation record read from storage or an
/// import document. Each step is idempotent.
const CONVERSATION_REPAIRS: &[Repair] = &[
    repair_id,
    repair_name,
    repair_messages,
    repair_model,
    repair_prompt,
    repair_folder_id,
];

const PROMPT_REPAIRS: &[Repair] = &[repair_id, repair_template, repair_model, repair_folder_id];

const FOLDER_REPAIRS: &[Repair] = &[repair_id, repair_folder];

impl Defaults {
    pub fn from_config() -> Self {
        let config = Configuration::instance();
        Self {
            model: config.backend.default_model.clone(),
            prompt: config.general.default_system_prompt.clone(),
        }
    }
}

/// Bring a raw conversation record to the current shape.
pub fn repair_conversation(value: Value, defaults: &Defaults) -> Result<Value> {
    repair_record(value, CONVERSATION_REPAIRS, defaults)
}

pub fn clean_conversation(value: Value, defaults: &Defaults) -> Result<Conversation> {
    let value = repair_conversation(value, defaults)?;
    Ok(serde_json::from_value(value)?)
}

/// Clean every record, dropping the ones that cannot be repaired.
pub fn clean_conversation_history(values: Vec<Value>, defaults: &Defaults) -> Vec<Conversation> {
    clean_entries(values, CONVERSATION_REPAIRS, defaults, "conversation")
}

pub fn clean_prompts(values: Vec<Value>, defaults: &Defaults) -> Vec<Prompt> {
    clean_entries(values, PROMPT_REPAIRS, defaults, "prompt")
}

pub fn clean_folders(values: Vec<Value>, defaults: &Defaults) -> Vec<Folder> {
    clean_entries(values, FOLDER_REPAIRS, defaults, "folder")
}

fn repair_record(value: Value, repairs: &[Repair], defaults: &Defaults) -> Result<Value> {
    let Value::Object(mut record) = value else {
        bail!("record is not an object");
    };
    for repair in repairs {
        repair(&mut record, defaults)?;
    }
    Ok(Value::Object(record))
}

fn clean_entries<T: DeserializeOwned>(
    values: Vec<Value>,
    repairs: &[Repair],
    defaults: &Defaults,
    kind: &str,
) -> Vec<T> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(idx, value)| {
            let cleaned = repair_record(value, repairs, defaults)
                .and_then(|value| Ok(serde_json::from_value(value)?));
            match cleaned {
                Ok(entry) => Some(entry),
                Err(err) => {
                    log::warn!("Dropping unreadable {} at index {}: {}", kind, idx, err);
                    None
                }
            }
        })
        .collect()
}

fn repair_id(record: &mut Map<String, Value>, _: &Defaults) -> Result<()> {
    match record.get("id") {
        Some(Value::String(id)) if !id.is_empty() => Ok(()),
        // Old exports used numeric ids
        Some(Value::Number(id)) => {
            let id = id.to_string();
            record.insert("id".to_string(), Value::String(id));
            Ok(())
        }
        _ => bail!("record has no id"),
    }
}

fn repair_name(record: &mut Map<String, Value>, _: &Defaults) -> Result<()> {
    fill_string(record, "name", NEW_CONVERSATION_NAME);
    Ok(())
}

fn repair_messages(record: &mut Map<String, Value>, _: &Defaults) -> Result<()> {
    let messages = match record.remove("messages") {
        Some(Value::Array(messages)) => messages,
        _ => vec![],
    };
    let total = messages.len();
    let messages: Vec<Value> = messages.into_iter().filter(is_valid_message).collect();
    if messages.len() != total {
        log::debug!(
            "Dropped {} malformed messages from conversation {}",
            total - messages.len(),
            record.get("id").unwrap_or(&Value::Null)
        );
    }
    record.insert("messages".to_string(), Value::Array(messages));
    Ok(())
}

fn repair_model(record: &mut Map<String, Value>, defaults: &Defaults) -> Result<()> {
    let Value::Object(default_model) = serde_json::to_value(&defaults.model)? else {
        bail!("default model is not an object");
    };
    match record.get_mut("model") {
        Some(Value::Object(model)) if matches!(model.get("id"), Some(Value::String(_))) => {
            for (key, value) in default_model {
                model.entry(key).or_insert(value);
            }
        }
        _ => {
            record.insert("model".to_string(), Value::Object(default_model));
        }
    }
    Ok(())
}

fn repair_template(record: &mut Map<String, Value>, _: &Defaults) -> Result<()> {
    fill_string(record, "name", NEW_PROMPT_NAME);
    fill_string(record, "description", "");
    fill_string(record, "content", "");
    Ok(())
}

fn repair_folder(record: &mut Map<String, Value>, _: &Defaults) -> Result<()> {
    fill_string(record, "name", NEW_FOLDER_NAME);
    match record.get("type").and_then(Value::as_str) {
        Some("chat") | Some("prompt") => {}
        // Folders held only conversations before prompts existed
        None => {
            record.insert("type".to_string(), Value::String("chat".to_string()));
        }
        Some(other) => bail!("unknown folder type {:?}", other),
    }
    Ok(())
}

fn fill_string(record: &mut Map<String, Value>, key: &str, default: &str) {
    if !matches!(record.get(key), Some(Value::String(_))) {
        record.insert(key.to_string(), Value::String(default.to_string()));
    }
}

fn repair_prompt(record: &mut Map<String, Value>, defaults: &Defaults) -> Result<()> {
    fill_string(record, "prompt", &defaults.prompt);
    Ok(())
}

fn repair_folder_id(record: &mut Map<String, Value>, _: &Defaults) -> Result<()> {
    let folder_id = match record.remove("folderId") {
        Some(Value::String(id)) if !id.is_empty() => Value::String(id),
        // `0` was used to mean "unfiled"
        Some(Value::Number(id)) if id.as_u64() != Some(0) => Value::String(id.to_string()),
        _ => Value::Null,
    };
    record.insert("folderId".to_string(), folder_id);
    Ok(())
}

fn is_valid_message(value: &Value) -> bool {
    let Value::Object(message) = value else {
        return false;
    };
    matches!(message.get("content"), Some(Value::String(_)))
        && matches!(
            message.get("role").and_then(Value::as_str),
            Some("user") | Some("assistant")
        )
}
