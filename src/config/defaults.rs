use super::constants::*;

pub(crate) fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

pub(crate) fn stop_reset_ms() -> u64 {
    STOP_RESET_MS
}

pub(crate) fn endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

pub(crate) fn log_level() -> Option<String> {
    Some("info".to_string())
}

pub(crate) fn log_file_path() -> String {
    LOG_FILE_PATH.to_string()
}
