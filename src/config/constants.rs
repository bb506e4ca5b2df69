pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Chatty, a helpful assistant. Reply concisely using markdown when it helps.";

pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000";

pub const DEFAULT_MODEL_ID: &str = "gpt-3.5-turbo";

pub const DEFAULT_MODEL_NAME: &str = "GPT-3.5";

/// Max input characters of the default model
pub const DEFAULT_MODEL_MAX_LENGTH: usize = 12000;

pub const DEFAULT_MODEL_TOKEN_LIMIT: usize = 4000;

/// How long the stop flag stays raised after a stop request
pub const STOP_RESET_MS: u64 = 1000;

/// Conversation names derived from the first message are cut at this many characters
pub const CONVERSATION_NAME_LENGTH: usize = 30;

pub const NEW_CONVERSATION_NAME: &str = "New Conversation";

pub const NEW_PROMPT_NAME: &str = "New Prompt";

pub const NEW_FOLDER_NAME: &str = "New Folder";

pub const LOG_FILE_PATH: &str = "/tmp/chatty.log";

pub const DEFAULT_DB_PATH: &str = "${HOME}/.local/share/chatty/chatty.db";
