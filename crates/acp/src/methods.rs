//! JSON-RPC method name constants. Typed payloads for these methods live in
//! [`crate::schema::methods`].

pub const INITIALIZE: &str = "initialize";
pub const AUTHENTICATE: &str = "authenticate";

pub const SESSION_NEW: &str = "session/new";
pub const SESSION_LOAD: &str = "session/load";
pub const SESSION_PROMPT: &str = "session/prompt";
pub const SESSION_CANCEL: &str = "session/cancel";
pub const SESSION_UPDATE: &str = "session/update";
pub const SESSION_SET_MODE: &str = "session/set_mode";
/// Unstable: agents may not implement model selection.
pub const SESSION_SET_MODEL: &str = "session/set_model";
/// Ambient extension, see [`crate::schema::session::SessionConfigOption`].
pub const SESSION_SET_CONFIG_OPTION: &str = "session/set_config_option";
pub const SESSION_CONFIG_OPTIONS: &str = "session/config_options";
pub const SESSION_REQUEST_PERMISSION: &str = "session/request_permission";

pub const FS_READ_TEXT_FILE: &str = "fs/read_text_file";
pub const FS_WRITE_TEXT_FILE: &str = "fs/write_text_file";

pub const TERMINAL_CREATE: &str = "terminal/create";
pub const TERMINAL_OUTPUT: &str = "terminal/output";
pub const TERMINAL_RELEASE: &str = "terminal/release";
pub const TERMINAL_WAIT_FOR_EXIT: &str = "terminal/wait_for_exit";
pub const TERMINAL_KILL: &str = "terminal/kill";
