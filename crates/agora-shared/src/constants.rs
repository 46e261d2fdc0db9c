/// Application name
pub const APP_NAME: &str = "Agora";

/// Maximum attachment source size in bytes (10 MiB)
pub const MAX_ATTACHMENT_SIZE: usize = 10 * 1024 * 1024;

/// Default interval between background refresh ticks, in seconds
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// How far apart (in seconds) an optimistic message and a server message
/// may be timestamped and still be treated as the same send
pub const ECHO_MATCH_WINDOW_SECS: i64 = 30;

/// How many characters of a message body survive into the chat-list preview
pub const PREVIEW_MAX_CHARS: usize = 80;
