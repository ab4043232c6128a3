/// Confirmation-button helpers for kick sessions.
pub mod interaction;
/// Single source of truth for the message-command prefix.
pub const COMMAND_PREFIX: char = '!';
/// Pure parser helpers.
pub mod parse;
/// Guild ownership checks.
pub mod permissions;
/// Shared time helpers.
pub mod time;
