pub mod confirm;
pub mod kick_status;
pub mod messages;
pub mod start_kicking;
pub mod stop_kicking;
