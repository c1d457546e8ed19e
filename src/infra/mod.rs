pub mod http_client;
pub mod scripted_session;

pub use http_client::RobloxSession;
pub use scripted_session::{Scripted, ScriptedSession};
