//! Lifecycle of the single background media session.

mod binder;
mod connection;
pub mod global;
mod media_session;

pub use binder::SessionBinder;
pub use connection::ServiceConnection;
pub use media_session::{MediaSession, SessionHandle};
