//! Async client side of crew-studio: REST calls, the per-session realtime
//! channel, and the controller that ties them to the session store.

pub mod api;
pub mod controller;
pub mod error;
pub mod realtime;
pub mod validator;

pub use api::ApiClient;
pub use controller::{Advance, SessionController};
pub use error::ClientError;
pub use realtime::{ConnectionState, RealtimeChannel};
