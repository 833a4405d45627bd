//! The consent decision
//!
//! - [`controller`] -- the consent state machine
//! - [`flow`]       -- async driver binding a controller to an authorization server
//! - [`session`]    -- in-memory registry of live consent sessions
//! - [`render`]     -- HTML projection of the consent state

pub mod controller;
pub mod flow;
pub mod render;
pub mod session;

pub use controller::{ConsentController, ConsentState};
pub use flow::ConsentFlow;
pub use session::SessionStore;
