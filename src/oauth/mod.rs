//! OAuth 2.0 authorization code + PKCE building blocks
//!
//! # Module Layout
//!
//! - [`params`]   -- authorization request parsing and validation
//! - [`metadata`] -- client display metadata and scope slugs
//! - [`api`]      -- authorization server client (scopes and authorize endpoints)
//! - [`redirect`] -- success and error redirect URL construction

pub mod api;
pub mod metadata;
pub mod params;
pub mod redirect;

pub use api::{AuthorizationResult, AuthorizationServer, HttpAuthorizationServer};
pub use metadata::{ClientMetadata, ScopeDescriptor};
pub use params::{AuthorizationRequest, RawParams};
