/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint:

- `serve`     - Run the consent HTTP service
- `check`     - Validate an authorization URL offline
- `probe`     - Resolve client metadata from the authorization server
- `authorize` - Run one consent decision in the terminal

The handlers are thin wrappers over the `oauth` and `consent` modules.
*/

pub mod authorize;
pub mod check;
pub mod probe;
pub mod serve;
