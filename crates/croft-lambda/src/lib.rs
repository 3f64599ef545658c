//! Handlers for the Croft item service
//!
//! Four entry points, each shipped as its own binary: `get_item`,
//! `post_item`, `healthcheck` and `populate_database`. Handler logic is
//! pure and talks to storage through the [`store::ItemStore`] port, so
//! the binaries only wire up the DynamoDB adapter and the runtime.
//!
//! Handlers are stateless and independently invocable; credential
//! checks happen in the gateway's authorizer before a handler runs,
//! never here.

pub mod envelope;
pub mod handlers;
pub mod store;

/// Environment variable carrying the provisioned table name.
pub const ITEM_TABLE_ENV: &str = "ITEM_TABLE";
