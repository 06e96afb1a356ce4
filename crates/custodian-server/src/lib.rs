//! Custodian Server
//!
//! The standalone HTTP resolver printed QR codes point at, plus the page
//! it renders. The `custodian` binary in this crate wires configuration,
//! tracing and the resolver together.

pub mod render;
pub mod resolver;

pub use render::{escape_html, render_asset_page};
pub use resolver::{routes, serve, ResolverError, ResolverState, BODY_LIMIT};
