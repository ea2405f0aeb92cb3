//! Data models for the portfolio backend.
//!
//! Field names are camelCase on the wire to match the site's frontend.

mod contact;
mod content;

pub use contact::*;
pub use content::*;
