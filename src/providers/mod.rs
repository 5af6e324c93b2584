//! Typed bindings for the provider schemas this stack uses.
//!
//! Field names follow the Terraform attribute names. Optional attributes are
//! left out of the synthesized JSON when unset.

pub mod aws;
pub mod github;
