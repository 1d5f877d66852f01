//! Terminal front end for the declarative engine
//!
//! The engine orchestrates:
//! 1. Diffing - Read each resource and compare with the manifest
//! 2. Confirming - Show the diff and ask before writing
//! 3. Executing - Apply changes one resource at a time with a progress bar

pub mod differ;
pub mod executor;

pub use executor::{ApplyOptions, execute};
