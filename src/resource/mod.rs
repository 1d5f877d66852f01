//! REST resources for the declarative engine
//!
//! Each manifest entry becomes a [`RestResource`]: a desired
//! [`restkit::ResourceInstance`] bound to its type and transport. State
//! detection and apply both run the restkit reconciler.

pub mod converters;
mod rest;

pub use rest::{Inspection, RestResource, render};
