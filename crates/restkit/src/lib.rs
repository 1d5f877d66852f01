//! Generic REST resource reconciliation.
//!
//! This crate reconciles a declarative resource description against an
//! arbitrary HTTP/JSON API without per-resource CRUD code:
//!
//! - **Identity**: which URL template variables address an instance,
//!   inferred from path segments or query parameters
//! - **Mapping**: flat properties to and from nested JSON documents, via path
//!   expressions or registered converters
//! - **Change calculation**: the minimal body for create or update, honoring
//!   post-only properties
//!
//! # Example
//!
//! ```no_run
//! use restkit::{Action, HttpTransport, PropertySpec, Reconciler, ResourceType};
//! use serde_json::json;
//!
//! let igroup = ResourceType::builder("igroup")
//!     .collection("/api/protocols/san/igroups")
//!     .document("/api/protocols/san/igroups?name={name}&svm.name={svm}")
//!     .property(PropertySpec::required("name"))
//!     .property(PropertySpec::required("svm"))
//!     .property(PropertySpec::new("os_type"))
//!     .map_path("os_type", "os_type")
//!     .post_only("os_type")
//!     .build()?;
//!
//! let desired = igroup.desired([
//!     ("name", json!("web")),
//!     ("svm", json!("vs0")),
//!     ("os_type", json!("linux")),
//! ])?;
//!
//! let transport = HttpTransport::new("https://cluster.example.com");
//! let outcome = Reconciler::new(&transport, &igroup, &desired).reconcile(Action::Configure)?;
//! println!("igroup {outcome}");
//! # Ok::<(), restkit::Error>(())
//! ```

pub mod change;
pub mod driver;
pub mod error;
pub mod hooks;
pub mod identity;
pub mod mapping;
pub mod merge;
pub mod path;
pub mod schema;
pub mod template;
pub mod transport;

pub use change::ChangeCalculator;
pub use driver::{Action, Outcome, PlannedChange, Reconciler, Snapshot};
pub use error::{Error, ErrorCategory, Result};
pub use hooks::{DefaultHooks, EnvelopeHooks, ResponseHooks};
pub use identity::{IdentityMap, SelectionMode};
pub use mapping::{ConverterRegistry, FnConverter, PropertyConverter, PropertyMapper};
pub use schema::{MappingInstruction, PropertySpec, ResourceInstance, ResourceType, ResourceTypeBuilder};
pub use template::UriTemplate;
pub use transport::{HttpTransport, Method, Response, Transport, TransportError};
