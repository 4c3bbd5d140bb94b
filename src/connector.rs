//! Connector Layer
//!
//! Pluggable backend contract and the registry binding configured backend
//! types to concrete implementations. A connector performs two duties:
//! discovery (`refresh`, pushing records into an origin's ingestion channel)
//! and query execution (`plots`). The catalog never inspects backend-specific
//! query syntax; it only relies on the producer semantics of the record sink
//! and the pass/fail outcome of a refresh.

mod registry;
mod traits;

pub use registry::{BackendHandler, BackendRegistry};
pub use traits::{Connector, ConnectorError, ConnectorRef};
