//! `BrowserState` snapshot model and the `BrowserContext`/`Page` adapter
//! interface the execution core consumes from the surrounding browser
//! runtime (§4.1, §6). No transport or live browser is implemented here;
//! [`fake`] provides an in-memory double used by the rest of the core's
//! test suites.

pub mod context;
pub mod errors;
pub mod fake;
pub mod snapshot;

pub use context::{BrowserContext, Page, ScrollDirection, ScrollTarget};
pub use errors::BrowserContextError;
pub use snapshot::{BrowserState, DOMElementNode, ScrollPosition};
