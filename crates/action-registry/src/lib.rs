//! Action Registry & Invocation (§4.2): the mandatory browser action
//! catalog, its JSON-schema validation contract, and the intent events
//! every call emits on the way through.

pub mod actions;
pub mod registry;
pub mod types;

pub use registry::{default_registry, ActionRegistry};
pub use types::{get_index_arg, set_index_arg, validate_against_schema, Action, ActionError, ActionExecCtx};
