//! Writing entities back to the server.
//!
//! Every entity type carries a table of [`FieldSpec`]s. The synchronizer walks that table and
//! issues one `modify_*` call per updatable field, in a deterministic order.

mod fields;
mod synchronizer;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use fields::*;
pub use synchronizer::*;
