//! Command-line interface for `cobblerctl`.

mod args;
mod commands;
mod styles;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use args::*;
pub use commands::*;
pub use styles::*;
