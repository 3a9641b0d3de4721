// lepasserelle - Command-line front end
//
// *La Passerelle* (The Bridge) - Connects the operator to the rotation search and the gcode analyzer

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Batch slicing over a folder of parts
pub mod batch;
/// Command-line interface
pub mod cli;

pub use batch::{
    discover_parts, is_part, plan_gcode_names, run_batch, BatchSummary, FailedPart, SlicedPart,
};
pub use cli::{resolve_config, Cli, Commands};
