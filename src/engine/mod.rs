//! The edit engine: the only component with externally visible contracts.
//!
//! `read_range`/`read_multi` are pure loads; `run_patch` is the central write
//! operation, and `insert`/`delete`/`append`/`create` are sugar that funnel
//! through `run_patch`'s single apply path so line-splitting and
//! trailing-terminator semantics never diverge between entry points.

mod create;
mod patch;
mod read;

pub use create::create;
pub use patch::{append, delete, insert, run_patch, Patch, PatchOutcome};
pub use read::{read_multi, read_range, MultiFileRead, RangeRequest, RangeRead};
