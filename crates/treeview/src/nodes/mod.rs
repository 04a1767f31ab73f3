//! Generic node variants.
//!
//! Format-specific nodes live with their formats. These are the few every
//! tree needs: error placeholders, an empty root, static branches, and
//! plain filesystem entries.

mod branch;
mod empty;
mod error;
mod file;

pub use branch::BranchDataNode;
pub use empty::EmptyDataNode;
pub use error::ErrorDataNode;
pub use file::{DirectoryDataNode, FileDataNode, PATH_DATA};
