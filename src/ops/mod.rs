//! High-level operations driven by the command line.

pub mod fetch;
pub mod lock;
pub mod resolve;

pub use fetch::{download_components, reclaim_cache};
pub use lock::{Lockfile, LOCK_FILENAME};
pub use resolve::{is_solve_required, load_requirements, resolve_project};
