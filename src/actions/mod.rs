//! File actions module.
//!
//! Currently a single action: removing duplicate candidate files, either to
//! the system trash (default, recoverable) or permanently.
//!
//! ```no_run
//! use refdupe::actions::delete::delete_to_trash;
//! use std::path::Path;
//!
//! let result = delete_to_trash(Path::new("/recovered/copy.jpg"));
//! ```

pub mod delete;

pub use delete::{
    delete_duplicates, delete_to_trash, delete_verified, ensure_inside, ensure_unprotected,
    permanent_delete, BatchDeleteResult, DeleteConfig, DeleteError, DeleteResult,
};
