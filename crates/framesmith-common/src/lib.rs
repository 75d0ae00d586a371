//! Framesmith-Common: shared errors and filesystem helpers.
//!
//! - **Error Handling**: location-level and filesystem error types
//! - **Path Utilities**: extension normalisation and matching, staged output naming
//! - **File Moves**: rename with a copy fallback, directory creation on demand
//!
//! # Examples
//!
//! ```
//! use framesmith_common::paths::{has_extension, output_file_name};
//! use std::path::Path;
//!
//! assert!(has_extension(Path::new("movie.MKV"), &["mkv".to_string()]));
//! assert_eq!(output_file_name(Path::new("movie.avi"), "720p", "mp4"), "movie.720p.mp4");
//! ```

pub mod error;
pub mod fs;
pub mod paths;

pub use error::{Error, Result};
