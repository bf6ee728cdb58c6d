//! Structural introspection of Go source files.
//!
//! Struct and interface declarations are read from the syntax tree produced
//! by `go_syntax` and converted into a small serializable model:
//!
//! - [`FileBuilder`] models one file,
//! - [`PackageBuilder`] resolves an import path and models each member file.
//!
//! Only bare named types, function types and channel types are modelled.
//! Any other field shape stops the build with an [`Error`].

pub mod classify;
pub mod env;
pub mod error;
pub mod file;
pub mod model;
pub mod package;
mod walker;

pub use env::{BuildConfig, GoEnv, SourceResolver, SourceSet};
pub use error::{ClassifyError, Error, ResolveError, TypeShape};
pub use file::FileBuilder;
pub use model::{ChanDir, Field, FieldList, File, Func, Interface, Package, Struct};
pub use package::PackageBuilder;
