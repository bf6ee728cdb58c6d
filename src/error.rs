use std::path::PathBuf;

use go_syntax::ast::Span;
use thiserror::Error;

/// Type shapes the model has no variant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeShape {
    Pointer,
    Array,
    Slice,
    Map,
    Struct,
    Interface,
    Qualified,
    Instantiated,
    Paren,
    Variadic,
    Union,
}

impl std::fmt::Display for TypeShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TypeShape::Pointer => "pointer type",
            TypeShape::Array => "array type",
            TypeShape::Slice => "slice type",
            TypeShape::Map => "map type",
            TypeShape::Struct => "inline struct type",
            TypeShape::Interface => "inline interface type",
            TypeShape::Qualified => "qualified identifier",
            TypeShape::Instantiated => "generic instantiation",
            TypeShape::Paren => "parenthesized type",
            TypeShape::Variadic => "variadic parameter",
            TypeShape::Union => "type union or approximation",
        })
    }
}

/// Why a single field, parameter or result could not be modelled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    #[error("unsupported field type: {shape}")]
    UnsupportedType { shape: TypeShape, span: Span },
    #[error("field declares multiple identifiers: {}", .names.join(", "))]
    MultipleIdentifiers { names: Vec<String>, span: Span },
}

impl ClassifyError {
    pub fn span(&self) -> Span {
        match self {
            ClassifyError::UnsupportedType { span, .. }
            | ClassifyError::MultipleIdentifiers { span, .. } => *span,
        }
    }
}

/// Import path resolution failures.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("cannot find package {import_path:?} in any of: {}", display_dirs(.searched))]
    NotFound {
        import_path: String,
        searched: Vec<PathBuf>,
    },
    #[error("no buildable Go source files in {}", .dir.display())]
    NoGoFiles { dir: PathBuf },
    #[error("cannot read {}: {source}", .dir.display())]
    ReadDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn display_dirs(dirs: &[PathBuf]) -> String {
    let dirs: Vec<_> = dirs.iter().map(|d| d.display().to_string()).collect();
    dirs.join(", ")
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}:{column}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: u32,
        column: u32,
        message: String,
        #[source]
        source: go_syntax::ParseFailure,
    },

    #[error("{}:{line}:{column}: in declaration of {decl}: {source}", .path.display())]
    Classify {
        path: PathBuf,
        decl: String,
        line: u32,
        column: u32,
        #[source]
        source: ClassifyError,
    },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("package {import_path}: {source}")]
    Package {
        import_path: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// The classification failure behind this error, if any.
    pub fn classify_error(&self) -> Option<&ClassifyError> {
        match self {
            Error::Classify { source, .. } => Some(source),
            Error::Package { source, .. } => source.classify_error(),
            _ => None,
        }
    }

    /// The file the failure happened in, when one is known.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Error::Io { path, .. } | Error::Parse { path, .. } | Error::Classify { path, .. } => {
                Some(path)
            }
            Error::Package { source, .. } => source.path(),
            Error::Resolve(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_error_is_found_through_package_wrapper() {
        let inner = Error::Classify {
            path: "a.go".into(),
            decl: "S".into(),
            line: 3,
            column: 2,
            source: ClassifyError::UnsupportedType {
                shape: TypeShape::Map,
                span: Span::new(10, 24),
            },
        };
        assert_eq!(
            inner.to_string(),
            "a.go:3:2: in declaration of S: unsupported field type: map type"
        );

        let err = Error::Package {
            import_path: "example.com/p".into(),
            source: Box::new(inner),
        };
        assert!(matches!(
            err.classify_error(),
            Some(ClassifyError::UnsupportedType {
                shape: TypeShape::Map,
                ..
            })
        ));
        assert_eq!(err.path(), Some(std::path::Path::new("a.go")));
    }
}
