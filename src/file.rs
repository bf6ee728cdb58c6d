use std::path::{Path, PathBuf};

use go_syntax::error::line_col;
use go_syntax::{parse_source, ParsedFile};
use tracing::debug;

use crate::classify::Classifier;
use crate::error::Error;
use crate::model::File;
use crate::walker::{DeclWalker, WalkFailure};

/// Builds the [`File`] model of one parsed Go source file.
///
/// The builder is consumed by [`build`](Self::build), so each builder runs
/// exactly one walk.
#[derive(Debug)]
pub struct FileBuilder {
    path: PathBuf,
    source: String,
    parsed: ParsedFile,
}

impl FileBuilder {
    /// Reads and parses the file at `path`.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_source(path, source)
    }

    /// Parses `source` as the contents of `path` without touching the disk.
    pub fn from_source(path: impl AsRef<Path>, source: impl Into<String>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let source = source.into();

        let parsed = match parse_source(&source) {
            Ok(parsed) => parsed,
            Err(failure) => {
                let (offset, message) = match failure.primary() {
                    Some(d) => (d.span.start, d.message.clone()),
                    None => (0, failure.to_string()),
                };
                let (line, column) = line_col(&source, offset);
                return Err(Error::Parse {
                    path,
                    line,
                    column,
                    message,
                    source: failure,
                });
            }
        };

        Ok(Self {
            path,
            source,
            parsed,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Go package name from the package clause.
    pub fn package_name(&self) -> &str {
        self.parsed.package_name()
    }

    /// Walks the file and returns its model, or the first failure.
    pub fn build(self) -> Result<File, Error> {
        match self.build_partial() {
            (file, None) => Ok(file),
            (_, Some(err)) => Err(err),
        }
    }

    /// Like [`build`](Self::build) but also returns what was collected
    /// before a failure. The partial model ends with the declaration that
    /// failed.
    pub fn build_partial(self) -> (File, Option<Error>) {
        let classifier = Classifier::new(&self.parsed.arena, &self.parsed.symbols);
        let mut walker = DeclWalker::new(classifier, File::new(self.path.to_string_lossy()));
        self.parsed.accept(&mut walker);
        let (file, failure) = walker.finish();

        debug!(
            path = %self.path.display(),
            structs = file.structs.len(),
            interfaces = file.interfaces.len(),
            failed = failure.is_some(),
            "introspected file"
        );

        let err = failure.map(|WalkFailure { decl, error }| {
            let (line, column) = line_col(&self.source, error.span().start);
            Error::Classify {
                path: self.path.clone(),
                decl,
                line,
                column,
                source: error,
            }
        });
        (file, err)
    }
}
