use tracing::debug;

use crate::env::{GoEnv, SourceResolver, SourceSet};
use crate::error::Error;
use crate::file::FileBuilder;
use crate::model::Package;

/// Builds the [`Package`] model of every member file of an import path.
#[derive(Debug)]
pub struct PackageBuilder {
    import_path: String,
    sources: SourceSet,
}

impl PackageBuilder {
    /// Resolves `import_path` in the environment's Go workspace.
    pub fn new(import_path: &str) -> Result<Self, Error> {
        Self::with_resolver(import_path, &GoEnv::from_env())
    }

    pub fn with_resolver<R>(import_path: &str, resolver: &R) -> Result<Self, Error>
    where
        R: SourceResolver + ?Sized,
    {
        let sources = resolver.resolve(import_path)?;
        Ok(Self {
            import_path: import_path.to_owned(),
            sources,
        })
    }

    pub fn import_path(&self) -> &str {
        &self.import_path
    }

    pub fn sources(&self) -> &SourceSet {
        &self.sources
    }

    /// Builds each member file in listing order. The first file that fails
    /// to read, parse or classify aborts the build.
    pub fn build(self) -> Result<Package, Error> {
        let mut files = Vec::with_capacity(self.sources.files.len());
        for name in self.sources.files.iter().filter(|n| n.ends_with(".go")) {
            let path = self.sources.dir.join(name);
            let file = FileBuilder::new(&path)
                .and_then(FileBuilder::build)
                .map_err(|source| Error::Package {
                    import_path: self.import_path.clone(),
                    source: Box::new(source),
                })?;
            files.push(file);
        }

        debug!(import_path = %self.import_path, files = files.len(), "introspected package");
        Ok(Package { files })
    }
}
