//! Import path resolution against a Go build environment.
//!
//! [`GoEnv`] locates a package directory the way the `go` tool does for
//! GOPATH and module layouts and selects its buildable files by name.
//! Build constraint comments (`//go:build`) are not evaluated.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ResolveError;

/// A package directory and its member file names, in build order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSet {
    pub dir: PathBuf,
    pub files: Vec<String>,
}

/// Maps an import path to the source files of a package.
pub trait SourceResolver {
    fn resolve(&self, import_path: &str) -> Result<SourceSet, ResolveError>;
}

/// Inputs of import resolution, normally taken from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub goroot: Option<PathBuf>,
    pub gopath: Vec<PathBuf>,
    pub goos: String,
    pub goarch: String,
    /// Base for relative import paths and the `go.mod` lookup.
    pub cwd: PathBuf,
}

impl BuildConfig {
    /// Reads `GOROOT`, `GOPATH`, `GOOS` and `GOARCH`. An unset `GOPATH`
    /// defaults to `$HOME/go`; unset `GOOS`/`GOARCH` default to the host.
    pub fn from_env() -> Self {
        let var = |key: &str| std::env::var_os(key).filter(|v| !v.is_empty());

        let gopath = match var("GOPATH") {
            Some(paths) => std::env::split_paths(&paths).collect(),
            None => var("HOME")
                .or_else(|| var("USERPROFILE"))
                .map(|home| vec![PathBuf::from(home).join("go")])
                .unwrap_or_default(),
        };
        let string_var = |key: &str, default: &str| {
            var(key)
                .and_then(|v| v.into_string().ok())
                .unwrap_or_else(|| default.to_owned())
        };

        Self {
            goroot: var("GOROOT").map(PathBuf::from),
            gopath,
            goos: string_var("GOOS", host_goos()),
            goarch: string_var("GOARCH", host_goarch()),
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

fn host_goos() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        os => os,
    }
}

fn host_goarch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc" => "ppc",
        "powerpc64" => "ppc64",
        "loongarch64" => "loong64",
        "wasm32" => "wasm",
        arch => arch,
    }
}

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips", "mipsle",
    "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le", "riscv",
    "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

/// Resolver backed by a [`BuildConfig`].
#[derive(Debug, Clone)]
pub struct GoEnv {
    config: BuildConfig,
}

impl GoEnv {
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(BuildConfig::from_env())
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Directories that may hold `import_path`, in lookup order.
    pub fn candidate_dirs(&self, import_path: &str) -> Vec<PathBuf> {
        if is_local_import(import_path) {
            return vec![self.config.cwd.join(import_path)];
        }

        let mut dirs = Vec::new();
        if let Some((root, module)) = find_module(&self.config.cwd) {
            if let Some(rest) = strip_module_prefix(import_path, &module) {
                dirs.push(root.join(rest));
            }
        }
        if let Some(goroot) = &self.config.goroot {
            dirs.push(goroot.join("src").join(import_path));
        }
        for gopath in &self.config.gopath {
            dirs.push(gopath.join("src").join(import_path));
        }
        dirs
    }

    /// Buildable Go files in `dir`, sorted by name.
    pub fn go_files(&self, dir: &Path) -> Result<Vec<String>, ResolveError> {
        let read_err = |source| ResolveError::ReadDir {
            dir: dir.to_path_buf(),
            source,
        };

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(read_err)? {
            let entry = entry.map_err(read_err)?;
            if !entry.file_type().map_err(read_err)?.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if self.matches_target(&name) {
                files.push(name);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Whether `file_name` is a non-test Go file built for the configured
    /// GOOS/GOARCH, judged by its `_GOOS`, `_GOARCH` or `_GOOS_GOARCH`
    /// suffix.
    pub fn matches_target(&self, file_name: &str) -> bool {
        let Some(stem) = file_name.strip_suffix(".go") else {
            return false;
        };
        if file_name.starts_with('_') || file_name.starts_with('.') || stem.ends_with("_test") {
            return false;
        }

        // Everything before the first `_` is ignored.
        let Some(i) = stem.find('_') else {
            return true;
        };
        let tags: Vec<&str> = stem[i + 1..].split('_').collect();
        let os = |t: &str| KNOWN_OS.iter().any(|k| *k == t);
        let arch = |t: &str| KNOWN_ARCH.iter().any(|k| *k == t);

        match tags[..] {
            [.., o, a] if os(o) && arch(a) => self.match_os(o) && a == self.config.goarch,
            [.., t] if os(t) => self.match_os(t),
            [.., t] if arch(t) => t == self.config.goarch,
            _ => true,
        }
    }

    fn match_os(&self, tag: &str) -> bool {
        let goos = self.config.goos.as_str();
        tag == goos
            || (tag == "linux" && goos == "android")
            || (tag == "solaris" && goos == "illumos")
            || (tag == "darwin" && goos == "ios")
    }
}

impl SourceResolver for GoEnv {
    fn resolve(&self, import_path: &str) -> Result<SourceSet, ResolveError> {
        let mut searched = self.candidate_dirs(import_path);
        let Some(found) = searched.iter().position(|d| d.is_dir()) else {
            return Err(ResolveError::NotFound {
                import_path: import_path.to_owned(),
                searched,
            });
        };
        let dir = searched.swap_remove(found);

        let files = self.go_files(&dir)?;
        if files.is_empty() {
            return Err(ResolveError::NoGoFiles { dir });
        }
        debug!(import_path, dir = %dir.display(), files = files.len(), "resolved package");
        Ok(SourceSet { dir, files })
    }
}

fn is_local_import(path: &str) -> bool {
    path == "."
        || path == ".."
        || path.starts_with("./")
        || path.starts_with("../")
        || Path::new(path).is_absolute()
}

fn strip_module_prefix<'p>(import_path: &'p str, module: &str) -> Option<&'p str> {
    match import_path.strip_prefix(module)? {
        "" => Some("."),
        rest => rest.strip_prefix('/'),
    }
}

/// The nearest `go.mod` at or above `dir`: its directory and module path.
fn find_module(dir: &Path) -> Option<(PathBuf, String)> {
    dir.ancestors().find_map(|d| {
        let text = std::fs::read_to_string(d.join("go.mod")).ok()?;
        let module = module_path(&text)?;
        Some((d.to_path_buf(), module.to_owned()))
    })
}

/// Extracts the path from the `module` directive of a `go.mod` file.
fn module_path(go_mod: &str) -> Option<&str> {
    go_mod.lines().find_map(|line| {
        let line = line.split("//").next()?.trim();
        let rest = line.strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) && !rest.starts_with('"') {
            return None;
        }
        let path = rest.trim().trim_matches(|c: char| c == '"' || c == '`');
        (!path.is_empty()).then_some(path)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(goos: &str, goarch: &str) -> GoEnv {
        GoEnv::new(BuildConfig {
            goroot: None,
            gopath: Vec::new(),
            goos: goos.into(),
            goarch: goarch.into(),
            cwd: PathBuf::from("/nonexistent"),
        })
    }

    #[test]
    fn file_name_filters() {
        let env = env("linux", "amd64");
        for name in ["a.go", "b_linux.go", "c_amd64.go", "d_linux_amd64.go", "foo_bar.go"] {
            assert!(env.matches_target(name), "{name}");
        }
        for name in [
            "a_test.go",
            "b_linux_test.go",
            "_x.go",
            ".y.go",
            "z.c",
            "w_windows.go",
            "v_arm64.go",
            "u_darwin_amd64.go",
            "t_linux_arm.go",
        ] {
            assert!(!env.matches_target(name), "{name}");
        }
    }

    #[test]
    fn android_builds_linux_files() {
        let env = env("android", "arm64");
        assert!(env.matches_target("x_linux.go"));
        assert!(env.matches_target("x_android_arm64.go"));
        assert!(!env.matches_target("x_linux_amd64.go"));
    }

    #[test]
    fn go_file_only_os_name_is_not_a_constraint() {
        // The part before the first underscore is the file's own name.
        assert!(env("linux", "amd64").matches_target("windows.go"));
    }

    #[test]
    fn parses_module_directive() {
        assert_eq!(module_path("// c\nmodule example.com/m\n\ngo 1.22\n"), Some("example.com/m"));
        assert_eq!(module_path("module \"example.com/q\" // quoted\n"), Some("example.com/q"));
        assert_eq!(module_path("modulex foo\n"), None);
    }

    #[test]
    fn module_prefix_matching() {
        assert_eq!(strip_module_prefix("example.com/m", "example.com/m"), Some("."));
        assert_eq!(strip_module_prefix("example.com/m/sub/x", "example.com/m"), Some("sub/x"));
        assert_eq!(strip_module_prefix("example.com/mod", "example.com/m"), None);
    }

    #[test]
    fn local_imports_resolve_against_cwd_only() {
        let env = env("linux", "amd64");
        assert_eq!(env.candidate_dirs("./pkg"), vec![PathBuf::from("/nonexistent/./pkg")]);
    }
}
