use go_introspect::{Error, FileBuilder};
use walkdir::WalkDir;

/// Parses and introspects every `.go` file under `$GO_INTROSPECT_CORPUS`
/// (for example a Go checkout's `src/`). Syntax errors fail the test;
/// unsupported declarations are expected and only counted.
#[test]
fn introspects_go_corpus_if_configured() {
    let Some(root) = std::env::var_os("GO_INTROSPECT_CORPUS") else {
        eprintln!("GO_INTROSPECT_CORPUS not set; skipping corpus test");
        return;
    };

    let mut total = 0usize;
    let mut modelled = 0usize;
    let mut unsupported = 0usize;

    for entry in WalkDir::new(&root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("go") {
            continue;
        }
        // testdata holds deliberately broken sources.
        if path.components().any(|c| c.as_os_str() == "testdata") {
            continue;
        }

        total += 1;
        let builder = match FileBuilder::new(path) {
            Ok(b) => b,
            Err(Error::Io { .. }) => continue,
            Err(err) => panic!("corpus parse failed after {total} files: {err}"),
        };
        match builder.build() {
            Ok(_) => modelled += 1,
            Err(err) if err.classify_error().is_some() => unsupported += 1,
            Err(err) => panic!("unexpected failure: {err}"),
        }
    }

    eprintln!("{total} files: {modelled} modelled, {unsupported} with unsupported declarations");
}
