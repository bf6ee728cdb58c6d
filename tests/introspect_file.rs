use std::path::{Path, PathBuf};

use go_introspect::{ChanDir, ClassifyError, Error, Field, FileBuilder, Func, TypeShape};

fn testdata(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/testdata").join(name)
}

fn named(name: &str, type_name: &str) -> Field {
    Field::Named {
        name: name.into(),
        type_name: type_name.into(),
    }
}

fn build_src(src: &str) -> Result<go_introspect::File, Error> {
    FileBuilder::from_source("snippet.go", src)?.build()
}

#[test]
fn struct_only_file() {
    let path = testdata("structs.go");
    let file = FileBuilder::new(&path).unwrap().build().unwrap();

    assert_eq!(file.name, path.to_string_lossy());
    assert!(file.interfaces.is_empty());
    let names: Vec<_> = file.structs.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Point", "Named", "Empty"]);

    assert_eq!(
        file.structs[0].fields.as_slice(),
        [named("X", "int"), named("Y", "int")]
    );
    assert_eq!(
        file.structs[1].fields.as_slice(),
        [named("Name", "string"), named("Label", "string"), named("", "Stringer")]
    );
    assert!(file.structs[2].fields.is_empty());
}

#[test]
fn interface_methods_become_funcs() {
    let file = FileBuilder::new(testdata("service.go")).unwrap().build().unwrap();

    let service = file.find_interface("Service").unwrap();
    assert_eq!(service.methods.len(), 4);
    assert!(service.methods.iter().all(|m| matches!(m, Field::Func(_))));

    let Field::Func(events) = &service.methods[2] else {
        unreachable!()
    };
    assert_eq!(events.name, "Events");
    assert_eq!(events.params.as_slice(), [named("filter", "string")]);
    assert_eq!(
        events.results.as_slice(),
        [named("ch", "Stream"), named("err", "error")]
    );

    let closer = file.find_interface("Closer").unwrap();
    assert_eq!(closer.methods[0], named("", "Service"));
    assert!(matches!(&closer.methods[1], Field::Func(f) if f.name == "Close"));
}

#[test]
fn channel_fields_keep_direction() {
    let file = FileBuilder::new(testdata("service.go")).unwrap().build().unwrap();
    let request = file.find_struct("Request").unwrap();

    assert_eq!(
        request.fields[1],
        Field::Chan {
            dir: ChanDir::Send,
            elem: Box::new(named("", "bool")),
        }
    );
    assert_eq!(
        request.fields[2],
        Field::Chan {
            dir: ChanDir::Recv,
            elem: Box::new(named("", "Event")),
        }
    );
    assert_eq!(
        request.fields[4],
        Field::Chan {
            dir: ChanDir::Both,
            elem: Box::new(named("", "int")),
        }
    );
}

#[test]
fn deeply_nested_channel_is_a_parse_error() {
    let src = format!(
        "package p\ntype S struct {{ C {}int }}\n",
        "chan ".repeat(5_000)
    );
    let err = build_src(&src).unwrap_err();
    let Error::Parse { message, .. } = &err else {
        panic!("expected parse error, got {err:?}");
    };
    assert!(message.contains("nesting depth"), "{message}");

    let src = format!(
        "package p\ntype S struct {{ C {}int }}\n",
        "chan ".repeat(100)
    );
    let file = build_src(&src).unwrap();
    let mut field = &file.structs[0].fields[0];
    let mut levels = 0;
    while let Field::Chan { dir, elem } = field {
        assert_eq!(*dir, ChanDir::Both);
        field = elem;
        levels += 1;
    }
    assert_eq!(levels, 100);
    assert_eq!(*field, named("", "int"));
}

#[test]
fn unnamed_parameter() {
    let file = build_src("package p\ntype S struct { F func(int) }\n").unwrap();
    let Field::Func(f) = &file.structs[0].fields[0] else {
        panic!("expected func field");
    };
    assert_eq!(f.params.as_slice(), [named("", "int")]);
    assert!(f.results.is_empty());
}

#[test]
fn grouped_names_fail() {
    let err = build_src("package p\ntype S struct { A, B int }\n").unwrap_err();
    let Some(ClassifyError::MultipleIdentifiers { names, .. }) = err.classify_error() else {
        panic!("expected multiple identifiers, got {err:?}");
    };
    assert_eq!(names, &["A", "B"]);
}

#[test]
fn unsupported_shape_stops_the_walk() {
    let path = testdata("mixed.go");
    let err = FileBuilder::new(&path).unwrap().build().unwrap_err();
    assert!(matches!(
        err.classify_error(),
        Some(ClassifyError::UnsupportedType {
            shape: TypeShape::Map,
            ..
        })
    ));
    assert_eq!(err.path(), Some(path.as_path()));

    let (partial, err) = FileBuilder::new(&path).unwrap().build_partial();
    assert!(err.is_some());
    let names: Vec<_> = partial.structs.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["First", "Bad"]);
    assert!(partial.structs[1].fields.is_empty());
    assert!(partial.find_struct("Never").is_none());
}

#[test]
fn slice_field_is_unsupported() {
    let err = build_src("package p\ntype S struct { Items []T }\n").unwrap_err();
    assert!(matches!(
        err.classify_error(),
        Some(ClassifyError::UnsupportedType {
            shape: TypeShape::Slice,
            ..
        })
    ));
}

#[test]
fn end_to_end_model() {
    let src = "package p\n\ntype S struct { A int; F func(x int) bool }\n\ntype I interface { M(c chan<- string) }\n";
    let file = build_src(src).unwrap();

    assert_eq!(file.structs.len(), 1);
    assert_eq!(
        file.structs[0].fields.as_slice(),
        [
            named("A", "int"),
            Field::Func(Func {
                name: "F".into(),
                params: [named("x", "int")].into_iter().collect(),
                results: [named("", "bool")].into_iter().collect(),
            }),
        ]
    );

    assert_eq!(file.interfaces.len(), 1);
    assert_eq!(
        file.interfaces[0].methods.as_slice(),
        [Field::Func(Func {
            name: "M".into(),
            params: [Field::Chan {
                dir: ChanDir::Send,
                elem: Box::new(named("", "string")),
            }]
            .into_iter()
            .collect(),
            results: Default::default(),
        })]
    );
}

#[test]
fn rebuilding_is_idempotent() {
    let path = testdata("service.go");
    let first = FileBuilder::new(&path).unwrap().build().unwrap();
    let second = FileBuilder::new(&path).unwrap().build().unwrap();
    assert_eq!(first, second);
}

#[test]
fn local_and_generic_types_are_included() {
    let src = r#"
package p

type Box[T any] struct { V T }

type Alias = struct{ A int }

func f() {
    type local interface{ Run() }
}
"#;
    let file = build_src(src).unwrap();
    let structs: Vec<_> = file.structs.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(structs, ["Box", "Alias"]);
    assert_eq!(file.interfaces[0].name, "local");
}

#[test]
fn syntax_error_is_reported_with_position() {
    let err = build_src("package p\ntype S struct {\n").unwrap_err();
    let Error::Parse { line, .. } = err else {
        panic!("expected parse error, got {err:?}");
    };
    assert_eq!(line, 3);
}

#[test]
fn model_serializes_to_json() {
    let file = build_src("package p\ntype I interface { Stop() }\n").unwrap();
    let json = serde_json::to_value(&file).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "name": "snippet.go",
            "structs": [],
            "interfaces": [{
                "name": "I",
                "methods": [{ "kind": "func", "name": "Stop", "params": [], "results": [] }]
            }]
        })
    );
}
