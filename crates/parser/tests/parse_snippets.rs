use go_syntax::parse_source;

fn assert_parses(src: &str) {
    if let Err(f) = parse_source(src) {
        panic!("expected parse ok, got diagnostics: {:#?}", f.diags);
    }
}

#[test]
fn parses_imports_and_decls() {
    assert_parses(
        r#"
package main

import (
    "fmt"
    . "math"
    _ "net/http"
)

const (
    A = 1
    B int = 2
)

var (
    x = 1
    y, z int
)

type (
    T = int
    U[T any] struct { F T }
    V interface {
        M(x int) int
        ~int | ~string
    }
)

func main() {
    fmt.Println(Sqrt(4))
}
"#,
    );
}

#[test]
fn parses_statements() {
    assert_parses(
        r#"
package p

func f(x int) int {
    if x < 0 { return -x }
    for i := 0; i < 10; i++ {
        if i == 5 { break }
        continue
    }
    for range []int{1,2,3} {
    }
    switch x {
    case 0, 1:
        x++
    default:
        x = 3
    }
    select {
    case ch <- x:
        return x
    default:
        return 0
    }
}
"#,
    );
}

#[test]
fn parses_expressions() {
    assert_parses(
        r#"
package p

func f(a, b, c int, ch chan<- int) {
    _ = a + b*c - (a<<2)
    _ = a == b || a < c && b <= c
    _ = &a
    _ = <-ch
    _ = []int{1,2,3}[0]
    _ = []int{1,2,3}[1:]
    _ = []int{1,2,3}[:2]
    _ = []int{1,2,3}[0:2:3]
    _ = map[string]int{"a":1, "b":2}["a"]
    _ = f(a, b, c)
    _ = f(a, b, c...)
}
"#,
    );
}

#[test]
fn parses_type_grammar() {
    assert_parses(
        r#"
package p

type T struct {
    A, B int
    C    [4]*byte `json:"c"`
    D    map[string][]chan<- func(int, ...string) (bool, error)
    E    <-chan <-chan int
    io.Reader
    *Embedded
    List[int]
    F    struct{ X interface{ ~int | ~uint; String() string } }
}

type (
    Number interface{ ~int | ~int64 | float64 }
    Pair[K comparable, V any] struct{ Key K; Val V }
    Alias = Pair[string, int]
    Arr [N * 2]int
    Fn func(a, b int) (sum int)
)

func (p *Pair[K, V]) Swap() (V, K) { return p.Val, p.Key }

func Map[T, U any](xs []T, f func(T) U) []U {
    type result struct{ out []U }
    var r result
    for _, x := range xs {
        r.out = append(r.out, f(x))
    }
    return r.out
}

func asm(x int) int
"#,
    );
}

#[test]
fn collects_local_type_decls() {
    let src = r#"
package p

var handler = func() {
    type local struct{ A int }
}

func f() {
    if true {
        type inner interface{ M() }
    }
    switch v := any(1).(type) {
    case int:
        _ = v
    }
}
"#;
    let file = parse_source(src).expect("parses");
    let mut names = Vec::new();
    collect_type_names(&file, &mut names);
    assert_eq!(names, ["local", "inner"]);
}

fn collect_type_names(file: &go_syntax::ParsedFile, out: &mut Vec<String>) {
    use go_syntax::ast::{AstArena, TypeSpecId};
    use go_syntax::walk::Visitor;

    struct Names<'f> {
        file: &'f go_syntax::ParsedFile,
        out: &'f mut Vec<String>,
    }

    impl<'a> Visitor<'a> for Names<'_> {
        fn visit_type_spec(&mut self, a: &'a AstArena, id: TypeSpecId) {
            let name = a.type_specs[id].name.sym;
            self.out.push(self.file.resolve(name).to_string());
        }
    }

    file.accept(&mut Names { file, out });
}

#[test]
fn reports_first_syntax_error() {
    let err = parse_source("package p\n\ntype T struct {\n    A int\n    B\n    C int int\n}\n")
        .expect_err("should fail");
    assert_eq!(err.diags.len(), 1);
    let d = err.primary().expect("primary diag");
    assert_eq!(d.kind, go_syntax::error::DiagKind::Parse);
    let at = &"package p\n\ntype T struct {\n    A int\n    B\n    C int int\n}\n"[d.span.start as usize..];
    assert!(at.starts_with("int\n}"), "error at {at:?}: {}", d.message);
}

#[test]
fn rejects_missing_package_clause() {
    let err = parse_source("type T int\n").expect_err("should fail");
    assert!(err.diags[0].message.contains("`package`"), "{}", err.diags[0].message);
}

#[test]
fn rejects_late_imports() {
    let err = parse_source("package p\nvar x int\nimport \"fmt\"\n").expect_err("should fail");
    assert!(err.diags[0].message.contains("imports"), "{}", err.diags[0].message);
}

fn nested_field(open: &str, inner: &str, close: &str, depth: usize) -> String {
    format!(
        "package p\n\ntype S struct {{ C {}{}{} }}\n",
        open.repeat(depth),
        inner,
        close.repeat(depth)
    )
}

#[test]
fn deep_nesting_is_a_parse_error() {
    let err = parse_source(&nested_field("(", "int", ")", 100_000)).expect_err("should fail");
    assert_eq!(err.diags.len(), 1);
    assert!(
        err.diags[0].message.contains("nesting depth"),
        "{}",
        err.diags[0].message
    );

    let err = parse_source(&nested_field("chan ", "int", "", 50_000)).expect_err("should fail");
    assert!(err.diags[0].message.contains("nesting depth"));
}

#[test]
fn nesting_below_the_limit_parses() {
    let depth = go_syntax::parser::MAX_NEST_DEPTH as usize - 8;
    assert_parses(&nested_field("(", "int", ")", depth));
    assert_parses(&nested_field("*", "T", "", depth));
}

#[test]
fn deep_nesting_under_backtracking_fails_fast() {
    // Each level goes through the `name [` lookahead in parameter lists.
    let src = nested_field("func(a []", "int", ")", 10_000);
    let err = parse_source(&src).expect_err("should fail");
    assert!(err.diags[0].message.contains("nesting depth"));
}
