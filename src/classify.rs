//! Conversion of parsed fields, parameters and results into model fields.

use go_syntax::ast::{self, AstArena, FieldId, IdentName, Interner, ListRef, Results, SignatureId, Type, TypeId};

use crate::error::{ClassifyError, TypeShape};
use crate::model::{Field, FieldList, Func};

/// Maps syntax-tree field entries of one parsed file onto [`Field`]s.
#[derive(Clone, Copy)]
pub struct Classifier<'a> {
    arena: &'a AstArena,
    symbols: &'a Interner,
}

impl<'a> Classifier<'a> {
    pub fn new(arena: &'a AstArena, symbols: &'a Interner) -> Self {
        Self { arena, symbols }
    }

    /// Classifies one struct field, parameter or result entry.
    ///
    /// The entry's names are checked first: none gives an empty name, more
    /// than one is an error.
    pub fn entry(&self, id: FieldId) -> Result<Field, ClassifyError> {
        let entry = &self.arena.fields[id];
        let name = self.single_name(entry.names)?;
        if let Some(ellipsis) = entry.ellipsis_pos {
            return Err(ClassifyError::UnsupportedType {
                shape: TypeShape::Variadic,
                span: ellipsis.to(self.arena.types.span(entry.typ)),
            });
        }
        self.field(name, entry.typ)
    }

    /// Classifies every entry of a parenthesized list, in order.
    pub fn field_list(&self, list: &ast::FieldList) -> Result<FieldList, ClassifyError> {
        self.entries(list.fields)
    }

    pub fn entries(&self, ids: ListRef<FieldId>) -> Result<FieldList, ClassifyError> {
        self.arena
            .fields_list(ids)
            .iter()
            .map(|&id| self.entry(id))
            .collect()
    }

    /// Classifies the type `typ` of a member called `name`.
    pub fn field(&self, name: String, typ: TypeId) -> Result<Field, ClassifyError> {
        let shape = match self.arena.types[typ] {
            Type::Named {
                pkg: None,
                name: ident,
                args,
            } if args.is_empty() => {
                return Ok(Field::Named {
                    name,
                    type_name: self.symbols.resolve(ident.sym).to_owned(),
                });
            }
            Type::Func { sig, .. } => return Ok(Field::Func(self.func(name, sig)?)),
            Type::Chan { dir, elem, .. } => {
                let elem = self.field(String::new(), elem)?;
                return Ok(Field::Chan {
                    dir: dir.into(),
                    elem: Box::new(elem),
                });
            }

            Type::Named { pkg: Some(_), .. } => TypeShape::Qualified,
            Type::Named { .. } => TypeShape::Instantiated,
            Type::Pointer { .. } => TypeShape::Pointer,
            Type::Array { .. } => TypeShape::Array,
            Type::Slice { .. } => TypeShape::Slice,
            Type::Map { .. } => TypeShape::Map,
            Type::Struct { .. } => TypeShape::Struct,
            Type::Interface { .. } => TypeShape::Interface,
            Type::Paren { .. } => TypeShape::Paren,
            Type::Union { .. } => TypeShape::Union,
        };
        Err(ClassifyError::UnsupportedType {
            shape,
            span: self.arena.types.span(typ),
        })
    }

    /// Builds a [`Func`] from a signature. A single unparenthesized result
    /// becomes one unnamed result entry.
    pub fn func(&self, name: String, sig: SignatureId) -> Result<Func, ClassifyError> {
        let sig = &self.arena.signatures[sig];
        let params = self.field_list(&sig.params)?;
        let results = match sig.results {
            None => FieldList::new(),
            Some(Results::Params(list)) => self.field_list(&list)?,
            Some(Results::Type(typ)) => {
                let mut results = FieldList::new();
                results.push(self.field(String::new(), typ)?);
                results
            }
        };
        Ok(Func {
            name,
            params,
            results,
        })
    }

    pub fn name(&self, ident: IdentName) -> &'a str {
        self.symbols.resolve(ident.sym)
    }

    fn single_name(&self, names: ListRef<IdentName>) -> Result<String, ClassifyError> {
        match self.arena.ident_names(names) {
            [] => Ok(String::new()),
            [one] => Ok(self.name(*one).to_owned()),
            [first, .., last] => Err(ClassifyError::MultipleIdentifiers {
                names: self
                    .arena
                    .ident_names(names)
                    .iter()
                    .map(|n| self.name(*n).to_owned())
                    .collect(),
                span: first.pos.to(last.pos),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChanDir;
    use go_syntax::ast::{Spec, TopLevelDecl};
    use go_syntax::{parse_source, ParsedFile};

    /// Parses `type T struct { <fields> }` and returns the file plus the
    /// struct's field ids.
    fn parse_fields(fields: &str) -> (ParsedFile, ListRef<FieldId>) {
        let src = format!("package p\n\ntype T struct {{\n{fields}\n}}\n");
        let parsed = parse_source(&src).unwrap();
        let ids = {
            let TopLevelDecl::Decl(decl) = parsed.arena.top_decls(parsed.root.decls)[0] else {
                panic!("expected type decl");
            };
            let ast::Decl::Gen(gd) = parsed.arena.decls[decl];
            let Spec::Type(spec) = parsed.arena.specs_list(gd.specs)[0] else {
                panic!("expected type spec");
            };
            let Type::Struct { fields, .. } = parsed.arena.types[parsed.arena.type_specs[spec].typ]
            else {
                panic!("expected struct");
            };
            fields
        };
        (parsed, ids)
    }

    fn classify(fields: &str) -> Result<FieldList, ClassifyError> {
        let (parsed, ids) = parse_fields(fields);
        Classifier::new(&parsed.arena, &parsed.symbols).entries(ids)
    }

    fn named(name: &str, type_name: &str) -> Field {
        Field::Named {
            name: name.into(),
            type_name: type_name.into(),
        }
    }

    fn unsupported(fields: &str) -> TypeShape {
        match classify(fields) {
            Err(ClassifyError::UnsupportedType { shape, .. }) => shape,
            other => panic!("expected unsupported type, got {other:?}"),
        }
    }

    #[test]
    fn named_and_embedded_fields() {
        let fields = classify("A int\nStringer\nB string").unwrap();
        assert_eq!(
            fields.as_slice(),
            [named("A", "int"), named("", "Stringer"), named("B", "string")]
        );
    }

    #[test]
    fn func_field_with_results() {
        let fields = classify("F func(x int, string) (n int, err error)").unwrap();
        let Field::Func(f) = &fields[0] else {
            panic!("expected func");
        };
        assert_eq!(f.name, "F");
        assert_eq!(f.params.as_slice(), [named("x", "int"), named("", "string")]);
        assert_eq!(f.results.as_slice(), [named("n", "int"), named("err", "error")]);
    }

    #[test]
    fn single_result_is_unnamed_entry() {
        let fields = classify("F func() bool").unwrap();
        let Field::Func(f) = &fields[0] else {
            panic!("expected func");
        };
        assert!(f.params.is_empty());
        assert_eq!(f.results.as_slice(), [named("", "bool")]);
    }

    #[test]
    fn channel_keeps_direction_and_unnamed_element() {
        let fields =
            classify("C <-chan string\nD chan func()\nE chan int\nS chan<- bool").unwrap();
        assert_eq!(
            fields[0],
            Field::Chan {
                dir: ChanDir::Recv,
                elem: Box::new(named("", "string")),
            }
        );
        let Field::Chan { dir: ChanDir::Both, elem } = &fields[1] else {
            panic!("expected bidirectional chan");
        };
        assert!(matches!(**elem, Field::Func(ref f) if f.name.is_empty()));
        assert_eq!(
            fields[2],
            Field::Chan {
                dir: ChanDir::Both,
                elem: Box::new(named("", "int")),
            }
        );
        assert_eq!(
            fields[3],
            Field::Chan {
                dir: ChanDir::Send,
                elem: Box::new(named("", "bool")),
            }
        );
    }

    #[test]
    fn multiple_identifiers_are_rejected() {
        let err = classify("A, B int").unwrap_err();
        let ClassifyError::MultipleIdentifiers { names, span } = err else {
            panic!("expected multiple identifiers");
        };
        assert_eq!(names, ["A", "B"]);
        assert!(span.len() >= 4);
    }

    #[test]
    fn names_are_checked_before_shape() {
        assert!(matches!(
            classify("A, B map[string]int"),
            Err(ClassifyError::MultipleIdentifiers { .. })
        ));
    }

    #[test]
    fn grouped_parameters_are_rejected() {
        assert!(matches!(
            classify("F func(a, b int)"),
            Err(ClassifyError::MultipleIdentifiers { .. })
        ));
    }

    #[test]
    fn unsupported_shapes() {
        assert_eq!(unsupported("P *int"), TypeShape::Pointer);
        assert_eq!(unsupported("A [3]int"), TypeShape::Array);
        assert_eq!(unsupported("S []int"), TypeShape::Slice);
        assert_eq!(unsupported("M map[string]int"), TypeShape::Map);
        assert_eq!(unsupported("X struct{}"), TypeShape::Struct);
        assert_eq!(unsupported("Y interface{}"), TypeShape::Interface);
        assert_eq!(unsupported("R io.Reader"), TypeShape::Qualified);
        assert_eq!(unsupported("L List[int]"), TypeShape::Instantiated);
        assert_eq!(unsupported("Q (int)"), TypeShape::Paren);
        assert_eq!(unsupported("*Embedded"), TypeShape::Pointer);
        assert_eq!(unsupported("F func(xs ...int)"), TypeShape::Variadic);
        assert_eq!(unsupported("C chan []byte"), TypeShape::Slice);
        assert_eq!(unsupported("G func() (int, *T)"), TypeShape::Pointer);
    }

    #[test]
    fn unsupported_span_covers_the_type() {
        let (parsed, ids) = parse_fields("M map[string]int");
        let err = Classifier::new(&parsed.arena, &parsed.symbols)
            .entries(ids)
            .unwrap_err();
        assert_eq!(err.span().len(), "map[string]int".len() as u32);
    }
}
