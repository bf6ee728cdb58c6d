//! Traversal of the declaration-level AST.
//!
//! Only nodes that can lead to a type declaration get a hook: declarations,
//! function declarations, type specs, and the type expressions, fields and
//! signatures hanging off them. Statement and expression bodies are not in
//! the tree; a function body is a [`Skipped`] region whose `decls` list
//! holds the `type` declarations found inside it, and the walk visits those
//! through `visit_decl` like any top-level declaration.
//!
//! `Walk` impls for node structs come from `#[derive(WalkAst)]`; fields
//! marked `#[walk(skip)]` (positions, names, tags) are leaves.

use crate::ast::*;

pub trait Walk<'ast> {
    fn walk<V: Visitor<'ast> + ?Sized>(&self, a: &'ast AstArena, v: &mut V);
}

/// Pre-order hooks, in source order.
///
/// Each default descends into the node. An override that does not call
/// `walk` prunes that subtree; `visit_type` is the usual one to cut when
/// only declarations matter.
pub trait Visitor<'ast> {
    #[inline(always)]
    fn visit_source_file(&mut self, a: &'ast AstArena, f: &'ast SourceFile) {
        f.walk(a, self);
    }

    /// `const`, `var`, `type` and `import` groups, including those local to
    /// a function body or initializer.
    #[inline(always)]
    fn visit_decl(&mut self, a: &'ast AstArena, id: DeclId) {
        a.decls[id].walk(a, self);
    }

    /// Receiver, type parameters, signature, then the local declarations of
    /// the body.
    #[inline(always)]
    fn visit_func_decl(&mut self, a: &'ast AstArena, id: FuncDeclId) {
        a.funcs[id].walk(a, self);
    }

    #[inline(always)]
    fn visit_type_spec(&mut self, a: &'ast AstArena, id: TypeSpecId) {
        a.type_specs[id].walk(a, self);
    }

    #[inline(always)]
    fn visit_type(&mut self, a: &'ast AstArena, id: TypeId) {
        a.types[id].walk(a, self);
    }

    /// Struct fields and parameters alike.
    #[inline(always)]
    fn visit_field(&mut self, a: &'ast AstArena, id: FieldId) {
        a.fields[id].walk(a, self);
    }

    #[inline(always)]
    fn visit_signature(&mut self, a: &'ast AstArena, id: SignatureId) {
        a.signatures[id].walk(a, self);
    }
}

/// Ids dispatch to their hook instead of walking the node directly.
macro_rules! dispatch_ids {
    ($($id:ty => $visit:ident),* $(,)?) => {
        $(
            impl<'ast> Walk<'ast> for $id {
                #[inline(always)]
                fn walk<V: Visitor<'ast> + ?Sized>(&self, a: &'ast AstArena, v: &mut V) {
                    v.$visit(a, *self);
                }
            }
        )*
    };
}

dispatch_ids! {
    DeclId => visit_decl,
    FuncDeclId => visit_func_decl,
    TypeSpecId => visit_type_spec,
    TypeId => visit_type,
    FieldId => visit_field,
    SignatureId => visit_signature,
}

/// Maps a `ListRef<T>` to its backing buffer in the arena.
pub trait ListSlice<T> {
    fn slice(&self, r: ListRef<T>) -> &[T];
}

impl<'ast, T> Walk<'ast> for ListRef<T>
where
    AstArena: ListSlice<T>,
    T: Walk<'ast> + 'ast,
{
    #[inline(always)]
    fn walk<V: Visitor<'ast> + ?Sized>(&self, a: &'ast AstArena, v: &mut V) {
        for item in a.slice(*self) {
            item.walk(a, v);
        }
    }
}

macro_rules! list_buffers {
    ($($t:ty => $getter:ident),* $(,)?) => {
        $(
            impl ListSlice<$t> for AstArena {
                #[inline(always)]
                fn slice(&self, r: ListRef<$t>) -> &[$t] {
                    self.$getter(r)
                }
            }
        )*
    };
}

list_buffers! {
    DeclId => decls_list,
    TypeId => types_list,
    FieldId => fields_list,
    Spec => specs_list,
    TopLevelDecl => top_decls,
    InterfaceElem => interface_elems,
    TypeTerm => type_terms,
    TypeParamDecl => type_params,
}

impl<'ast, T: Walk<'ast>> Walk<'ast> for Option<T> {
    #[inline(always)]
    fn walk<V: Visitor<'ast> + ?Sized>(&self, a: &'ast AstArena, v: &mut V) {
        if let Some(x) = self {
            x.walk(a, v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_source, ParsedFile};

    const SRC: &str = "package p\n\ntype A struct { X *int }\n\nfunc f(n int) {\n\ttype B int\n}\n";

    struct Counter<'f> {
        file: &'f ParsedFile,
        specs: Vec<String>,
        types: usize,
        prune_types: bool,
    }

    impl<'ast> Visitor<'ast> for Counter<'_> {
        fn visit_type_spec(&mut self, a: &'ast AstArena, id: TypeSpecId) {
            let name = self.file.resolve(a.type_specs[id].name.sym).to_string();
            self.specs.push(name);
            a.type_specs[id].walk(a, self);
        }

        fn visit_type(&mut self, a: &'ast AstArena, id: TypeId) {
            self.types += 1;
            if !self.prune_types {
                a.types[id].walk(a, self);
            }
        }
    }

    fn count(prune_types: bool) -> (Vec<String>, usize) {
        let file = parse_source(SRC).unwrap();
        let mut v = Counter {
            file: &file,
            specs: Vec::new(),
            types: 0,
            prune_types,
        };
        file.accept(&mut v);
        (v.specs, v.types)
    }

    #[test]
    fn reaches_local_type_specs_in_order() {
        let (specs, _) = count(false);
        assert_eq!(specs, ["A", "B"]);
    }

    #[test]
    fn default_hooks_descend_into_types() {
        // struct, *int, int, param int, local int
        assert_eq!(count(false).1, 5);
    }

    #[test]
    fn override_without_walk_prunes() {
        let (specs, types) = count(true);
        assert_eq!(specs, ["A", "B"]);
        assert_eq!(types, 3);
    }
}
