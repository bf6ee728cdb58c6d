//! # Go declaration-level AST
//!
//! Arena-allocated syntax tree for the declaration layer of a Go source file:
//! the package clause, imports, const/var/type declarations, function and
//! method signatures, and the complete type grammar.
//!
//! ## Architecture
//!
//! - **Nodes**: allocated in typed arenas (`SpannedArena<T>`) and referenced
//!   through typed `Id<T>` handles
//! - **Lists**: centralized buffers in `ExtraData`, referenced by `ListRef<T>`
//! - **Spans**: stored in side tables next to each arena
//! - **Symbols**: identifiers are interned once (`Interner`)
//!
//! ## Skipped regions
//!
//! Statements and expressions are not modelled. Function bodies and
//! const/var initializers are recorded as [`Skipped`] regions, which keep the
//! type declarations that appear inside them (local types, types declared in
//! function literals) so that traversals still reach every type spec.
//!
//! Walk/Visitor infrastructure lives in `crate::walk`; `#[derive(WalkAst)]`
//! generates the child traversal for every node below.

use ast_derive::WalkAst;
use core::marker::PhantomData;
use core::ops::{Index, IndexMut};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::hash::{BuildHasher, BuildHasherDefault, Hasher, RandomState};

// =============================================================================
// Core Foundation Types
// =============================================================================

/// Byte range in the source, end exclusive.
///
/// Positions are stored as `u32`, limiting file size to 4GB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// # Panics
    /// In debug builds, panics if positions exceed `u32::MAX`.
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= u32::MAX as usize);
        debug_assert!(end <= u32::MAX as usize);
        Self {
            start: start as u32,
            end: end as u32,
        }
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest span covering both `self` and `other`.
    #[inline]
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Type-safe handle to an arena-allocated node.
#[derive(Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Id<T> {
    raw: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Copy for Id<T> {}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Id<T> {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub const fn to_usize(&self) -> usize {
        self.raw as usize
    }
}

/// Typed reference into a centralized list buffer.
#[derive(Debug, PartialEq, Eq)]
pub struct ListRef<T> {
    start: u32,
    len: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Copy for ListRef<T> {}

impl<T> Clone for ListRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Default for ListRef<T> {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl<T> ListRef<T> {
    pub const EMPTY: Self = Self {
        start: 0,
        len: 0,
        _marker: PhantomData,
    };

    #[inline]
    pub const fn new(start: u32, len: u32) -> Self {
        Self {
            start,
            len,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.len
    }

    #[inline]
    const fn range(&self) -> core::ops::Range<usize> {
        self.start as usize..(self.start + self.len) as usize
    }
}

// =============================================================================
// Symbol Interning
// =============================================================================

/// Interned identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Symbol(u32);

pub type Ident = Symbol;

/// Identifier occurrence (interned symbol + source position).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentName {
    pub sym: Ident,
    pub pos: Span,
}

/// Identity hasher: bucket keys are already hashes.
#[derive(Default)]
struct U64IdentityHasher(u64);

impl Hasher for U64IdentityHasher {
    fn write(&mut self, _b: &[u8]) {
        unreachable!("U64IdentityHasher only supports write_u64")
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.0 = i;
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }
}

type U64IdentityBuild = BuildHasherDefault<U64IdentityHasher>;

/// String interner keyed by seeded hash buckets.
#[derive(Debug, Default)]
pub struct Interner {
    strings: Vec<Box<str>>,
    buckets: HashMap<u64, SmallVec<[Symbol; 1]>, U64IdentityBuild>,
    state: RandomState,
}

impl Interner {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `s`, returning the existing symbol when already present.
    pub fn intern(&mut self, s: &str) -> Symbol {
        let h = self.state.hash_one(s);
        let entry = self.buckets.entry(h).or_default();

        if let Some(&sym) = entry
            .iter()
            .find(|sym| self.strings[sym.0 as usize].as_ref() == s)
        {
            return sym;
        }

        let sym = Symbol(self.strings.len() as u32);
        self.strings.push(s.into());
        entry.push(sym);
        sym
    }

    /// # Panics
    /// Panics if `sym` was not produced by this interner.
    #[inline]
    pub fn resolve(&self, sym: Symbol) -> &str {
        self.strings
            .get(sym.0 as usize)
            .expect("symbol from a different interner")
            .as_ref()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

// =============================================================================
// Arena Allocation
// =============================================================================

/// Nodes and their spans, stored in parallel vectors.
#[derive(Debug)]
pub struct SpannedArena<T> {
    data: Vec<T>,
    spans: Vec<Span>,
}

impl<T> Default for SpannedArena<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            spans: Vec::new(),
        }
    }
}

impl<T> SpannedArena<T> {
    #[inline]
    pub fn alloc(&mut self, node: T, span: Span) -> Id<T> {
        let id = Id::from_raw(self.data.len() as u32);
        self.data.push(node);
        self.spans.push(span);
        id
    }

    #[inline]
    pub fn span(&self, id: Id<T>) -> Span {
        self.spans[id.to_usize()]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T> Index<Id<T>> for SpannedArena<T> {
    type Output = T;
    fn index(&self, id: Id<T>) -> &T {
        &self.data[id.to_usize()]
    }
}

impl<T> IndexMut<Id<T>> for SpannedArena<T> {
    fn index_mut(&mut self, id: Id<T>) -> &mut T {
        &mut self.data[id.to_usize()]
    }
}

pub type DeclId = Id<Decl>;
pub type FuncDeclId = Id<FuncDecl>;
pub type TypeSpecId = Id<TypeSpec>;
pub type TypeId = Id<Type>;
pub type FieldId = Id<Field>;
pub type SignatureId = Id<Signature>;

// =============================================================================
// Centralized List Storage
// =============================================================================

/// Buffers that every `ListRef<T>` points into.
#[derive(Debug, Default)]
pub struct ExtraData {
    pub ident_names: Vec<IdentName>,
    pub decl_ids: Vec<DeclId>,
    pub types: Vec<TypeId>,
    pub fields: Vec<FieldId>,
    pub specs: Vec<Spec>,
    pub top_decls: Vec<TopLevelDecl>,
    pub interface_elems: Vec<InterfaceElem>,
    pub type_terms: Vec<TypeTerm>,
    pub type_params: Vec<TypeParamDecl>,
}

/// Central arena holding all AST nodes and list buffers.
#[derive(Debug, Default)]
pub struct AstArena {
    pub decls: SpannedArena<Decl>,
    pub funcs: SpannedArena<FuncDecl>,
    pub type_specs: SpannedArena<TypeSpec>,
    pub types: SpannedArena<Type>,
    pub signatures: SpannedArena<Signature>,
    pub fields: SpannedArena<Field>,
    pub extras: ExtraData,
}

macro_rules! list_buffers {
    ($($t:ty => $buf:ident, $build:ident, $get:ident;)*) => {
        impl AstArena {
            $(
                pub fn $build(&mut self, items: impl IntoIterator<Item = $t>) -> ListRef<$t> {
                    Self::push_list(&mut self.extras.$buf, items)
                }

                #[inline]
                pub fn $get(&self, r: ListRef<$t>) -> &[$t] {
                    &self.extras.$buf[r.range()]
                }
            )*
        }
    };
}

list_buffers! {
    IdentName => ident_names, list_ident_names, ident_names;
    DeclId => decl_ids, list_decls, decls_list;
    TypeId => types, list_types, types_list;
    FieldId => fields, list_fields, fields_list;
    Spec => specs, list_specs, specs_list;
    TopLevelDecl => top_decls, list_top_decls, top_decls;
    InterfaceElem => interface_elems, list_interface_elems, interface_elems;
    TypeTerm => type_terms, list_type_terms, type_terms;
    TypeParamDecl => type_params, list_type_params, type_params;
}

impl AstArena {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_list<T>(buf: &mut Vec<T>, items: impl IntoIterator<Item = T>) -> ListRef<T> {
        let start = buf.len();
        buf.extend(items);
        let len = buf.len() - start;
        if len == 0 {
            return ListRef::EMPTY;
        }
        debug_assert!(buf.len() <= u32::MAX as usize);
        ListRef::new(start as u32, len as u32)
    }
}

// =============================================================================
// Source File (Root Node)
// =============================================================================

/// ```text
/// SourceFile = PackageClause ";" { ImportDecl ";" } { TopLevelDecl ";" }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct SourceFile {
    #[walk(skip)]
    pub package_pos: Span,
    #[walk(skip)]
    pub name: IdentName,
    /// Imports first, then every other top-level declaration, in source order.
    pub decls: ListRef<TopLevelDecl>,
}

// =============================================================================
// Declarations
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum TopLevelDecl {
    Decl(DeclId),
    Func(FuncDeclId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Decl {
    Gen(GenDecl),
}

/// `import`, `const`, `type` or `var` declaration, single or grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct GenDecl {
    #[walk(skip)]
    pub kw_pos: Span,
    #[walk(skip)]
    pub kind: GenDeclKind,
    #[walk(skip)]
    pub l_paren: Option<Span>,
    pub specs: ListRef<Spec>,
    #[walk(skip)]
    pub r_paren: Option<Span>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GenDeclKind {
    Import,
    Const,
    Type,
    Var,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Spec {
    #[walk(skip)]
    Import(ImportSpec),
    Value(ValueSpec),
    Type(TypeSpecId),
}

/// `ImportSpec = [ "." | PackageName ] ImportPath`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSpec {
    pub name: Option<ImportName>,
    pub path: StringLit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportName {
    /// `import . "pkg"`
    Dot(Span),
    /// `import name "pkg"` (including `_`)
    Name(IdentName),
}

/// Const or var spec. The initializer expressions are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct ValueSpec {
    #[walk(skip)]
    pub names: ListRef<IdentName>,
    pub typ: Option<TypeId>,
    pub values: Option<Skipped>,
}

/// `TypeSpec = AliasDecl | TypeDef`
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct TypeSpec {
    #[walk(skip)]
    pub name: IdentName,
    pub type_params: ListRef<TypeParamDecl>,
    /// Position of `=` for aliases.
    #[walk(skip)]
    pub assign_pos: Option<Span>,
    pub typ: TypeId,
}

impl TypeSpec {
    #[inline]
    pub fn is_alias(&self) -> bool {
        self.assign_pos.is_some()
    }
}

/// ```text
/// FunctionDecl = "func" FunctionName [ TypeParameters ] Signature [ FunctionBody ]
/// MethodDecl   = "func" Receiver MethodName Signature [ FunctionBody ]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct FuncDecl {
    #[walk(skip)]
    pub func_pos: Span,
    pub recv: Option<FieldList>,
    #[walk(skip)]
    pub name: IdentName,
    pub type_params: ListRef<TypeParamDecl>,
    pub signature: SignatureId,
    pub body: Option<Skipped>,
}

/// A region of statements or expressions that was skipped, with the type
/// declarations found inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct Skipped {
    #[walk(skip)]
    pub span: Span,
    pub decls: ListRef<DeclId>,
}

/// `TypeParamDecl = IdentifierList TypeConstraint`
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct TypeParamDecl {
    #[walk(skip)]
    pub names: ListRef<IdentName>,
    pub constraint: TypeId,
}

// =============================================================================
// Signatures and Fields
// =============================================================================

/// `Signature = Parameters [ Result ]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct Signature {
    pub params: FieldList,
    pub results: Option<Results>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Results {
    /// Parenthesized results: `(x int, err error)` or `(int, error)`
    Params(FieldList),
    /// Single unparenthesized result: `int`
    Type(TypeId),
}

/// Parenthesized parameter/result/receiver list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct FieldList {
    #[walk(skip)]
    pub l_paren: Span,
    pub fields: ListRef<FieldId>,
    #[walk(skip)]
    pub r_paren: Span,
}

/// Struct field or parameter declaration.
///
/// `ParameterDecl = [ IdentifierList ] [ "..." ] Type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct Field {
    /// Empty for embedded fields and unnamed parameters.
    #[walk(skip)]
    pub names: ListRef<IdentName>,
    /// Position of `...` for variadic parameters
    #[walk(skip)]
    pub ellipsis_pos: Option<Span>,
    pub typ: TypeId,
    #[walk(skip)]
    pub tag: Option<StringLit>,
    #[walk(skip)]
    pub is_embed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringLit {
    pub raw: Span,
}

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum Type {
    /// `Name`, `pkg.Name`, `Name[T1, T2]`
    Named {
        #[walk(skip)]
        pkg: Option<IdentName>,
        #[walk(skip)]
        name: IdentName,
        args: ListRef<TypeId>,
    },

    /// `*T`
    Pointer {
        #[walk(skip)]
        star_pos: Span,
        elem: TypeId,
    },

    /// `[N]T` or `[...]T`
    Array {
        #[walk(skip)]
        len: ArrayLen,
        elem: TypeId,
    },

    /// `[]T`
    Slice {
        #[walk(skip)]
        l_brack: Span,
        elem: TypeId,
    },

    /// `map[K]V`
    Map {
        #[walk(skip)]
        map_pos: Span,
        key: TypeId,
        val: TypeId,
    },

    /// `chan T`, `<-chan T` or `chan<- T`
    Chan {
        #[walk(skip)]
        dir: ChanDir,
        #[walk(skip)]
        chan_pos: Span,
        elem: TypeId,
    },

    /// `struct { ... }`
    Struct {
        #[walk(skip)]
        struct_pos: Span,
        fields: ListRef<FieldId>,
    },

    /// `interface { ... }`
    Interface {
        #[walk(skip)]
        interface_pos: Span,
        elems: ListRef<InterfaceElem>,
    },

    /// `func(...) ...`
    Func {
        #[walk(skip)]
        func_pos: Span,
        sig: SignatureId,
    },

    /// `(T)`
    Paren { typ: TypeId },

    /// Constraint union: `~int | string`, or a single `~T`.
    Union { terms: ListRef<TypeTerm> },
}

/// Array length. The length expression itself is not modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayLen {
    Expr(Span),
    /// `[...]T`
    Ellipsis(Span),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    /// `chan T`
    Both,
    /// `chan<- T`
    Send,
    /// `<-chan T`
    Recv,
}

/// One term of a union; `tilde_pos` is set for `~T`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub struct TypeTerm {
    #[walk(skip)]
    pub tilde_pos: Option<Span>,
    pub typ: TypeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, WalkAst)]
pub enum InterfaceElem {
    /// `Method(...) ...`
    Method {
        #[walk(skip)]
        name: IdentName,
        sig: SignatureId,
    },

    /// Embedded type (`Stringer`, `io.Reader`) or constraint union.
    Embed(TypeId),
}
