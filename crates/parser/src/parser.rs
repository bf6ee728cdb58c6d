//! Recursive-descent parser for the declaration layer of Go.
//!
//! The token stream is collected up front so the parser can back off from
//! the few places where Go's grammar needs unbounded lookahead (`a [N]T`
//! versus `G[T]` in field and parameter lists). Statements and expressions
//! are skipped by bracket matching; type declarations met while skipping
//! are parsed and attached to the enclosing [`Skipped`] region.

use crate::ast::*;
use crate::error::{Diag, ParseFailure};
use crate::lexer::{Lexer, Tok};
use crate::walk::Visitor;

/// A parsed file: the arena, its interned identifiers and the root node.
#[derive(Debug)]
pub struct ParsedFile {
    pub arena: AstArena,
    pub symbols: Interner,
    pub root: SourceFile,
}

impl ParsedFile {
    #[inline]
    pub fn resolve(&self, sym: Symbol) -> &str {
        self.symbols.resolve(sym)
    }

    #[inline]
    pub fn package_name(&self) -> &str {
        self.resolve(self.root.name.sym)
    }

    /// Runs `v` over the whole file, starting at the root.
    pub fn accept<'a, V: Visitor<'a> + ?Sized>(&'a self, v: &mut V) {
        v.visit_source_file(&self.arena, &self.root);
    }
}

/// Parses a Go source file.
///
/// Lexer diagnostics are reported together; otherwise the first syntax error
/// aborts the parse.
pub fn parse_source(src: &str) -> Result<ParsedFile, ParseFailure> {
    let mut lex = Lexer::new(src);
    let toks: Vec<_> = lex.by_ref().collect();
    let diags = lex.take_diags();
    if !diags.is_empty() {
        return Err(ParseFailure { diags });
    }

    let mut parser = Parser::new(toks, src.len());
    let root = parser
        .source_file()
        .map_err(|d| ParseFailure { diags: vec![d] })?;

    Ok(ParsedFile {
        arena: parser.arena,
        symbols: parser.symbols,
        root,
    })
}

type PResult<T> = Result<T, Diag>;

/// Deepest nesting of types, parameter lists and skipped blocks the parser
/// accepts before giving up.
pub const MAX_NEST_DEPTH: u32 = 256;

/// One entry of a parameter list before grouped names are resolved.
#[derive(Clone, Debug)]
struct ParamDecl {
    names: Vec<IdentName>,
    ellipsis_pos: Option<Span>,
    typ: Option<TypeId>,
    span: Span,
}

/// How a struct field declaration starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FieldStart {
    /// `*T` or `*pkg.T`
    EmbeddedPointer,
    /// `T`, `pkg.T`
    Embedded,
    /// `name [`: array/slice-typed field or embedded instantiation
    Bracketed,
    /// `a, b T` / `a T`
    Named,
    Invalid,
}

struct Parser<'src> {
    toks: Vec<(usize, Tok<'src>, usize)>,
    pos: usize,
    eof: usize,
    arena: AstArena,
    symbols: Interner,
    depth: u32,
    /// Set once `depth` hits the limit; backtracking stops retrying.
    too_deep: bool,
}

impl<'src> Parser<'src> {
    fn new(toks: Vec<(usize, Tok<'src>, usize)>, eof: usize) -> Self {
        Self {
            toks,
            pos: 0,
            eof,
            arena: AstArena::new(),
            symbols: Interner::new(),
            depth: 0,
            too_deep: false,
        }
    }

    // -------------------------------------------------------------------------
    // Token cursor
    // -------------------------------------------------------------------------

    #[inline]
    fn peek(&self) -> Option<Tok<'src>> {
        self.nth(0)
    }

    #[inline]
    fn nth(&self, n: usize) -> Option<Tok<'src>> {
        self.toks.get(self.pos + n).map(|(_, t, _)| t.clone())
    }

    #[inline]
    fn at(&self, tok: &Tok<'src>) -> bool {
        self.toks.get(self.pos).is_some_and(|(_, t, _)| t == tok)
    }

    fn span_here(&self) -> Span {
        match self.toks.get(self.pos) {
            Some(&(start, _, end)) => Span::new(start, end),
            None => Span::new(self.eof, self.eof),
        }
    }

    /// End offset of the last consumed token.
    fn prev_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.toks.get(i))
            .map_or(0, |&(_, _, end)| end)
    }

    fn span_from(&self, start: Span) -> Span {
        Span::new(start.start as usize, self.prev_end().max(start.start as usize))
    }

    fn bump(&mut self) -> Span {
        let span = self.span_here();
        if self.pos < self.toks.len() {
            self.pos += 1;
        }
        span
    }

    fn eat(&mut self, tok: &Tok<'src>) -> Option<Span> {
        self.at(tok).then(|| self.bump())
    }

    fn expect(&mut self, tok: &Tok<'src>, what: &str) -> PResult<Span> {
        match self.eat(tok) {
            Some(span) => Ok(span),
            None => Err(self.unexpected(what)),
        }
    }

    fn unexpected(&self, what: &str) -> Diag {
        let found = match self.peek() {
            Some(tok) => tok.to_string(),
            None => "EOF".to_string(),
        };
        Diag::parse(self.span_here(), format!("expected {what}, found {found}"))
    }

    /// Accepts the `;` that terminates a declaration or element. It may be
    /// omitted before `closer` or at EOF.
    fn end_of_item(&mut self, closer: Option<&Tok<'src>>) -> PResult<()> {
        if self.eat(&Tok::Semi).is_some() || self.peek().is_none() {
            return Ok(());
        }
        match closer {
            Some(c) if self.at(c) => Ok(()),
            _ => Err(self.unexpected("';'")),
        }
    }

    /// Runs `f`, rewinding the cursor if it fails. Nodes allocated by a
    /// failed attempt stay in the arena unreferenced. Hitting the nesting
    /// limit is not retried.
    fn try_parse<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<Option<T>> {
        let save = self.pos;
        match f(self) {
            Ok(v) => Ok(Some(v)),
            Err(diag) if self.too_deep => Err(diag),
            Err(_) => {
                self.pos = save;
                Ok(None)
            }
        }
    }

    /// Runs `f` one nesting level deeper.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.depth >= MAX_NEST_DEPTH {
            self.too_deep = true;
            return Err(Diag::parse(self.span_here(), "exceeded max nesting depth"));
        }
        self.depth += 1;
        let out = f(self);
        self.depth -= 1;
        out
    }

    fn ident(&mut self) -> PResult<IdentName> {
        match self.peek() {
            Some(Tok::Ident(s)) => {
                let pos = self.bump();
                Ok(IdentName {
                    sym: self.symbols.intern(s),
                    pos,
                })
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn ident_vec(&mut self) -> PResult<Vec<IdentName>> {
        let mut names = vec![self.ident()?];
        while self.eat(&Tok::Comma).is_some() {
            names.push(self.ident()?);
        }
        Ok(names)
    }

    fn at_string(&self) -> bool {
        matches!(self.peek(), Some(Tok::StringLit(_) | Tok::RawStringLit(_)))
    }

    fn at_type_start(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                Tok::Ident(_)
                    | Tok::Star
                    | Tok::LBrack
                    | Tok::LParen
                    | Tok::Arrow
                    | Tok::KwMap
                    | Tok::KwChan
                    | Tok::KwStruct
                    | Tok::KwInterface
                    | Tok::KwFunc
            )
        )
    }

    /// Whether the previous token lets a statement start here.
    fn at_stmt_start(&self) -> bool {
        let prev = self.pos.checked_sub(1).and_then(|i| self.toks.get(i));
        matches!(prev, Some((_, Tok::LBrace | Tok::Semi | Tok::Colon, _)))
    }

    // -------------------------------------------------------------------------
    // Declarations
    // -------------------------------------------------------------------------

    fn source_file(&mut self) -> PResult<SourceFile> {
        let package_pos = self.expect(&Tok::KwPackage, "`package`")?;
        let name = self.ident()?;
        self.end_of_item(None)?;

        let mut decls = Vec::new();
        while self.at(&Tok::KwImport) {
            decls.push(TopLevelDecl::Decl(self.gen_decl(GenDeclKind::Import)?));
            self.end_of_item(None)?;
        }

        while let Some(tok) = self.peek() {
            let decl = match tok {
                Tok::KwConst => TopLevelDecl::Decl(self.gen_decl(GenDeclKind::Const)?),
                Tok::KwVar => TopLevelDecl::Decl(self.gen_decl(GenDeclKind::Var)?),
                Tok::KwType => TopLevelDecl::Decl(self.gen_decl(GenDeclKind::Type)?),
                Tok::KwFunc => TopLevelDecl::Func(self.func_decl()?),
                Tok::KwImport => {
                    return Err(Diag::parse(
                        self.span_here(),
                        "imports must appear before other declarations",
                    ));
                }
                _ => return Err(self.unexpected("declaration")),
            };
            decls.push(decl);
            self.end_of_item(None)?;
        }

        Ok(SourceFile {
            package_pos,
            name,
            decls: self.arena.list_top_decls(decls),
        })
    }

    fn gen_decl(&mut self, kind: GenDeclKind) -> PResult<DeclId> {
        let kw_pos = self.bump();
        let mut specs = Vec::new();

        let (l_paren, r_paren) = match self.eat(&Tok::LParen) {
            Some(l_paren) => {
                while !self.at(&Tok::RParen) {
                    specs.push(self.spec(kind)?);
                    self.end_of_item(Some(&Tok::RParen))?;
                }
                (Some(l_paren), Some(self.expect(&Tok::RParen, "`)`")?))
            }
            None => {
                specs.push(self.spec(kind)?);
                (None, None)
            }
        };

        let span = self.span_from(kw_pos);
        let specs = self.arena.list_specs(specs);
        let decl = Decl::Gen(GenDecl {
            kw_pos,
            kind,
            l_paren,
            specs,
            r_paren,
        });
        Ok(self.arena.decls.alloc(decl, span))
    }

    fn spec(&mut self, kind: GenDeclKind) -> PResult<Spec> {
        match kind {
            GenDeclKind::Import => self.import_spec().map(Spec::Import),
            GenDeclKind::Const | GenDeclKind::Var => self.value_spec().map(Spec::Value),
            GenDeclKind::Type => self.type_spec().map(Spec::Type),
        }
    }

    fn import_spec(&mut self) -> PResult<ImportSpec> {
        let name = match self.peek() {
            Some(Tok::Dot) => Some(ImportName::Dot(self.bump())),
            Some(Tok::Ident(_)) => Some(ImportName::Name(self.ident()?)),
            _ => None,
        };
        if !self.at_string() {
            return Err(self.unexpected("import path"));
        }
        let path = StringLit { raw: self.bump() };
        Ok(ImportSpec { name, path })
    }

    fn value_spec(&mut self) -> PResult<ValueSpec> {
        let names = self.ident_vec()?;
        let names = self.arena.list_ident_names(names);

        let typ = match self.peek() {
            None | Some(Tok::Assign | Tok::Semi | Tok::RParen) => None,
            Some(_) => Some(self.type_()?),
        };
        let values = match self.eat(&Tok::Assign) {
            Some(_) => Some(self.skip_values()?),
            None => None,
        };

        Ok(ValueSpec { names, typ, values })
    }

    fn type_spec(&mut self) -> PResult<TypeSpecId> {
        let name = self.ident()?;
        let type_params = if self.type_params_ahead() {
            self.type_params()?
        } else {
            ListRef::EMPTY
        };
        let assign_pos = self.eat(&Tok::Assign);
        let typ = self.type_()?;

        let span = self.span_from(name.pos);
        let spec = TypeSpec {
            name,
            type_params,
            assign_pos,
            typ,
        };
        Ok(self.arena.type_specs.alloc(spec, span))
    }

    /// `type T[P C] ...` versus `type A [N]E`.
    ///
    /// `[P *C]` and other expression-like brackets parse as array lengths.
    fn type_params_ahead(&self) -> bool {
        self.at(&Tok::LBrack)
            && matches!(self.nth(1), Some(Tok::Ident(_)))
            && matches!(
                self.nth(2),
                Some(
                    Tok::Ident(_)
                        | Tok::Comma
                        | Tok::Tilde
                        | Tok::LBrack
                        | Tok::KwInterface
                        | Tok::KwFunc
                        | Tok::KwMap
                        | Tok::KwChan
                        | Tok::KwStruct
                )
            )
    }

    fn type_params(&mut self) -> PResult<ListRef<TypeParamDecl>> {
        self.expect(&Tok::LBrack, "`[`")?;
        let mut decls = Vec::new();
        while !self.at(&Tok::RBrack) {
            let names = self.ident_vec()?;
            let constraint = self.type_elem()?;
            decls.push(TypeParamDecl {
                names: self.arena.list_ident_names(names),
                constraint,
            });
            if self.eat(&Tok::Comma).is_none() {
                break;
            }
        }
        self.expect(&Tok::RBrack, "`]`")?;
        if decls.is_empty() {
            return Err(self.unexpected("type parameter"));
        }
        Ok(self.arena.list_type_params(decls))
    }

    fn func_decl(&mut self) -> PResult<FuncDeclId> {
        let func_pos = self.bump();
        let recv = match self.at(&Tok::LParen) {
            true => Some(self.parameters()?),
            false => None,
        };
        let name = self.ident()?;
        let type_params = match self.at(&Tok::LBrack) {
            true => self.type_params()?,
            false => ListRef::EMPTY,
        };
        let signature = self.signature()?;
        let body = match self.at(&Tok::LBrace) {
            true => Some(self.skip_block()?),
            false => None,
        };

        let span = self.span_from(func_pos);
        let decl = FuncDecl {
            func_pos,
            recv,
            name,
            type_params,
            signature,
            body,
        };
        Ok(self.arena.funcs.alloc(decl, span))
    }

    // -------------------------------------------------------------------------
    // Skipped regions
    // -------------------------------------------------------------------------

    /// Skips a `{ ... }` block, parsing the type declarations inside it.
    fn skip_block(&mut self) -> PResult<Skipped> {
        self.nested(Self::skip_block_inner)
    }

    fn skip_block_inner(&mut self) -> PResult<Skipped> {
        let l_brace = self.expect(&Tok::LBrace, "`{`")?;
        let mut depth = 1usize;
        let mut decls = Vec::new();

        while depth > 0 {
            match self.peek() {
                None => return Err(Diag::parse(l_brace, "unclosed `{`")),
                Some(Tok::KwType) if self.at_stmt_start() => {
                    decls.push(self.gen_decl(GenDeclKind::Type)?);
                }
                Some(tok) => {
                    match tok {
                        Tok::LBrace => depth += 1,
                        Tok::RBrace => depth -= 1,
                        _ => {}
                    }
                    self.bump();
                }
            }
        }

        Ok(Skipped {
            span: self.span_from(l_brace),
            decls: self.arena.list_decls(decls),
        })
    }

    /// Skips an initializer expression list up to the `;` or `)` that ends
    /// the spec.
    fn skip_values(&mut self) -> PResult<Skipped> {
        let start = self.span_here();
        let first = self.pos;
        let mut depth = 0usize;
        let mut decls = Vec::new();

        loop {
            match self.peek() {
                None => break,
                Some(Tok::Semi | Tok::RParen) if depth == 0 => break,
                Some(Tok::KwType) if depth > 0 && self.at_stmt_start() => {
                    decls.push(self.gen_decl(GenDeclKind::Type)?);
                }
                Some(Tok::LParen | Tok::LBrack | Tok::LBrace) => {
                    depth += 1;
                    self.bump();
                }
                Some(Tok::RParen | Tok::RBrack | Tok::RBrace) => {
                    if depth == 0 {
                        return Err(self.unexpected("expression"));
                    }
                    depth -= 1;
                    self.bump();
                }
                Some(_) => {
                    self.bump();
                }
            }
        }

        if self.pos == first {
            return Err(self.unexpected("expression"));
        }
        Ok(Skipped {
            span: self.span_from(start),
            decls: self.arena.list_decls(decls),
        })
    }

    /// Skips an array length expression and the closing `]`.
    fn skip_array_len(&mut self) -> PResult<Span> {
        let start = self.span_here();
        let mut depth = 0usize;
        loop {
            match self.peek() {
                None => return Err(self.unexpected("`]`")),
                Some(Tok::RBrack) if depth == 0 => break,
                Some(Tok::LParen | Tok::LBrack | Tok::LBrace) => depth += 1,
                Some(Tok::RParen | Tok::RBrack | Tok::RBrace) => {
                    depth = depth.checked_sub(1).ok_or_else(|| self.unexpected("`]`"))?;
                }
                Some(_) => {}
            }
            self.bump();
        }
        if self.span_here() == start {
            return Err(self.unexpected("array length"));
        }
        let len = self.span_from(start);
        self.bump();
        Ok(len)
    }

    // -------------------------------------------------------------------------
    // Signatures and parameters
    // -------------------------------------------------------------------------

    fn signature(&mut self) -> PResult<SignatureId> {
        let params = self.parameters()?;
        let results = if self.at(&Tok::LParen) {
            Some(Results::Params(self.parameters()?))
        } else if self.at_type_start() {
            Some(Results::Type(self.type_()?))
        } else {
            None
        };

        let span = self.span_from(params.l_paren);
        Ok(self.arena.signatures.alloc(Signature { params, results }, span))
    }

    fn parameters(&mut self) -> PResult<FieldList> {
        self.nested(Self::parameter_list)
    }

    fn parameter_list(&mut self) -> PResult<FieldList> {
        let l_paren = self.expect(&Tok::LParen, "`(`")?;
        let mut decls = Vec::new();
        while !self.at(&Tok::RParen) {
            decls.push(self.param_decl()?);
            if self.eat(&Tok::Comma).is_none() {
                break;
            }
        }
        let r_paren = self.expect(&Tok::RParen, "`)`")?;

        let fields = self.resolve_param_list(decls);
        Ok(FieldList {
            l_paren,
            fields: self.arena.list_fields(fields),
            r_paren,
        })
    }

    fn param_decl(&mut self) -> PResult<ParamDecl> {
        let start = self.span_here();

        if matches!(self.peek(), Some(Tok::Ident(_))) {
            match self.nth(1) {
                // Bare identifier: a name or a type, decided by the list.
                Some(Tok::Comma | Tok::RParen) => {
                    let name = self.ident()?;
                    return Ok(ParamDecl {
                        names: vec![name],
                        ellipsis_pos: None,
                        typ: None,
                        span: name.pos,
                    });
                }
                // `pkg.T`
                Some(Tok::Dot) => {}
                // `a []T` / `a [N]T` versus `G[T]`
                Some(Tok::LBrack) => {
                    let named = self.try_parse(|p| {
                        let name = p.ident()?;
                        let typ = p.type_()?;
                        match p.peek() {
                            Some(Tok::Comma | Tok::RParen) => Ok((name, typ)),
                            _ => Err(p.unexpected("`,` or `)`")),
                        }
                    })?;
                    if let Some((name, typ)) = named {
                        return Ok(ParamDecl {
                            names: vec![name],
                            ellipsis_pos: None,
                            typ: Some(typ),
                            span: self.span_from(start),
                        });
                    }
                }
                _ => {
                    let name = self.ident()?;
                    let ellipsis_pos = self.eat(&Tok::Ellipsis);
                    let typ = self.type_()?;
                    return Ok(ParamDecl {
                        names: vec![name],
                        ellipsis_pos,
                        typ: Some(typ),
                        span: self.span_from(start),
                    });
                }
            }
        }

        let ellipsis_pos = self.eat(&Tok::Ellipsis);
        let typ = self.type_()?;
        Ok(ParamDecl {
            names: Vec::new(),
            ellipsis_pos,
            typ: Some(typ),
            span: self.span_from(start),
        })
    }

    /// Resolves Go's grouped parameter names.
    ///
    /// Bare identifiers are held back: a following named entry claims them as
    /// extra names (`a, b int`), while an unnamed entry or the end of the list
    /// turns them into types (`int, string`).
    fn resolve_param_list(&mut self, params: Vec<ParamDecl>) -> Vec<FieldId> {
        let mut out = Vec::new();
        let mut pending: Vec<IdentName> = Vec::new();

        for param in params {
            match param.typ {
                Some(typ) if !param.names.is_empty() => {
                    let span = pending.first().map_or(param.span, |n| n.pos.to(param.span));
                    let names: Vec<_> = pending.drain(..).chain(param.names).collect();
                    out.push(self.alloc_param(names, param.ellipsis_pos, typ, span));
                }
                Some(typ) => {
                    self.flush_names_as_types(&mut pending, &mut out);
                    out.push(self.alloc_param(Vec::new(), param.ellipsis_pos, typ, param.span));
                }
                None => pending.extend(param.names),
            }
        }

        self.flush_names_as_types(&mut pending, &mut out);
        out
    }

    fn flush_names_as_types(&mut self, pending: &mut Vec<IdentName>, out: &mut Vec<FieldId>) {
        for name in pending.drain(..) {
            let typ = self.arena.types.alloc(
                Type::Named {
                    pkg: None,
                    name,
                    args: ListRef::EMPTY,
                },
                name.pos,
            );
            out.push(self.alloc_param(Vec::new(), None, typ, name.pos));
        }
    }

    fn alloc_param(
        &mut self,
        names: Vec<IdentName>,
        ellipsis_pos: Option<Span>,
        typ: TypeId,
        span: Span,
    ) -> FieldId {
        let field = Field {
            names: self.arena.list_ident_names(names),
            ellipsis_pos,
            typ,
            tag: None,
            is_embed: false,
        };
        self.arena.fields.alloc(field, span)
    }

    // -------------------------------------------------------------------------
    // Types
    // -------------------------------------------------------------------------

    fn type_(&mut self) -> PResult<TypeId> {
        self.nested(Self::type_expr)
    }

    fn type_expr(&mut self) -> PResult<TypeId> {
        let start = self.span_here();
        let ty = match self.peek() {
            Some(Tok::Ident(_)) => return self.named_type(),
            Some(Tok::KwStruct) => return self.struct_type(),
            Some(Tok::KwInterface) => return self.interface_type(),
            Some(Tok::Star) => {
                let star_pos = self.bump();
                let elem = self.type_()?;
                Type::Pointer { star_pos, elem }
            }
            Some(Tok::LBrack) => {
                let l_brack = self.bump();
                if self.eat(&Tok::RBrack).is_some() {
                    let elem = self.type_()?;
                    Type::Slice { l_brack, elem }
                } else if let Some(ellipsis) = self.eat(&Tok::Ellipsis) {
                    self.expect(&Tok::RBrack, "`]`")?;
                    let elem = self.type_()?;
                    Type::Array {
                        len: ArrayLen::Ellipsis(ellipsis),
                        elem,
                    }
                } else {
                    let len = self.skip_array_len()?;
                    let elem = self.type_()?;
                    Type::Array {
                        len: ArrayLen::Expr(len),
                        elem,
                    }
                }
            }
            Some(Tok::KwMap) => {
                let map_pos = self.bump();
                self.expect(&Tok::LBrack, "`[`")?;
                let key = self.type_()?;
                self.expect(&Tok::RBrack, "`]`")?;
                let val = self.type_()?;
                Type::Map { map_pos, key, val }
            }
            Some(Tok::KwChan) => {
                let chan_pos = self.bump();
                // `chan<- T`; `chan <-chan T` is `chan<- (chan T)`.
                let dir = match self.eat(&Tok::Arrow) {
                    Some(_) => ChanDir::Send,
                    None => ChanDir::Both,
                };
                let elem = self.type_()?;
                Type::Chan {
                    dir,
                    chan_pos,
                    elem,
                }
            }
            Some(Tok::Arrow) => {
                let arrow = self.bump();
                let chan_pos = self.expect(&Tok::KwChan, "`chan`")?;
                let elem = self.type_()?;
                Type::Chan {
                    dir: ChanDir::Recv,
                    chan_pos: arrow.to(chan_pos),
                    elem,
                }
            }
            Some(Tok::KwFunc) => {
                let func_pos = self.bump();
                let sig = self.signature()?;
                Type::Func { func_pos, sig }
            }
            Some(Tok::LParen) => {
                self.bump();
                let typ = self.type_()?;
                self.expect(&Tok::RParen, "`)`")?;
                Type::Paren { typ }
            }
            _ => return Err(self.unexpected("type")),
        };
        Ok(self.alloc_type(ty, start))
    }

    fn alloc_type(&mut self, ty: Type, start: Span) -> TypeId {
        let span = self.span_from(start);
        self.arena.types.alloc(ty, span)
    }

    fn named_type(&mut self) -> PResult<TypeId> {
        let start = self.span_here();
        let first = self.ident()?;
        let (pkg, name) = match self.eat(&Tok::Dot) {
            Some(_) => (Some(first), self.ident()?),
            None => (None, first),
        };

        let args = if self.at(&Tok::LBrack) {
            self.bump();
            let mut args = Vec::new();
            while !self.at(&Tok::RBrack) {
                args.push(self.type_()?);
                if self.eat(&Tok::Comma).is_none() {
                    break;
                }
            }
            self.expect(&Tok::RBrack, "`]`")?;
            if args.is_empty() {
                return Err(Diag::parse(self.span_from(start), "empty type argument list"));
            }
            self.arena.list_types(args)
        } else {
            ListRef::EMPTY
        };

        Ok(self.alloc_type(Type::Named { pkg, name, args }, start))
    }

    fn struct_type(&mut self) -> PResult<TypeId> {
        let struct_pos = self.bump();
        self.expect(&Tok::LBrace, "`{`")?;
        let mut fields = Vec::new();
        while !self.at(&Tok::RBrace) {
            fields.push(self.field_decl()?);
            self.end_of_item(Some(&Tok::RBrace))?;
        }
        self.expect(&Tok::RBrace, "`}`")?;

        let fields = self.arena.list_fields(fields);
        Ok(self.alloc_type(Type::Struct { struct_pos, fields }, struct_pos))
    }

    fn field_start(&self) -> FieldStart {
        match (self.peek(), self.nth(1)) {
            (Some(Tok::Star), _) => FieldStart::EmbeddedPointer,
            (
                Some(Tok::Ident(_)),
                None
                | Some(
                    Tok::Dot | Tok::Semi | Tok::RBrace | Tok::StringLit(_) | Tok::RawStringLit(_),
                ),
            ) => FieldStart::Embedded,
            (Some(Tok::Ident(_)), Some(Tok::LBrack)) => FieldStart::Bracketed,
            (Some(Tok::Ident(_)), Some(_)) => FieldStart::Named,
            _ => FieldStart::Invalid,
        }
    }

    fn at_field_end(&self) -> bool {
        matches!(
            self.peek(),
            None | Some(Tok::Semi | Tok::RBrace | Tok::StringLit(_) | Tok::RawStringLit(_))
        )
    }

    fn field_decl(&mut self) -> PResult<FieldId> {
        let start = self.span_here();
        let (names, typ, is_embed) = match self.field_start() {
            FieldStart::EmbeddedPointer => (Vec::new(), self.type_()?, true),
            FieldStart::Embedded => (Vec::new(), self.named_type()?, true),
            FieldStart::Bracketed => {
                let named = self.try_parse(|p| {
                    let name = p.ident()?;
                    let typ = p.type_()?;
                    match p.at_field_end() {
                        true => Ok((name, typ)),
                        false => Err(p.unexpected("';'")),
                    }
                })?;
                match named {
                    Some((name, typ)) => (vec![name], typ, false),
                    None => (Vec::new(), self.named_type()?, true),
                }
            }
            FieldStart::Named => {
                let names = self.ident_vec()?;
                (names, self.type_()?, false)
            }
            FieldStart::Invalid => return Err(self.unexpected("field name or embedded type")),
        };

        let tag = match self.at_string() {
            true => Some(StringLit { raw: self.bump() }),
            false => None,
        };

        let span = self.span_from(start);
        let field = Field {
            names: self.arena.list_ident_names(names),
            ellipsis_pos: None,
            typ,
            tag,
            is_embed,
        };
        Ok(self.arena.fields.alloc(field, span))
    }

    fn interface_type(&mut self) -> PResult<TypeId> {
        let interface_pos = self.bump();
        self.expect(&Tok::LBrace, "`{`")?;
        let mut elems = Vec::new();
        while !self.at(&Tok::RBrace) {
            let elem = match (self.peek(), self.nth(1)) {
                (Some(Tok::Ident(_)), Some(Tok::LParen)) => {
                    let name = self.ident()?;
                    let sig = self.signature()?;
                    InterfaceElem::Method { name, sig }
                }
                _ => InterfaceElem::Embed(self.type_elem()?),
            };
            elems.push(elem);
            self.end_of_item(Some(&Tok::RBrace))?;
        }
        self.expect(&Tok::RBrace, "`}`")?;

        let elems = self.arena.list_interface_elems(elems);
        Ok(self.alloc_type(
            Type::Interface {
                interface_pos,
                elems,
            },
            interface_pos,
        ))
    }

    /// `TypeElem = TypeTerm { "|" TypeTerm }`; a lone plain term is returned
    /// as that type.
    fn type_elem(&mut self) -> PResult<TypeId> {
        let start = self.span_here();
        let mut terms = Vec::new();
        loop {
            let tilde_pos = self.eat(&Tok::Tilde);
            let typ = self.type_()?;
            terms.push(TypeTerm { tilde_pos, typ });
            if self.eat(&Tok::Pipe).is_none() {
                break;
            }
        }

        if let [TypeTerm {
            tilde_pos: None,
            typ,
        }] = terms[..]
        {
            return Ok(typ);
        }
        let terms = self.arena.list_type_terms(terms);
        Ok(self.alloc_type(Type::Union { terms }, start))
    }
}
