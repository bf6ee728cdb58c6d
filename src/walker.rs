use go_syntax::ast::{
    AstArena, DeclId, FieldId, FuncDeclId, InterfaceElem, SignatureId, Type, TypeId, TypeSpecId,
};
use go_syntax::walk::{Visitor, Walk};
use tracing::trace;

use crate::classify::Classifier;
use crate::error::ClassifyError;
use crate::model::{Field, FieldList, File, Interface, Struct};

/// The first classification failure and the declaration it occurred in.
#[derive(Debug)]
pub(crate) struct WalkFailure {
    pub decl: String,
    pub error: ClassifyError,
}

/// Collects struct and interface declarations into a [`File`].
///
/// Entries are appended before their members are classified, so after a
/// failure the partial model ends with the offending declaration. The first
/// failure stops the walk.
pub(crate) struct DeclWalker<'a> {
    classifier: Classifier<'a>,
    file: File,
    failure: Option<WalkFailure>,
}

impl<'a> DeclWalker<'a> {
    pub fn new(classifier: Classifier<'a>, file: File) -> Self {
        Self {
            classifier,
            file,
            failure: None,
        }
    }

    pub fn finish(self) -> (File, Option<WalkFailure>) {
        (self.file, self.failure)
    }

    fn fail(&mut self, decl: &str, error: ClassifyError) {
        trace!(decl, %error, "classification failed");
        self.failure = Some(WalkFailure {
            decl: decl.to_owned(),
            error,
        });
    }

    fn add_struct(&mut self, name: &str, fields: &[FieldId]) {
        trace!(decl = name, fields = fields.len(), "struct");
        self.file.structs.push(Struct {
            name: name.to_owned(),
            fields: FieldList::new(),
        });
        for &id in fields {
            let field = match self.classifier.entry(id) {
                Ok(field) => field,
                Err(e) => return self.fail(name, e),
            };
            if let Some(entry) = self.file.structs.last_mut() {
                entry.fields.push(field);
            }
        }
    }

    fn add_interface(&mut self, name: &str, elems: &[InterfaceElem]) {
        trace!(decl = name, methods = elems.len(), "interface");
        self.file.interfaces.push(Interface {
            name: name.to_owned(),
            methods: FieldList::new(),
        });
        for elem in elems {
            let field = match *elem {
                InterfaceElem::Method { name: method, sig } => {
                    let method = self.classifier.name(method).to_owned();
                    self.classifier.func(method, sig).map(Field::Func)
                }
                InterfaceElem::Embed(typ) => self.classifier.field(String::new(), typ),
            };
            let field = match field {
                Ok(field) => field,
                Err(e) => return self.fail(name, e),
            };
            if let Some(entry) = self.file.interfaces.last_mut() {
                entry.methods.push(field);
            }
        }
    }
}

impl<'a> Visitor<'a> for DeclWalker<'a> {
    fn visit_decl(&mut self, a: &'a AstArena, id: DeclId) {
        if self.failure.is_none() {
            a.decls[id].walk(a, self);
        }
    }

    fn visit_func_decl(&mut self, a: &'a AstArena, id: FuncDeclId) {
        if self.failure.is_none() {
            a.funcs[id].walk(a, self);
        }
    }

    fn visit_type_spec(&mut self, a: &'a AstArena, id: TypeSpecId) {
        if self.failure.is_some() {
            return;
        }
        let spec = &a.type_specs[id];
        let name = self.classifier.name(spec.name);
        match a.types[spec.typ] {
            Type::Struct { fields, .. } => self.add_struct(name, a.fields_list(fields)),
            Type::Interface { elems, .. } => self.add_interface(name, a.interface_elems(elems)),
            _ => {}
        }
    }

    // Type expressions hold no declarations.
    fn visit_type(&mut self, _: &'a AstArena, _: TypeId) {}

    fn visit_field(&mut self, _: &'a AstArena, _: FieldId) {}

    fn visit_signature(&mut self, _: &'a AstArena, _: SignatureId) {}
}
