//! Structural model of a Go file's struct and interface declarations.

use serde::{Deserialize, Serialize};

/// Channel direction as written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChanDir {
    /// `chan<- T`
    Send,
    /// `<-chan T`
    Recv,
    /// `chan T`
    Both,
}

impl From<go_syntax::ast::ChanDir> for ChanDir {
    fn from(dir: go_syntax::ast::ChanDir) -> Self {
        use go_syntax::ast::ChanDir as Syn;
        match dir {
            Syn::Send => ChanDir::Send,
            Syn::Recv => ChanDir::Recv,
            Syn::Both => ChanDir::Both,
        }
    }
}

/// A function-typed member: a struct field of func type, an interface
/// method, or a func-typed parameter or result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Func {
    pub name: String,
    pub params: FieldList,
    pub results: FieldList,
}

/// One struct field, interface method, parameter or result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Field {
    /// A member whose type is a bare identifier. `name` is empty for
    /// embedded members and unnamed parameters.
    Named { name: String, type_name: String },
    Func(Func),
    /// A channel; `elem` describes the element type and is never named.
    Chan { dir: ChanDir, elem: Box<Field> },
}

impl Field {
    /// The member name, or `""` for channels and anonymous members.
    pub fn name(&self) -> &str {
        match self {
            Field::Named { name, .. } => name,
            Field::Func(f) => &f.name,
            Field::Chan { .. } => "",
        }
    }
}

/// Ordered, append-only list of fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldList(Vec<Field>);

impl FieldList {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, field: Field) {
        self.0.push(field);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Field> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Field] {
        &self.0
    }
}

impl std::ops::Index<usize> for FieldList {
    type Output = Field;

    fn index(&self, index: usize) -> &Field {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a FieldList {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Field> for FieldList {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A declared struct type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Struct {
    pub name: String,
    pub fields: FieldList,
}

/// A declared interface type. Methods are `Func` fields; embedded
/// interfaces are `Named` fields with an empty name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    pub methods: FieldList,
}

/// Declarations of one source file, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub name: String,
    pub structs: Vec<Struct>,
    pub interfaces: Vec<Interface>,
}

impl File {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn find_struct(&self, name: &str) -> Option<&Struct> {
        self.structs.iter().find(|s| s.name == name)
    }

    pub fn find_interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.name == name)
    }
}

/// Every member file of a package, in resolver order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub files: Vec<File>,
}
