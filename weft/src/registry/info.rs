//! Class and member descriptors held by the registry.

use crate::ir::{Access, ClassNode};
use compact_str::CompactString;
use serde::Serialize;
use std::fmt;

/// Whether a member is a method or a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    /// A method.
    Method,
    /// A field.
    Field,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Method => write!(f, "method"),
            MemberKind::Field => write!(f, "field"),
        }
    }
}

/// A declared member as the registry sees it.
///
/// The declared name never changes; renames are kept in the registry's
/// ledger and looked up by [`MemberInfo::key`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    /// Internal name of the declaring class.
    pub owner: CompactString,
    /// Method or field.
    pub kind: MemberKind,
    /// Name as declared.
    pub name: CompactString,
    /// Descriptor.
    pub desc: CompactString,
    /// Access flags.
    pub access: Access,
    /// Declared `@Unique` in a fragment.
    pub unique: bool,
    /// Declared `@Final` in a fragment.
    pub decorated_final: bool,
}

impl MemberInfo {
    /// Ledger key of this member.
    pub fn key(&self) -> MemberKey {
        MemberKey {
            owner: self.owner.clone(),
            kind: self.kind,
            name: self.name.clone(),
            desc: self.desc.clone(),
        }
    }

    /// Whether the member is declared `private`.
    pub fn is_private(&self) -> bool {
        self.access.is_private()
    }

    /// Whether the member is `static`.
    pub fn is_static(&self) -> bool {
        self.access.is_static()
    }

    /// Whether the member has no body.
    pub fn is_abstract(&self) -> bool {
        self.access.is_abstract()
    }
}

/// Identity of a member: declaring class, kind, declared name, descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberKey {
    /// Declaring class.
    pub owner: CompactString,
    /// Method or field.
    pub kind: MemberKind,
    /// Declared name.
    pub name: CompactString,
    /// Descriptor.
    pub desc: CompactString,
}

impl MemberKey {
    /// Builds a key from parts.
    pub fn new(owner: &str, kind: MemberKind, name: &str, desc: &str) -> Self {
        Self {
            owner: owner.into(),
            kind,
            name: name.into(),
            desc: desc.into(),
        }
    }
}

impl fmt::Display for MemberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MemberKind::Method => write!(f, "{}.{}{}", self.owner, self.name, self.desc),
            MemberKind::Field => write!(f, "{}.{}:{}", self.owner, self.name, self.desc),
        }
    }
}

/// Immutable descriptor of a class: own members plus hierarchy references.
#[derive(Debug, Clone)]
pub struct ClassInfo {
    /// Internal name.
    pub name: CompactString,
    /// Super class.
    pub super_name: Option<CompactString>,
    /// Implemented interfaces.
    pub interfaces: Vec<CompactString>,
    /// Class access flags.
    pub access: Access,
    /// True if this class is a fragment (mixin) rather than a real class.
    pub is_mixin: bool,
    /// Declared methods.
    pub methods: Vec<MemberInfo>,
    /// Declared fields.
    pub fields: Vec<MemberInfo>,
}

impl ClassInfo {
    /// Builds a descriptor from a host-supplied node.
    pub fn from_node(node: &ClassNode, is_mixin: bool) -> Self {
        let owner = CompactString::from(node.name.as_str());
        let member = |kind, name: &str, desc: &str, access| MemberInfo {
            owner: owner.clone(),
            kind,
            name: name.into(),
            desc: desc.into(),
            access,
            unique: false,
            decorated_final: false,
        };
        Self {
            name: owner.clone(),
            super_name: node.super_name.as_deref().map(CompactString::from),
            interfaces: node
                .interfaces
                .iter()
                .map(|i| CompactString::from(i.as_str()))
                .collect(),
            access: node.access,
            is_mixin,
            methods: node
                .methods
                .iter()
                .map(|m| member(MemberKind::Method, &m.name, &m.desc, m.access))
                .collect(),
            fields: node
                .fields
                .iter()
                .map(|f| member(MemberKind::Field, &f.name, &f.desc, f.access))
                .collect(),
        }
    }

    /// Declared members of the given kind.
    pub fn members(&self, kind: MemberKind) -> &[MemberInfo] {
        match kind {
            MemberKind::Method => &self.methods,
            MemberKind::Field => &self.fields,
        }
    }

    /// Mutable access used while building fragment descriptors.
    pub(crate) fn members_mut(&mut self, kind: MemberKind) -> &mut Vec<MemberInfo> {
        match kind {
            MemberKind::Method => &mut self.methods,
            MemberKind::Field => &mut self.fields,
        }
    }

    /// True if this is an interface.
    pub fn is_interface(&self) -> bool {
        self.access.contains(Access::INTERFACE)
    }

    /// Finds a declared member by its declared name and descriptor.
    pub fn declared(&self, kind: MemberKind, name: &str, desc: &str) -> Option<&MemberInfo> {
        self.members(kind)
            .iter()
            .find(|m| m.name == name && m.desc == desc)
    }
}
