//! The result of merging one fragment into one target.
//!
//! A [`MergePlan`] is what the host composer consumes: the members to add or
//! overwrite, already renamed and with rewritten bodies, plus records of
//! everything that was resolved, generated or dropped along the way.

use crate::accessor::AccessorKind;
use crate::fragment::InjectionPoint;
use crate::ir::{FieldNode, MethodNode};
use crate::registry::MemberKind;
use serde::Serialize;

/// A shadow member bound to an existing target member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShadowRecord {
    /// Name as authored in the fragment.
    pub declared: String,
    /// Name of the target member.
    pub name: String,
    /// Descriptor.
    pub desc: String,
}

/// A method replacing an existing target method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverwriteRecord {
    /// Name as authored in the fragment.
    pub declared: String,
    /// Name of the overwritten target method.
    pub name: String,
    /// Descriptor.
    pub desc: String,
}

/// A request to generate an accessor or invoker body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessorRecord {
    /// Accessor method name.
    pub method: String,
    /// Accessor method descriptor.
    pub desc: String,
    /// Getter, setter or proxy.
    pub kind: AccessorKind,
    /// Resolved target member name.
    pub target_name: String,
    /// Resolved target member descriptor.
    pub target_desc: String,
}

/// An injector handler and where it lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InjectorRecord {
    /// Handler method name.
    pub method: String,
    /// Handler descriptor.
    pub desc: String,
    /// Target reference after conform.
    pub target: Option<InjectionPoint>,
}

/// A member dropped instead of merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscardedMember {
    /// Method or field.
    pub kind: MemberKind,
    /// Member name.
    pub name: String,
    /// Descriptor.
    pub desc: String,
    /// Why it was dropped.
    pub reason: String,
}

/// A rename applied to a fragment member for this target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameEntry {
    /// Method or field.
    pub kind: MemberKind,
    /// Name before.
    pub from: String,
    /// Name after.
    pub to: String,
    /// Descriptor.
    pub desc: String,
}

/// An instruction whose member reference was rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rewrite {
    /// Method containing the instruction (its final name).
    pub method: String,
    /// Instruction index.
    pub index: usize,
    /// Owner of the referenced member.
    pub owner: String,
    /// Name before.
    pub from: String,
    /// Name after.
    pub to: String,
}

/// Everything the host needs to merge one fragment into one target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergePlan {
    /// Fragment internal name.
    pub fragment: String,
    /// Target internal name.
    pub target: String,
    /// Methods to add, or to replace where an overwrite record names them.
    pub methods: Vec<MethodNode>,
    /// Fields to add.
    pub fields: Vec<FieldNode>,
    /// Shadow methods bound to target methods.
    pub shadow_methods: Vec<ShadowRecord>,
    /// Shadow fields bound to target fields.
    pub shadow_fields: Vec<ShadowRecord>,
    /// Overwritten target methods.
    pub overwrites: Vec<OverwriteRecord>,
    /// Accessor and invoker generation requests.
    pub accessors: Vec<AccessorRecord>,
    /// Injector handlers.
    pub injectors: Vec<InjectorRecord>,
    /// Dropped members.
    pub discarded: Vec<DiscardedMember>,
    /// Per-target renames.
    pub renames: Vec<RenameEntry>,
    /// Applied instruction rewrites.
    pub rewrites: Vec<Rewrite>,
}

impl MergePlan {
    /// A merged method by final name.
    pub fn method(&self, name: &str) -> Option<&MethodNode> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// A merged field by final name.
    pub fn field(&self, name: &str) -> Option<&FieldNode> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// True if a member with this name was discarded.
    pub fn is_discarded(&self, name: &str) -> bool {
        self.discarded.iter().any(|d| d.name == name)
    }

    /// Number of merged members.
    pub fn merged_count(&self) -> usize {
        self.methods.len() + self.fields.len()
    }
}
