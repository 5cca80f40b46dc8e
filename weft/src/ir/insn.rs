//! Instruction stream variants.
//!
//! Only instructions that reference another member by name carry structure;
//! everything else is an opaque mnemonic the engine never touches.

use serde::{Deserialize, Serialize};

/// Dispatch kind of a method invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvokeKind {
    /// Virtual dispatch.
    Virtual,
    /// Constructor, private or super call.
    Special,
    /// Static call.
    Static,
    /// Interface dispatch.
    Interface,
}

/// Kind of field access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOp {
    /// Instance read.
    Get,
    /// Instance write.
    Put,
    /// Static read.
    GetStatic,
    /// Static write.
    PutStatic,
}

/// A single instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Insn {
    /// Method call by (owner, name, descriptor).
    Invoke {
        /// Dispatch kind.
        kind: InvokeKind,
        /// Internal name of the owning class.
        owner: String,
        /// Method name as referenced.
        name: String,
        /// Method descriptor.
        desc: String,
    },
    /// Field access by (owner, name, descriptor).
    Field {
        /// Access kind.
        kind: FieldOp,
        /// Internal name of the owning class.
        owner: String,
        /// Field name as referenced.
        name: String,
        /// Field descriptor.
        desc: String,
    },
    /// Any instruction without a member reference.
    Other {
        /// Mnemonic, e.g. `aload_0`.
        mnemonic: String,
    },
}

/// Borrowed view of an instruction's member reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberRef<'a> {
    /// Owning class.
    pub owner: &'a str,
    /// Referenced name.
    pub name: &'a str,
    /// Descriptor.
    pub desc: &'a str,
    /// True for method references, false for field references.
    pub is_method: bool,
}

impl Insn {
    /// Convenience constructor for a virtual call.
    pub fn invoke_virtual(owner: &str, name: &str, desc: &str) -> Self {
        Self::Invoke {
            kind: InvokeKind::Virtual,
            owner: owner.to_owned(),
            name: name.to_owned(),
            desc: desc.to_owned(),
        }
    }

    /// Convenience constructor for an instance field read.
    pub fn get_field(owner: &str, name: &str, desc: &str) -> Self {
        Self::Field {
            kind: FieldOp::Get,
            owner: owner.to_owned(),
            name: name.to_owned(),
            desc: desc.to_owned(),
        }
    }

    /// Convenience constructor for an opaque instruction.
    pub fn other(mnemonic: &str) -> Self {
        Self::Other {
            mnemonic: mnemonic.to_owned(),
        }
    }

    /// The referenced member, if any.
    pub fn member_ref(&self) -> Option<MemberRef<'_>> {
        match self {
            Self::Invoke {
                owner, name, desc, ..
            } => Some(MemberRef {
                owner,
                name,
                desc,
                is_method: true,
            }),
            Self::Field {
                owner, name, desc, ..
            } => Some(MemberRef {
                owner,
                name,
                desc,
                is_method: false,
            }),
            Self::Other { .. } => None,
        }
    }

    /// Rewrites the referenced name. Returns false for opaque instructions.
    pub fn set_name(&mut self, new_name: &str) -> bool {
        match self {
            Self::Invoke { name, .. } | Self::Field { name, .. } => {
                new_name.clone_into(name);
                true
            }
            Self::Other { .. } => false,
        }
    }
}
