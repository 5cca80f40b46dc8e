//! Instruction-stream IR supplied by the host.
//!
//! The engine never parses class files itself; the host hands over already
//! parsed [`ClassNode`]s for both fragments and targets.

mod access;
pub mod descriptor;
mod insn;

pub use access::Access;
pub use insn::{FieldOp, Insn, InvokeKind, MemberRef};

use serde::{Deserialize, Serialize};

/// A parsed class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassNode {
    /// Internal name (`game/world/Chunk`).
    pub name: String,
    /// Super class internal name; `None` only for the root class.
    #[serde(default)]
    pub super_name: Option<String>,
    /// Implemented interfaces.
    #[serde(default)]
    pub interfaces: Vec<String>,
    /// Class access flags.
    #[serde(default)]
    pub access: Access,
    /// Declared methods, in declaration order.
    #[serde(default)]
    pub methods: Vec<MethodNode>,
    /// Declared fields, in declaration order.
    #[serde(default)]
    pub fields: Vec<FieldNode>,
}

impl ClassNode {
    /// Creates an empty public class.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            super_name: None,
            interfaces: Vec::new(),
            access: Access::PUBLIC,
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Sets the super class.
    pub fn with_super(mut self, super_name: &str) -> Self {
        self.super_name = Some(super_name.to_owned());
        self
    }

    /// Adds an implemented interface.
    pub fn with_interface(mut self, interface: &str) -> Self {
        self.interfaces.push(interface.to_owned());
        self
    }

    /// Sets the class access flags.
    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    /// Appends a method.
    pub fn with_method(mut self, method: MethodNode) -> Self {
        self.methods.push(method);
        self
    }

    /// Appends a field.
    pub fn with_field(mut self, field: FieldNode) -> Self {
        self.fields.push(field);
        self
    }

    /// Simple name: the part after the last `/`.
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }
}

/// The part of an internal name after the last `/`.
pub fn simple_name(internal_name: &str) -> &str {
    internal_name
        .rsplit_once('/')
        .map_or(internal_name, |(_, simple)| simple)
}

/// A method with its instruction stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodNode {
    /// Method name.
    pub name: String,
    /// Method descriptor.
    pub desc: String,
    /// Access flags.
    #[serde(default)]
    pub access: Access,
    /// Body; empty for abstract methods.
    #[serde(default)]
    pub instructions: Vec<Insn>,
}

impl MethodNode {
    /// Creates a method without a body.
    pub fn new(name: &str, desc: &str, access: Access) -> Self {
        Self {
            name: name.to_owned(),
            desc: desc.to_owned(),
            access,
            instructions: Vec::new(),
        }
    }

    /// Replaces the body.
    pub fn with_body(mut self, instructions: Vec<Insn>) -> Self {
        self.instructions = instructions;
        self
    }
}

/// A field declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldNode {
    /// Field name.
    pub name: String,
    /// Field type descriptor.
    pub desc: String,
    /// Access flags.
    #[serde(default)]
    pub access: Access,
}

impl FieldNode {
    /// Creates a field.
    pub fn new(name: &str, desc: &str, access: Access) -> Self {
        Self {
            name: name.to_owned(),
            desc: desc.to_owned(),
            access,
        }
    }
}
