//! Fragment (mixin) model: member markers, lifecycle phase and the
//! descriptor the registry sees.

use crate::constants::CTOR;
use crate::error::{Result, Site, WeftError};
use crate::ir::{Access, ClassNode, FieldNode, MethodNode};
use crate::registry::{ClassInfo, MemberKey, MemberKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default fragment priority; lower values apply first.
pub const DEFAULT_PRIORITY: i32 = 1000;

/// Annotation-derived role of a fragment member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Marker {
    /// No marker: merged into the target as-is.
    #[default]
    Plain,
    /// Stand-in for a member that already exists in the target.
    Shadow {
        /// Prefix to strip, overriding the configured default.
        #[serde(default)]
        prefix: Option<String>,
        /// Alternative target names, tried in order after the member's own.
        #[serde(default)]
        aliases: Vec<String>,
    },
    /// Replaces a method that exists in the target.
    Overwrite {
        /// Alternative target names.
        #[serde(default)]
        aliases: Vec<String>,
    },
    /// Must not collide with anything in the target.
    Unique,
    /// Abstract getter or setter for a target field.
    Accessor {
        /// Explicit target name; inflected from the method name if absent.
        #[serde(default)]
        target: Option<String>,
    },
    /// Abstract proxy for a target method.
    Invoker {
        /// Explicit target name; inflected from the method name if absent.
        #[serde(default)]
        target: Option<String>,
    },
    /// Code injected into a target method, given as `name` or `name(desc)`.
    Injector {
        /// Target method reference.
        target: String,
    },
    /// Method implementing a soft interface under a prefixed name.
    SoftImplementsAlias {
        /// The soft-implemented interface whose prefix applies.
        interface: String,
    },
}

impl Marker {
    /// Annotation-style label used in diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            Marker::Plain => "(none)",
            Marker::Shadow { .. } => "@Shadow",
            Marker::Overwrite { .. } => "@Overwrite",
            Marker::Unique => "@Unique",
            Marker::Accessor { .. } => "@Accessor",
            Marker::Invoker { .. } => "@Invoker",
            Marker::Injector { .. } => "@Inject",
            Marker::SoftImplementsAlias { .. } => "@Implements",
        }
    }

    /// True for markers that bind the member to an existing target member.
    pub fn binds_target(&self) -> bool {
        matches!(
            self,
            Marker::Shadow { .. }
                | Marker::Overwrite { .. }
                | Marker::Unique
                | Marker::Accessor { .. }
                | Marker::Invoker { .. }
        )
    }

    /// Aliases declared by `@Shadow` / `@Overwrite`; empty otherwise.
    pub fn aliases(&self) -> &[String] {
        match self {
            Marker::Shadow { aliases, .. } | Marker::Overwrite { aliases } => aliases,
            _ => &[],
        }
    }
}

/// Soft interface declaration: members starting with `prefix` implement
/// `interface` once the prefix is removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftImplements {
    /// Interface internal name.
    pub interface: String,
    /// Member name prefix, e.g. `entity$`.
    pub prefix: String,
}

/// Where an injector lands after conform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InjectionPoint {
    /// Target method name as written.
    pub name: String,
    /// Target method descriptor as written, if given.
    pub desc: Option<String>,
    /// Name found in the target, if the reference resolved.
    pub resolved: Option<String>,
}

impl InjectionPoint {
    /// Splits `name(desc)` into its parts; a bare name has no descriptor.
    pub fn parse(reference: &str) -> Self {
        let (name, desc) = match reference.find('(') {
            Some(open) => (&reference[..open], Some(reference[open..].to_owned())),
            None => (reference, None),
        };
        Self {
            name: name.to_owned(),
            desc,
            resolved: None,
        }
    }
}

/// A method declared in a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentMethod {
    /// The method as parsed.
    #[serde(flatten)]
    pub node: MethodNode,
    /// Role of the method.
    #[serde(default)]
    pub marker: Marker,
    #[serde(skip)]
    pub(crate) declared: Option<MemberKey>,
    #[serde(skip)]
    pub(crate) injection: Option<InjectionPoint>,
}

impl FragmentMethod {
    /// Wraps a method with a marker.
    pub fn new(node: MethodNode, marker: Marker) -> Self {
        Self {
            node,
            marker,
            declared: None,
            injection: None,
        }
    }

    /// Name as authored, before any rename.
    pub fn declared_name(&self) -> &str {
        self.declared
            .as_ref()
            .map_or(self.node.name.as_str(), |k| k.name.as_str())
    }

    /// Identity of this member as authored in `owner`.
    pub(crate) fn key(&self, owner: &str) -> MemberKey {
        self.declared.clone().unwrap_or_else(|| {
            MemberKey::new(owner, MemberKind::Method, &self.node.name, &self.node.desc)
        })
    }

    /// Injection point after conform.
    pub fn injection(&self) -> Option<&InjectionPoint> {
        self.injection.as_ref()
    }

    /// True for constructors.
    pub fn is_constructor(&self) -> bool {
        self.node.name == CTOR
    }
}

/// A field declared in a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentField {
    /// The field as parsed.
    #[serde(flatten)]
    pub node: FieldNode,
    /// Role of the field.
    #[serde(default)]
    pub marker: Marker,
    /// Declared `@Final`: the shadow is expected to match a final target field.
    #[serde(default)]
    pub decorated_final: bool,
    #[serde(skip)]
    pub(crate) declared: Option<MemberKey>,
}

impl FragmentField {
    /// Wraps a field with a marker.
    pub fn new(node: FieldNode, marker: Marker) -> Self {
        Self {
            node,
            marker,
            decorated_final: false,
            declared: None,
        }
    }

    /// Identity of this member as authored in `owner`.
    pub(crate) fn key(&self, owner: &str) -> MemberKey {
        self.declared.clone().unwrap_or_else(|| {
            MemberKey::new(owner, MemberKind::Field, &self.node.name, &self.node.desc)
        })
    }

    /// Builder-style `@Final`.
    pub fn with_final(mut self) -> Self {
        self.decorated_final = true;
        self
    }

    /// Name as authored, before any rename.
    pub fn declared_name(&self) -> &str {
        self.declared
            .as_ref()
            .map_or(self.node.name.as_str(), |k| k.name.as_str())
    }
}

/// Lifecycle of a fragment (or of one per-target copy of it).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Freshly parsed.
    #[default]
    Unprepared,
    /// Target-independent work done; may be instantiated per target.
    Prepared,
    /// Merged into a target; terminal.
    Attached,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Unprepared => write!(f, "unprepared"),
            Phase::Prepared => write!(f, "prepared"),
            Phase::Attached => write!(f, "attached"),
        }
    }
}

/// A fragment class to be merged into one or more targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    /// Internal name.
    pub name: String,
    /// Declared super class.
    #[serde(default)]
    pub super_name: Option<String>,
    /// Directly implemented interfaces.
    #[serde(default)]
    pub interfaces: Vec<String>,
    /// Target classes, by internal name.
    pub targets: Vec<String>,
    /// Ordering among fragments sharing a target; lower first.
    #[serde(default = "default_priority")]
    pub priority: i32,
    /// Class-level `@Unique`: every member is unique.
    #[serde(default)]
    pub unique: bool,
    /// Soft interface table.
    #[serde(default)]
    pub soft_implements: Vec<SoftImplements>,
    /// Methods in declaration order.
    #[serde(default)]
    pub methods: Vec<FragmentMethod>,
    /// Fields in declaration order.
    #[serde(default)]
    pub fields: Vec<FragmentField>,
    #[serde(skip)]
    pub(crate) phase: Phase,
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

impl Fragment {
    /// Creates an empty fragment for the given targets.
    pub fn new(name: &str, targets: &[&str]) -> Self {
        Self {
            name: name.to_owned(),
            super_name: None,
            interfaces: Vec::new(),
            targets: targets.iter().map(|t| (*t).to_owned()).collect(),
            priority: DEFAULT_PRIORITY,
            unique: false,
            soft_implements: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            phase: Phase::Unprepared,
        }
    }

    /// Appends a method.
    pub fn with_method(mut self, node: MethodNode, marker: Marker) -> Self {
        self.methods.push(FragmentMethod::new(node, marker));
        self
    }

    /// Appends a field.
    pub fn with_field(mut self, field: FragmentField) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a soft interface.
    pub fn with_soft_implements(mut self, interface: &str, prefix: &str) -> Self {
        self.soft_implements.push(SoftImplements {
            interface: interface.to_owned(),
            prefix: prefix.to_owned(),
        });
        self
    }

    /// Marks the whole fragment `@Unique`.
    pub fn with_unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the super class.
    pub fn with_super(mut self, super_name: &str) -> Self {
        self.super_name = Some(super_name.to_owned());
        self
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Site for diagnostics about this fragment, naming its declared targets.
    pub fn site(&self) -> Site {
        Site::fragment(&self.name).declared_targets(&self.targets)
    }

    /// A plain class node with the fragment's members, as authored.
    pub fn class_node(&self) -> ClassNode {
        ClassNode {
            name: self.name.clone(),
            super_name: self.super_name.clone(),
            interfaces: self.interfaces.clone(),
            access: Access::PUBLIC,
            methods: self.methods.iter().map(|m| m.node.clone()).collect(),
            fields: self.fields.iter().map(|f| f.node.clone()).collect(),
        }
    }

    /// Registry descriptor, carrying the `@Unique` and `@Final` flags.
    pub fn class_info(&self) -> ClassInfo {
        let mut info = ClassInfo::from_node(&self.class_node(), true);
        for (member, method) in info.members_mut(MemberKind::Method).iter_mut().zip(&self.methods) {
            member.unique = self.unique || method.marker == Marker::Unique;
        }
        for (member, field) in info.members_mut(MemberKind::Field).iter_mut().zip(&self.fields) {
            member.unique = self.unique || field.marker == Marker::Unique;
            member.decorated_final = field.decorated_final;
        }
        info
    }

    /// A fresh working copy for one target.
    ///
    /// Fails unless the fragment is prepared.
    pub fn instantiate(&self) -> Result<Fragment> {
        match self.phase {
            Phase::Prepared => Ok(self.clone()),
            phase => Err(WeftError::IllegalState {
                fragment: self.name.clone(),
                message: format!("cannot instantiate a {phase} fragment"),
            }),
        }
    }

    /// Stamps the authored identity of every member. Idempotent.
    pub(crate) fn record_declared(&mut self) {
        for method in &mut self.methods {
            if method.declared.is_none() {
                method.declared = Some(MemberKey::new(
                    &self.name,
                    MemberKind::Method,
                    &method.node.name,
                    &method.node.desc,
                ));
            }
        }
        for field in &mut self.fields {
            if field.declared.is_none() {
                field.declared = Some(MemberKey::new(
                    &self.name,
                    MemberKind::Field,
                    &field.node.name,
                    &field.node.desc,
                ));
            }
        }
    }
}
