//! Accessor and invoker signature rules.
//!
//! An accessor is an abstract fragment method standing in for a getter or
//! setter of a target field; an invoker stands in for a call to a target
//! method. Both may name their target explicitly or leave it to be inflected
//! from the method name (`getTickCount` -> `tickCount`).

use crate::constants::{get_accessor_name_re, get_invoker_name_re};
use crate::fragment::Marker;
use crate::ir::descriptor::parse_method_descriptor;
use crate::ir::MethodNode;
use serde::Serialize;
use std::fmt;

/// What an accessor method does with its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessorKind {
    /// Reads a field: no parameters, non-void return.
    FieldGetter,
    /// Writes a field: one parameter, void return.
    FieldSetter,
    /// Calls a method with the accessor's own descriptor.
    MethodProxy,
}

impl AccessorKind {
    /// True for the two field kinds.
    pub fn is_field(self) -> bool {
        matches!(self, AccessorKind::FieldGetter | AccessorKind::FieldSetter)
    }
}

impl fmt::Display for AccessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessorKind::FieldGetter => write!(f, "getter"),
            AccessorKind::FieldSetter => write!(f, "setter"),
            AccessorKind::MethodProxy => write!(f, "invoker"),
        }
    }
}

/// A fully-determined accessor request: kind plus target name and the
/// descriptor the target member must have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessorSpec {
    /// Getter, setter or proxy.
    pub kind: AccessorKind,
    /// Target member name in the fragment's environment.
    pub target_name: String,
    /// Field type for getters/setters; method descriptor for proxies.
    pub target_desc: String,
}

impl AccessorSpec {
    /// Derives the request from an `@Accessor` / `@Invoker` method.
    ///
    /// Returns a human-readable reason when the signature is unusable.
    pub fn from_method(method: &MethodNode, marker: &Marker) -> Result<Self, String> {
        let (explicit, invoker) = match marker {
            Marker::Accessor { target } => (target.as_deref(), false),
            Marker::Invoker { target } => (target.as_deref(), true),
            other => return Err(format!("{} is not an accessor marker", other.label())),
        };

        let desc = parse_method_descriptor(&method.desc)
            .ok_or_else(|| format!("malformed descriptor {}", method.desc))?;

        let (kind, target_desc) = if invoker {
            (AccessorKind::MethodProxy, method.desc.clone())
        } else if desc.is_void() && desc.params.len() == 1 {
            (AccessorKind::FieldSetter, desc.params[0].to_string())
        } else if !desc.is_void() && desc.params.is_empty() {
            (AccessorKind::FieldGetter, desc.ret.to_string())
        } else {
            return Err(format!(
                "{}{} is neither a getter nor a setter",
                method.name, method.desc
            ));
        };

        let target_name = match explicit.filter(|t| !t.is_empty()) {
            Some(name) => name.to_owned(),
            None => inflect_target(&method.name, kind).ok_or_else(|| {
                format!(
                    "no {kind} target specified and none could be inflected from {}",
                    method.name
                )
            })?,
        };

        Ok(Self {
            kind,
            target_name,
            target_desc,
        })
    }
}

/// Inflects the target name from an accessor or invoker method name.
///
/// Getters accept `get`/`is`, setters accept `set`, proxies accept
/// `call`/`invoke`. An all-caps base (`getURL`) is kept as written;
/// otherwise the first letter is lowered.
pub fn inflect_target(method_name: &str, kind: AccessorKind) -> Option<String> {
    let re = match kind {
        AccessorKind::MethodProxy => get_invoker_name_re(),
        _ => get_accessor_name_re(),
    };
    let caps = re.captures(method_name)?;
    let prefix = caps.get(1)?.as_str();
    let prefix_ok = match kind {
        AccessorKind::FieldGetter => prefix == "get" || prefix == "is",
        AccessorKind::FieldSetter => prefix == "set",
        AccessorKind::MethodProxy => true,
    };
    if !prefix_ok {
        return None;
    }
    let base = caps.get(2)?.as_str();
    if base.chars().all(|c| !c.is_lowercase()) {
        return Some(base.to_owned());
    }
    let mut chars = base.chars();
    let first = chars.next()?;
    Some(first.to_lowercase().chain(chars).collect())
}
