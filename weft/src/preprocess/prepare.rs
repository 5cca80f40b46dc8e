use super::PreProcessor;
use crate::error::{Result, WeftError};
use crate::fragment::{Fragment, FragmentMethod, Marker, Phase, SoftImplements};
use crate::ir::descriptor::{is_field_descriptor, parse_method_descriptor};
use crate::registry::{ClassInfo, MemberKind};
use rustc_hash::FxHashSet;
use std::sync::Arc;
use tracing::{debug, warn};

impl PreProcessor<'_> {
    /// Target-independent preparation. A no-op on an already prepared
    /// fragment.
    ///
    /// Validation runs before anything is published, so a failing fragment
    /// leaves the registry untouched.
    pub fn prepare(&self, fragment: &mut Fragment) -> Result<()> {
        if fragment.phase != Phase::Unprepared {
            debug!(fragment = %fragment.name, phase = %fragment.phase, "already prepared");
            return Ok(());
        }

        self.validate_structure(fragment)?;
        let interfaces = fragment
            .soft_implements
            .iter()
            .map(|entry| -> Result<_> {
                Ok((entry.clone(), self.registry.resolve(&entry.interface)?))
            })
            .collect::<Result<Vec<_>>>()?;

        fragment.record_declared();
        let info = self.registry.define(fragment.class_info());
        for method in &mut fragment.methods {
            self.prepare_shadow(&info, method);
            self.prepare_soft_implements(&info, &interfaces, method)?;
        }

        fragment.phase = Phase::Prepared;
        debug!(fragment = %fragment.name, "prepared");
        Ok(())
    }

    fn validate_structure(&self, fragment: &Fragment) -> Result<()> {
        let site = |name: &str, desc: &str| fragment.site().member(name, desc);
        if fragment.targets.is_empty() {
            return Err(WeftError::invalid_mixin(
                fragment.site(),
                "fragment declares no target classes",
            ));
        }

        let mut seen = FxHashSet::default();
        for method in &fragment.methods {
            let (name, desc) = (method.node.name.as_str(), method.node.desc.as_str());
            if parse_method_descriptor(desc).is_none() {
                return Err(WeftError::invalid_mixin(site(name, desc), "malformed method descriptor"));
            }
            if !seen.insert((MemberKind::Method, name, desc)) {
                return Err(WeftError::invalid_mixin(site(name, desc), "duplicate method"));
            }
            match &method.marker {
                Marker::Overwrite { .. } if fragment.unique => {
                    return Err(WeftError::invalid_mixin(
                        site(name, desc),
                        "@Overwrite method found in a @Unique mixin",
                    ));
                }
                Marker::Shadow { prefix, .. } => {
                    let prefix = prefix.as_deref().unwrap_or(&self.options.shadow_prefix);
                    if prefix.is_empty() || name == prefix {
                        return Err(WeftError::invalid_mixin(
                            site(name, desc),
                            format!("@Shadow prefix '{prefix}' leaves no member name"),
                        ));
                    }
                }
                Marker::Injector { target } if target.trim().is_empty() => {
                    return Err(WeftError::invalid_mixin(
                        site(name, desc),
                        "@Inject declares no target method",
                    ));
                }
                Marker::SoftImplementsAlias { interface }
                    if !fragment.soft_implements.iter().any(|s| s.interface == *interface) =>
                {
                    return Err(WeftError::invalid_mixin(
                        site(name, desc),
                        format!("@Implements alias names {interface}, which is not soft-implemented"),
                    ));
                }
                _ => {}
            }
        }

        for field in &fragment.fields {
            let (name, desc) = (field.node.name.as_str(), field.node.desc.as_str());
            if !is_field_descriptor(desc) {
                return Err(WeftError::invalid_mixin(site(name, desc), "malformed field descriptor"));
            }
            if !seen.insert((MemberKind::Field, name, desc)) {
                return Err(WeftError::invalid_mixin(site(name, desc), "duplicate field"));
            }
            if matches!(
                field.marker,
                Marker::Accessor { .. }
                    | Marker::Invoker { .. }
                    | Marker::Overwrite { .. }
                    | Marker::Injector { .. }
                    | Marker::SoftImplementsAlias { .. }
            ) {
                return Err(WeftError::invalid_mixin(
                    site(name, desc),
                    format!("{} is not allowed on fields", field.marker.label()),
                ));
            }
            let prefix = match &field.marker {
                Marker::Shadow {
                    prefix: Some(prefix),
                    ..
                } => prefix.as_str(),
                _ => self.options.shadow_prefix.as_str(),
            };
            if !prefix.is_empty() && name.starts_with(prefix) {
                return Err(WeftError::invalid_mixin(
                    site(name, desc),
                    format!("field {name} has a shadow prefix. This is not allowed."),
                ));
            }
        }
        Ok(())
    }

    fn prepare_shadow(&self, info: &ClassInfo, method: &mut FragmentMethod) {
        let Marker::Shadow { prefix, .. } = &method.marker else {
            return;
        };
        let prefix = prefix.as_deref().unwrap_or(&self.options.shadow_prefix);
        let declared = method.declared_name().to_owned();
        let Some(stripped) = declared.strip_prefix(prefix) else {
            return;
        };
        if let Some(member) = info.declared(MemberKind::Method, &declared, &method.node.desc) {
            method.node.name = self.registry.rename(member, stripped).to_string();
        }
    }

    fn prepare_soft_implements(
        &self,
        info: &ClassInfo,
        interfaces: &[(SoftImplements, Arc<ClassInfo>)],
        method: &mut FragmentMethod,
    ) -> Result<()> {
        let only = match &method.marker {
            Marker::Shadow { .. } => return Ok(()),
            Marker::SoftImplementsAlias { interface } => Some(interface.as_str()),
            _ => None,
        };

        for (entry, interface) in interfaces {
            if only.is_some_and(|i| i != entry.interface) {
                continue;
            }
            let declared = method.declared_name().to_owned();
            let Some(stripped) = declared.strip_prefix(entry.prefix.as_str()) else {
                continue;
            };
            let implemented = self.registry.find_member(
                &interface.name,
                MemberKind::Method,
                stripped,
                &method.node.desc,
                false,
            )?;
            if implemented.is_none() {
                continue;
            }
            if let Some(member) = info.declared(MemberKind::Method, &declared, &method.node.desc) {
                method.node.name = self.registry.rename(member, stripped).to_string();
            }
            return Ok(());
        }

        if let Some(interface) = only {
            warn!(
                fragment = %info.name,
                "{}{} does not implement any method of {interface}",
                method.node.name,
                method.node.desc
            );
        }
        Ok(())
    }
}
