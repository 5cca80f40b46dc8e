use super::PreProcessor;
use crate::error::Result;
use crate::fragment::{Fragment, InjectionPoint, Marker};
use crate::registry::{MemberKey, MemberKind};
use crate::rename::TargetClass;
use tracing::{debug, warn};

impl PreProcessor<'_> {
    /// Resolves every injector's target reference against `target`.
    ///
    /// Tries the literal name, then the target's rename table, then the
    /// remapper. A remapped hit is recorded in the rename table. An
    /// unresolved reference is only a warning.
    pub fn conform(&self, fragment: &mut Fragment, target: &TargetClass) -> Result<()> {
        Self::require_prepared(fragment, "conform")?;
        for method in &mut fragment.methods {
            let Marker::Injector { target: reference } = &method.marker else {
                continue;
            };
            let mut point = InjectionPoint::parse(reference);
            point.resolved = self.resolve_injection(&point, target)?;
            match &point.resolved {
                Some(resolved) => debug!(
                    fragment = %fragment.name,
                    "injector {} -> {}.{resolved}",
                    method.node.name,
                    target.name()
                ),
                None => warn!(
                    fragment = %fragment.name,
                    "injector {} target {reference} was not found in {}",
                    method.node.name,
                    target.name()
                ),
            }
            method.injection = Some(point);
        }
        Ok(())
    }

    fn resolve_injection(&self, point: &InjectionPoint, target: &TargetClass) -> Result<Option<String>> {
        let desc = point.desc.as_deref();
        let exists = |name: &str| {
            target
                .info
                .methods
                .iter()
                .any(|m| m.name == name && desc.map_or(true, |d| m.desc == d))
        };

        if exists(&point.name) {
            return Ok(Some(point.name.clone()));
        }

        let key = MemberKey::new(
            target.name(),
            MemberKind::Method,
            &point.name,
            desc.unwrap_or_default(),
        );
        if let Some(renamed) = target.renames.get(&key) {
            if exists(&renamed) {
                return Ok(Some(renamed.to_string()));
            }
        }

        let Some(desc) = desc else {
            return Ok(None);
        };
        let remapped = self
            .remapper
            .remap_method(target.name(), &point.name, desc)
            .into_iter()
            .find(|mapped| exists(mapped));
        if let Some(mapped) = &remapped {
            target.renames.insert(key, mapped)?;
        }
        Ok(remapped)
    }
}
