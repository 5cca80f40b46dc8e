use super::{member_site, PreProcessor};
use crate::accessor::AccessorSpec;
use crate::constants::{CLINIT, CTOR, IMAGINARY_SUPER};
use crate::context::TargetContext;
use crate::error::{Result, WeftError};
use crate::fragment::{Fragment, FragmentField, FragmentMethod, Marker, Phase};
use crate::ir::descriptor::{object_type, replace_class};
use crate::ir::Access;
use crate::registry::{MemberHandle, MemberKind};
use tracing::{debug, info, warn};

impl PreProcessor<'_> {
    /// Merges a prepared working copy into the context's target, then
    /// rewrites member references in the retained bodies.
    ///
    /// A copy can be attached once; attaching an unprepared fragment or
    /// re-attaching is an [`WeftError::IllegalState`].
    pub fn attach(&self, fragment: &mut Fragment, ctx: &mut TargetContext<'_>) -> Result<()> {
        Self::require_prepared(fragment, "attach")?;
        fragment.phase = Phase::Attached;

        self.attach_methods(fragment, ctx)?;
        self.attach_fields(fragment, ctx)?;
        self.transform(fragment, ctx)
    }

    fn attach_methods(&self, fragment: &mut Fragment, ctx: &mut TargetContext<'_>) -> Result<()> {
        let unique_fragment = fragment.unique;
        let methods = std::mem::take(&mut fragment.methods);
        let mut retained = Vec::with_capacity(methods.len());

        for mut method in methods {
            if !Self::validate_method(ctx, &method) {
                continue;
            }

            match &method.marker {
                Marker::Injector { .. } => {
                    retained.push(method);
                    continue;
                }
                Marker::Accessor { .. } | Marker::Invoker { .. } => {
                    Self::attach_accessor_method(ctx, &method)?;
                    continue;
                }
                Marker::Shadow { aliases, .. } => {
                    let aliases = aliases.clone();
                    if let Some(target) = Self::attach_special_method(ctx, &mut method, &aliases, false)? {
                        ctx.add_shadow_method(&method, &target);
                    }
                    continue;
                }
                Marker::Overwrite { aliases } => {
                    if unique_fragment {
                        return Err(WeftError::invalid_mixin(
                            member_site(ctx, &method.node.name, &method.node.desc),
                            "@Overwrite method found in a @Unique mixin",
                        ));
                    }
                    let aliases = aliases.clone();
                    if let Some(target) = Self::attach_special_method(ctx, &mut method, &aliases, true)? {
                        ctx.add_overwrite_method(&method, &target);
                        retained.push(method);
                        continue;
                    }
                    warn!(
                        fragment = %ctx.fragment_name(),
                        "@Overwrite target {}{} was not located in {}, merging it as a new method",
                        method.node.name,
                        method.node.desc,
                        ctx.target_name()
                    );
                }
                _ => {}
            }

            if self.attach_unique_method(ctx, unique_fragment, &mut method)? {
                continue;
            }
            self.attach_plain_method(ctx, &mut method);
            retained.push(method);
        }

        fragment.methods = retained;
        Ok(())
    }

    /// Returns false if the method is dropped without further processing.
    fn validate_method(ctx: &mut TargetContext<'_>, method: &FragmentMethod) -> bool {
        let (name, desc) = (method.node.name.as_str(), method.node.desc.as_str());
        let initializer = name == CTOR || name == CLINIT;
        if initializer && method.marker.binds_target() {
            let reason = format!("{} cannot be applied to an initializer", method.marker.label());
            warn!(
                fragment = %ctx.fragment_name(),
                "Dropping {name}{desc} from {}: {reason}",
                ctx.target_name()
            );
            ctx.discard(MemberKind::Method, name, desc, reason);
            return false;
        }
        true
    }

    fn attach_accessor_method(ctx: &mut TargetContext<'_>, method: &FragmentMethod) -> Result<()> {
        let site = member_site(ctx, &method.node.name, &method.node.desc);
        let label = method.marker.label();
        if !method.node.access.is_abstract() {
            return Err(WeftError::invalid_accessor(
                site,
                format!("{label} method {} is not abstract", method.node.name),
            ));
        }
        if method.node.access.is_static() {
            return Err(WeftError::invalid_accessor(
                site,
                format!("{label} method {} cannot be static", method.node.name),
            ));
        }

        let spec = AccessorSpec::from_method(&method.node, &method.marker)
            .map_err(|message| WeftError::invalid_accessor(site.clone(), message))?;

        let target = if spec.kind.is_field() {
            ctx.find_field(&spec.target_name, &[])
                .filter(|h| h.info.desc == spec.target_desc)
                .or_else(|| ctx.find_remapped_field(&spec.target_name, &spec.target_desc))
        } else {
            ctx.find_method(&spec.target_name, &spec.target_desc, &[])
                .or_else(|| ctx.find_remapped_method(&spec.target_name, &spec.target_desc))
        };
        let Some(target) = target else {
            return Err(WeftError::invalid_accessor(
                site,
                format!(
                    "could not locate {} target {} {} in {}",
                    spec.kind,
                    spec.target_name,
                    spec.target_desc,
                    ctx.target_name()
                ),
            ));
        };

        debug!(
            fragment = %ctx.fragment_name(),
            "{label} {} -> {} {}",
            method.node.name,
            spec.kind,
            target.name()
        );
        ctx.add_accessor_method(method, &spec, &target);
        Ok(())
    }

    /// Resolves a `@Shadow` or `@Overwrite` method against the target.
    ///
    /// Shadows fall back to the remapper and fail if still unresolved;
    /// overwrites return `None` instead. Only shadows require an aliased
    /// target to be private.
    fn attach_special_method(
        ctx: &mut TargetContext<'_>,
        method: &mut FragmentMethod,
        aliases: &[String],
        overwrite: bool,
    ) -> Result<Option<MemberHandle>> {
        let label = method.marker.label();
        let target = match ctx.find_method(&method.node.name, &method.node.desc, aliases) {
            Some(target) => target,
            None if overwrite => return Ok(None),
            None => {
                let Some(remapped) = ctx.find_remapped_method(&method.node.name, &method.node.desc) else {
                    return Err(WeftError::invalid_mixin(
                        member_site(ctx, &method.node.name, &method.node.desc),
                        format!(
                            "{label} method {} was not located in the target class {}",
                            method.node.name,
                            ctx.target_name()
                        ),
                    ));
                };
                rename_method(ctx, method, remapped.name());
                remapped
            }
        };

        if target.name() == CTOR {
            return Err(WeftError::invalid_mixin(
                member_site(ctx, &method.node.name, &method.node.desc),
                format!("{label} method {} cannot alias a constructor", method.node.name),
            ));
        }

        if target.name() != method.node.name {
            if !overwrite && !target.info.is_private() {
                return Err(WeftError::invalid_mixin(
                    member_site(ctx, &method.node.name, &method.node.desc),
                    format!("Non-private method cannot be aliased. Found {}", target.info.key()),
                ));
            }
            rename_method(ctx, method, target.name());
        }

        Ok(Some(target))
    }

    /// Handles unique members. Returns true if the method is discarded.
    fn attach_unique_method(
        &self,
        ctx: &mut TargetContext<'_>,
        unique_fragment: bool,
        method: &mut FragmentMethod,
    ) -> Result<bool> {
        if !unique_fragment && method.marker != Marker::Unique {
            return Ok(false);
        }
        let Some(target) = ctx.find_method(&method.node.name, &method.node.desc, &[]) else {
            return Ok(false);
        };

        if method.node.access.intersects(Access::PRIVATE | Access::PROTECTED) {
            let unique = ctx.unique_name(method.declared_name(), &method.node.desc);
            self.log_unique_rename(ctx, MemberKind::Method, &method.node.name, &unique);
            rename_method(ctx, method, &unique);
            return Ok(false);
        }

        if self.options.strict_unique {
            return Err(WeftError::invalid_mixin(
                member_site(ctx, &method.node.name, &method.node.desc),
                format!(
                    "Method conflict, @Unique method {}{} in {} cannot overwrite {}",
                    method.node.name,
                    method.node.desc,
                    ctx.fragment_name(),
                    target.info.key()
                ),
            ));
        }

        warn!(
            fragment = %ctx.fragment_name(),
            "Discarding @Unique public method {}{} because it already exists in {}",
            method.node.name,
            method.node.desc,
            ctx.target_name()
        );
        ctx.discard(
            MemberKind::Method,
            &method.node.name,
            &method.node.desc,
            format!("collides with {}", target.info.key()),
        );
        Ok(true)
    }

    /// An override of a renamed parent method adopts the parent's name.
    fn attach_plain_method(&self, ctx: &mut TargetContext<'_>, method: &mut FragmentMethod) {
        if method.node.name == CTOR || method.node.name == CLINIT {
            return;
        }
        let Some(parent) = self.registry.find_in_hierarchy(
            ctx.fragment_name(),
            MemberKind::Method,
            &method.node.name,
            &method.node.desc,
        ) else {
            return;
        };
        if parent.renamed && parent.name() != method.node.name {
            rename_method(ctx, method, parent.name());
        }
    }

    fn attach_fields(&self, fragment: &mut Fragment, ctx: &mut TargetContext<'_>) -> Result<()> {
        let unique_fragment = fragment.unique;
        let fields = std::mem::take(&mut fragment.fields);
        let mut retained = Vec::with_capacity(fields.len());

        for mut field in fields {
            if !Self::validate_field(ctx, &field)? {
                continue;
            }
            field.node.desc = replace_class(&field.node.desc, ctx.fragment_name(), ctx.target_name());

            let shadow = matches!(field.marker, Marker::Shadow { .. });
            let target = match ctx.find_field(&field.node.name, field.marker.aliases()) {
                Some(target) => target,
                None if !shadow => {
                    retained.push(field);
                    continue;
                }
                None => {
                    let Some(remapped) = ctx.find_remapped_field(&field.node.name, &field.node.desc) else {
                        return Err(WeftError::invalid_mixin(
                            member_site(ctx, &field.node.name, &field.node.desc),
                            format!(
                                "@Shadow field {} was not located in the target class {}",
                                field.node.name,
                                ctx.target_name()
                            ),
                        ));
                    };
                    rename_field(ctx, &mut field, remapped.name());
                    remapped
                }
            };

            if !shadow && (unique_fragment || field.marker == Marker::Unique) {
                if field.node.access.intersects(Access::PRIVATE | Access::PROTECTED) {
                    let unique = ctx.unique_name(field.declared_name(), &field.node.desc);
                    self.log_unique_rename(ctx, MemberKind::Field, &field.node.name, &unique);
                    rename_field(ctx, &mut field, &unique);
                    retained.push(field);
                    continue;
                }
                if self.options.strict_unique {
                    return Err(WeftError::invalid_mixin(
                        member_site(ctx, &field.node.name, &field.node.desc),
                        format!(
                            "Field conflict, @Unique field {}:{} in {} cannot overwrite {}",
                            field.node.name,
                            field.node.desc,
                            ctx.fragment_name(),
                            target.info.key()
                        ),
                    ));
                }
                warn!(
                    fragment = %ctx.fragment_name(),
                    "Discarding @Unique public field {} because it already exists in {}",
                    field.node.name,
                    ctx.target_name()
                );
                ctx.discard(
                    MemberKind::Field,
                    &field.node.name,
                    &field.node.desc,
                    format!("collides with {}", target.info.key()),
                );
                continue;
            }

            if target.info.desc != field.node.desc {
                return Err(WeftError::invalid_mixin(
                    member_site(ctx, &field.node.name, &field.node.desc),
                    format!(
                        "The field {} in the target class has a conflicting signature {}",
                        target.name(),
                        target.info.desc
                    ),
                ));
            }

            if target.name() != field.node.name {
                let access = target.info.access;
                if !access.is_private() && !access.is_synthetic() {
                    return Err(WeftError::invalid_mixin(
                        member_site(ctx, &field.node.name, &field.node.desc),
                        format!("Non-private field cannot be aliased. Found {}", target.info.key()),
                    ));
                }
                rename_field(ctx, &mut field, target.name());
            }

            if shadow {
                if self.options.verbose && target.info.access.is_final() != field.decorated_final {
                    warn!(
                        fragment = %ctx.fragment_name(),
                        "@Shadow field {} {} @Final but the target field {}",
                        field.node.name,
                        if field.decorated_final { "is" } else { "is not" },
                        if target.info.access.is_final() { "is final" } else { "is not final" }
                    );
                }
                ctx.add_shadow_field(&field, &target);
            } else {
                debug!(
                    fragment = %ctx.fragment_name(),
                    "field {} merges into existing {}",
                    field.node.name,
                    target.info.key()
                );
            }
        }

        fragment.fields = retained;
        Ok(())
    }

    /// Returns false if the field is stripped without further processing.
    fn validate_field(ctx: &mut TargetContext<'_>, field: &FragmentField) -> Result<bool> {
        let access = field.node.access;
        let (name, desc) = (field.node.name.as_str(), field.node.desc.as_str());

        if name == IMAGINARY_SUPER {
            if access != Access::PRIVATE {
                return Err(WeftError::invalid_mixin(
                    member_site(ctx, name, desc),
                    format!("Imaginary super field {name} must be private and non-final"),
                ));
            }
            if desc != object_type(ctx.fragment_name()) {
                return Err(WeftError::invalid_mixin(
                    member_site(ctx, name, desc),
                    format!("Imaginary super field {name} must have the same type as the parent mixin"),
                ));
            }
            ctx.discard(MemberKind::Field, name, desc, "imaginary super field");
            return Ok(false);
        }

        let shadow = matches!(field.marker, Marker::Shadow { .. });
        if access.is_static() && !access.is_private() && !access.is_synthetic() && !shadow {
            return Err(WeftError::invalid_mixin(
                member_site(ctx, name, desc),
                format!("Mixin contains non-private static field {name}:{desc}"),
            ));
        }
        Ok(true)
    }

    fn log_unique_rename(&self, ctx: &TargetContext<'_>, kind: MemberKind, from: &str, to: &str) {
        if self.options.verbose {
            info!(
                fragment = %ctx.fragment_name(),
                "Renaming @Unique {kind} {from} to {to} in {}",
                ctx.target_name()
            );
        } else {
            debug!(
                fragment = %ctx.fragment_name(),
                "Renaming @Unique {kind} {from} to {to} in {}",
                ctx.target_name()
            );
        }
    }
}

fn rename_method(ctx: &mut TargetContext<'_>, method: &mut FragmentMethod, to: &str) {
    let key = method.key(ctx.fragment_name());
    ctx.stage_rename(&key, &method.node.name, to);
    to.clone_into(&mut method.node.name);
}

fn rename_field(ctx: &mut TargetContext<'_>, field: &mut FragmentField, to: &str) {
    let key = field.key(ctx.fragment_name());
    ctx.stage_rename(&key, &field.node.name, to);
    to.clone_into(&mut field.node.name);
}
