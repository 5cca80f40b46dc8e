use super::PreProcessor;
use crate::context::TargetContext;
use crate::error::{Result, WeftError};
use crate::fragment::Fragment;
use crate::plan::Rewrite;
use crate::registry::MemberKind;
use tracing::trace;

impl PreProcessor<'_> {
    /// Rewrites every member reference in the retained method bodies to the
    /// name the member has in this target.
    ///
    /// Per-target renames (staged, then committed) win over the global
    /// name. References whose owner cannot be resolved are left alone.
    pub(super) fn transform(&self, fragment: &mut Fragment, ctx: &mut TargetContext<'_>) -> Result<()> {
        for method in &mut fragment.methods {
            for (index, insn) in method.node.instructions.iter_mut().enumerate() {
                let Some(reference) = insn.member_ref() else {
                    continue;
                };
                let kind = if reference.is_method {
                    MemberKind::Method
                } else {
                    MemberKind::Field
                };
                let handle = match self.registry.find_member(
                    reference.owner,
                    kind,
                    reference.name,
                    reference.desc,
                    true,
                ) {
                    Ok(Some(handle)) => handle,
                    Ok(None) => continue,
                    Err(WeftError::ClassNotFound(owner)) => {
                        trace!(%owner, "skipping reference into unresolvable class");
                        continue;
                    }
                    Err(e) => return Err(e),
                };

                let resolved = ctx
                    .renamed(&handle.info.key())
                    .or_else(|| handle.renamed.then(|| handle.current_name.clone()));
                let Some(name) = resolved else {
                    continue;
                };
                if name == reference.name {
                    continue;
                }

                let owner = reference.owner.to_owned();
                let from = reference.name.to_owned();
                insn.set_name(&name);
                ctx.add_rewrite(Rewrite {
                    method: method.node.name.clone(),
                    index,
                    owner,
                    from,
                    to: name.to_string(),
                });
            }
        }
        Ok(())
    }
}
