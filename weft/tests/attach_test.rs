//! Tests for attaching a prepared fragment to a target: shadows, overwrites,
//! unique members, accessors, fields and the reference rewrite that follows.

#![allow(clippy::unwrap_used)]

mod common;

use common::{
    abstract_method, apply, calls, first_reference, method, private_method, weaver, weaver_with,
    BAR, ENTITY, FOO,
};
use std::sync::Arc;
use weft::accessor::AccessorKind;
use weft::ir::{Access, FieldNode, Insn, MethodNode};
use weft::registry::{MemberKey, MemberKind};
use weft::{Fragment, FragmentField, MappingTable, Marker, NoRemap, Phase, WeaveOptions, WeftError};

const MIXIN: &str = "mixins/FooMixin";

fn shadow() -> Marker {
    Marker::Shadow {
        prefix: None,
        aliases: Vec::new(),
    }
}

fn shadow_aliased(alias: &str) -> Marker {
    Marker::Shadow {
        prefix: None,
        aliases: vec![alias.to_owned()],
    }
}

fn overwrite() -> Marker {
    Marker::Overwrite {
        aliases: Vec::new(),
    }
}

fn field(name: &str, desc: &str, access: Access, marker: Marker) -> FragmentField {
    FragmentField::new(FieldNode::new(name, desc, access), marker)
}

fn mappings() -> Arc<MappingTable> {
    let mut table = MappingTable::new();
    table.add_method("named", FOO, "spawn", "(I)V", "a").unwrap();
    table.add_field("named", FOO, "speed", "b").unwrap();
    Arc::new(table)
}

// ---------------------------------------------------------------------------
// Shadows
// ---------------------------------------------------------------------------

#[test]
fn test_shadow_method_binds_and_is_not_merged() {
    let weaver = weaver();
    let fragment = Fragment::new(MIXIN, &[FOO])
        .with_method(method("shadow$tick", "()V"), shadow())
        .with_method(
            method("onUpdate", "()V").with_body(calls(MIXIN, "shadow$tick", "()V")),
            Marker::Plain,
        );
    let plan = apply(&weaver, fragment, FOO).unwrap();

    assert_eq!(plan.shadow_methods.len(), 1);
    assert_eq!(plan.shadow_methods[0].declared, "shadow$tick");
    assert_eq!(plan.shadow_methods[0].name, "tick");
    assert!(plan.method("tick").is_none());
    assert!(plan.method("onUpdate").is_some());
    assert_eq!(first_reference(&plan, "onUpdate"), "tick");
    assert_eq!(plan.rewrites.len(), 1);
    assert_eq!(plan.rewrites[0].from, "shadow$tick");
    assert_eq!(plan.rewrites[0].to, "tick");
}

#[test]
fn test_shadow_alias_to_private_member_renames() {
    let weaver = weaver();
    let fragment = Fragment::new(MIXIN, &[FOO])
        .with_method(private_method("doHelp", "()V"), shadow_aliased("helper"))
        .with_method(
            method("go", "()V").with_body(calls(MIXIN, "doHelp", "()V")),
            Marker::Plain,
        );
    let target = weaver.target(FOO).unwrap();
    let plan = apply(&weaver, fragment, FOO).unwrap();

    assert_eq!(plan.shadow_methods[0].name, "helper");
    assert_eq!(first_reference(&plan, "go"), "helper");
    let key = MemberKey::new(MIXIN, MemberKind::Method, "doHelp", "()V");
    assert_eq!(target.renames.get(&key).unwrap(), "helper");
}

#[test]
fn test_shadow_alias_to_public_member_fails_without_side_effects() {
    let weaver = weaver();
    let fragment = Fragment::new(MIXIN, &[FOO])
        .with_method(private_method("doHelp", "()V"), shadow_aliased("helper"))
        .with_method(method("draw", "()V"), shadow_aliased("render"));
    let target = weaver.target(FOO).unwrap();
    let err = apply(&weaver, fragment, FOO).unwrap_err();

    assert!(err.to_string().contains("Non-private method cannot be aliased"), "{err}");
    let site = err.site().unwrap();
    assert_eq!(site.target.as_deref(), Some(FOO));
    assert_eq!(site.member.as_deref(), Some("draw()V"));
    // The earlier, successful alias was staged but never committed.
    assert!(target.renames.is_empty());
}

#[test]
fn test_shadow_not_found() {
    let weaver = weaver();
    let fragment = Fragment::new(MIXIN, &[FOO]).with_method(method("shadow$explode", "()V"), shadow());
    let err = apply(&weaver, fragment, FOO).unwrap_err();
    assert!(matches!(err, WeftError::InvalidMixin { .. }));
    assert!(err.to_string().contains("was not located in the target class game/Foo"));
}

#[test]
fn test_shadow_resolved_through_remapper() {
    let weaver = weaver_with(WeaveOptions::default(), mappings());
    let fragment = Fragment::new(MIXIN, &[FOO])
        .with_method(private_method("spawn", "(I)V"), shadow())
        .with_method(
            method("go", "()V").with_body(calls(MIXIN, "spawn", "(I)V")),
            Marker::Plain,
        );
    let target = weaver.target(FOO).unwrap();
    let plan = apply(&weaver, fragment, FOO).unwrap();

    assert_eq!(plan.shadow_methods[0].name, "a");
    assert_eq!(first_reference(&plan, "go"), "a");
    let key = MemberKey::new(MIXIN, MemberKind::Method, "spawn", "(I)V");
    assert_eq!(target.renames.get(&key).unwrap(), "a");
}

#[test]
fn test_shadow_cannot_alias_constructor() {
    let weaver = weaver();
    let fragment = Fragment::new(MIXIN, &[FOO]).with_method(private_method("create", "()V"), shadow_aliased("<init>"));
    let err = apply(&weaver, fragment, FOO).unwrap_err();
    assert!(err.to_string().contains("cannot alias a constructor"));
}

#[test]
fn test_marker_on_initializer_drops_member() {
    let weaver = weaver();
    let fragment = Fragment::new(MIXIN, &[FOO])
        .with_method(method("<clinit>", "()V"), Marker::Unique)
        .with_method(method("<init>", "()V"), overwrite())
        .with_method(method("extra", "()V"), Marker::Plain);
    let plan = apply(&weaver, fragment, FOO).unwrap();

    assert!(plan.is_discarded("<clinit>"));
    assert!(plan.is_discarded("<init>"));
    assert!(plan.discarded[0].reason.contains("@Unique cannot be applied to an initializer"));
    assert!(plan.method("<clinit>").is_none());
    assert!(plan.method("<init>").is_none());
    assert!(plan.overwrites.is_empty());
    assert!(plan.method("extra").is_some());
}

// ---------------------------------------------------------------------------
// Overwrites
// ---------------------------------------------------------------------------

#[test]
fn test_overwrite_found() {
    let weaver = weaver();
    let fragment = Fragment::new(MIXIN, &[FOO]).with_method(method("render", "()V"), overwrite());
    let plan = apply(&weaver, fragment, FOO).unwrap();
    assert_eq!(plan.overwrites.len(), 1);
    assert_eq!(plan.overwrites[0].name, "render");
    assert!(plan.method("render").is_some());
}

#[test]
fn test_overwrite_missing_target_merges_as_new_method() {
    let weaver = weaver();
    let fragment = Fragment::new(MIXIN, &[FOO]).with_method(method("explode", "()V"), overwrite());
    let plan = apply(&weaver, fragment, FOO).unwrap();
    assert!(plan.overwrites.is_empty());
    assert!(plan.method("explode").is_some());
}

#[test]
fn test_overwrite_does_not_use_remapper() {
    let weaver = weaver_with(WeaveOptions::default(), mappings());
    let fragment = Fragment::new(MIXIN, &[FOO]).with_method(private_method("spawn", "(I)V"), overwrite());
    let plan = apply(&weaver, fragment, FOO).unwrap();
    assert!(plan.overwrites.is_empty());
    assert!(plan.method("spawn").is_some());
    assert!(plan.renames.is_empty());
}

#[test]
fn test_overwrite_alias_to_public_member_renames() {
    let weaver = weaver();
    let fragment = Fragment::new(MIXIN, &[FOO])
        .with_method(
            method("draw", "()V"),
            Marker::Overwrite {
                aliases: vec!["render".to_owned()],
            },
        )
        .with_method(
            method("go", "()V").with_body(calls(MIXIN, "draw", "()V")),
            Marker::Plain,
        );
    let target = weaver.target(FOO).unwrap();
    let plan = apply(&weaver, fragment, FOO).unwrap();

    assert_eq!(plan.overwrites.len(), 1);
    assert_eq!(plan.overwrites[0].declared, "draw");
    assert_eq!(plan.overwrites[0].name, "render");
    assert!(plan.method("render").is_some());
    assert!(plan.method("draw").is_none());
    assert_eq!(first_reference(&plan, "go"), "render");
    let key = MemberKey::new(MIXIN, MemberKind::Method, "draw", "()V");
    assert_eq!(target.renames.get(&key).unwrap(), "render");
}

// ---------------------------------------------------------------------------
// Unique members
// ---------------------------------------------------------------------------

#[test]
fn test_unique_private_collision_renamed() {
    let weaver = weaver();
    let fragment = Fragment::new(MIXIN, &[FOO])
        .with_method(private_method("helper", "()V"), Marker::Unique)
        .with_method(
            method("go", "()V").with_body(calls(MIXIN, "helper", "()V")),
            Marker::Plain,
        );
    let target = weaver.target(FOO).unwrap();
    let plan = apply(&weaver, fragment, FOO).unwrap();

    assert_eq!(plan.renames.len(), 1);
    let unique = plan.renames[0].to.clone();
    assert!(unique.starts_with("FooMixin$helper$"), "{unique}");
    assert_eq!(unique.len(), "FooMixin$helper$".len() + 8);
    assert!(plan.method(&unique).is_some());
    assert!(plan.method("helper").is_none());
    assert_eq!(first_reference(&plan, "go"), unique);

    let key = MemberKey::new(MIXIN, MemberKind::Method, "helper", "()V");
    assert_eq!(target.renames.get(&key).unwrap(), unique.as_str());
}

#[test]
fn test_unique_name_is_deterministic() {
    let name = || {
        let weaver = weaver();
        let fragment = Fragment::new(MIXIN, &[FOO]).with_method(private_method("helper", "()V"), Marker::Unique);
        apply(&weaver, fragment, FOO).unwrap().renames[0].to.clone()
    };
    assert_eq!(name(), name());
}

#[test]
fn test_unique_without_collision_keeps_name() {
    let weaver = weaver();
    let fragment = Fragment::new(MIXIN, &[FOO]).with_method(private_method("fresh", "()V"), Marker::Unique);
    let plan = apply(&weaver, fragment, FOO).unwrap();
    assert!(plan.method("fresh").is_some());
    assert!(plan.renames.is_empty());
}

#[test]
fn test_unique_public_collision_discarded() {
    let weaver = weaver();
    let fragment = Fragment::new(MIXIN, &[FOO]).with_method(method("render", "()V"), Marker::Unique);
    let plan = apply(&weaver, fragment, FOO).unwrap();
    assert!(plan.method("render").is_none());
    assert!(plan.is_discarded("render"));
}

#[test]
fn test_unique_public_collision_strict() {
    let options = WeaveOptions {
        strict_unique: true,
        ..WeaveOptions::default()
    };
    let weaver = weaver_with(options, Arc::new(NoRemap));
    let fragment = Fragment::new(MIXIN, &[FOO]).with_method(method("render", "()V"), Marker::Unique);
    let err = apply(&weaver, fragment, FOO).unwrap_err();
    let text = err.to_string();
    assert!(text.contains("Method conflict"), "{text}");
    assert!(text.contains(MIXIN));
    assert!(text.contains("game/Foo.render()V"));
}

#[test]
fn test_unique_fragment_applies_to_every_member() {
    let weaver = weaver();
    let fragment = Fragment::new(MIXIN, &[FOO])
        .with_unique()
        .with_method(private_method("helper", "()V"), Marker::Plain)
        .with_method(method("render", "()V"), Marker::Plain)
        .with_field(field("count", "I", Access::PRIVATE, Marker::Plain))
        .with_field(field("ticks", "I", Access::PUBLIC, Marker::Plain));
    let plan = apply(&weaver, fragment, FOO).unwrap();

    assert!(plan.method("helper").is_none());
    assert!(plan.methods[0].name.starts_with("FooMixin$helper$"));
    assert!(plan.is_discarded("render"));
    assert!(plan.fields[0].name.starts_with("FooMixin$count$"));
    assert!(plan.is_discarded("ticks"));
}

#[test]
fn test_unique_field_public_collision_strict() {
    let options = WeaveOptions {
        strict_unique: true,
        ..WeaveOptions::default()
    };
    let weaver = weaver_with(options, Arc::new(NoRemap));
    let fragment = Fragment::new(MIXIN, &[FOO]).with_field(field("ticks", "I", Access::PUBLIC, Marker::Unique));
    let err = apply(&weaver, fragment, FOO).unwrap_err();
    assert!(err.to_string().contains("Field conflict"));
}

// ---------------------------------------------------------------------------
// Plain members
// ---------------------------------------------------------------------------

#[test]
fn test_plain_override_adopts_renamed_parent_name() {
    let weaver = weaver();
    let entity = weaver.registry().resolve(ENTITY).unwrap();
    let update = entity.declared(MemberKind::Method, "update", "()V").unwrap();
    weaver.registry().rename(update, "func_update");

    let fragment = Fragment::new(MIXIN, &[FOO])
        .with_super(ENTITY)
        .with_method(method("update", "()V"), Marker::Plain);
    let plan = apply(&weaver, fragment, FOO).unwrap();
    assert!(plan.method("func_update").is_some());
    assert!(plan.method("update").is_none());
}

#[test]
fn test_references_to_unrelated_classes_untouched() {
    let weaver = weaver();
    let body = vec![
        Insn::invoke_virtual("java/lang/Object", "hashCode", "()I"),
        Insn::invoke_virtual(FOO, "tick", "()V"),
        Insn::other("return"),
    ];
    let fragment = Fragment::new(MIXIN, &[FOO]).with_method(method("go", "()V").with_body(body.clone()), Marker::Plain);
    let plan = apply(&weaver, fragment, FOO).unwrap();
    assert_eq!(plan.method("go").unwrap().instructions, body);
    assert!(plan.rewrites.is_empty());
}

#[test]
fn test_every_reference_in_every_body_rewritten() {
    let weaver = weaver();
    let body = || {
        vec![
            Insn::get_field(MIXIN, "count", "I"),
            Insn::other("aload_0"),
            Insn::invoke_virtual(MIXIN, "shadow$tick", "()V"),
            Insn::invoke_virtual(MIXIN, "shadow$tick", "()V"),
            Insn::invoke_virtual(FOO, "render", "()V"),
            Insn::other("return"),
        ]
    };
    let fragment = Fragment::new(MIXIN, &[FOO])
        .with_method(method("shadow$tick", "()V"), shadow())
        .with_field(field("count", "I", Access::PRIVATE, Marker::Unique))
        .with_method(method("go", "()V").with_body(body()), Marker::Plain)
        .with_method(method("go2", "()V").with_body(body()), Marker::Plain);
    let plan = apply(&weaver, fragment, FOO).unwrap();

    let unique = plan
        .renames
        .iter()
        .find(|r| r.kind == MemberKind::Field && r.from == "count")
        .unwrap()
        .to
        .clone();
    assert!(unique.starts_with("FooMixin$count$"));
    let rewrites: Vec<(&str, usize, &str, &str)> = plan
        .rewrites
        .iter()
        .map(|r| (r.method.as_str(), r.index, r.from.as_str(), r.to.as_str()))
        .collect();
    assert_eq!(
        rewrites,
        vec![
            ("go", 0, "count", unique.as_str()),
            ("go", 2, "shadow$tick", "tick"),
            ("go", 3, "shadow$tick", "tick"),
            ("go2", 0, "count", unique.as_str()),
            ("go2", 2, "shadow$tick", "tick"),
            ("go2", 3, "shadow$tick", "tick"),
        ]
    );
    for name in ["go", "go2"] {
        let names: Vec<&str> = plan
            .method(name)
            .unwrap()
            .instructions
            .iter()
            .filter_map(|insn| insn.member_ref().map(|r| r.name))
            .collect();
        assert_eq!(names, vec![unique.as_str(), "tick", "tick", "render"]);
    }
}

// ---------------------------------------------------------------------------
// Accessors and invokers
// ---------------------------------------------------------------------------

#[test]
fn test_accessor_getter_and_setter() {
    let weaver = weaver();
    let fragment = Fragment::new(MIXIN, &[FOO])
        .with_method(abstract_method("getCount", "()I"), Marker::Accessor { target: None })
        .with_method(abstract_method("setTicks", "(I)V"), Marker::Accessor { target: None });
    let plan = apply(&weaver, fragment, FOO).unwrap();

    assert!(plan.methods.is_empty());
    assert_eq!(plan.accessors.len(), 2);
    assert_eq!(plan.accessors[0].kind, AccessorKind::FieldGetter);
    assert_eq!(plan.accessors[0].target_name, "count");
    assert_eq!(plan.accessors[0].target_desc, "I");
    assert_eq!(plan.accessors[1].kind, AccessorKind::FieldSetter);
    assert_eq!(plan.accessors[1].target_name, "ticks");
}

#[test]
fn test_accessor_explicit_target_through_remapper() {
    let weaver = weaver_with(WeaveOptions::default(), mappings());
    let fragment = Fragment::new(MIXIN, &[FOO]).with_method(
        abstract_method("getVelocity", "()F"),
        Marker::Accessor {
            target: Some("speed".to_owned()),
        },
    );
    let plan = apply(&weaver, fragment, FOO).unwrap();
    assert_eq!(plan.accessors[0].target_name, "b");
}

#[test]
fn test_invoker() {
    let weaver = weaver();
    let fragment = Fragment::new(MIXIN, &[FOO])
        .with_method(abstract_method("callSpawnInternal", "(I)V"), Marker::Invoker { target: None });
    let plan = apply(&weaver, fragment, FOO).unwrap();
    assert_eq!(plan.accessors[0].kind, AccessorKind::MethodProxy);
    assert_eq!(plan.accessors[0].target_name, "spawnInternal");
}

#[test]
fn test_accessor_must_be_abstract() {
    let weaver = weaver();
    let fragment = Fragment::new(MIXIN, &[FOO]).with_method(method("getCount", "()I"), Marker::Accessor { target: None });
    let err = apply(&weaver, fragment, FOO).unwrap_err();
    assert!(matches!(err, WeftError::InvalidAccessor { .. }));
    assert!(err.to_string().contains("is not abstract"));
}

#[test]
fn test_accessor_cannot_be_static() {
    let weaver = weaver();
    let node = MethodNode::new("getCount", "()I", Access::PUBLIC | Access::ABSTRACT | Access::STATIC);
    let fragment = Fragment::new(MIXIN, &[FOO]).with_method(node, Marker::Accessor { target: None });
    let err = apply(&weaver, fragment, FOO).unwrap_err();
    assert!(err.to_string().contains("cannot be static"));
}

#[test]
fn test_accessor_target_missing() {
    let weaver = weaver();
    let fragment = Fragment::new(MIXIN, &[FOO])
        .with_method(abstract_method("getHealth", "()I"), Marker::Accessor { target: None });
    let err = apply(&weaver, fragment, FOO).unwrap_err();
    assert!(matches!(err, WeftError::InvalidAccessor { .. }));
    assert!(err.to_string().contains("could not locate getter target health"));
}

#[test]
fn test_accessor_descriptor_must_match() {
    let weaver = weaver();
    let fragment = Fragment::new(MIXIN, &[FOO])
        .with_method(abstract_method("getCount", "()J"), Marker::Accessor { target: None });
    assert!(matches!(
        apply(&weaver, fragment, FOO),
        Err(WeftError::InvalidAccessor { .. })
    ));
}

#[test]
fn test_accessor_bad_signature() {
    let weaver = weaver();
    let fragment = Fragment::new(MIXIN, &[FOO])
        .with_method(abstract_method("getCount", "(I)I"), Marker::Accessor { target: None });
    let err = apply(&weaver, fragment, FOO).unwrap_err();
    assert!(err.to_string().contains("neither a getter nor a setter"));
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

#[test]
fn test_shadow_field() {
    let weaver = weaver();
    let fragment = Fragment::new(MIXIN, &[FOO]).with_field(field("count", "I", Access::PRIVATE, shadow()));
    let plan = apply(&weaver, fragment, FOO).unwrap();
    assert!(plan.fields.is_empty());
    assert_eq!(plan.shadow_fields[0].name, "count");
}

#[test]
fn test_shadow_field_through_remapper() {
    let weaver = weaver_with(WeaveOptions::default(), mappings());
    let fragment = Fragment::new(MIXIN, &[FOO]).with_field(field("speed", "F", Access::PRIVATE, shadow()));
    let plan = apply(&weaver, fragment, FOO).unwrap();
    assert_eq!(plan.shadow_fields[0].declared, "speed");
    assert_eq!(plan.shadow_fields[0].name, "b");
}

#[test]
fn test_shadow_field_missing() {
    let weaver = weaver();
    let fragment = Fragment::new(MIXIN, &[FOO]).with_field(field("health", "I", Access::PRIVATE, shadow()));
    let err = apply(&weaver, fragment, FOO).unwrap_err();
    assert!(err.to_string().contains("@Shadow field health was not located"));
}

#[test]
fn test_shadow_field_descriptor_mismatch() {
    let weaver = weaver();
    let fragment = Fragment::new(MIXIN, &[FOO]).with_field(field("count", "J", Access::PRIVATE, shadow()));
    let err = apply(&weaver, fragment, FOO).unwrap_err();
    assert!(err.to_string().contains("conflicting signature I"));
}

#[test]
fn test_shadow_field_alias_to_public_rejected() {
    let weaver = weaver();
    let fragment = Fragment::new(MIXIN, &[FOO]).with_field(field("tickCount", "I", Access::PRIVATE, shadow_aliased("ticks")));
    let err = apply(&weaver, fragment, FOO).unwrap_err();
    assert!(err.to_string().contains("Non-private field cannot be aliased"));
}

#[test]
fn test_new_field_merged_with_target_type() {
    let weaver = weaver();
    let fragment = Fragment::new(MIXIN, &[FOO])
        .with_field(field("self", "Lmixins/FooMixin;", Access::PRIVATE, Marker::Plain))
        .with_field(field("extra", "[Lmixins/FooMixin;", Access::PRIVATE, Marker::Plain));
    let plan = apply(&weaver, fragment, FOO).unwrap();
    assert_eq!(plan.field("self").unwrap().desc, "Lgame/Foo;");
    assert_eq!(plan.field("extra").unwrap().desc, "[Lgame/Foo;");
}

#[test]
fn test_plain_field_matching_target_is_stripped() {
    let weaver = weaver();
    let fragment = Fragment::new(MIXIN, &[FOO]).with_field(field("count", "I", Access::PRIVATE, Marker::Plain));
    let plan = apply(&weaver, fragment, FOO).unwrap();
    assert!(plan.fields.is_empty());
    assert!(plan.shadow_fields.is_empty());
}

#[test]
fn test_non_private_static_field_rejected() {
    let weaver = weaver();
    let fragment = Fragment::new(MIXIN, &[FOO])
        .with_field(field("COUNTER", "I", Access::PUBLIC | Access::STATIC, Marker::Plain));
    let err = apply(&weaver, fragment, FOO).unwrap_err();
    assert!(err.to_string().contains("non-private static field COUNTER"));
}

#[test]
fn test_imaginary_super_discarded() {
    let weaver = weaver();
    let fragment = Fragment::new(MIXIN, &[FOO])
        .with_field(field("super$", "Lmixins/FooMixin;", Access::PRIVATE, Marker::Plain));
    let plan = apply(&weaver, fragment, FOO).unwrap();
    assert!(plan.fields.is_empty());
    assert!(plan.is_discarded("super$"));
}

#[test]
fn test_imaginary_super_must_be_private() {
    let weaver = weaver();
    let fragment = Fragment::new(MIXIN, &[FOO]).with_field(field(
        "super$",
        "Lmixins/FooMixin;",
        Access::PRIVATE | Access::FINAL,
        Marker::Plain,
    ));
    let err = apply(&weaver, fragment, FOO).unwrap_err();
    assert!(err.to_string().contains("must be private and non-final"));
}

#[test]
fn test_imaginary_super_must_have_fragment_type() {
    let weaver = weaver();
    let fragment = Fragment::new(MIXIN, &[FOO]).with_field(field("super$", "Lgame/Foo;", Access::PRIVATE, Marker::Plain));
    let err = apply(&weaver, fragment, FOO).unwrap_err();
    assert!(err.to_string().contains("same type as the parent mixin"));
}

// ---------------------------------------------------------------------------
// Injectors
// ---------------------------------------------------------------------------

#[test]
fn test_injector_targets_resolved() {
    let weaver = weaver_with(WeaveOptions::default(), mappings());
    let fragment = Fragment::new(MIXIN, &[FOO])
        .with_method(
            private_method("onTick", "()V"),
            Marker::Injector {
                target: "tick()V".to_owned(),
            },
        )
        .with_method(
            private_method("onSpawn", "(I)V"),
            Marker::Injector {
                target: "spawn(I)V".to_owned(),
            },
        )
        .with_method(
            private_method("onNothing", "()V"),
            Marker::Injector {
                target: "nothing".to_owned(),
            },
        );
    let target = weaver.target(FOO).unwrap();
    let plan = apply(&weaver, fragment, FOO).unwrap();

    assert_eq!(plan.injectors.len(), 3);
    assert!(plan.method("onTick").is_some());
    let resolved: Vec<Option<&str>> = plan
        .injectors
        .iter()
        .map(|i| i.target.as_ref().and_then(|t| t.resolved.as_deref()))
        .collect();
    assert_eq!(resolved, vec![Some("tick"), Some("a"), None]);

    let key = MemberKey::new(FOO, MemberKind::Method, "spawn", "(I)V");
    assert_eq!(target.renames.get(&key).unwrap(), "a");
}

// ---------------------------------------------------------------------------
// Phases and multiple targets
// ---------------------------------------------------------------------------

#[test]
fn test_apply_unprepared_fragment_is_illegal() {
    let weaver = weaver();
    let fragment = Fragment::new(MIXIN, &[FOO]).with_method(method("go", "()V"), Marker::Plain);
    let err = weaver.apply(&fragment, FOO).unwrap_err();
    assert!(matches!(err, WeftError::IllegalState { .. }));
}

#[test]
fn test_working_copy_attaches_once() {
    let weaver = weaver();
    let mut fragment = Fragment::new(MIXIN, &[FOO]).with_method(method("go", "()V"), Marker::Plain);
    weaver.prepare(&mut fragment).unwrap();

    let target = weaver.target(FOO).unwrap();
    let processor = weft::PreProcessor::new(weaver.registry(), &NoRemap, weaver.options());
    let mut working = fragment.instantiate().unwrap();
    let mut ctx = weft::context::TargetContext::new(weaver.registry(), &NoRemap, MIXIN, &target);
    processor.attach(&mut working, &mut ctx).unwrap();
    assert_eq!(working.phase(), Phase::Attached);

    let err = processor.attach(&mut working, &mut ctx).unwrap_err();
    assert!(matches!(err, WeftError::IllegalState { .. }));
    assert!(working.instantiate().is_err());
    assert!(processor.conform(&mut working, &target).is_err());
    // The prepared original is unaffected.
    assert_eq!(fragment.phase(), Phase::Prepared);
}

#[test]
fn test_multi_target_renames_are_independent() {
    let weaver = weaver();
    let mut fragment = Fragment::new(MIXIN, &[FOO, BAR])
        .with_method(private_method("helper", "()V"), Marker::Unique)
        .with_method(method("tick", "()V"), overwrite())
        .with_method(
            method("go", "()V").with_body(calls(MIXIN, "helper", "()V")),
            Marker::Plain,
        );
    weaver.prepare(&mut fragment).unwrap();

    let foo = weaver.apply(&fragment, FOO).unwrap();
    let bar = weaver.apply(&fragment, BAR).unwrap();

    assert!(foo.method("helper").is_none());
    assert_ne!(first_reference(&foo, "go"), "helper");
    assert!(bar.method("helper").is_some());
    assert_eq!(first_reference(&bar, "go"), "helper");
    assert_eq!(foo.overwrites.len(), 1);
    assert_eq!(bar.overwrites.len(), 1);

    assert_eq!(weaver.target(FOO).unwrap().renames.len(), 1);
    assert!(weaver.target(BAR).unwrap().renames.is_empty());

    // The prepared fragment itself never changes.
    assert_eq!(fragment.phase(), Phase::Prepared);
    assert_eq!(fragment.methods[0].node.name, "helper");
    assert_eq!(fragment.methods.len(), 3);
}

#[test]
fn test_reapplying_to_same_target_is_consistent() {
    let weaver = weaver();
    let mut fragment = Fragment::new(MIXIN, &[FOO]).with_method(private_method("helper", "()V"), Marker::Unique);
    weaver.prepare(&mut fragment).unwrap();
    let first = weaver.apply(&fragment, FOO).unwrap();
    let second = weaver.apply(&fragment, FOO).unwrap();
    assert_eq!(first.methods, second.methods);
}
