//! Shared fixtures: a small game class hierarchy and weaver helpers.
#![allow(dead_code, clippy::unwrap_used)]

use std::sync::Arc;
use weft::ir::{Access, ClassNode, FieldNode, Insn, MethodNode};
use weft::{
    ClassRegistry, Fragment, MergePlan, MemorySource, NoRemap, Remapper, Result, WeaveOptions,
    Weaver,
};

pub const FOO: &str = "game/Foo";
pub const BAR: &str = "game/Bar";
pub const ENTITY: &str = "game/Entity";
pub const TICKING: &str = "api/Ticking";

/// `game/Entity <- game/Foo`, `game/Entity <- game/Bar`, plus `api/Ticking`.
///
/// `game/Foo` carries obfuscated-looking private members `a(I)V` and `b:F`
/// that mapping tests point at.
pub fn game_source() -> MemorySource {
    MemorySource::new()
        .with(
            ClassNode::new(ENTITY)
                .with_method(MethodNode::new("update", "()V", Access::PUBLIC))
                .with_method(MethodNode::new("getId", "()I", Access::PUBLIC))
                .with_field(FieldNode::new("world", "Lgame/World;", Access::PROTECTED)),
        )
        .with(
            ClassNode::new(FOO)
                .with_super(ENTITY)
                .with_method(MethodNode::new("<init>", "()V", Access::PUBLIC))
                .with_method(MethodNode::new("tick", "()V", Access::PUBLIC))
                .with_method(MethodNode::new("render", "()V", Access::PUBLIC))
                .with_method(MethodNode::new("helper", "()V", Access::PRIVATE))
                .with_method(MethodNode::new("a", "(I)V", Access::PRIVATE))
                .with_method(MethodNode::new("spawnInternal", "(I)V", Access::PRIVATE))
                .with_field(FieldNode::new("count", "I", Access::PRIVATE))
                .with_field(FieldNode::new("b", "F", Access::PRIVATE))
                .with_field(FieldNode::new("ticks", "I", Access::PUBLIC))
                .with_field(FieldNode::new("maxTicks", "I", Access::PRIVATE | Access::FINAL)),
        )
        .with(
            ClassNode::new(BAR)
                .with_super(ENTITY)
                .with_method(MethodNode::new("tick", "()V", Access::PUBLIC))
                .with_field(FieldNode::new("count", "I", Access::PRIVATE)),
        )
        .with(
            ClassNode::new(TICKING)
                .with_access(Access::PUBLIC | Access::INTERFACE | Access::ABSTRACT)
                .with_method(MethodNode::new(
                    "tick",
                    "()V",
                    Access::PUBLIC | Access::ABSTRACT,
                )),
        )
}

pub fn weaver_with(options: WeaveOptions, remapper: Arc<dyn Remapper>) -> Weaver {
    Weaver::new(
        Arc::new(ClassRegistry::new(game_source())),
        remapper,
        options,
    )
}

pub fn weaver() -> Weaver {
    weaver_with(WeaveOptions::default(), Arc::new(NoRemap))
}

/// Prepares `fragment` and applies it to `target`.
pub fn apply(weaver: &Weaver, mut fragment: Fragment, target: &str) -> Result<MergePlan> {
    weaver.prepare(&mut fragment)?;
    weaver.apply(&fragment, target)
}

pub fn method(name: &str, desc: &str) -> MethodNode {
    MethodNode::new(name, desc, Access::PUBLIC)
}

pub fn private_method(name: &str, desc: &str) -> MethodNode {
    MethodNode::new(name, desc, Access::PRIVATE)
}

pub fn abstract_method(name: &str, desc: &str) -> MethodNode {
    MethodNode::new(name, desc, Access::PUBLIC | Access::ABSTRACT)
}

/// A body calling `owner.name desc` and returning.
pub fn calls(owner: &str, name: &str, desc: &str) -> Vec<Insn> {
    vec![
        Insn::other("aload_0"),
        Insn::invoke_virtual(owner, name, desc),
        Insn::other("return"),
    ]
}

/// Name referenced by the first member-referencing instruction of `method`.
pub fn first_reference(plan: &MergePlan, method: &str) -> String {
    plan.method(method)
        .unwrap()
        .instructions
        .iter()
        .find_map(|insn| insn.member_ref().map(|r| r.name.to_owned()))
        .unwrap()
}
