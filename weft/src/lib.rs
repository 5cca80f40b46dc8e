//! Core library for the weft mixin pre-processor.
//!
//! Fragments (mixin classes) carry members marked as shadows, overwrites,
//! unique members, accessors, invokers or injectors. The pre-processor
//! resolves each against a target class, renames what must be renamed,
//! rewrites member references in fragment bodies and hands the host a
//! [`plan::MergePlan`] describing exactly what to merge.

#![allow(clippy::similar_names, clippy::map_unwrap_or, clippy::items_after_statements)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

/// Accessor and invoker signature rules.
pub mod accessor;

/// Module defining the command-line interface arguments and structs.
pub mod cli;

/// Subcommand implementations.
pub mod commands;

/// Module for loading configuration.
pub mod config;

/// Module containing shared constants and regex patterns.
pub mod constants;

/// Per-attach working state.
pub mod context;

/// Module defining the entry point logic shared by both binaries.
pub mod entry_point;

/// Error taxonomy.
pub mod error;

/// Fragment model.
pub mod fragment;

/// CLI input document.
pub mod input;

/// Host-supplied class IR.
pub mod ir;

/// Tracing subscriber setup.
pub mod logging;

/// Module for rich CLI output formatting with colored text and tables.
pub mod output;

/// Merge plans handed to the host.
pub mod plan;

/// The four-phase fragment pre-processor.
pub mod preprocess;

/// Thread-safe class metadata registry.
pub mod registry;

/// Remapping between naming environments.
pub mod remap;

/// Per-target rename tables.
pub mod rename;

/// Multi-fragment, multi-target driver.
pub mod weaver;

pub use config::WeaveOptions;
pub use error::{Result, Site, WeftError};
pub use fragment::{Fragment, FragmentField, FragmentMethod, Marker, Phase};
pub use plan::MergePlan;
pub use preprocess::PreProcessor;
pub use registry::{ClassRegistry, ClassSource, MemorySource};
pub use remap::{MappingTable, NoRemap, Remapper};
pub use rename::TargetClass;
pub use weaver::{WeaveReport, Weaver};
