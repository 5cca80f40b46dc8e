//! Error taxonomy for the pre-processor.
//!
//! Every fatal error raised while processing a fragment carries a [`Site`]
//! naming the fragment, the offending member and the target class so the
//! declaration can be located by a human.

use std::fmt;

/// Location of a failure: fragment, member (name + descriptor) and target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Site {
    /// Internal name of the fragment class.
    pub fragment: String,
    /// Offending member as `name desc`, if the failure concerns a member.
    pub member: Option<String>,
    /// Target class, if the failure happened in a target-dependent phase.
    pub target: Option<String>,
    /// Targets the fragment declares, named when no single target applies.
    pub declared_targets: Vec<String>,
}

impl Site {
    /// Creates a site for a fragment with no member or target yet.
    pub fn fragment(fragment: impl Into<String>) -> Self {
        Self {
            fragment: fragment.into(),
            member: None,
            target: None,
            declared_targets: Vec::new(),
        }
    }

    /// Attaches the offending member.
    pub fn member(mut self, name: &str, desc: &str) -> Self {
        self.member = Some(format!("{name}{desc}"));
        self
    }

    /// Attaches the target class.
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Attaches every target the fragment declares.
    pub fn declared_targets(mut self, targets: &[String]) -> Self {
        self.declared_targets = targets.to_vec();
        self
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fragment {}", self.fragment)?;
        if let Some(member) = &self.member {
            write!(f, ", member {member}")?;
        }
        match &self.target {
            Some(target) => write!(f, ", target {target}"),
            None if !self.declared_targets.is_empty() => {
                write!(f, ", targets {}", self.declared_targets.join(", "))
            }
            None => write!(f, ", no target"),
        }
    }
}

/// Errors raised by the registry and the pre-processor.
#[derive(Debug, thiserror::Error)]
pub enum WeftError {
    /// Structural contract violation in a fragment.
    #[error("Invalid mixin: {message} [{site}]")]
    InvalidMixin {
        /// Where the violation was found.
        site: Site,
        /// What was wrong.
        message: String,
    },
    /// Accessor or invoker contract violation.
    #[error("Invalid accessor: {message} [{site}]")]
    InvalidAccessor {
        /// Where the violation was found.
        site: Site,
        /// What was wrong.
        message: String,
    },
    /// The class source could not supply the named class.
    #[error("Class not found: {0}")]
    ClassNotFound(String),
    /// Two independently-declared mappings disagree for the same symbol.
    #[error("Reference conflict for {key}: {new} conflicts with existing mapping {existing}")]
    ReferenceConflict {
        /// The symbol being mapped.
        key: String,
        /// The mapping already recorded.
        existing: String,
        /// The mapping that was rejected.
        new: String,
    },
    /// A phase was entered out of order.
    #[error("Illegal state for fragment {fragment}: {message}")]
    IllegalState {
        /// Internal name of the fragment class.
        fragment: String,
        /// Which transition was attempted.
        message: String,
    },
}

impl WeftError {
    /// Shorthand for [`WeftError::InvalidMixin`].
    pub fn invalid_mixin(site: Site, message: impl Into<String>) -> Self {
        Self::InvalidMixin {
            site,
            message: message.into(),
        }
    }

    /// Shorthand for [`WeftError::InvalidAccessor`].
    pub fn invalid_accessor(site: Site, message: impl Into<String>) -> Self {
        Self::InvalidAccessor {
            site,
            message: message.into(),
        }
    }

    /// Returns the failure site, if the error has one.
    pub fn site(&self) -> Option<&Site> {
        match self {
            Self::InvalidMixin { site, .. } | Self::InvalidAccessor { site, .. } => Some(site),
            _ => None,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = WeftError> = std::result::Result<T, E>;
