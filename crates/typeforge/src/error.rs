// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for the representation kernel.
//!
//! Four families are kept apart because callers treat them differently:
//!
//! - [`SpecError`]: misuse of a [`RepresentationSpec`](crate::RepresentationSpec)
//!   by type-construction code (a bug in the type definition).
//! - [`Clash`]: an attempt to bind a host class that is already bound, or
//!   bound to an unsuitable representation.
//! - [`InterpreterError`]: internal-consistency faults and host class
//!   initialisation failures. Never a guest-language exception.
//! - guest-visible rejections (`__class__`/`__dict__` assignment, base
//!   layout conflicts) and the explicit "not yet supported" signal,
//!   carried directly by [`Error`].

use std::fmt;

use crate::host::HostClass;

/// Result type for kernel operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Crate-wide error.
#[derive(Debug)]
pub enum Error {
    /// A representation specification was misused.
    Spec(SpecError),
    /// A registry binding conflict.
    Clash(Clash),
    /// The type system itself is inconsistent for this execution.
    Interpreter(InterpreterError),
    /// `__class__` assignment rejected by the validation hook.
    ClassAssignment {
        /// Name of the type currently held by the object.
        from: String,
        /// Name of the type the caller tried to assign.
        to: String,
    },
    /// `__dict__` assignment rejected by the validation hook.
    DictAssignment(String),
    /// The bases of a guest class have incompatible host layouts.
    LayoutConflict {
        /// Class being defined.
        name: String,
        /// Names of its bases.
        bases: Vec<String>,
    },
    /// The requested path exists but has not been implemented.
    NotYetSupported(String),
    /// Kernel configuration could not be loaded or is invalid.
    Config(String),
}

impl Error {
    /// Shorthand for an [`InterpreterError::Internal`].
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Interpreter(InterpreterError::Internal(msg.into()))
    }

    /// Whether this error signals a broken type system rather than a
    /// rejected request.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Interpreter(_) | Self::Clash(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spec(e) => write!(f, "{}", e),
            Self::Clash(e) => write!(f, "{}", e),
            Self::Interpreter(e) => write!(f, "{}", e),
            Self::ClassAssignment { from, to } => write!(
                f,
                "__class__ assignment: '{}' object layout differs from '{}'",
                to, from
            ),
            Self::DictAssignment(msg) => write!(f, "__dict__ assignment: {}", msg),
            Self::LayoutConflict { name, bases } => write!(
                f,
                "class {}: multiple bases have instance lay-out conflict ({})",
                name,
                bases.join(", ")
            ),
            Self::NotYetSupported(what) => write!(f, "not yet supported: {}", what),
            Self::Config(msg) => write!(f, "kernel configuration error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spec(e) => Some(e),
            Self::Clash(e) => Some(e),
            Self::Interpreter(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SpecError> for Error {
    fn from(e: SpecError) -> Self {
        Self::Spec(e)
    }
}

impl From<Clash> for Error {
    fn from(e: Clash) -> Self {
        Self::Clash(e)
    }
}

impl From<InterpreterError> for Error {
    fn from(e: InterpreterError) -> Self {
        Self::Interpreter(e)
    }
}

/// Misuse of a representation specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    /// The specification was already frozen.
    Frozen {
        /// Provisional name of the specification.
        spec: String,
    },
    /// A class that is not an interface was offered as one.
    NotInterface {
        /// Provisional name of the specification.
        spec: String,
        /// Offending class.
        class: String,
    },
    /// The same interface or slot was added twice.
    Repeat {
        /// Provisional name of the specification.
        spec: String,
        /// The adding operation (`add_interface`, `add_slot`, `adopt`, `accept`).
        op: &'static str,
        /// The repeated item.
        item: String,
    },
}

impl fmt::Display for SpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Frozen { spec } => write!(f, "specification {} already frozen", spec),
            Self::NotInterface { spec, class } => {
                write!(f, "specification {}: {} is not an interface", spec, class)
            }
            Self::Repeat { spec, op, item } => {
                write!(f, "specification {}: repeated {}({})", spec, op, item)
            }
        }
    }
}

impl std::error::Error for SpecError {}

/// Kind of registry conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClashMode {
    /// New representation requested but one exists already.
    Existing,
    /// Representation needed for sharing is not a shared one.
    NotSharable,
    /// Representation needed as an accepted class is missing.
    Missing,
}

/// A host class could not be bound as requested.
#[derive(Debug, Clone)]
pub struct Clash {
    /// Name of the type specification being processed, if any.
    pub context: Option<String>,
    /// What went wrong.
    pub mode: ClashMode,
    /// Host class being bound.
    pub class: HostClass,
    /// Label of the representation already bound, if any.
    pub existing: Option<String>,
}

impl Clash {
    /// A class that is already bound to `existing`.
    pub fn existing(class: &HostClass, existing: impl fmt::Display) -> Self {
        Self {
            context: None,
            mode: ClashMode::Existing,
            class: class.clone(),
            existing: Some(existing.to_string()),
        }
    }

    /// A class bound to a representation that cannot be shared.
    pub fn not_sharable(class: &HostClass, existing: impl fmt::Display) -> Self {
        Self {
            context: None,
            mode: ClashMode::NotSharable,
            class: class.clone(),
            existing: Some(existing.to_string()),
        }
    }

    /// A class that should have been bound but is not.
    pub fn missing(class: &HostClass) -> Self {
        Self {
            context: None,
            mode: ClashMode::Missing,
            class: class.clone(),
            existing: None,
        }
    }

    /// Attach the name of the specification being processed.
    pub fn in_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for Clash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(
                f,
                "interpreting specification {}, the type system found ",
                context
            )?;
        }
        let existing = self.existing.as_deref().unwrap_or("nothing");
        match self.mode {
            ClashMode::Existing => write!(
                f,
                "class {} was already bound to {}",
                self.class.name(),
                existing
            ),
            ClashMode::NotSharable => write!(
                f,
                "class {} was bound to non-shared {}",
                self.class.name(),
                existing
            ),
            ClashMode::Missing => write!(f, "no representation for class {}", self.class.name()),
        }
    }
}

impl std::error::Error for Clash {}

/// Internal fault of the type system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterpreterError {
    /// An instance was presented to a shared representation but cannot
    /// report its own type.
    NotShared {
        /// Host class of the offending instance.
        class: String,
        /// Label of the representation it was registered as.
        representation: String,
    },
    /// Static initialisation of a host class failed.
    ClassInit {
        /// Class that failed to initialise.
        class: String,
        /// Failure reported by the initializer.
        reason: String,
    },
    /// Any other broken invariant.
    Internal(String),
}

impl fmt::Display for InterpreterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotShared {
                class,
                representation,
            } => write!(
                f,
                "internal error: unsharable class {:.100} registered as {}",
                class, representation
            ),
            Self::ClassInit { class, reason } => write!(
                f,
                "internal error: failed to initialise class {}: {}",
                class, reason
            ),
            Self::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for InterpreterError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clash_message_with_context() {
        let c = HostClass::builder("demo.Thing").build();
        let clash = Clash::existing(&c, "Thing as thing").in_context("thing");
        let msg = clash.to_string();
        assert!(msg.starts_with("interpreting specification thing"));
        assert!(msg.contains("demo.Thing was already bound to Thing as thing"));
    }

    #[test]
    fn test_internal_classification() {
        assert!(Error::internal("boom").is_internal());
        assert!(!Error::NotYetSupported("x".into()).is_internal());
        let spec = Error::from(SpecError::Frozen { spec: "A".into() });
        assert!(!spec.is_internal());
        assert_eq!(spec.to_string(), "specification A already frozen");
    }
}
