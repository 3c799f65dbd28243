//! Error types for the reflection engine

use thiserror::Error;

/// Failure raised by a constructor or method body.
///
/// Bodies are caller-supplied logic, so their failures are carried as an
/// opaque boxed error and handed back untouched inside
/// [`ReflectError::InvocationTarget`] or [`ReflectError::InstantiationFailure`].
pub type TargetError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout the engine
pub type ReflectResult<T> = Result<T, ReflectError>;

/// Reflection errors
#[derive(Debug, Error)]
pub enum ReflectError {
    /// No declaration is registered under the qualified name
    #[error("Type not found: {0}")]
    TypeNotFound(String),

    /// No field, method or constructor matches the name/signature
    #[error("Member not found: {owner}.{member}{signature}")]
    MemberNotFound {
        /// Qualified name of the searched type
        owner: String,
        /// Member name (`<init>` for constructors)
        member: String,
        /// Requested signature, rendered as `(T1, T2)`; empty for fields
        signature: String,
    },

    /// A signature matched more than one candidate
    #[error("Ambiguous member: {owner}.{member}{signature} matches {count} candidates")]
    AmbiguousMember {
        /// Qualified name of the searched type
        owner: String,
        /// Member name
        member: String,
        /// Requested signature
        signature: String,
        /// Number of matching candidates
        count: usize,
    },

    /// Visibility check failed and no valid access token was presented
    #[error("Access denied: {modifiers} member {owner}.{member}")]
    AccessDenied {
        /// Qualified name of the owning type
        owner: String,
        /// Member name
        member: String,
        /// Rendered modifiers of the member
        modifiers: String,
    },

    /// Arity, argument type, receiver or value type mismatch
    #[error("Argument type mismatch for {member}: {message}")]
    ArgumentTypeMismatch {
        /// Member being accessed
        member: String,
        /// What did not match
        message: String,
    },

    /// Abstract/interface instantiation, or a failing constructor body
    #[error("Cannot instantiate {type_name}: {message}")]
    InstantiationFailure {
        /// Qualified name of the type
        type_name: String,
        /// Reason
        message: String,
        /// Failure raised by the constructor body, if any
        #[source]
        cause: Option<TargetError>,
    },

    /// The invoked method's own logic failed
    #[error("Invocation of {member} failed: {cause}")]
    InvocationTarget {
        /// Invoked member, rendered as `Owner.name(T1, T2)`
        member: String,
        /// The original failure, unchanged
        #[source]
        cause: TargetError,
    },

    /// Dispatch found no implementation for an abstract method
    #[error("Abstract method {member} has no implementation in {receiver}")]
    AbstractMethod {
        /// Invoked member
        member: String,
        /// Runtime type of the receiver
        receiver: String,
    },

    /// The member was declared with a body name that was never linked
    #[error("No native body bound for {member}")]
    UnboundBody {
        /// Member whose body is missing
        member: String,
    },

    /// A declaration with this name already exists
    #[error("Duplicate type declaration: {0}")]
    DuplicateType(String),

    /// The supertype/interface graph loops back on itself
    #[error("Cyclic inheritance involving {0}")]
    CyclicInheritance(String),

    /// The declaration is malformed
    #[error("Invalid declaration for {type_name}: {message}")]
    InvalidDeclaration {
        /// Qualified name of the declared type
        type_name: String,
        /// What is wrong with it
        message: String,
    },
}

impl ReflectError {
    pub(crate) fn invalid(type_name: &str, message: impl Into<String>) -> Self {
        ReflectError::InvalidDeclaration {
            type_name: type_name.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn mismatch(member: impl Into<String>, message: impl Into<String>) -> Self {
        ReflectError::ArgumentTypeMismatch {
            member: member.into(),
            message: message.into(),
        }
    }

    /// The failure raised by a body, for `InvocationTarget` and
    /// `InstantiationFailure` errors that carry one.
    pub fn target_cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            ReflectError::InvocationTarget { cause, .. } => Some(cause.as_ref()),
            ReflectError::InstantiationFailure {
                cause: Some(cause), ..
            } => Some(cause.as_ref()),
            _ => None,
        }
    }
}
