//! Overload resolution by exact parameter signature
//!
//! A candidate matches only when its parameter list has the requested
//! length and every parameter type is identical to the requested one.
//! There is no widening, boxing or variance: `int` does not match `long`,
//! and a subtype does not match its supertype.

use crate::error::{ReflectError, ReflectResult};
use crate::metadata::Parameterized;
use crate::types::{format_signature, TypeRef};

/// Whether `candidate` has exactly the parameter types in `signature`
pub fn matches_signature<M: Parameterized + ?Sized>(candidate: &M, signature: &[TypeRef]) -> bool {
    candidate.parameter_types() == signature
}

/// Pick the unique candidate whose parameters equal `signature`.
///
/// `owner` and `member` only label the error when nothing (or more than one
/// candidate) matches.
pub fn select<'a, M, I>(
    owner: &str,
    member: &str,
    candidates: I,
    signature: &[TypeRef],
) -> ReflectResult<&'a M>
where
    M: Parameterized + 'a,
    I: IntoIterator<Item = &'a M>,
{
    let mut matching = candidates
        .into_iter()
        .filter(|c| matches_signature(*c, signature));

    let Some(first) = matching.next() else {
        return Err(ReflectError::MemberNotFound {
            owner: owner.to_string(),
            member: member.to_string(),
            signature: format_signature(signature),
        });
    };

    let extra = matching.count();
    if extra > 0 {
        return Err(ReflectError::AmbiguousMember {
            owner: owner.to_string(),
            member: member.to_string(),
            signature: format_signature(signature),
            count: extra + 1,
        });
    }

    Ok(first)
}
