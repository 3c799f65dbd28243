//! Visibility checks and the access override capability
//!
//! Callers of the engine stand outside every registered type, so without a
//! token only public members are usable. [`override_access`] hands out an
//! [`AccessToken`] bound to one member; presenting it lifts the visibility
//! check for that member alone.

use tracing::debug;

use crate::error::{ReflectError, ReflectResult};
use crate::metadata::{Member, MemberId};

/// Capability to bypass the visibility check of a single member.
///
/// Tokens cannot be cloned or built by hand; each one comes from an explicit
/// [`override_access`] call.
#[derive(Debug)]
#[must_use = "an access token does nothing unless presented to the engine"]
pub struct AccessToken {
    member: MemberId,
    description: String,
}

impl AccessToken {
    /// The member this token unlocks
    pub fn member(&self) -> MemberId {
        self.member
    }

    /// Description of the unlocked member
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether this token unlocks `member`
    pub fn grants<M: Member + ?Sized>(&self, member: &M) -> bool {
        self.member == member.id()
    }
}

/// Mark `member` accessible for the holder of the returned token.
///
/// Always succeeds.
pub fn override_access<M: Member + ?Sized>(member: &M) -> AccessToken {
    let description = member.describe();
    debug!(member = %description, modifiers = %member.modifiers(), "access override granted");
    AccessToken {
        member: member.id(),
        description,
    }
}

/// Whether `token` was issued for `member`
pub(crate) fn token_grants<M: Member + ?Sized>(member: &M, token: Option<&AccessToken>) -> bool {
    token.is_some_and(|t| t.grants(member))
}

/// Public members pass; anything else needs a token for this exact member.
pub(crate) fn check_access<M: Member + ?Sized>(
    member: &M,
    token: Option<&AccessToken>,
) -> ReflectResult<()> {
    if member.modifiers().is_public() || token_grants(member, token) {
        return Ok(());
    }
    Err(denied(member))
}

pub(crate) fn denied<M: Member + ?Sized>(member: &M) -> ReflectError {
    ReflectError::AccessDenied {
        owner: member.owner_name().to_string(),
        member: member.name().to_string(),
        modifiers: member.modifiers().to_string(),
    }
}
