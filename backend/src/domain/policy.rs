//! Authorization policy for course actions.
//!
//! [`decide`] is pure: it inspects only the principal, the requested action,
//! and (for ownership rules) the target course. Role checks always run before
//! ownership checks so a caller with the wrong role learns nothing about
//! whether a course exists.

use std::fmt;

use serde_json::json;

use super::{Course, Error, Principal, Role};

/// Operation a principal is attempting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateCourse,
    ListAll,
    FindByTitle,
    GetCourse,
    ListByInstructor,
    ListByStudent,
    Enroll,
    Unenroll,
    DeleteCourse,
}

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The principal's role may never perform the action.
    WrongRole,
    /// The principal has the right role but does not own the course.
    NotOwner,
}

impl DenyReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WrongRole => "wrong-role",
            Self::NotOwner => "not-owner",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Convert a denial into a `forbidden` domain error.
    ///
    /// # Examples
    /// ```
    /// use courses_backend::domain::{Decision, DenyReason, ErrorCode};
    ///
    /// assert!(Decision::Allow.into_result().is_ok());
    /// let err = Decision::Deny(DenyReason::NotOwner).into_result().unwrap_err();
    /// assert_eq!(err.code(), ErrorCode::Forbidden);
    /// ```
    pub fn into_result(self) -> Result<(), Error> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(reason) => Err(Error::forbidden(match reason {
                DenyReason::WrongRole => "your role does not permit this action",
                DenyReason::NotOwner => "only the course owner may perform this action",
            })
            .with_details(json!({ "reason": reason.as_str() }))),
        }
    }
}

fn require_role(principal: &Principal, role: Role) -> Decision {
    if principal.role() == role {
        Decision::Allow
    } else {
        Decision::Deny(DenyReason::WrongRole)
    }
}

/// Decide whether `principal` may perform `action`.
///
/// `resource` is consulted only by ownership rules. For
/// [`Action::DeleteCourse`], pass `None` to run the role pre-check alone and
/// `Some(course)` once the course has been loaded.
pub fn decide(principal: &Principal, action: Action, resource: Option<&Course>) -> Decision {
    match action {
        Action::CreateCourse => require_role(principal, Role::Instructor),
        Action::ListAll
        | Action::FindByTitle
        | Action::GetCourse
        | Action::ListByInstructor
        | Action::ListByStudent => Decision::Allow,
        Action::Enroll | Action::Unenroll => require_role(principal, Role::Student),
        Action::DeleteCourse => match (principal.role(), resource) {
            (Role::Student, _) => Decision::Deny(DenyReason::WrongRole),
            (Role::Instructor, None) => Decision::Allow,
            (Role::Instructor, Some(course)) if course.is_owned_by(&principal.id()) => {
                Decision::Allow
            }
            (Role::Instructor, Some(_)) => Decision::Deny(DenyReason::NotOwner),
        },
    }
}
