//! Course aggregate and its enrolment roster.
//!
//! A [`Course`] is created from a validated [`CourseDraft`], owned forever by
//! the instructor who created it, and mutated only through its roster. Every
//! roster change bumps the course revision so stores can apply
//! compare-and-store updates.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use utoipa::ToSchema;
use uuid::Uuid;

use super::UserId;

/// Validation failures raised while building course values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CourseValidationError {
    InvalidId,
    EmptyTitle,
    NegativePrice,
    NonFinitePrice,
}

impl CourseValidationError {
    /// Request field the error refers to.
    pub const fn field(&self) -> &'static str {
        match self {
            Self::InvalidId => "id",
            Self::EmptyTitle => "title",
            Self::NegativePrice | Self::NonFinitePrice => "price",
        }
    }

    /// Stable machine-readable validation code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidId => "invalid_id",
            Self::EmptyTitle => "empty_title",
            Self::NegativePrice => "negative_price",
            Self::NonFinitePrice => "non_finite_price",
        }
    }
}

impl fmt::Display for CourseValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "course id must be a valid UUID"),
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::NegativePrice => write!(f, "price must not be negative"),
            Self::NonFinitePrice => write!(f, "price must be a finite number"),
        }
    }
}

impl std::error::Error for CourseValidationError {}

/// Opaque course identifier, assigned once at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, format = Uuid)]
pub struct CourseId(Uuid);

impl CourseId {
    /// Generate a fresh random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for CourseId {
    type Err = CourseValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim() != s {
            return Err(CourseValidationError::InvalidId);
        }
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| CourseValidationError::InvalidId)
    }
}

/// Non-negative, finite course price.
///
/// # Examples
/// ```
/// use courses_backend::domain::Price;
///
/// assert!(Price::new(0.0).is_ok());
/// assert!(Price::new(-1.0).is_err());
/// assert!(Price::new(f64::NAN).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Price(f64);

// utoipa's derive cannot attach `minimum` to a newtype, so the schema
// (an `f64` with `minimum = 0`) is spelled out by hand.
impl utoipa::PartialSchema for Price {
    fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        use utoipa::openapi::schema::{KnownFormat, ObjectBuilder, SchemaFormat, Type};
        ObjectBuilder::new()
            .schema_type(Type::Number)
            .format(Some(SchemaFormat::KnownFormat(KnownFormat::Double)))
            .minimum(Some(0))
            .into()
    }
}

impl ToSchema for Price {}

impl Price {
    pub fn new(value: f64) -> Result<Self, CourseValidationError> {
        if !value.is_finite() {
            return Err(CourseValidationError::NonFinitePrice);
        }
        if value < 0.0 {
            return Err(CourseValidationError::NegativePrice);
        }
        // `-0.0` passes the range check; store it as `0.0`.
        let value = if value.is_sign_negative() { 0.0 } else { value };
        Ok(Self(value))
    }

    pub const fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Price {
    type Error = CourseValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for f64 {
    fn from(value: Price) -> Self {
        value.0
    }
}

/// Set of enrolled students that remembers insertion order.
///
/// Membership checks go through a hash set; display order comes from the
/// backing vector. Both views always hold the same ids.
#[derive(Debug, Clone, Default)]
pub struct StudentRoster {
    ordered: Vec<UserId>,
    members: HashSet<UserId>,
}

impl StudentRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a roster from stored ids, dropping repeats after the first.
    pub fn from_ids(ids: impl IntoIterator<Item = UserId>) -> Self {
        let mut roster = Self::new();
        for id in ids {
            roster.insert(id);
        }
        roster
    }

    pub fn contains(&self, id: &UserId) -> bool {
        self.members.contains(id)
    }

    /// Add `id`; returns `false` when it was already present.
    pub fn insert(&mut self, id: UserId) -> bool {
        if !self.members.insert(id) {
            return false;
        }
        self.ordered.push(id);
        true
    }

    /// Remove `id`; returns `false` when it was absent.
    pub fn remove(&mut self, id: &UserId) -> bool {
        if !self.members.remove(id) {
            return false;
        }
        self.ordered.retain(|member| member != id);
        true
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn as_slice(&self) -> &[UserId] {
        &self.ordered
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserId> {
        self.ordered.iter()
    }
}

impl PartialEq for StudentRoster {
    fn eq(&self, other: &Self) -> bool {
        self.ordered == other.ordered
    }
}

impl Eq for StudentRoster {}

impl Serialize for StudentRoster {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.ordered.serialize(serializer)
    }
}

/// Validated input for a new course.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseDraft {
    title: String,
    description: String,
    price: Price,
    image_ref: String,
}

impl CourseDraft {
    /// Validate raw creation fields.
    ///
    /// The title is trimmed and must not be empty. Description and image
    /// reference are stored verbatim; an empty image reference is allowed.
    ///
    /// # Examples
    /// ```
    /// use courses_backend::domain::{CourseDraft, CourseValidationError};
    ///
    /// let draft = CourseDraft::try_new("  Algebra ", "Intro", 10.0, "").unwrap();
    /// assert_eq!(draft.title(), "Algebra");
    /// assert_eq!(
    ///     CourseDraft::try_new(" ", "Intro", 10.0, "").unwrap_err(),
    ///     CourseValidationError::EmptyTitle,
    /// );
    /// ```
    pub fn try_new(
        title: &str,
        description: &str,
        price: f64,
        image_ref: &str,
    ) -> Result<Self, CourseValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(CourseValidationError::EmptyTitle);
        }
        Ok(Self {
            title: title.to_owned(),
            description: description.to_owned(),
            price: Price::new(price)?,
            image_ref: image_ref.to_owned(),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

/// Raised when a roster change would break a course invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RosterError {
    #[error("the course owner cannot enrol in their own course")]
    OwnerCannotEnroll,
}

/// Stored field values used to rebuild a [`Course`] from persistence.
#[derive(Debug, Clone)]
pub struct CourseRecord {
    pub id: CourseId,
    pub title: String,
    pub description: String,
    pub price: Price,
    pub image_ref: String,
    pub instructor_id: UserId,
    pub students: Vec<UserId>,
    pub created_at: DateTime<Utc>,
    pub revision: u32,
}

/// A published course.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    id: CourseId,
    title: String,
    description: String,
    price: Price,
    image_ref: String,
    instructor_id: UserId,
    students: StudentRoster,
    created_at: DateTime<Utc>,
    revision: u32,
}

impl Course {
    /// Initial revision of a freshly created course.
    pub const INITIAL_REVISION: u32 = 1;

    /// Create a course owned by `instructor_id` with an empty roster.
    pub fn create(
        id: CourseId,
        draft: CourseDraft,
        instructor_id: UserId,
        created_at: DateTime<Utc>,
    ) -> Self {
        let CourseDraft {
            title,
            description,
            price,
            image_ref,
        } = draft;
        Self {
            id,
            title,
            description,
            price,
            image_ref,
            instructor_id,
            students: StudentRoster::new(),
            created_at,
            revision: Self::INITIAL_REVISION,
        }
    }

    /// Rehydrate a course from stored values.
    ///
    /// Duplicate and owner ids in the stored roster are dropped.
    pub fn from_record(record: CourseRecord) -> Self {
        let CourseRecord {
            id,
            title,
            description,
            price,
            image_ref,
            instructor_id,
            students,
            created_at,
            revision,
        } = record;
        let students =
            StudentRoster::from_ids(students.into_iter().filter(|id| *id != instructor_id));
        Self {
            id,
            title,
            description,
            price,
            image_ref,
            instructor_id,
            students,
            created_at,
            revision,
        }
    }

    pub fn id(&self) -> CourseId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn image_ref(&self) -> &str {
        &self.image_ref
    }

    pub fn instructor_id(&self) -> UserId {
        self.instructor_id
    }

    pub fn students(&self) -> &StudentRoster {
        &self.students
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn revision(&self) -> u32 {
        self.revision
    }

    /// Whether `user` owns this course.
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        self.instructor_id == *user
    }

    /// Add a student to the roster.
    ///
    /// Returns `Ok(false)` without touching the revision when the student is
    /// already enrolled.
    pub fn add_student(&mut self, student: UserId) -> Result<bool, RosterError> {
        if self.is_owned_by(&student) {
            return Err(RosterError::OwnerCannotEnroll);
        }
        let added = self.students.insert(student);
        if added {
            self.bump_revision();
        }
        Ok(added)
    }

    /// Remove a student from the roster; returns `false` when absent.
    pub fn remove_student(&mut self, student: &UserId) -> bool {
        let removed = self.students.remove(student);
        if removed {
            self.bump_revision();
        }
        removed
    }

    fn bump_revision(&mut self) {
        self.revision = self.revision.saturating_add(1);
    }
}
