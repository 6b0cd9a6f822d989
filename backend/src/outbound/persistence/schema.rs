//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered accounts.
    users (id) {
        id -> Uuid,
        username -> Varchar,
        /// Normalised, unique via `users_email_key`.
        email -> Varchar,
        /// Argon2id hash in PHC string form.
        password_hash -> Text,
        /// `instructor` or `student`.
        role -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Published courses with their enrolled students.
    courses (id) {
        id -> Uuid,
        title -> Varchar,
        description -> Text,
        price -> Float8,
        image_ref -> Text,
        instructor_id -> Uuid,
        /// Enrolled student ids in enrolment order.
        students -> Array<Uuid>,
        /// Optimistic concurrency counter for roster updates.
        revision -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(courses, users);
