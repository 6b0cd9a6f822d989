//! Outbound adapters implementing the driven domain ports.
//!
//! - **memory**: process-local course and account stores
//! - **password**: Argon2id password hashing
//! - **persistence**: PostgreSQL-backed adapters using Diesel ORM
//!
//! Adapters convert between domain types and storage representations. They
//! contain no business logic.

pub mod memory;
pub mod password;
pub mod persistence;
