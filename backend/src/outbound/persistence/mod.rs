//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Adapters translate between Diesel rows (`models.rs`, `schema.rs`, both
//! private) and domain types; they hold no business rules. Connections come
//! from a `bb8` pool through `diesel-async`.
//!
//! ```ignore
//! use courses_backend::outbound::persistence::{DbPool, DieselCourseRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/courses")).await?;
//! let repo = DieselCourseRepository::new(pool);
//! ```

mod diesel_account_repository;
mod diesel_course_repository;
mod diesel_user_directory;
mod error_mapping;
mod models;
mod pool;
mod schema;

pub use diesel_account_repository::DieselAccountRepository;
pub use diesel_course_repository::DieselCourseRepository;
pub use diesel_user_directory::DieselUserDirectory;
pub use pool::{DbPool, PoolConfig, PoolError};
