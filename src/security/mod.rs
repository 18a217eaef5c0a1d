//! Security subsystem.
//!
//! # Responsibilities
//! - Password hashing and verification for user accounts
//!
//! # Design Decisions
//! - Hashing sits behind a trait so handlers never depend on the algorithm
//! - Authentication gates live in handler construction, not middleware

pub mod password;

pub use password::{Argon2Hasher, PasswordError, PasswordHasher};
