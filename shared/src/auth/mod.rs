//! # Authentication Module
//!
//! Authentication primitives shared by the server crate.
//!
//! ```text
//! auth/
//! ├── password.rs   - Argon2id password hashing + strength validation
//! └── middleware.rs - Bearer session-token extractor for Actix-web
//! ```
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`PasswordHasher`] | Argon2id password hashing |
//! | [`PasswordValidator`] | Password strength rule |
//! | [`AuthenticatedUser`] | Extractor for the authenticated principal |
//! | [`SessionValidator`] | Injected dependency resolving a token to a principal |

pub mod middleware;
pub mod password;

pub use middleware::{extract_bearer_token, AuthenticatedUser, SessionValidator};
pub use password::{PasswordHasher, PasswordValidator};
