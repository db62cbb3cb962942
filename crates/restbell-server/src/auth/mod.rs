//! Authentication for the Restbell server.
//!
//! The server validates bearer access tokens signed with a shared secret;
//! issuing production tokens is the account service's job. Issuance is kept
//! here for the test suite and local tooling.

pub mod claims;
pub mod jwt;

pub use claims::Claims;
pub use jwt::JwtManager;
