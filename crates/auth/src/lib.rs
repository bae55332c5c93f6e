//! `relieftrack-auth`: authentication and authorization boundary.
//!
//! Token signing/verification, the claims model, the role→permission policy
//! and the permission check. Decoupled from HTTP and storage.

pub mod authorize;
pub mod claims;
pub mod credentials;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod token;

pub use authorize::{AuthzError, authorize};
pub use claims::{JwtClaims, TokenError, validate_claims};
pub use credentials::AdminCredentials;
pub use permissions::{Permission, permissions_for_roles};
pub use principal::Principal;
pub use roles::Role;
pub use token::{Hs256Tokens, JwtValidator};
