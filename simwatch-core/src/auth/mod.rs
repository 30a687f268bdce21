//! Credential issuance, resolution, and revocation.

mod revocation;
mod token;

pub use revocation::RevocationCache;
pub use token::{AuthError, AuthOutcome, Claims, IssuedToken, OperatorIdentity, TokenService};
