//! Authentication for the API: credential storage, bearer token issuance and
//! verification, and the request guard. Keep the public surface thin and
//! split implementation across sub-modules.

mod credentials;
mod gate;
mod token;

pub use credentials::{CredentialStore, User};
pub use gate::{require_auth, Principal};
pub use token::{TokenError, TokenService};
