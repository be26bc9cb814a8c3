pub mod firebase;
pub mod middleware;

pub use firebase::{FirebaseTokenVerifier, FIREBASE_JWKS_URL};
pub use middleware::{AuthenticatedUser, Claims, TokenVerifier};
