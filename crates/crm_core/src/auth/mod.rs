//! Sign-in / sign-up flows and their error vocabulary.

pub mod exception;
pub mod password;
pub mod sign_in_up;

pub use exception::{AuthError, AuthException, AuthExceptionCode, AuthResult};
pub use password::{compare_hash, hash_password, is_password_valid, PASSWORD_REGEX};
pub use sign_in_up::{PictureFetcher, SignInUpInput, SignInUpService};
