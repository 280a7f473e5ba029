//! Application Layer
//!
//! Use cases and application services.

pub mod check_session;
pub mod config;
pub mod email_verification;
pub mod password_reset;
pub mod session_token;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;

// Re-exports
pub use check_session::{CheckSessionUseCase, CurrentUser};
pub use config::AuthConfig;
pub use email_verification::{EmailVerificationUseCase, ResendOutcome, VerifyOutcome};
pub use password_reset::{PasswordResetUseCase, ResetPasswordInput};
pub use sign_in::{ClientFingerprint, SignInInput, SignInOutput, SignInUseCase};
pub use sign_out::SignOutUseCase;
pub use sign_up::{SignUpInput, SignUpOutput, SignUpUseCase};
