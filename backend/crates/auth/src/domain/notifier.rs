//! Notification port
//!
//! Delivery of signed links (mail transport lives in `infra`).

use crate::domain::entity::user::User;
use crate::domain::signed_url::SignedLink;
use crate::error::AuthResult;

#[trait_variant::make(VerificationNotifier: Send)]
pub trait LocalVerificationNotifier {
    /// Deliver an email verification `link` to `user`'s current address
    async fn send_verification_link(&self, user: &User, link: &SignedLink) -> AuthResult<()>;

    /// Deliver a password reset `link` to `user`'s current address
    async fn send_password_reset_link(&self, user: &User, link: &SignedLink) -> AuthResult<()>;
}
