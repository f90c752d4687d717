use crate::errors::Result;

/// Identity lookup owned by the surrounding system. The engine only needs
/// a delivery address for a user id; account and session management stay
/// outside this crate.
pub trait UserDirectoryTrait: Send + Sync {
    /// The user's email address, or `None` when the user has no usable one.
    fn email_for_user(&self, user_id: &str) -> Result<Option<String>>;
}
