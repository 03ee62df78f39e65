//! Identity provider trait abstraction.
//!
//! Answer sessions and telemetry attribute requests to a user id that is
//! stable for the lifetime of a client instance. The production
//! implementation is [`crate::profile::Profile`]; tests use
//! [`crate::adapters::mock::FixedIdentity`].

/// Source of the stable per-client user identifier.
pub trait IdentityProvider: Send + Sync {
    /// The user id attached to every answer request.
    ///
    /// Must return the same value for the lifetime of the provider.
    fn user_id(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Static;

    impl IdentityProvider for Static {
        fn user_id(&self) -> String {
            "user-1".to_string()
        }
    }

    #[test]
    fn test_identity_provider_is_object_safe() {
        let provider: Box<dyn IdentityProvider> = Box::new(Static);
        assert_eq!(provider.user_id(), "user-1");
        assert_eq!(provider.user_id(), "user-1");
    }
}
