//! Routing table from `(key, sender)` to the control that owns it.

use std::collections::HashMap;

use crate::domain::control::SenderRestriction;
use crate::domain::error::ConfigError;
use crate::domain::event::Sender;
use crate::keymap::Key;

/// Index of a control inside the engine that registered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId(pub usize);

#[derive(Debug, Clone)]
struct Owner {
    id: ControlId,
    label: String,
}

/// Maps each `(key, sender)` pair to at most one control.
#[derive(Debug, Default)]
pub struct ControlRegistry {
    owners: HashMap<(Key, Sender), Owner>,
}

impl ControlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `key` for every sender `restriction` allows.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateKeyOwner`] if any of the pairs is
    /// already owned.  Nothing is claimed in that case.
    pub fn register(
        &mut self,
        key: Key,
        restriction: SenderRestriction,
        id: ControlId,
        label: &str,
    ) -> Result<(), ConfigError> {
        self.register_control([key], restriction, id, label)
    }

    /// Claims every key of one control, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateKeyOwner`] for the first pair owned by
    /// a different control.  The registry is left unchanged.  Pairs already
    /// owned by `id` are accepted as they are.
    pub fn register_control(
        &mut self,
        keys: impl IntoIterator<Item = Key>,
        restriction: SenderRestriction,
        id: ControlId,
        label: &str,
    ) -> Result<(), ConfigError> {
        let pairs: Vec<(Key, Sender)> = keys
            .into_iter()
            .flat_map(|key| restriction.claimed_senders().iter().map(move |s| (key, *s)))
            .collect();

        for (key, sender) in &pairs {
            if let Some(owner) = self.owners.get(&(*key, *sender)) {
                if owner.id == id {
                    continue;
                }
                return Err(ConfigError::DuplicateKeyOwner {
                    key: *key,
                    sender: *sender,
                    owner: owner.label.clone(),
                    claimant: label.to_string(),
                });
            }
        }

        for pair in pairs {
            self.owners.insert(
                pair,
                Owner {
                    id,
                    label: label.to_string(),
                },
            );
        }
        Ok(())
    }

    /// The control that handles `key` events from `sender`, if any.
    pub fn resolve(&self, key: Key, sender: Sender) -> Option<ControlId> {
        self.owners.get(&(key, sender)).map(|owner| owner.id)
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_restriction_claims_both_senders() {
        let mut registry = ControlRegistry::new();
        registry
            .register(Key::A, SenderRestriction::Any, ControlId(0), "Button(A)")
            .unwrap();
        assert_eq!(registry.resolve(Key::A, Sender::Host), Some(ControlId(0)));
        assert_eq!(registry.resolve(Key::A, Sender::Player), Some(ControlId(0)));
    }

    #[test]
    fn test_host_only_leaves_player_slot_free() {
        // Arrange
        let mut registry = ControlRegistry::new();
        registry
            .register(Key::A, SenderRestriction::HostOnly, ControlId(0), "Button(A, host_only)")
            .unwrap();

        // Act
        let result = registry.register(Key::A, SenderRestriction::Any, ControlId(1), "Button(A)");

        // Assert
        assert!(matches!(
            result,
            Err(ConfigError::DuplicateKeyOwner { key: Key::A, sender: Sender::Host, .. })
        ));
        assert_eq!(registry.resolve(Key::A, Sender::Player), None);
    }

    #[test]
    fn test_conflict_names_owner_and_claimant() {
        let mut registry = ControlRegistry::new();
        registry
            .register(Key::A, SenderRestriction::Any, ControlId(0), "Button(A)")
            .unwrap();

        let err = registry
            .register(Key::A, SenderRestriction::Any, ControlId(1), "Button(A, alt)")
            .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("Button(A)"));
        assert!(msg.contains("Button(A, alt)"));
    }

    #[test]
    fn test_failed_registration_leaves_registry_unchanged() {
        // Arrange
        let mut registry = ControlRegistry::new();
        registry
            .register(Key::Up, SenderRestriction::Any, ControlId(0), "Button(UP)")
            .unwrap();
        let before = registry.len();

        // Act: W is free but its alternate UP is not.
        let result = registry.register_control(
            [Key::W, Key::Up],
            SenderRestriction::Any,
            ControlId(1),
            "Button(W)",
        );

        // Assert
        assert!(result.is_err());
        assert_eq!(registry.len(), before);
        assert_eq!(registry.resolve(Key::W, Sender::Player), None);
    }

    #[test]
    fn test_every_key_rejects_a_second_owner_without_mutation() {
        for restriction in [SenderRestriction::Any, SenderRestriction::HostOnly] {
            for key in Key::ALL {
                // Arrange
                let mut registry = ControlRegistry::new();
                registry
                    .register(key, restriction, ControlId(0), "first")
                    .unwrap();
                let before = registry.len();

                // Act
                let result = registry.register(key, restriction, ControlId(1), "second");

                // Assert
                assert!(
                    matches!(result, Err(ConfigError::DuplicateKeyOwner { key: k, .. }) if k == key),
                    "{key} under {restriction:?} must conflict"
                );
                assert_eq!(registry.len(), before);
                for sender in [Sender::Host, Sender::Player] {
                    let expected = restriction
                        .claimed_senders()
                        .contains(&sender)
                        .then_some(ControlId(0));
                    assert_eq!(registry.resolve(key, sender), expected);
                }
            }
        }
    }

    #[test]
    fn test_same_control_may_reclaim_its_own_pairs() {
        // Arrange
        let mut registry = ControlRegistry::new();
        registry
            .register(Key::S, SenderRestriction::Any, ControlId(3), "Button(S)")
            .unwrap();

        // Act
        let result = registry.register_control(
            [Key::S, Key::Down],
            SenderRestriction::Any,
            ControlId(3),
            "Button(S)",
        );

        // Assert
        assert!(result.is_ok());
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.resolve(Key::Down, Sender::Player), Some(ControlId(3)));
    }

    #[test]
    fn test_unclaimed_key_resolves_to_none() {
        let registry = ControlRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.resolve(Key::Z, Sender::Host), None);
    }
}
