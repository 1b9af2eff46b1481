//! Change tracking - remembers the committed hash next to a live value

use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::hashing::compute_hash;

/// A value paired with the hash it had at the last load or save.
///
/// Serializes exactly like the wrapped value; the hash never reaches disk.
/// Deserializing records the loaded state as committed.
#[derive(Clone, Debug)]
pub struct Tracked<T> {
    value: T,
    committed: String,
}

impl<T: Serialize> Tracked<T> {
    /// Wrap a value, treating its current state as committed
    pub fn new(value: T) -> Self {
        let committed = compute_hash(&value);
        Tracked { value, committed }
    }

    /// True when the value differs from its state at the last commit
    pub fn was_changed(&self) -> bool {
        compute_hash(&self.value) != self.committed
    }

    /// Record the current state as committed (after load or save)
    pub fn commit(&mut self) {
        self.committed = compute_hash(&self.value);
    }

    /// Replace the value without committing it
    pub fn set(&mut self, value: T) {
        self.value = value;
    }
}

impl<T> Tracked<T> {
    /// Wrap a value that has never been committed. It reports changed
    /// until the first commit.
    pub fn pending(value: T) -> Self {
        Tracked {
            value,
            committed: String::new(),
        }
    }

    /// Forget the committed state so the value reports changed
    pub fn mark_changed(&mut self) {
        self.committed.clear();
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for Tracked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for Tracked<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: PartialEq> PartialEq for Tracked<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: Serialize> From<T> for Tracked<T> {
    fn from(value: T) -> Self {
        Tracked::new(value)
    }
}

impl<T: Serialize> Serialize for Tracked<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T: Serialize + Deserialize<'de>> Deserialize<'de> for Tracked<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Tracked::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Call;

    #[test]
    fn test_clean_after_wrap() {
        let tracked = Tracked::new(Call::new());
        assert!(!tracked.was_changed());
    }

    #[test]
    fn test_mutation_then_commit() {
        let mut tracked = Tracked::new(Call::new());
        tracked.method = "POST".to_string();
        assert!(tracked.was_changed());

        tracked.commit();
        assert!(!tracked.was_changed());
    }

    #[test]
    fn test_reverting_edit_is_clean() {
        let mut tracked = Tracked::new(Call::new());
        tracked.url = "https://example.com".to_string();
        assert!(tracked.was_changed());
        tracked.url.clear();
        assert!(!tracked.was_changed());
    }

    #[test]
    fn test_serializes_as_inner_value() {
        let call = Call::new();
        let tracked = Tracked::new(call.clone());
        assert_eq!(
            serde_json::to_value(&tracked).unwrap(),
            serde_json::to_value(&call).unwrap()
        );
    }

    #[test]
    fn test_deserialized_value_is_committed() {
        let json = r#"{"id":"c1","name":"","url":"https://x","method":"GET","headers":[],"auth":null,"data":"","data_type":""}"#;
        let tracked: Tracked<Call> = serde_json::from_str(json).unwrap();
        assert_eq!(tracked.id, "c1");
        assert!(!tracked.was_changed());
    }

    #[test]
    fn test_set_leaves_value_uncommitted() {
        let mut tracked = Tracked::new(Call::new());
        let mut edited = tracked.get().clone();
        edited.name = "List users".to_string();
        tracked.set(edited);
        assert_eq!(tracked.name, "List users");
        assert!(tracked.was_changed());

        tracked.commit();
        assert!(!tracked.was_changed());
    }

    #[test]
    fn test_pending_until_first_commit() {
        let mut tracked = Tracked::pending(Call::new());
        assert!(tracked.was_changed());
        tracked.commit();
        assert!(!tracked.was_changed());

        tracked.mark_changed();
        assert!(tracked.was_changed());
    }
}
