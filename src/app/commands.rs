//! Command handlers - mutations of the working set
//!
//! Every mutation that changes something persists the full set through the
//! repository and reindexes call ownership. Mutations that find no target
//! return `Ok(false)` and leave the store untouched. A failed save keeps
//! the in-memory change so it can be retried.

use std::collections::HashSet;

use uuid::Uuid;

use crate::app::AppState;
use crate::error::StorageError;
use crate::models::{Auth, AuthField, AuthKind, Call, Collection};

impl AppState {
    // ========================
    // Persistence
    // ========================

    /// Write the whole set and mark every call clean
    pub fn save(&mut self) -> Result<(), StorageError> {
        self.repository.save(&self.collections)?;
        for collection in &mut self.collections {
            for call in &mut collection.calls {
                call.commit();
            }
        }
        Ok(())
    }

    fn persist(&mut self) -> Result<(), StorageError> {
        self.reindex();
        self.save()
    }

    /// Incoming calls stay changed until a save goes through
    fn mark_calls_changed(collection: &mut Collection) {
        for call in &mut collection.calls {
            call.mark_changed();
        }
    }

    // ========================
    // Collections
    // ========================

    /// Append a collection under a fresh id and return that id
    pub fn create_collection(&mut self, mut collection: Collection) -> Result<String, StorageError> {
        collection.id = Uuid::new_v4().to_string();
        Self::mark_calls_changed(&mut collection);
        let id = collection.id.clone();
        tracing::info!(id = %id, name = %collection.name, "Creating collection");
        self.collections.push(collection);
        self.persist()?;
        Ok(id)
    }

    /// Replace the collection with the same id
    pub fn update_collection(&mut self, mut collection: Collection) -> Result<bool, StorageError> {
        let Some(slot) = self.collections.iter_mut().find(|c| c.id == collection.id) else {
            return Ok(false);
        };
        Self::mark_calls_changed(&mut collection);
        *slot = collection;
        self.persist()?;
        Ok(true)
    }

    /// Remove a collection and its calls. Clears the selection when it
    /// pointed into the removed collection.
    pub fn remove_collection(&mut self, collection_id: &str) -> Result<bool, StorageError> {
        let before = self.collections.len();
        self.collections.retain(|c| c.id != collection_id);
        if self.collections.len() == before {
            return Ok(false);
        }
        tracing::info!(id = collection_id, "Removed collection");
        self.persist()?;
        Ok(true)
    }

    /// Index of the collection named `name`, creating it when absent
    fn get_or_create_collection(&mut self, name: &str) -> usize {
        if let Some(index) = self.collections.iter().position(|c| c.name == name) {
            return index;
        }
        tracing::info!(name, "Creating collection for new call");
        self.collections.push(Collection::new(name));
        self.collections.len() - 1
    }

    /// Upsert a call into the collection named `collection_name`,
    /// returning the owning collection id. A call whose id belongs to
    /// another collection is moved out of it.
    pub fn add_to_collection(
        &mut self,
        collection_name: &str,
        call: Call,
    ) -> Result<String, StorageError> {
        let index = self.get_or_create_collection(collection_name);
        let previous_owner = self
            .owners
            .get(&call.id)
            .filter(|owner| **owner != self.collections[index].id)
            .cloned();
        if let Some(owner) = previous_owner {
            if let Some(old) = self.collections.iter_mut().find(|c| c.id == owner) {
                old.calls.retain(|c| c.id != call.id);
            }
            tracing::info!(call_id = %call.id, from = %owner, "Moving call to another collection");
        }

        let collection = &mut self.collections[index];
        collection.upsert_call(call);
        let id = collection.id.clone();
        self.persist()?;
        Ok(id)
    }

    /// Add an imported collection. It gets a fresh id and any call id
    /// already present in the working set is replaced.
    pub fn import_collection(&mut self, mut collection: Collection) -> Result<String, StorageError> {
        collection.id = Uuid::new_v4().to_string();
        let mut taken: HashSet<String> = self.owners.keys().cloned().collect();
        for call in &mut collection.calls {
            if !taken.insert(call.id.clone()) {
                let fresh = Uuid::new_v4().to_string();
                tracing::warn!(old = %call.id, new = %fresh, "Call id already in use, reassigning");
                call.id = fresh.clone();
                taken.insert(fresh);
            }
        }
        Self::mark_calls_changed(&mut collection);

        let id = collection.id.clone();
        tracing::info!(id = %id, calls = collection.calls.len(), "Imported collection");
        self.collections.push(collection);
        self.persist()?;
        Ok(id)
    }

    // ========================
    // Calls
    // ========================

    /// Replace every stored call with the same id
    pub fn update_call(&mut self, call: Call) -> Result<bool, StorageError> {
        let mut found = false;
        for collection in &mut self.collections {
            for slot in collection.calls.iter_mut().filter(|c| c.id == call.id) {
                slot.set(call.clone());
                found = true;
            }
        }
        if !found {
            return Ok(false);
        }
        tracing::debug!(call_id = %call.id, "Updated call");
        self.persist()?;
        Ok(true)
    }

    /// Remove a call from whichever collection owns it
    pub fn remove_call(&mut self, call_id: &str) -> Result<bool, StorageError> {
        let Some(owner) = self.owners.get(call_id).cloned() else {
            return Ok(false);
        };
        if let Some(collection) = self.collections.iter_mut().find(|c| c.id == owner) {
            collection.calls.retain(|c| c.id != call_id);
        }
        tracing::debug!(call_id, collection = %owner, "Removed call");
        self.persist()?;
        Ok(true)
    }

    fn edit_call<F>(&mut self, call_id: &str, edit: F) -> Result<bool, StorageError>
    where
        F: FnOnce(&mut Call) -> bool,
    {
        let Some(call) = self.call_mut(call_id) else {
            return Ok(false);
        };
        if !edit(&mut **call) {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Set or clear a call's auth
    pub fn set_call_auth(&mut self, call_id: &str, auth: Option<Auth>) -> Result<bool, StorageError> {
        self.edit_call(call_id, |call| {
            call.auth = auth;
            true
        })
    }

    /// Switch auth variant. Credentials are cleared on a variant change and
    /// kept when the variant is unchanged.
    pub fn set_call_auth_kind(&mut self, call_id: &str, kind: AuthKind) -> Result<bool, StorageError> {
        self.edit_call(call_id, |call| {
            if call.auth.as_ref().map(Auth::kind) != Some(kind) {
                call.auth = Some(Auth::empty(kind));
            }
            true
        })
    }

    /// Set one credential field. No-op when the call has no auth or the
    /// field does not belong to its variant.
    pub fn set_call_auth_value(
        &mut self,
        call_id: &str,
        field: AuthField,
        value: &str,
    ) -> Result<bool, StorageError> {
        self.edit_call(call_id, |call| match call.auth.as_mut() {
            Some(auth) => auth.set_field(field, value),
            None => false,
        })
    }
}
