//! App state - the working set of collections and the current selection

use std::collections::HashMap;

use crate::error::StorageError;
use crate::models::{Auth, Call, Collection};
use crate::network::PreparedRequest;
use crate::storage::Repository;
use crate::tracker::Tracked;

/// Current selection
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub collection_id: Option<String>,
    pub call_id: Option<String>,
}

/// All collections in memory plus the repository they persist to
pub struct AppState {
    pub(crate) collections: Vec<Collection>,
    /// call id -> owning collection id
    pub(crate) owners: HashMap<String, String>,
    pub(crate) selection: Selection,
    pub(crate) repository: Box<dyn Repository>,
}

impl AppState {
    /// Empty working set backed by `repository`
    pub fn new(repository: Box<dyn Repository>) -> Self {
        AppState {
            collections: Vec::new(),
            owners: HashMap::new(),
            selection: Selection::default(),
            repository,
        }
    }

    /// Load every collection from `repository`. All calls start clean.
    pub fn load(repository: Box<dyn Repository>) -> Result<Self, StorageError> {
        let mut state = AppState::new(repository);
        state.collections = state.repository.load()?;
        for collection in &mut state.collections {
            for call in &mut collection.calls {
                call.commit();
            }
        }
        state.reindex();
        Ok(state)
    }

    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    pub fn collection(&self, id: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.id == id)
    }

    pub fn collection_by_name(&self, name: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// Collection owning the call, in constant time
    pub fn collection_of(&self, call_id: &str) -> Option<&Collection> {
        let owner = self.owners.get(call_id)?;
        self.collection(owner)
    }

    pub fn find_call(&self, call_id: &str) -> Option<&Tracked<Call>> {
        self.collection_of(call_id)?.find_call(call_id)
    }

    /// In-memory edit access. Changes are persisted by [`AppState::save`].
    pub fn call_mut(&mut self, call_id: &str) -> Option<&mut Tracked<Call>> {
        let owner = self.owners.get(call_id)?.clone();
        self.collections
            .iter_mut()
            .find(|c| c.id == owner)?
            .find_call_mut(call_id)
    }

    /// URL with the owning collection's base URL substituted
    pub fn effective_url(&self, call_id: &str) -> Option<String> {
        let call = self.find_call(call_id)?;
        Some(call.resolve_url(self.collection_of(call_id)))
    }

    /// Auth applied when sending, following `inherit`
    pub fn effective_auth(&self, call_id: &str) -> Option<Auth> {
        let call = self.find_call(call_id)?;
        call.resolve_auth(self.collection_of(call_id))
    }

    /// Everything the executor needs to send the call
    pub fn prepare_request(&self, call_id: &str) -> Option<PreparedRequest> {
        let call = self.find_call(call_id)?;
        Some(PreparedRequest::from_call(call, self.collection_of(call_id)))
    }

    /// Ids of calls edited since they were last loaded or saved
    pub fn dirty_calls(&self) -> Vec<&str> {
        self.collections
            .iter()
            .flat_map(|c| c.calls.iter())
            .filter(|call| call.was_changed())
            .map(|call| call.id.as_str())
            .collect()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        !self.dirty_calls().is_empty()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected_collection(&self) -> Option<&Collection> {
        self.collection(self.selection.collection_id.as_deref()?)
    }

    pub fn selected_call(&self) -> Option<&Tracked<Call>> {
        self.find_call(self.selection.call_id.as_deref()?)
    }

    /// Select a collection by id. Returns false when it does not exist.
    pub fn select_collection(&mut self, collection_id: &str) -> bool {
        if self.collection(collection_id).is_none() {
            return false;
        }
        if self.selection.collection_id.as_deref() != Some(collection_id) {
            self.selection.call_id = None;
        }
        self.selection.collection_id = Some(collection_id.to_string());
        true
    }

    /// Select a call and its owning collection
    pub fn select_call(&mut self, call_id: &str) -> bool {
        let Some(owner) = self.owners.get(call_id).cloned() else {
            return false;
        };
        self.selection.collection_id = Some(owner);
        self.selection.call_id = Some(call_id.to_string());
        true
    }

    /// Rebuild the call owner index and drop stale selections
    pub(crate) fn reindex(&mut self) {
        self.owners.clear();
        for collection in &self.collections {
            for call in &collection.calls {
                self.owners
                    .entry(call.id.clone())
                    .or_insert_with(|| collection.id.clone());
            }
        }

        let collection_gone = self
            .selection
            .collection_id
            .as_deref()
            .is_some_and(|id| self.collection(id).is_none());
        if collection_gone {
            self.selection = Selection::default();
        }
        let call_gone = self
            .selection
            .call_id
            .as_deref()
            .is_some_and(|id| !self.owners.contains_key(id));
        if call_gone {
            self.selection.call_id = None;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::storage::JsonStorage;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// In-memory repository that counts saves
    #[derive(Clone, Default)]
    pub(crate) struct MemoryRepository {
        pub stored: Rc<RefCell<Vec<Collection>>>,
        pub saves: Rc<Cell<usize>>,
    }

    impl Repository for MemoryRepository {
        fn load(&self) -> Result<Vec<Collection>, StorageError> {
            Ok(self.stored.borrow().clone())
        }

        fn save(&self, collections: &[Collection]) -> Result<(), StorageError> {
            *self.stored.borrow_mut() = collections.to_vec();
            self.saves.set(self.saves.get() + 1);
            Ok(())
        }
    }

    pub(crate) fn sample_collection() -> Collection {
        let mut collection = Collection::new("Pets");
        collection.base_url = "https://api.example.com".to_string();
        collection.auth = Some(Auth::BearerToken {
            token: "secret".to_string(),
        });

        let mut call = Call::new();
        call.id = "list".to_string();
        call.url = "{{BASE_URL}}/pets".to_string();
        call.auth = Some(Auth::Inherit);
        collection.upsert_call(call);
        collection
    }

    pub(crate) fn memory_state() -> (MemoryRepository, AppState) {
        let repo = MemoryRepository::default();
        repo.stored.borrow_mut().push(sample_collection());
        let state = AppState::load(Box::new(repo.clone())).unwrap();
        (repo, state)
    }

    #[test]
    fn test_load_indexes_calls() {
        let (_, state) = memory_state();
        let owner = state.collection_of("list").unwrap();
        assert_eq!(owner.name, "Pets");
        assert!(state.collection_of("missing").is_none());
        assert!(state.dirty_calls().is_empty());
    }

    #[test]
    fn test_load_from_json_storage() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::in_dir(dir.path());
        storage.save(&[sample_collection()]).unwrap();

        let state = AppState::load(Box::new(storage)).unwrap();
        assert_eq!(state.collections().len(), 1);
        assert!(state.find_call("list").is_some());
    }

    #[test]
    fn test_effective_url_and_auth() {
        let (_, state) = memory_state();
        assert_eq!(
            state.effective_url("list").as_deref(),
            Some("https://api.example.com/pets")
        );
        assert_eq!(
            state.effective_auth("list"),
            Some(Auth::BearerToken {
                token: "secret".to_string()
            })
        );

        let request = state.prepare_request("list").unwrap();
        assert_eq!(request.url, "https://api.example.com/pets");
        assert!(state.prepare_request("missing").is_none());
    }

    #[test]
    fn test_call_mut_marks_dirty() {
        let (_, mut state) = memory_state();
        state.call_mut("list").unwrap().method = "POST".to_string();
        assert_eq!(state.dirty_calls(), vec!["list"]);
        assert!(state.has_unsaved_changes());
    }

    #[test]
    fn test_selection() {
        let (_, mut state) = memory_state();
        assert!(state.selected_collection().is_none());
        assert!(!state.select_collection("nope"));

        assert!(state.select_call("list"));
        assert_eq!(state.selected_collection().unwrap().name, "Pets");
        assert_eq!(state.selected_call().unwrap().id, "list");
    }
}
