//! Conversation storage.
//!
//! [`ConversationStore`] is the only owner of conversation records. Callers
//! get cloned views; turns are append-only and a record disappears only on
//! explicit deletion.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use folio_core::{
    Clock, ConversationMetadata, ConversationRecord, ConversationSummary, IdGenerator,
    NewConversation, SystemClock, Turn, UuidGenerator,
};

use crate::error::ChatError;

/// Storage operations for conversation records.
pub trait ConversationStore: Send + Sync {
    /// Start a new, empty conversation and return its id.
    fn create(&self, new: NewConversation) -> Result<String, ChatError>;

    /// Append a turn and refresh `updated_at`.
    fn append(&self, id: &str, turn: Turn) -> Result<(), ChatError>;

    /// Full record, or `NotFound`.
    fn get(&self, id: &str) -> Result<ConversationRecord, ChatError>;

    fn contains(&self, id: &str) -> Result<bool, ChatError>;

    /// One summary per record, oldest conversation first.
    fn list(&self) -> Result<Vec<ConversationSummary>, ChatError>;

    /// Remove a record. Unknown ids are not an error.
    fn delete(&self, id: &str) -> Result<(), ChatError>;

    /// Set `ended_at` (first call only).
    fn mark_ended(&self, id: &str) -> Result<(), ChatError>;

    /// Plain-text rendering of the full history.
    fn snapshot(&self, id: &str) -> Result<String, ChatError> {
        let record = self.get(id)?;
        Ok(render_snapshot(&record))
    }
}

/// Render a conversation as numbered `[Role] content` lines under a header.
pub fn render_snapshot(record: &ConversationRecord) -> String {
    let mut lines = Vec::with_capacity(record.messages.len() + 2);
    lines.push(format!("Conversation ID: {}", record.id));
    lines.push("=".repeat(40));
    for (idx, turn) in record.messages.iter().enumerate() {
        lines.push(format!("{}. [{}] {}", idx + 1, turn.role.title(), turn.content));
    }
    lines.join("\n")
}

// =============================================================================
// InMemoryConversationStore
// =============================================================================

/// Process-local store. Contents are lost on restart.
pub struct InMemoryConversationStore {
    records: RwLock<HashMap<String, ConversationRecord>>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl InMemoryConversationStore {
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            clock,
            ids,
        }
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, ConversationRecord>>, ChatError>
    {
        self.records
            .read()
            .map_err(|e| ChatError::Storage(format!("conversation lock poisoned: {}", e)))
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, ConversationRecord>>, ChatError>
    {
        self.records
            .write()
            .map_err(|e| ChatError::Storage(format!("conversation lock poisoned: {}", e)))
    }
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(UuidGenerator))
    }
}

impl ConversationStore for InMemoryConversationStore {
    fn create(&self, new: NewConversation) -> Result<String, ChatError> {
        let id = self.ids.next_id();
        let now = self.clock.now();
        let mut records = self.write()?;
        if records.contains_key(&id) {
            return Err(ChatError::Storage(format!(
                "id generator returned a live id: {}",
                id
            )));
        }
        records.insert(
            id.clone(),
            ConversationRecord {
                id: id.clone(),
                messages: Vec::new(),
                metadata: ConversationMetadata {
                    created_at: now,
                    updated_at: now,
                    ended_at: None,
                    user_email: new.user_email.filter(|e| !e.trim().is_empty()),
                    model: new.model,
                },
            },
        );
        tracing::debug!(conversation_id = %id, "Conversation created");
        Ok(id)
    }

    fn append(&self, id: &str, turn: Turn) -> Result<(), ChatError> {
        let now = self.clock.now();
        let mut records = self.write()?;
        let record = records
            .get_mut(id)
            .ok_or_else(|| ChatError::NotFound(id.to_string()))?;
        record.messages.push(turn);
        record.metadata.updated_at = now.max(record.metadata.updated_at);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<ConversationRecord, ChatError> {
        self.read()?
            .get(id)
            .cloned()
            .ok_or_else(|| ChatError::NotFound(id.to_string()))
    }

    fn contains(&self, id: &str) -> Result<bool, ChatError> {
        Ok(self.read()?.contains_key(id))
    }

    fn list(&self) -> Result<Vec<ConversationSummary>, ChatError> {
        let records = self.read()?;
        let mut summaries: Vec<ConversationSummary> =
            records.values().map(ConversationSummary::from).collect();
        summaries.sort_by(|a, b| {
            a.metadata
                .created_at
                .cmp(&b.metadata.created_at)
                .then_with(|| a.conversation_id.cmp(&b.conversation_id))
        });
        Ok(summaries)
    }

    fn delete(&self, id: &str) -> Result<(), ChatError> {
        if self.write()?.remove(id).is_some() {
            tracing::debug!(conversation_id = %id, "Conversation deleted");
        }
        Ok(())
    }

    fn mark_ended(&self, id: &str) -> Result<(), ChatError> {
        let now = self.clock.now();
        let mut records = self.write()?;
        let record = records
            .get_mut(id)
            .ok_or_else(|| ChatError::NotFound(id.to_string()))?;
        if record.metadata.ended_at.is_none() {
            record.metadata.ended_at = Some(now.max(record.metadata.updated_at));
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{FixedClock, SequentialIds};
    use folio_core::Role;

    fn make_store() -> (InMemoryConversationStore, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::default());
        let store = InMemoryConversationStore::new(clock.clone(), Arc::new(SequentialIds::default()));
        (store, clock)
    }

    fn new_conv() -> NewConversation {
        NewConversation {
            user_email: None,
            model: "llama-3.1-8b-instant".to_string(),
        }
    }

    // ---- Create ----

    #[test]
    fn test_create_assigns_fresh_ids() {
        let (store, _) = make_store();
        let a = store.create(new_conv()).unwrap();
        let b = store.create(new_conv()).unwrap();
        assert_ne!(a, b);
        assert!(store.contains(&a).unwrap());
        assert!(store.contains(&b).unwrap());
    }

    #[test]
    fn test_create_initializes_metadata() {
        let (store, clock) = make_store();
        let id = store
            .create(NewConversation {
                user_email: Some("v@example.com".into()),
                model: "m1".into(),
            })
            .unwrap();
        let record = store.get(&id).unwrap();
        assert!(record.messages.is_empty());
        assert_eq!(record.metadata.created_at, clock.now());
        assert_eq!(record.metadata.updated_at, record.metadata.created_at);
        assert!(record.metadata.ended_at.is_none());
        assert_eq!(record.metadata.user_email.as_deref(), Some("v@example.com"));
        assert_eq!(record.metadata.model, "m1");
    }

    #[test]
    fn test_create_ignores_blank_user_email() {
        let (store, _) = make_store();
        let id = store
            .create(NewConversation {
                user_email: Some("  ".into()),
                model: "m".into(),
            })
            .unwrap();
        assert!(store.get(&id).unwrap().metadata.user_email.is_none());
    }

    #[test]
    fn test_create_rejects_colliding_id() {
        struct Constant;
        impl IdGenerator for Constant {
            fn next_id(&self) -> String {
                "same".to_string()
            }
        }
        let store = InMemoryConversationStore::new(Arc::new(FixedClock::default()), Arc::new(Constant));
        store.create(new_conv()).unwrap();
        let err = store.create(new_conv()).unwrap_err();
        assert!(matches!(err, ChatError::Storage(_)));
    }

    // ---- Append ----

    #[test]
    fn test_append_preserves_order_and_refreshes_updated_at() {
        let (store, clock) = make_store();
        let id = store.create(new_conv()).unwrap();
        let created = clock.now();

        clock.advance_secs(5);
        store.append(&id, Turn::user("first", clock.now())).unwrap();
        clock.advance_secs(5);
        store.append(&id, Turn::assistant("second", clock.now())).unwrap();

        let record = store.get(&id).unwrap();
        assert_eq!(record.messages.len(), 2);
        assert_eq!(record.messages[0].content, "first");
        assert_eq!(record.messages[0].role, Role::User);
        assert_eq!(record.messages[1].content, "second");
        assert_eq!(record.metadata.created_at, created);
        assert_eq!(record.metadata.updated_at, clock.now());
        assert!(record.metadata.updated_at >= record.metadata.created_at);
    }

    #[test]
    fn test_append_unknown_id_not_found() {
        let (store, clock) = make_store();
        let err = store.append("missing", Turn::user("x", clock.now())).unwrap_err();
        assert!(matches!(err, ChatError::NotFound(id) if id == "missing"));
    }

    #[test]
    fn test_updated_at_never_moves_backwards() {
        let (store, clock) = make_store();
        let id = store.create(new_conv()).unwrap();
        clock.advance_secs(10);
        store.append(&id, Turn::user("a", clock.now())).unwrap();
        let later = store.get(&id).unwrap().metadata.updated_at;
        clock.advance_secs(-60);
        store.append(&id, Turn::user("b", clock.now())).unwrap();
        assert_eq!(store.get(&id).unwrap().metadata.updated_at, later);
    }

    // ---- Get / list ----

    #[test]
    fn test_get_nonexistent_not_found() {
        let (store, _) = make_store();
        let err = store.get("nonexistent-id").unwrap_err();
        assert!(matches!(err, ChatError::NotFound(_)));
    }

    #[test]
    fn test_get_returns_detached_copy() {
        let (store, clock) = make_store();
        let id = store.create(new_conv()).unwrap();
        let mut copy = store.get(&id).unwrap();
        copy.messages.push(Turn::user("sneaky", clock.now()));
        assert!(store.get(&id).unwrap().messages.is_empty());
    }

    #[test]
    fn test_list_summaries() {
        let (store, clock) = make_store();
        let a = store.create(new_conv()).unwrap();
        clock.advance_secs(1);
        let b = store.create(new_conv()).unwrap();
        store.append(&b, Turn::user("hello", clock.now())).unwrap();
        store.append(&b, Turn::assistant("hi!", clock.now())).unwrap();

        let list = store.list().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].conversation_id, a);
        assert_eq!(list[0].message_count, 0);
        assert!(list[0].last_message.is_none());
        assert_eq!(list[1].conversation_id, b);
        assert_eq!(list[1].message_count, 2);
        assert_eq!(list[1].last_message.as_ref().unwrap().content, "hi!");
    }

    #[test]
    fn test_list_empty() {
        let (store, _) = make_store();
        assert!(store.list().unwrap().is_empty());
    }

    // ---- Delete ----

    #[test]
    fn test_delete_removes_record() {
        let (store, _) = make_store();
        let id = store.create(new_conv()).unwrap();
        store.delete(&id).unwrap();
        assert!(!store.contains(&id).unwrap());
        assert!(store.get(&id).is_err());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (store, _) = make_store();
        let id = store.create(new_conv()).unwrap();
        store.delete(&id).unwrap();
        assert!(store.delete(&id).is_ok());
        assert!(store.delete("never-existed").is_ok());
    }

    // ---- End ----

    #[test]
    fn test_mark_ended_sets_timestamp() {
        let (store, clock) = make_store();
        let id = store.create(new_conv()).unwrap();
        store.append(&id, Turn::user("a", clock.now())).unwrap();
        clock.advance_secs(30);
        store.mark_ended(&id).unwrap();
        let meta = store.get(&id).unwrap().metadata;
        assert_eq!(meta.ended_at, Some(clock.now()));
        assert!(meta.ended_at.unwrap() >= meta.updated_at);
    }

    #[test]
    fn test_mark_ended_is_set_once() {
        let (store, clock) = make_store();
        let id = store.create(new_conv()).unwrap();
        store.mark_ended(&id).unwrap();
        let first = store.get(&id).unwrap().metadata.ended_at;
        clock.advance_secs(100);
        store.mark_ended(&id).unwrap();
        assert_eq!(store.get(&id).unwrap().metadata.ended_at, first);
    }

    #[test]
    fn test_mark_ended_unknown_not_found() {
        let (store, _) = make_store();
        assert!(matches!(
            store.mark_ended("ghost").unwrap_err(),
            ChatError::NotFound(_)
        ));
    }

    // ---- Snapshot ----

    #[test]
    fn test_snapshot_numbers_turns_in_order() {
        let (store, clock) = make_store();
        let id = store.create(new_conv()).unwrap();
        let turns = [
            Turn::user("Hi", clock.now()),
            Turn::assistant("Hello! How can I help?", clock.now()),
            Turn::user("Tell me about your projects", clock.now()),
        ];
        for t in turns.iter().cloned() {
            store.append(&id, t).unwrap();
        }

        let snap = store.snapshot(&id).unwrap();
        let lines: Vec<&str> = snap.lines().collect();
        assert_eq!(lines[0], format!("Conversation ID: {}", id));
        assert_eq!(lines[1], "=".repeat(40));
        assert_eq!(lines.len(), 2 + turns.len());
        assert_eq!(lines[2], "1. [User] Hi");
        assert_eq!(lines[3], "2. [Assistant] Hello! How can I help?");
        assert_eq!(lines[4], "3. [User] Tell me about your projects");
    }

    #[test]
    fn test_snapshot_empty_conversation_is_header_only() {
        let (store, _) = make_store();
        let id = store.create(new_conv()).unwrap();
        assert_eq!(store.snapshot(&id).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_snapshot_capitalizes_system_role() {
        let (store, clock) = make_store();
        let id = store.create(new_conv()).unwrap();
        store
            .append(&id, Turn::new(Role::System, "note", clock.now()))
            .unwrap();
        assert!(store.snapshot(&id).unwrap().ends_with("1. [System] note"));
    }

    #[test]
    fn test_snapshot_unknown_not_found() {
        let (store, _) = make_store();
        assert!(matches!(
            store.snapshot("nope").unwrap_err(),
            ChatError::NotFound(_)
        ));
    }

    // ---- Concurrency ----

    #[test]
    fn test_concurrent_appends_to_different_conversations() {
        use std::thread;

        let store = Arc::new(InMemoryConversationStore::default());
        let ids: Vec<String> = (0..8)
            .map(|_| store.create(new_conv()).unwrap())
            .collect();

        let handles: Vec<_> = ids
            .iter()
            .cloned()
            .map(|id| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..25 {
                        store
                            .append(&id, Turn::user(format!("{} #{}", id, i), chrono::Utc::now()))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        for id in &ids {
            let record = store.get(id).unwrap();
            assert_eq!(record.messages.len(), 25);
            assert!(record.messages.iter().all(|t| t.content.starts_with(id.as_str())));
            assert_eq!(record.messages[24].content, format!("{} #24", id));
        }
    }
}
