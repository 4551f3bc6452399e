//! Conversation repository: CRUD and mutation operations over the persisted
//! conversation list.
//!
//! Every operation is read-entire-list, transform, write-entire-list, and
//! returns the freshly persisted list so the caller's view is always
//! consistent with storage.  There is no in-memory cache to go stale.
//!
//! Operations referencing a missing conversation, message, or user return a
//! typed not-found error and leave the persisted list untouched.

use crate::model::{
    Conversation, Message, Profile, ProfilePatch, Reaction, User, UserPatch, LOCAL_USER_ID,
    NOW_LABEL,
};
use crate::seed;
use crate::store::{BlobStore, StoreError, CONVERSATIONS_KEY, PROFILE_KEY};
use crate::{logging, mlog};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum RepoError {
    Store(StoreError),
    ConversationNotFound(String),
    MessageNotFound(String),
    UserNotFound(String),
}

impl std::fmt::Display for RepoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepoError::Store(e) => write!(f, "store error: {e}"),
            RepoError::ConversationNotFound(id) => write!(f, "conversation not found: {id}"),
            RepoError::MessageNotFound(id) => write!(f, "message not found: {id}"),
            RepoError::UserNotFound(id) => write!(f, "user not found: {id}"),
        }
    }
}

impl std::error::Error for RepoError {}

impl From<StoreError> for RepoError {
    fn from(e: StoreError) -> Self {
        RepoError::Store(e)
    }
}

impl RepoError {
    /// Whether this error names a missing id rather than a storage failure.
    pub fn is_not_found(&self) -> bool {
        !matches!(self, RepoError::Store(_))
    }
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

pub struct ConversationRepository {
    store: BlobStore,
}

impl ConversationRepository {
    pub fn new(store: BlobStore) -> Self {
        Self { store }
    }

    // -- profile ------------------------------------------------------------

    /// The local user's profile, seeded on first read.  A corrupt stored
    /// blob is replaced by the seed rather than failing the caller.
    pub fn own_profile(&self) -> Result<Profile, StoreError> {
        match self.store.load(PROFILE_KEY)? {
            Some(raw) => match serde_json::from_str::<Profile>(&raw) {
                Ok(profile) => Ok(profile),
                Err(e) => {
                    mlog!("profile blob failed to parse, reseeding: {e}");
                    self.seed_profile()
                }
            },
            None => self.seed_profile(),
        }
    }

    /// Shallow-merge the set fields of `patch` into the profile.
    pub fn update_own_profile(&self, patch: &ProfilePatch) -> Result<Profile, StoreError> {
        let mut profile = self.own_profile()?;
        patch.apply(&mut profile);
        self.store
            .save(PROFILE_KEY, &serde_json::to_string(&profile)?)?;
        Ok(profile)
    }

    fn seed_profile(&self) -> Result<Profile, StoreError> {
        let profile = seed::default_profile();
        self.store
            .save(PROFILE_KEY, &serde_json::to_string(&profile)?)?;
        Ok(profile)
    }

    // -- conversation list --------------------------------------------------

    /// The full conversation list, seeded on first read.  Write-through on
    /// first read keeps subsequent reads stable.
    pub fn list_conversations(&self) -> Result<Vec<Conversation>, StoreError> {
        match self.store.load(CONVERSATIONS_KEY)? {
            Some(raw) => match serde_json::from_str::<Vec<Conversation>>(&raw) {
                Ok(conversations) => Ok(conversations),
                Err(e) => {
                    mlog!("conversation blob failed to parse, reseeding: {e}");
                    self.seed_conversations()
                }
            },
            None => self.seed_conversations(),
        }
    }

    fn seed_conversations(&self) -> Result<Vec<Conversation>, StoreError> {
        let conversations = seed::default_conversations();
        self.save_list(&conversations)?;
        Ok(conversations)
    }

    fn save_list(&self, conversations: &[Conversation]) -> Result<(), StoreError> {
        self.store
            .save(CONVERSATIONS_KEY, &serde_json::to_string(conversations)?)
    }

    /// Read-modify-write helper for operations scoped to one conversation.
    fn mutate_conversation<F>(
        &self,
        conv_id: &str,
        mutate: F,
    ) -> Result<Vec<Conversation>, RepoError>
    where
        F: FnOnce(&mut Conversation) -> Result<(), RepoError>,
    {
        let mut conversations = self.list_conversations()?;
        let conv = conversations
            .iter_mut()
            .find(|c| c.id == conv_id)
            .ok_or_else(|| RepoError::ConversationNotFound(conv_id.to_string()))?;
        mutate(conv)?;
        self.save_list(&conversations)?;
        Ok(conversations)
    }

    // -- operations ---------------------------------------------------------

    /// Prepend a new empty conversation with the given counterparty.
    pub fn add_conversation(&self, user: User) -> Result<Vec<Conversation>, RepoError> {
        let mut conversations = self.list_conversations()?;
        let conv = Conversation::new(user);
        mlog!("repo: new conversation {}", logging::conv_id(&conv.id));
        conversations.insert(0, conv);
        self.save_list(&conversations)?;
        Ok(conversations)
    }

    /// Remove a conversation by id.
    pub fn delete_conversation(&self, conv_id: &str) -> Result<Vec<Conversation>, RepoError> {
        let mut conversations = self.list_conversations()?;
        let before = conversations.len();
        conversations.retain(|c| c.id != conv_id);
        if conversations.len() == before {
            return Err(RepoError::ConversationNotFound(conv_id.to_string()));
        }
        mlog!("repo: deleted conversation {}", logging::conv_id(conv_id));
        self.save_list(&conversations)?;
        Ok(conversations)
    }

    /// Remove one message and re-derive the conversation summary from the
    /// new tail.  Deleting the tail also clears `unread`: whatever made the
    /// thread unread is gone.
    pub fn delete_message(
        &self,
        conv_id: &str,
        msg_id: &str,
    ) -> Result<Vec<Conversation>, RepoError> {
        self.mutate_conversation(conv_id, |conv| {
            let was_tail = conv.messages.last().is_some_and(|m| m.id == msg_id);
            let before = conv.messages.len();
            conv.messages.retain(|m| m.id != msg_id);
            if conv.messages.len() == before {
                return Err(RepoError::MessageNotFound(msg_id.to_string()));
            }
            conv.refresh_summary();
            if was_tail {
                conv.unread = false;
            }
            Ok(())
        })
    }

    /// Clear the unread marker.  Idempotent.
    pub fn mark_conversation_read(&self, conv_id: &str) -> Result<Vec<Conversation>, RepoError> {
        self.mutate_conversation(conv_id, |conv| {
            conv.unread = false;
            Ok(())
        })
    }

    /// Append a message and update the summary fields atomically with it.
    /// The thread becomes unread exactly when the sender is not the local
    /// user.
    pub fn add_message(
        &self,
        conv_id: &str,
        message: Message,
    ) -> Result<Vec<Conversation>, RepoError> {
        self.mutate_conversation(conv_id, |conv| {
            conv.last_message = message.text.clone();
            conv.timestamp = NOW_LABEL.to_string();
            conv.unread = message.sender_id != LOCAL_USER_ID;
            conv.messages.push(message);
            Ok(())
        })
    }

    /// Flag one message as seen.  Idempotent.
    pub fn mark_message_seen(
        &self,
        conv_id: &str,
        msg_id: &str,
    ) -> Result<Vec<Conversation>, RepoError> {
        self.mutate_conversation(conv_id, |conv| {
            let msg = conv
                .messages
                .iter_mut()
                .find(|m| m.id == msg_id)
                .ok_or_else(|| RepoError::MessageNotFound(msg_id.to_string()))?;
            msg.seen = true;
            Ok(())
        })
    }

    /// Merge partial fields into the embedded counterparty of every
    /// conversation whose user id matches.
    pub fn update_counterparty_profile(
        &self,
        user_id: &str,
        patch: &UserPatch,
    ) -> Result<Vec<Conversation>, RepoError> {
        let mut conversations = self.list_conversations()?;
        let mut matched = 0usize;
        for conv in conversations.iter_mut().filter(|c| c.user.id == user_id) {
            patch.apply(&mut conv.user);
            matched += 1;
        }
        if matched == 0 {
            return Err(RepoError::UserNotFound(user_id.to_string()));
        }
        self.save_list(&conversations)?;
        Ok(conversations)
    }

    /// Flip the auto-reply flag.
    pub fn toggle_ai_enabled(&self, conv_id: &str) -> Result<Vec<Conversation>, RepoError> {
        self.mutate_conversation(conv_id, |conv| {
            conv.ai_enabled = !conv.ai_enabled;
            Ok(())
        })
    }

    /// Add a reaction, replacing any earlier reaction from the same sender.
    /// Last write wins per sender; other senders' reactions keep their order.
    pub fn add_or_replace_reaction(
        &self,
        conv_id: &str,
        msg_id: &str,
        reaction: Reaction,
    ) -> Result<Vec<Conversation>, RepoError> {
        self.mutate_conversation(conv_id, |conv| {
            let msg = conv
                .messages
                .iter_mut()
                .find(|m| m.id == msg_id)
                .ok_or_else(|| RepoError::MessageNotFound(msg_id.to_string()))?;
            msg.reactions.retain(|r| r.sender_id != reaction.sender_id);
            msg.reactions.push(reaction);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NO_MESSAGES, NOW_LABEL};

    fn test_repo() -> ConversationRepository {
        ConversationRepository::new(BlobStore::open_in_memory().unwrap())
    }

    #[test]
    fn first_list_seeds_and_is_stable() {
        let repo = test_repo();
        let first = repo.list_conversations().unwrap();
        assert!(!first.is_empty());
        let second = repo.list_conversations().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn corrupt_blob_falls_back_to_seed() {
        let repo = test_repo();
        repo.store.save(CONVERSATIONS_KEY, "{not json").unwrap();
        let list = repo.list_conversations().unwrap();
        assert_eq!(list, seed::default_conversations());
        // Write-through: the corrupt blob was replaced.
        let raw = repo.store.load(CONVERSATIONS_KEY).unwrap().unwrap();
        assert!(serde_json::from_str::<Vec<Conversation>>(&raw).is_ok());
    }

    #[test]
    fn wrong_shape_blob_falls_back_to_seed() {
        let repo = test_repo();
        repo.store
            .save(CONVERSATIONS_KEY, r#"{"unexpected":"object"}"#)
            .unwrap();
        assert_eq!(
            repo.list_conversations().unwrap(),
            seed::default_conversations()
        );
    }

    #[test]
    fn profile_seeds_and_merges_patch() {
        let repo = test_repo();
        let profile = repo.own_profile().unwrap();
        assert_eq!(profile.user.id, LOCAL_USER_ID);

        let patch = ProfilePatch {
            bio: Some("new bio".into()),
            ..Default::default()
        };
        let updated = repo.update_own_profile(&patch).unwrap();
        assert_eq!(updated.bio.as_deref(), Some("new bio"));
        assert_eq!(updated.user.username, profile.user.username);
        // Persisted, not just returned.
        assert_eq!(repo.own_profile().unwrap(), updated);
    }

    #[test]
    fn add_conversation_prepends_empty_thread() {
        let repo = test_repo();
        let before = repo.list_conversations().unwrap().len();
        let list = repo.add_conversation(seed::default_new_user()).unwrap();
        assert_eq!(list.len(), before + 1);
        let conv = &list[0];
        assert!(conv.messages.is_empty());
        assert_eq!(conv.last_message, NO_MESSAGES);
        assert!(!conv.unread);
        assert!(!conv.ai_enabled);
    }

    #[test]
    fn delete_conversation_unknown_id_is_not_found() {
        let repo = test_repo();
        let before = repo.list_conversations().unwrap();
        let err = repo.delete_conversation("conv-nope").unwrap_err();
        assert!(matches!(err, RepoError::ConversationNotFound(_)));
        assert_eq!(repo.list_conversations().unwrap(), before);
    }

    #[test]
    fn add_message_from_local_user_stays_read() {
        let repo = test_repo();
        let list = repo
            .add_message("conv-jordy", Message::new(LOCAL_USER_ID, "hi"))
            .unwrap();
        let conv = list.iter().find(|c| c.id == "conv-jordy").unwrap();
        assert_eq!(conv.last_message, "hi");
        assert_eq!(conv.timestamp, NOW_LABEL);
        assert!(!conv.unread);
    }

    #[test]
    fn add_message_from_counterparty_marks_unread() {
        let repo = test_repo();
        let list = repo
            .add_message("conv-jordy", Message::new("jordy", "yo"))
            .unwrap();
        let conv = list.iter().find(|c| c.id == "conv-jordy").unwrap();
        assert!(conv.unread);
        assert_eq!(conv.last_message, "yo");
    }

    #[test]
    fn mark_read_is_idempotent() {
        let repo = test_repo();
        repo.add_message("conv-jordy", Message::new("jordy", "yo"))
            .unwrap();
        let once = repo.mark_conversation_read("conv-jordy").unwrap();
        let twice = repo.mark_conversation_read("conv-jordy").unwrap();
        assert_eq!(once, twice);
        assert!(!twice.iter().find(|c| c.id == "conv-jordy").unwrap().unread);
    }

    #[test]
    fn delete_message_recomputes_summary() {
        let repo = test_repo();
        let list = repo.delete_message("conv-1", "m3").unwrap();
        let conv = list.iter().find(|c| c.id == "conv-1").unwrap();
        assert_eq!(conv.messages.len(), 2);
        assert_eq!(conv.last_message, "Not yet, checking it out now!");
        assert!(conv.summary_matches_tail());
    }

    #[test]
    fn delete_last_message_restores_sentinel() {
        let repo = test_repo();
        let list = repo
            .add_message("conv-jordy", Message::new(LOCAL_USER_ID, "only one"))
            .unwrap();
        let msg_id = list
            .iter()
            .find(|c| c.id == "conv-jordy")
            .unwrap()
            .messages[0]
            .id
            .clone();
        let list = repo.delete_message("conv-jordy", &msg_id).unwrap();
        let conv = list.iter().find(|c| c.id == "conv-jordy").unwrap();
        assert!(conv.messages.is_empty());
        assert_eq!(conv.last_message, NO_MESSAGES);
    }

    #[test]
    fn delete_message_unknown_id_is_not_found() {
        let repo = test_repo();
        let err = repo.delete_message("conv-1", "m99").unwrap_err();
        assert!(matches!(err, RepoError::MessageNotFound(_)));
    }

    #[test]
    fn mark_message_seen_sets_flag_and_is_idempotent() {
        let repo = test_repo();
        repo.mark_message_seen("conv-1", "m2").unwrap();
        let list = repo.mark_message_seen("conv-1", "m2").unwrap();
        let conv = list.iter().find(|c| c.id == "conv-1").unwrap();
        let msg = conv.messages.iter().find(|m| m.id == "m2").unwrap();
        assert!(msg.seen);
    }

    #[test]
    fn reaction_replaces_prior_from_same_sender() {
        let repo = test_repo();
        repo.add_or_replace_reaction(
            "conv-1",
            "m1",
            Reaction {
                emoji: "❤️".into(),
                sender_id: LOCAL_USER_ID.into(),
            },
        )
        .unwrap();
        let list = repo
            .add_or_replace_reaction(
                "conv-1",
                "m1",
                Reaction {
                    emoji: "🔥".into(),
                    sender_id: LOCAL_USER_ID.into(),
                },
            )
            .unwrap();
        let conv = list.iter().find(|c| c.id == "conv-1").unwrap();
        let msg = conv.messages.iter().find(|m| m.id == "m1").unwrap();
        assert_eq!(msg.reactions.len(), 1);
        assert_eq!(msg.reactions[0].emoji, "🔥");
        assert_eq!(msg.reactions[0].sender_id, LOCAL_USER_ID);
    }

    #[test]
    fn reactions_keep_one_entry_per_sender() {
        let repo = test_repo();
        for sender in ["me", "1", "me", "1", "other"] {
            repo.add_or_replace_reaction(
                "conv-1",
                "m1",
                Reaction {
                    emoji: "👍".into(),
                    sender_id: sender.into(),
                },
            )
            .unwrap();
        }
        let list = repo.list_conversations().unwrap();
        let conv = list.iter().find(|c| c.id == "conv-1").unwrap();
        let msg = conv.messages.iter().find(|m| m.id == "m1").unwrap();
        assert_eq!(msg.reactions.len(), 3);
        let mut senders: Vec<_> = msg.reactions.iter().map(|r| r.sender_id.as_str()).collect();
        senders.sort_unstable();
        senders.dedup();
        assert_eq!(senders.len(), 3);
    }

    #[test]
    fn update_counterparty_merges_every_matching_thread() {
        let repo = test_repo();
        // Two conversations with the same counterparty id.
        let mut dup = seed::default_new_user();
        dup.id = "jordy".into();
        repo.add_conversation(dup).unwrap();

        let patch = UserPatch {
            username: Some("jordy_official".into()),
            ..Default::default()
        };
        let list = repo.update_counterparty_profile("jordy", &patch).unwrap();
        let matching: Vec<_> = list.iter().filter(|c| c.user.id == "jordy").collect();
        assert_eq!(matching.len(), 2);
        assert!(matching.iter().all(|c| c.user.username == "jordy_official"));
    }

    #[test]
    fn update_counterparty_unknown_user_is_not_found() {
        let repo = test_repo();
        let err = repo
            .update_counterparty_profile("nobody", &UserPatch::default())
            .unwrap_err();
        assert!(matches!(err, RepoError::UserNotFound(_)));
    }

    #[test]
    fn toggle_ai_flips_flag() {
        let repo = test_repo();
        let list = repo.toggle_ai_enabled("conv-jordy").unwrap();
        assert!(list.iter().find(|c| c.id == "conv-jordy").unwrap().ai_enabled);
        let list = repo.toggle_ai_enabled("conv-jordy").unwrap();
        assert!(!list.iter().find(|c| c.id == "conv-jordy").unwrap().ai_enabled);
    }

    #[test]
    fn summary_invariant_holds_after_every_mutation() {
        let repo = test_repo();
        let assert_invariant = |list: &[Conversation]| {
            for conv in list {
                assert!(conv.summary_matches_tail(), "summary drifted in {}", conv.id);
            }
        };
        assert_invariant(&repo.list_conversations().unwrap());
        assert_invariant(&repo.add_message("conv-jordy", Message::new("me", "a")).unwrap());
        assert_invariant(&repo.add_message("conv-1", Message::new("1", "b")).unwrap());
        assert_invariant(&repo.delete_message("conv-1", "m3").unwrap());
        assert_invariant(&repo.mark_conversation_read("conv-1").unwrap());
        assert_invariant(&repo.toggle_ai_enabled("conv-1").unwrap());
        assert_invariant(&repo.delete_conversation("conv-jordy").unwrap());
    }
}
