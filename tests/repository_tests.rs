//! Integration tests for the conversation repository: persistence across
//! reopen, and multi-operation workflows through the public API.

use mirage::model::{Reaction, User, UserPatch, LOCAL_USER_ID, NO_MESSAGES};
use mirage::repository::ConversationRepository;
use mirage::store::BlobStore;

fn mem_repo() -> ConversationRepository {
    ConversationRepository::new(BlobStore::open_in_memory().unwrap())
}

fn new_user(id: &str, username: &str) -> User {
    User {
        id: id.to_string(),
        username: username.to_string(),
        full_name: username.to_string(),
        avatar: String::new(),
        is_verified: false,
        is_active: false,
        followers: None,
        posts_count: None,
        following_since: None,
        mutual_follows: None,
    }
}

#[test]
fn state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("mirage.db");

    let conv_id = {
        let repo = ConversationRepository::new(BlobStore::open(&db_path).unwrap());
        let list = repo.add_conversation(new_user("u-alice", "alice")).unwrap();
        let conv_id = list[0].id.clone();
        repo.add_message(&conv_id, mirage::model::Message::new(LOCAL_USER_ID, "hi alice"))
            .unwrap();
        repo.update_own_profile(&mirage::model::ProfilePatch {
            bio: Some("updated bio".to_string()),
            ..Default::default()
        })
        .unwrap();
        conv_id
    };

    let repo = ConversationRepository::new(BlobStore::open(&db_path).unwrap());
    let list = repo.list_conversations().unwrap();
    let conv = list.iter().find(|c| c.id == conv_id).unwrap();
    assert_eq!(conv.user.username, "alice");
    assert_eq!(conv.messages.len(), 1);
    assert_eq!(conv.last_message, "hi alice");
    assert_eq!(
        repo.own_profile().unwrap().bio.as_deref(),
        Some("updated bio")
    );
}

#[test]
fn deleting_tail_message_undoes_the_send() {
    let repo = mem_repo();
    repo.mark_conversation_read("conv-1").unwrap();
    let before = repo
        .list_conversations()
        .unwrap()
        .into_iter()
        .find(|c| c.id == "conv-1")
        .unwrap();

    let incoming = mirage::model::Message::new("1", "one more thing");
    let msg_id = incoming.id.clone();
    let list = repo.add_message("conv-1", incoming).unwrap();
    let conv = list.iter().find(|c| c.id == "conv-1").unwrap();
    assert!(conv.unread);
    assert_eq!(conv.last_message, "one more thing");

    let list = repo.delete_message("conv-1", &msg_id).unwrap();
    let conv = list.iter().find(|c| c.id == "conv-1").unwrap();
    assert!(!conv.unread);
    assert_eq!(conv.messages, before.messages);
    assert_eq!(conv.last_message, before.last_message);
    assert!(conv.summary_matches_tail());
}

#[test]
fn emptying_a_thread_restores_the_sentinel() {
    let repo = mem_repo();
    let list = repo.add_conversation(new_user("u-bob", "bob")).unwrap();
    let conv_id = list[0].id.clone();

    let msg = mirage::model::Message::new(LOCAL_USER_ID, "only message");
    let msg_id = msg.id.clone();
    repo.add_message(&conv_id, msg).unwrap();

    let list = repo.delete_message(&conv_id, &msg_id).unwrap();
    let conv = list.iter().find(|c| c.id == conv_id).unwrap();
    assert!(conv.messages.is_empty());
    assert_eq!(conv.last_message, NO_MESSAGES);
}

#[test]
fn full_workflow_over_one_thread() {
    let repo = mem_repo();
    let list = repo.add_conversation(new_user("u-carol", "carol")).unwrap();
    let conv_id = list[0].id.clone();

    // Message, then react twice as the local user; the second reaction
    // replaces the first.
    let msg = mirage::model::Message::new(LOCAL_USER_ID, "check this out");
    let msg_id = msg.id.clone();
    repo.add_message(&conv_id, msg).unwrap();
    repo.add_or_replace_reaction(
        &conv_id,
        &msg_id,
        Reaction {
            emoji: "👍".to_string(),
            sender_id: LOCAL_USER_ID.to_string(),
        },
    )
    .unwrap();
    let list = repo
        .add_or_replace_reaction(
            &conv_id,
            &msg_id,
            Reaction {
                emoji: "🔥".to_string(),
                sender_id: LOCAL_USER_ID.to_string(),
            },
        )
        .unwrap();
    let conv = list.iter().find(|c| c.id == conv_id).unwrap();
    let reactions = &conv.messages[0].reactions;
    assert_eq!(reactions.len(), 1);
    assert_eq!(reactions[0].emoji, "🔥");

    // Rename the counterparty; the edit lands on the embedded copy.
    let list = repo
        .update_counterparty_profile(
            "u-carol",
            &UserPatch {
                full_name: Some("Carol Renamed".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    let conv = list.iter().find(|c| c.id == conv_id).unwrap();
    assert_eq!(conv.user.full_name, "Carol Renamed");

    // Other threads keep their own embedded users.
    let other = list.iter().find(|c| c.id == "conv-1").unwrap();
    assert_eq!(other.user.username, "masta_otf");

    let list = repo.delete_conversation(&conv_id).unwrap();
    assert!(list.iter().all(|c| c.id != conv_id));
}

#[test]
fn not_found_operations_leave_the_list_unchanged() {
    let repo = mem_repo();
    let before = repo.list_conversations().unwrap();

    assert!(repo.delete_conversation("conv-nope").is_err());
    assert!(repo.delete_message("conv-1", "m-nope").is_err());
    assert!(repo.mark_message_seen("conv-nope", "m1").is_err());
    assert!(repo
        .update_counterparty_profile("u-nope", &UserPatch::default())
        .is_err());

    assert_eq!(repo.list_conversations().unwrap(), before);
}
