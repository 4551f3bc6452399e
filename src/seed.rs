//! Fixed default dataset used to initialize storage on first use and to
//! recover from a corrupt blob.

use crate::model::{Conversation, Message, Profile, User, LOCAL_USER_ID};

/// The local user's initial profile record.
pub fn default_profile() -> Profile {
    Profile {
        user: User {
            id: LOCAL_USER_ID.to_string(),
            username: "design_ninja".to_string(),
            full_name: "Design Ninja".to_string(),
            avatar: "https://picsum.photos/seed/ninja/150/150".to_string(),
            is_verified: false,
            is_active: false,
            followers: None,
            posts_count: None,
            following_since: None,
            mutual_follows: None,
        },
        bio: Some("Creative technologist exploring the future of UI and AI. ✨".to_string()),
        website: Some("ninja.design/portfolio".to_string()),
    }
}

/// The initial conversation list: one empty business thread and one thread
/// with a short unread history.
pub fn default_conversations() -> Vec<Conversation> {
    vec![
        Conversation {
            id: "conv-jordy".to_string(),
            user: User {
                id: "jordy".to_string(),
                username: "jordymone9".to_string(),
                full_name: "Jordy Mone".to_string(),
                avatar: "https://picsum.photos/seed/jordy/200/200".to_string(),
                is_verified: true,
                is_active: true,
                followers: Some("52k".to_string()),
                posts_count: Some("340".to_string()),
                following_since: Some("2024".to_string()),
                mutual_follows: Some("masta_otf and 1 other".to_string()),
            },
            last_message: "Business chat".to_string(),
            timestamp: "Just now".to_string(),
            unread: false,
            messages: Vec::new(),
            ai_enabled: false,
        },
        Conversation {
            id: "conv-1".to_string(),
            user: User {
                id: "1".to_string(),
                username: "masta_otf".to_string(),
                full_name: "Masta".to_string(),
                avatar: "https://picsum.photos/seed/user1/150/150".to_string(),
                is_verified: true,
                is_active: true,
                followers: None,
                posts_count: None,
                following_since: None,
                mutual_follows: None,
            },
            last_message: "That design looks incredible! 🔥".to_string(),
            timestamp: "2m".to_string(),
            unread: true,
            messages: vec![
                seed_message("m1", "1", "Hey, did you see the new update?", "10:00"),
                seed_message("m2", LOCAL_USER_ID, "Not yet, checking it out now!", "10:05"),
                seed_message("m3", "1", "That design looks incredible! 🔥", "10:10"),
            ],
            ai_enabled: false,
        },
    ]
}

fn seed_message(id: &str, sender_id: &str, text: &str, timestamp: &str) -> Message {
    Message {
        id: id.to_string(),
        sender_id: sender_id.to_string(),
        text: text.to_string(),
        timestamp: timestamp.to_string(),
        seen: false,
        reactions: Vec::new(),
    }
}

/// Template counterparty for a brand-new chat when the caller leaves fields
/// blank.
pub fn default_new_user() -> User {
    User {
        id: crate::model::fresh_id("user"),
        username: "newuser".to_string(),
        full_name: "New User".to_string(),
        avatar: "https://picsum.photos/seed/default/150/150".to_string(),
        is_verified: false,
        is_active: false,
        followers: Some("0".to_string()),
        posts_count: Some("0".to_string()),
        following_since: Some("2026".to_string()),
        mutual_follows: None,
    }
}
