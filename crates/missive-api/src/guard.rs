//! Authorization decisions. Pure functions over the requester's identity
//! and current store rows; callers translate a denial into a rejection
//! without revealing resource contents.

use missive_db::models::{MessageRow, UserRow};

use crate::middleware::Identity;

/// Any authenticated requester may view any existing user's public profile.
/// A nonexistent target is denied rather than reported missing, so username
/// existence is indistinguishable from permission at the boundary.
pub fn can_view_user(_requester: &Identity, target: Option<&UserRow>) -> bool {
    target.is_some()
}

/// Visibility is shared between the two parties to a message.
pub fn can_view_message(requester: &Identity, message: &MessageRow) -> bool {
    requester.username() == message.from_username || requester.username() == message.to_username
}

/// The read-state transition is recipient-only. It asserts "I have seen
/// this", which the sender cannot do even though the sender may view the
/// message.
pub fn can_mark_read(requester: &Identity, message: &MessageRow) -> bool {
    requester.username() == message.to_username
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(name: &str) -> Identity {
        Identity::new(name.to_string())
    }

    fn message(from: &str, to: &str) -> MessageRow {
        MessageRow {
            id: 1,
            from_username: from.to_string(),
            to_username: to.to_string(),
            body: "hi".to_string(),
            sent_at: "2026-01-01T00:00:00+00:00".to_string(),
            read_at: None,
        }
    }

    fn user(name: &str) -> UserRow {
        UserRow {
            username: name.to_string(),
            password: "hash".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            phone: "+15550000000".to_string(),
            joined_at: "2026-01-01T00:00:00+00:00".to_string(),
            last_login_at: "2026-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn both_parties_may_view_a_message() {
        let m = message("alice", "bob");
        assert!(can_view_message(&identity("alice"), &m));
        assert!(can_view_message(&identity("bob"), &m));
    }

    #[test]
    fn third_party_may_not_view_a_message() {
        let m = message("alice", "bob");
        assert!(!can_view_message(&identity("carol"), &m));
    }

    #[test]
    fn only_the_recipient_may_mark_read() {
        let m = message("alice", "bob");
        assert!(can_mark_read(&identity("bob"), &m));
        assert!(!can_mark_read(&identity("alice"), &m));
        assert!(!can_mark_read(&identity("carol"), &m));
    }

    #[test]
    fn self_addressed_message_grants_both_checks() {
        let m = message("alice", "alice");
        assert!(can_view_message(&identity("alice"), &m));
        assert!(can_mark_read(&identity("alice"), &m));
    }

    #[test]
    fn existing_profiles_are_visible_to_anyone_authenticated() {
        let target = user("bob");
        assert!(can_view_user(&identity("carol"), Some(&target)));
        assert!(!can_view_user(&identity("carol"), None));
    }
}
