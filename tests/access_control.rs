// tests/access_control.rs

use promptrelay::access::{AllowList, Authorizer};
use promptrelay::config::AccessSection;
use promptrelay::engine::ActorId;

#[test]
fn empty_allow_list_admits_everyone() {
    let list = AllowList::from(&AccessSection::default());
    assert!(list.allows_everyone());
    assert!(list.is_authorized(&ActorId::from("anyone")));
}

#[test]
fn allow_list_is_exact_match() {
    let list = AllowList::from(&AccessSection {
        allowed_actors: vec!["123456".to_string(), "alice".to_string()],
    });
    assert!(!list.allows_everyone());
    assert!(list.is_authorized(&ActorId::from("123456")));
    assert!(list.is_authorized(&ActorId::from("alice")));
    assert!(!list.is_authorized(&ActorId::from("Alice")));
    assert!(!list.is_authorized(&ActorId::from("1234567")));
    assert!(!list.is_authorized(&ActorId::from("")));
}
