//! Address space matching and dispatch tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use oscnet_core::{AddressSpace, Argument, MatchPriority, Message};

fn message(address: &str) -> Message {
    Message::new(address, vec![])
}

#[test]
fn test_exact_match_dispatch() {
    let space = AddressSpace::new();
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_clone = hits.clone();
    space.register("/mixer/fader", move |_| {
        hits_clone.fetch_add(1, Ordering::SeqCst);
    });

    assert!(space.dispatch(&message("/mixer/fader"), MatchPriority::None));
    assert!(!space.dispatch(&message("/mixer/pan"), MatchPriority::None));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_wildcard_segment_matches_anything() {
    let space = AddressSpace::new();
    space.register("/a/b/*/d/e", |_| {});

    for priority in [MatchPriority::None, MatchPriority::String] {
        assert!(space.dispatch(&message("/a/b/x/d/e"), priority));
    }
    // Segment count mismatch never matches
    assert!(!space.dispatch(&message("/a/b/x/y/d/e"), MatchPriority::None));
    assert!(!space.dispatch(&message("/a/b/d/e"), MatchPriority::None));
}

#[test]
fn test_handler_receives_message() {
    let space = AddressSpace::new();
    let seen = Arc::new(AtomicUsize::new(0));
    let seen_clone = seen.clone();
    space.register("/args/*", move |msg| {
        assert_eq!(msg.arguments().len(), 1);
        seen_clone.fetch_add(1, Ordering::SeqCst);
    });

    let msg = Message::new("/args/here", vec![Argument::Int(9)]);
    assert!(space.dispatch(&msg, MatchPriority::None));
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

/// The candidate set from the reference address-space behavior:
/// method A = "/a/b/*/d/e" (1 wildcard), method B = "/a/b/*/*/e"
/// (2 wildcards), surrounded by decoys of various segment counts.
fn populated_space(a_hit: Arc<AtomicBool>, b_hit: Arc<AtomicBool>) -> AddressSpace {
    let space = AddressSpace::new();
    space.register("/a/b/c", |_| {});
    space.register("/a/b/*/d/*/*", |_| {});
    space.register("/a/b/*/d/e/*/*", |_| {});
    space.register("/a/b/*/d/e", move |_| a_hit.store(true, Ordering::SeqCst));
    space.register("/a/b/*/*/e/f/*/*", |_| {});
    space.register("/a/b/*/*/e/x/g/*/*", |_| {});
    space.register("/a/b/*/*/e/y/g/*/*", |_| {});
    space.register("/a/b/*/*/e", move |_| b_hit.store(true, Ordering::SeqCst));
    space.register("/a/b/*/*/*/f/*/*", |_| {});
    space.register("/a/b/*/*/*/x/g/*/*", |_| {});
    space.register("/a/b/*/*/*/y/g/*/*", |_| {});
    space
}

#[test]
fn test_string_priority_prefers_literal_segments() {
    let a_hit = Arc::new(AtomicBool::new(false));
    let b_hit = Arc::new(AtomicBool::new(false));
    let space = populated_space(a_hit.clone(), b_hit.clone());

    // "/a/b/x/d/e": A scores 4 strings, B scores 3 strings
    assert!(space.dispatch(&message("/a/b/x/d/e"), MatchPriority::String));
    assert!(a_hit.load(Ordering::SeqCst));
    assert!(!b_hit.load(Ordering::SeqCst));
}

#[test]
fn test_wildcard_priority_prefers_wildcard_segments() {
    let a_hit = Arc::new(AtomicBool::new(false));
    let b_hit = Arc::new(AtomicBool::new(false));
    let space = populated_space(a_hit.clone(), b_hit.clone());

    // "/a/b/x/d/e": A scores 1 wildcard, B scores 2 wildcards
    assert!(space.dispatch(&message("/a/b/x/d/e"), MatchPriority::Wildcard));
    assert!(b_hit.load(Ordering::SeqCst));
    assert!(!a_hit.load(Ordering::SeqCst));
}

#[test]
fn test_only_wildcard_candidate_survives() {
    let a_hit = Arc::new(AtomicBool::new(false));
    let b_hit = Arc::new(AtomicBool::new(false));
    let space = populated_space(a_hit.clone(), b_hit.clone());

    // "/a/b/x/y/e" eliminates A (literal 'd' differs); B matches under
    // either priority.
    assert!(space.dispatch(&message("/a/b/x/y/e"), MatchPriority::String));
    assert!(b_hit.load(Ordering::SeqCst));
    assert!(!a_hit.load(Ordering::SeqCst));

    b_hit.store(false, Ordering::SeqCst);
    assert!(space.dispatch(&message("/a/b/x/y/e"), MatchPriority::Wildcard));
    assert!(b_hit.load(Ordering::SeqCst));
}

#[test]
fn test_no_priority_invokes_all_matches() {
    let space = AddressSpace::new();
    let hits = Arc::new(AtomicUsize::new(0));
    for pattern in ["/a/*/c", "/a/b/*", "/*/b/c"] {
        let hits = hits.clone();
        space.register(pattern, move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        });
    }

    assert!(space.dispatch(&message("/a/b/c"), MatchPriority::None));
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[test]
fn test_priority_returns_single_method() {
    let space = AddressSpace::new();
    space.register("/a/*/c", |_| {});
    space.register("/a/b/*", |_| {});

    assert_eq!(space.matches("/a/b/c", MatchPriority::None).len(), 2);
    assert_eq!(space.matches("/a/b/c", MatchPriority::String).len(), 1);
    assert_eq!(space.matches("/a/b/c", MatchPriority::Wildcard).len(), 1);
}

#[test]
fn test_tie_breaks_by_registration_order() {
    let space = AddressSpace::new();
    space.register("/t/a/*", |_| {});
    space.register("/t/*/b", |_| {});
    // "/t/a/b": both score 2 strings and 1 wildcard — earliest registered wins
    assert_eq!(
        space.matches("/t/a/b", MatchPriority::String),
        vec!["/t/a/*".to_string()]
    );
    assert_eq!(
        space.matches("/t/a/b", MatchPriority::Wildcard),
        vec!["/t/a/*".to_string()]
    );
}

#[test]
fn test_duplicate_registration_replaces() {
    let space = AddressSpace::new();
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    let first_clone = first.clone();
    assert!(!space.register("/dup", move |_| {
        first_clone.fetch_add(1, Ordering::SeqCst);
    }));
    let second_clone = second.clone();
    assert!(space.register("/dup", move |_| {
        second_clone.fetch_add(1, Ordering::SeqCst);
    }));

    assert_eq!(space.len(), 1);
    assert!(space.dispatch(&message("/dup"), MatchPriority::None));
    assert_eq!(first.load(Ordering::SeqCst), 0);
    assert_eq!(second.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unregister() {
    let space = AddressSpace::new();
    space.register("/gone", |_| {});
    assert!(space.unregister("/gone"));
    assert!(!space.unregister("/gone"));
    assert!(!space.dispatch(&message("/gone"), MatchPriority::None));
    assert!(space.is_empty());
}

#[test]
fn test_dispatch_empty_space() {
    let space = AddressSpace::new();
    assert!(!space.dispatch(&message("/anything"), MatchPriority::None));
    assert!(!space.dispatch(&message("/anything"), MatchPriority::String));
}

#[test]
fn test_concurrent_dispatch() {
    let space = Arc::new(AddressSpace::new());
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_clone = hits.clone();
    space.register("/load/*", move |_| {
        hits_clone.fetch_add(1, Ordering::SeqCst);
    });

    let mut handles = Vec::new();
    for i in 0..8 {
        let space = space.clone();
        handles.push(std::thread::spawn(move || {
            for _ in 0..100 {
                space.dispatch(&message(&format!("/load/{i}")), MatchPriority::None);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(hits.load(Ordering::SeqCst), 800);
}
