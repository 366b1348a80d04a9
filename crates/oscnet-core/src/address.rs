//! Address space and pattern matching
//!
//! OSC addresses are '/'-delimited paths:
//! ```text
//! /mixer/channel/3/fader
//! /light/par/12/intensity
//! ```
//!
//! Registered method patterns may contain `*` segments, which match any
//! single incoming segment. Matching never crosses segment-count boundaries:
//! `/a/b/*` matches `/a/b/c` but not `/a/b/c/d`.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::types::Message;

/// Handler invoked with each message dispatched to a matching method
pub type Handler = Arc<dyn Fn(&Message) + Send + Sync>;

/// Tie-breaking rule applied when several patterns match one address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPriority {
    /// Invoke every matching method
    #[default]
    None,
    /// Invoke only the method with the most literal-segment matches
    String,
    /// Invoke only the method with the most wildcard-segment matches
    Wildcard,
}

/// A registered address pattern with its handler.
///
/// Identity is the pattern string alone: two methods with the same pattern
/// are the same method, whatever their handlers.
#[derive(Clone)]
pub struct AddressMethod {
    address_pattern: String,
    parts: Vec<String>,
    handler: Handler,
}

impl AddressMethod {
    pub fn new(address_pattern: impl Into<String>, handler: Handler) -> Self {
        let address_pattern = address_pattern.into();
        let parts = address_pattern
            .split('/')
            .skip(1)
            .map(str::to_string)
            .collect();
        Self {
            address_pattern,
            parts,
            handler,
        }
    }

    pub fn address_pattern(&self) -> &str {
        &self.address_pattern
    }

    /// Pattern components split on '/', leading empty component dropped
    pub fn parts(&self) -> &[String] {
        &self.parts
    }
}

impl PartialEq for AddressMethod {
    fn eq(&self, other: &Self) -> bool {
        self.address_pattern == other.address_pattern
    }
}

impl Eq for AddressMethod {}

impl std::hash::Hash for AddressMethod {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.address_pattern.hash(state);
    }
}

impl std::fmt::Debug for AddressMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressMethod")
            .field("address_pattern", &self.address_pattern)
            .finish()
    }
}

/// How one pattern segment relates to one address segment
enum SegmentMatch {
    String,
    Wildcard,
    Different,
}

fn match_segment(pattern: &str, segment: &str) -> SegmentMatch {
    if pattern == segment {
        SegmentMatch::String
    } else if pattern == "*" {
        SegmentMatch::Wildcard
    } else {
        SegmentMatch::Different
    }
}

/// A surviving candidate with its per-segment scores
struct Candidate<'a> {
    method: &'a AddressMethod,
    strings: usize,
    wildcards: usize,
}

/// The set of registered methods, keyed by pattern string.
///
/// Registration and removal take the write lock; dispatch takes the read
/// lock, so concurrent dispatches never block each other. The registry is
/// insertion-ordered, which makes priority tie-breaks deterministic: among
/// equal scores the earliest-registered method wins.
#[derive(Default)]
pub struct AddressSpace {
    methods: RwLock<Vec<AddressMethod>>,
}

impl AddressSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an address pattern.
    ///
    /// A pattern that is already registered is replaced in place: the new
    /// handler wins, and the method keeps its original position in the
    /// tie-break order. Returns true if an existing method was replaced.
    pub fn register<F>(&self, address_pattern: impl Into<String>, handler: F) -> bool
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        let method = AddressMethod::new(address_pattern, Arc::new(handler));
        let mut methods = self.methods.write();
        if let Some(existing) = methods
            .iter_mut()
            .find(|m| m.address_pattern == method.address_pattern)
        {
            *existing = method;
            true
        } else {
            methods.push(method);
            false
        }
    }

    /// Remove the method registered for a pattern. Returns whether one existed.
    pub fn unregister(&self, address_pattern: &str) -> bool {
        let mut methods = self.methods.write();
        let before = methods.len();
        methods.retain(|m| m.address_pattern != address_pattern);
        methods.len() != before
    }

    /// Number of registered methods
    pub fn len(&self) -> usize {
        self.methods.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.read().is_empty()
    }

    /// Patterns matching an address, after priority selection
    pub fn matches(&self, address: &str, priority: MatchPriority) -> Vec<String> {
        let methods = self.methods.read();
        select(&methods, address, priority)
            .into_iter()
            .map(|m| m.address_pattern.clone())
            .collect()
    }

    /// Dispatch a message to every matching method's handler.
    ///
    /// Returns whether any method matched. Handler execution has no error
    /// channel here; a handler that needs one reports out of band.
    pub fn dispatch(&self, message: &Message, priority: MatchPriority) -> bool {
        let methods = self.methods.read();
        let matched = select(&methods, message.address_pattern(), priority);
        if matched.is_empty() {
            return false;
        }
        for method in matched {
            (method.handler)(message);
        }
        true
    }
}

/// Score every registered method against an address and apply the priority
/// rule. Candidates are eliminated on the first differing segment; patterns
/// with a different segment count never participate.
fn select<'a>(
    methods: &'a [AddressMethod],
    address: &str,
    priority: MatchPriority,
) -> Vec<&'a AddressMethod> {
    let parts: Vec<&str> = address.split('/').skip(1).collect();

    let mut candidates: Vec<Candidate<'a>> = methods
        .iter()
        .filter(|m| m.parts.len() == parts.len())
        .map(|method| Candidate {
            method,
            strings: 0,
            wildcards: 0,
        })
        .collect();

    for (index, part) in parts.iter().enumerate() {
        candidates.retain_mut(|candidate| {
            match match_segment(&candidate.method.parts[index], part) {
                SegmentMatch::String => {
                    candidate.strings += 1;
                    true
                }
                SegmentMatch::Wildcard => {
                    candidate.wildcards += 1;
                    true
                }
                SegmentMatch::Different => false,
            }
        });
    }

    match priority {
        MatchPriority::None => candidates.into_iter().map(|c| c.method).collect(),
        MatchPriority::String => best_by(&candidates, |c| c.strings),
        MatchPriority::Wildcard => best_by(&candidates, |c| c.wildcards),
    }
}

/// First candidate with the highest score. Ties keep the earliest-registered
/// method, since candidates preserve registration order.
fn best_by<'a>(
    candidates: &[Candidate<'a>],
    score: impl Fn(&Candidate<'a>) -> usize,
) -> Vec<&'a AddressMethod> {
    let mut best: Option<&Candidate<'a>> = None;
    for candidate in candidates {
        if best.map_or(true, |b| score(candidate) > score(b)) {
            best = Some(candidate);
        }
    }
    best.map(|c| vec![c.method]).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_count_filter() {
        let space = AddressSpace::new();
        space.register("/a/b/*", |_| {});
        assert!(space
            .matches("/a/b/c/d", MatchPriority::None)
            .is_empty());
        assert_eq!(space.matches("/a/b/c", MatchPriority::None).len(), 1);
    }

    #[test]
    fn test_method_identity_is_pattern() {
        let a = AddressMethod::new("/x/y", Arc::new(|_: &Message| {}));
        let b = AddressMethod::new("/x/y", Arc::new(|_: &Message| panic!()));
        assert_eq!(a, b);
    }

    #[test]
    fn test_parts_drop_leading_empty() {
        let m = AddressMethod::new("/a/b/c", Arc::new(|_: &Message| {}));
        assert_eq!(m.parts(), &["a", "b", "c"]);
    }
}
