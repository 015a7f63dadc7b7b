//! Group moderation: which groups can be posted to, which are waiting for a
//! decision, and which notices are public.
//!
//! Everything here is pure. Callers persist a proposed list first and commit it
//! to [`ModerationState`] only once the write has succeeded.

use crate::api::models::Notice;
use std::collections::HashSet;

/// Synthetic group meaning "every group"; never official, pending or blocked.
pub const ALL_GROUPS: &str = "All Groups";

/// Comparison key for group names: trimmed and case-folded.
pub fn group_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn is_sentinel(name: &str) -> bool {
    group_key(name) == group_key(ALL_GROUPS)
}

fn contains(list: &[String], name: &str) -> bool {
    let key = group_key(name);
    list.iter().any(|g| group_key(g) == key)
}

/// Compose dropdown entries: the sentinel, then the official list as given.
pub fn available_groups(official: &[String]) -> Vec<String> {
    std::iter::once(ALL_GROUPS.to_string())
        .chain(official.iter().cloned())
        .collect()
}

/// Group names seen on notices that are neither official nor blocked.
///
/// Names are deduplicated case-insensitively; the first spelling seen wins and
/// the result keeps first-seen order.
pub fn pending_groups(notices: &[Notice], official: &[String], blocked: &[String]) -> Vec<String> {
    let excluded: HashSet<String> = official.iter().chain(blocked).map(|g| group_key(g)).collect();
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for name in notices.iter().filter_map(|n| n.group_name.as_deref()) {
        let key = group_key(name);
        if key.is_empty() || is_sentinel(name) || excluded.contains(&key) {
            continue;
        }
        if seen.insert(key) {
            out.push(name.trim().to_string());
        }
    }
    out
}

/// Notices shown on the public board: ungrouped, sent to every group, or sent
/// to an official group. Input order is kept.
pub fn visible_notices<'a>(notices: &'a [Notice], official: &[String]) -> Vec<&'a Notice> {
    notices
        .iter()
        .filter(|n| match n.group_name.as_deref() {
            None => true,
            Some(g) => g.trim().is_empty() || is_sentinel(g) || contains(official, g),
        })
        .collect()
}

/// Client-side group lists. `official` mirrors the backend settings,
/// `blocked` mirrors the local store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModerationState {
    official: Vec<String>,
    blocked: Vec<String>,
}

impl ModerationState {
    pub fn new(official: Vec<String>, blocked: Vec<String>) -> Self {
        Self { official, blocked }
    }

    pub fn official(&self) -> &[String] {
        &self.official
    }

    pub fn blocked(&self) -> &[String] {
        &self.blocked
    }

    pub fn is_official(&self, name: &str) -> bool {
        contains(&self.official, name)
    }

    pub fn is_blocked(&self, name: &str) -> bool {
        contains(&self.blocked, name)
    }

    pub fn available_groups(&self) -> Vec<String> {
        available_groups(&self.official)
    }

    pub fn pending_groups(&self, notices: &[Notice]) -> Vec<String> {
        pending_groups(notices, &self.official, &self.blocked)
    }

    pub fn visible_notices<'a>(&self, notices: &'a [Notice]) -> Vec<&'a Notice> {
        visible_notices(notices, &self.official)
    }

    /// Official list with `name` appended, unchanged if already present.
    pub fn with_approved(&self, name: &str) -> Vec<String> {
        append_unique(&self.official, name)
    }

    /// Official list with every case-insensitive match of `name` removed.
    pub fn without(&self, name: &str) -> Vec<String> {
        let key = group_key(name);
        self.official
            .iter()
            .filter(|g| group_key(g) != key)
            .cloned()
            .collect()
    }

    /// Block list with `name` appended, unchanged if already present.
    pub fn with_blocked(&self, name: &str) -> Vec<String> {
        append_unique(&self.blocked, name)
    }

    pub fn set_official(&mut self, official: Vec<String>) {
        self.official = official;
    }

    pub fn set_blocked(&mut self, blocked: Vec<String>) {
        self.blocked = blocked;
    }
}

fn append_unique(list: &[String], name: &str) -> Vec<String> {
    let mut out = list.to_vec();
    let name = name.trim();
    if !name.is_empty() && !contains(list, name) {
        out.push(name.to_string());
    }
    out
}
