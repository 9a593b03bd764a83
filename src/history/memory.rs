//! In-process browser: a session history stack plus a hash fragment.
//!
//! Behaves like the browser surface the router is written against:
//! `push_path` adds an entry silently, `back`/`forward` move through
//! entries and notify pop-state listeners, and a hash change (programmatic
//! or user edit) notifies hash-change listeners. Listeners run
//! synchronously, after internal locks are released.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::history::browser::{BrowserNavigation, Listener, Subscription};

#[derive(Debug)]
struct Location {
    entries: Vec<String>,
    index: usize,
    hash: String,
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    pop_state: Vec<(u64, Listener)>,
    hash_change: Vec<(u64, Listener)>,
}

#[derive(Clone, Copy)]
enum Channel {
    PopState,
    HashChange,
}

impl Listeners {
    fn channel(&mut self, channel: Channel) -> &mut Vec<(u64, Listener)> {
        match channel {
            Channel::PopState => &mut self.pop_state,
            Channel::HashChange => &mut self.hash_change,
        }
    }
}

/// Browser navigation state kept in memory.
pub struct MemoryBrowser {
    location: Mutex<Location>,
    listeners: Arc<Mutex<Listeners>>,
}

impl MemoryBrowser {
    /// Start with a single history entry at `initial_path` and an empty hash.
    pub fn new(initial_path: impl Into<String>) -> Self {
        Self {
            location: Mutex::new(Location {
                entries: vec![initial_path.into()],
                index: 0,
                hash: String::new(),
            }),
            listeners: Arc::default(),
        }
    }

    /// Go back one entry. Returns false at the start of history.
    pub fn back(&self) -> bool {
        self.go(-1)
    }

    /// Go forward one entry. Returns false at the end of history.
    pub fn forward(&self) -> bool {
        self.go(1)
    }

    /// Move `delta` entries and notify pop-state listeners.
    pub fn go(&self, delta: isize) -> bool {
        let moved = {
            let mut location = lock(&self.location);
            match location.index.checked_add_signed(delta) {
                Some(index) if delta != 0 && index < location.entries.len() => {
                    location.index = index;
                    true
                }
                _ => false,
            }
        };
        if moved {
            self.notify(Channel::PopState);
        }
        moved
    }

    /// A user edit of the address bar's fragment.
    pub fn edit_hash(&self, hash: &str) {
        self.set_hash(hash);
    }

    /// Number of session history entries.
    pub fn history_len(&self) -> usize {
        lock(&self.location).entries.len()
    }

    pub fn entries(&self) -> Vec<String> {
        lock(&self.location).entries.clone()
    }

    /// Position of the current entry.
    pub fn index(&self) -> usize {
        lock(&self.location).index
    }

    fn subscribe(&self, channel: Channel, listener: Listener) -> Subscription {
        let id = {
            let mut listeners = lock(&self.listeners);
            listeners.next_id += 1;
            let id = listeners.next_id;
            listeners.channel(channel).push((id, listener));
            id
        };

        let listeners = Arc::clone(&self.listeners);
        Subscription::new(move || {
            lock(&listeners).channel(channel).retain(|(lid, _)| *lid != id);
        })
    }

    fn notify(&self, channel: Channel) {
        let targets: Vec<Listener> = lock(&self.listeners)
            .channel(channel)
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in targets {
            listener();
        }
    }
}

impl Default for MemoryBrowser {
    fn default() -> Self {
        Self::new("/")
    }
}

impl BrowserNavigation for MemoryBrowser {
    fn current_path(&self) -> String {
        let location = lock(&self.location);
        location.entries[location.index].clone()
    }

    fn push_path(&self, path: &str) {
        let mut location = lock(&self.location);
        let keep = location.index + 1;
        location.entries.truncate(keep);
        location.entries.push(path.to_string());
        location.index = keep;
    }

    fn current_hash(&self) -> String {
        lock(&self.location).hash.clone()
    }

    fn set_hash(&self, path: &str) {
        let hash = path.strip_prefix('#').unwrap_or(path).to_string();
        let changed = {
            let mut location = lock(&self.location);
            if location.hash == hash {
                false
            } else {
                location.hash = hash;
                true
            }
        };
        if changed {
            self.notify(Channel::HashChange);
        }
    }

    fn on_pop_state(&self, listener: Listener) -> Subscription {
        self.subscribe(Channel::PopState, listener)
    }

    fn on_hash_change(&self, listener: Listener) -> Subscription {
        self.subscribe(Channel::HashChange, listener)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
