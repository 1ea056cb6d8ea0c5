use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};

use ledgerbook_ledger::model::{Entry, EventKey};

// ---------------------------------------------------------------------------
// Per-key state machine
// ---------------------------------------------------------------------------

/// Lifecycle of one pending local mutation. Confirmed and Expired are not
/// states: a confirmed or expired overlay is removed and server rows show
/// through again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    /// Inside the suppression window; background refresh is withheld so a
    /// racing server read cannot flicker stale rows in.
    Speculative,
    /// Suppression elapsed; refresh results are compared against this key.
    AwaitingConfirmation,
}

/// One speculative mutation. An empty entry set models a deletion:
/// confirmation then means the server list no longer contains the key.
#[derive(Debug, Clone)]
pub struct Overlay {
    pub entries: Vec<Entry>,
    pub state: OverlayState,
    pub applied_at: DateTime<Utc>,
    /// Monotonic across the whole map. A refresh begun before a newer
    /// mutation for this key carries an older version and is discarded.
    pub version: u64,
}

impl Overlay {
    pub fn is_deletion(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Overlay map
// ---------------------------------------------------------------------------

/// All pending mutations, keyed by event. Machines for distinct keys are
/// fully independent; BTreeMap keeps iteration deterministic.
#[derive(Debug, Default)]
pub struct OverlayMap {
    overlays: BTreeMap<EventKey, Overlay>,
    next_version: u64,
}

impl OverlayMap {
    /// Enter Speculative state for a key, superseding any pending overlay
    /// (and any reconciliation in flight for it). Returns the new version.
    pub fn apply(&mut self, key: EventKey, entries: Vec<Entry>, now: DateTime<Utc>) -> u64 {
        self.next_version += 1;
        debug!("overlay v{} applied for event '{key}'", self.next_version);
        self.overlays.insert(
            key,
            Overlay {
                entries,
                state: OverlayState::Speculative,
                applied_at: now,
                version: self.next_version,
            },
        );
        self.next_version
    }

    pub fn remove(&mut self, key: &EventKey) -> Option<Overlay> {
        self.overlays.remove(key)
    }

    /// Reinstate a previously captured overlay (mutation rollback).
    pub fn restore(&mut self, key: EventKey, overlay: Overlay) {
        self.overlays.insert(key, overlay);
    }

    pub fn get(&self, key: &EventKey) -> Option<&Overlay> {
        self.overlays.get(key)
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &EventKey> {
        self.overlays.keys()
    }

    /// Snapshot of current versions, captured when a refresh begins.
    pub fn versions(&self) -> BTreeMap<EventKey, u64> {
        self.overlays
            .iter()
            .map(|(k, o)| (k.clone(), o.version))
            .collect()
    }

    /// True while any key sits inside its suppression window.
    pub fn any_in_suppression(&self, now: DateTime<Utc>, suppression: Duration) -> bool {
        self.overlays
            .values()
            .any(|o| o.state == OverlayState::Speculative && now - o.applied_at < suppression)
    }

    /// Advance every machine: Speculative becomes AwaitingConfirmation once
    /// its suppression window elapses, and overlays past the confirmation
    /// timeout are dropped. Returns the keys expired on this tick.
    pub fn tick(
        &mut self,
        now: DateTime<Utc>,
        suppression: Duration,
        timeout: Duration,
    ) -> Vec<EventKey> {
        let mut expired = Vec::new();
        for (key, overlay) in self.overlays.iter_mut() {
            if now - overlay.applied_at >= timeout {
                expired.push(key.clone());
            } else if overlay.state == OverlayState::Speculative
                && now - overlay.applied_at >= suppression
            {
                overlay.state = OverlayState::AwaitingConfirmation;
                debug!("event '{key}' awaiting confirmation");
            }
        }
        for key in &expired {
            // Repeated expiry means the server is silently failing writes.
            warn!("no server confirmation for event '{key}' before timeout, dropping overlay");
            self.overlays.remove(key);
        }
        expired
    }
}

// ---------------------------------------------------------------------------
// Visible-list composition
// ---------------------------------------------------------------------------

/// One entry of the reconciled visible list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleEntry {
    pub entry: Entry,
    pub speculative: bool,
}

/// Compose server truth with pending overlays. Pure: this and the projector
/// are the only producers of the visible list.
///
/// Server rows whose key has an overlay are replaced in place (never
/// duplicated) by the overlay's rows at the key's first position. Overlays
/// for keys absent from the server append afterwards in mutation order.
pub fn compose(server: &[Entry], overlays: &OverlayMap) -> Vec<VisibleEntry> {
    let mut out = Vec::with_capacity(server.len());
    let mut spliced: HashSet<EventKey> = HashSet::new();

    for entry in server {
        let key = entry.event_key();
        match overlays.get(&key) {
            Some(overlay) => {
                if spliced.insert(key) {
                    for oe in &overlay.entries {
                        out.push(VisibleEntry {
                            entry: oe.clone(),
                            speculative: true,
                        });
                    }
                }
                // remaining server rows for this key are suppressed
            }
            None => out.push(VisibleEntry {
                entry: entry.clone(),
                speculative: false,
            }),
        }
    }

    // Overlay-only keys (pure additions), in mutation order.
    let mut additions: Vec<&Overlay> = overlays
        .keys()
        .filter(|k| !spliced.contains(*k))
        .filter_map(|k| overlays.get(k))
        .collect();
    additions.sort_by_key(|o| o.version);
    for overlay in additions {
        for oe in &overlay.entries {
            out.push(VisibleEntry {
                entry: oe.clone(),
                speculative: true,
            });
        }
    }

    out
}
