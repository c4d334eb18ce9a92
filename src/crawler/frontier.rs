//! Crawl frontier
//!
//! Traversal is level-synchronous breadth-first: every entry of depth `d` is
//! dispatched before any entry of depth `d + 1`. Children reported by workers
//! are buffered per parent and merged in parent dispatch order when the level
//! is exhausted, so the order of the next level never depends on which worker
//! finished first.
//!
//! URLs are marked visited when they are enqueued, which guarantees that no
//! URL is dispatched twice within one crawl.

use crate::url::{is_same_host, visit_key};
use regex::Regex;
use std::collections::{BTreeMap, HashSet, VecDeque};
use url::Url;

/// File extensions never worth fetching as pages
const SKIPPED_EXTENSIONS: &[&str] = &[
    ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".ico", ".css", ".js", ".zip",
    ".gz", ".mp4", ".mp3",
];

/// A URL waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: Url,
    pub depth: u32,
    pub parent_url: Option<String>,
    /// Seed this entry descends from; the same-domain policy compares against it
    pub origin: Url,
}

/// What the dispatcher should do next
#[derive(Debug)]
pub enum Dispatch {
    /// Fetch this entry; the sequence number orders its children
    Entry(u64, FrontierEntry),
    /// The current level is exhausted; wait for in-flight work, then advance
    LevelDrained,
    /// A termination condition holds
    Done(StopReason),
}

/// Why the frontier stopped handing out entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    PageBudget,
    DepthLimit,
    Exhausted,
}

/// Rules deciding which discovered links are followed
#[derive(Debug, Clone, Default)]
pub struct LinkFilter {
    pub same_domain_only: bool,
    pub include: Vec<Regex>,
    pub exclude: Vec<Regex>,
}

impl LinkFilter {
    /// Checks a discovered link against the policy
    pub fn allows(&self, origin: &Url, candidate: &Url) -> bool {
        if self.same_domain_only && !is_same_host(origin, candidate) {
            return false;
        }

        let path = candidate.path().to_ascii_lowercase();
        if SKIPPED_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            return false;
        }

        let url = candidate.as_str();
        if self.exclude.iter().any(|re| re.is_match(url)) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|re| re.is_match(url))
    }
}

/// Frontier queue, visited set and page counter of one crawl
#[derive(Debug)]
pub struct Frontier {
    current: VecDeque<FrontierEntry>,
    /// Children buffered by parent dispatch sequence
    pending: BTreeMap<u64, Vec<FrontierEntry>>,
    visited: HashSet<String>,
    page_counter: usize,
    max_pages: Option<usize>,
    max_depth: Option<u32>,
    depth: u32,
    next_seq: u64,
    filter: LinkFilter,
}

impl Frontier {
    pub fn new(max_pages: Option<usize>, max_depth: Option<u32>, filter: LinkFilter) -> Self {
        Self {
            current: VecDeque::new(),
            pending: BTreeMap::new(),
            visited: HashSet::new(),
            page_counter: 0,
            max_pages,
            max_depth,
            depth: 0,
            next_seq: 0,
            filter,
        }
    }

    /// Adds a depth-0 seed; returns false if it was already queued
    pub fn seed(&mut self, url: Url) -> bool {
        if !self.visited.insert(visit_key(&url)) {
            return false;
        }
        self.current.push_back(FrontierEntry {
            origin: url.clone(),
            url,
            depth: 0,
            parent_url: None,
        });
        true
    }

    /// Checks termination, then hands out the next entry of the current level
    pub fn next_dispatch(&mut self) -> Dispatch {
        if self.budget_spent() {
            return Dispatch::Done(StopReason::PageBudget);
        }
        if self.max_depth.map_or(false, |max| self.depth > max) {
            return Dispatch::Done(StopReason::DepthLimit);
        }

        match self.current.pop_front() {
            Some(entry) => {
                let seq = self.next_seq;
                self.next_seq += 1;
                Dispatch::Entry(seq, entry)
            }
            None if self.pending.values().all(Vec::is_empty) => Dispatch::Done(StopReason::Exhausted),
            None => Dispatch::LevelDrained,
        }
    }

    /// Counts a page against the budget; false if the budget is already spent
    pub fn claim_page(&mut self) -> bool {
        if self.budget_spent() {
            return false;
        }
        self.page_counter += 1;
        true
    }

    /// Buffers the followable children of a dispatched entry
    ///
    /// Children beyond the depth limit or rejected by the link filter are
    /// dropped here; duplicates are resolved when the level advances.
    pub fn record_children(&mut self, seq: u64, parent: &FrontierEntry, links: &[Url]) {
        let depth = parent.depth + 1;
        if self.max_depth.map_or(false, |max| depth > max) {
            return;
        }

        let children: Vec<FrontierEntry> = links
            .iter()
            .filter(|link| self.filter.allows(&parent.origin, link))
            .map(|link| FrontierEntry {
                url: link.clone(),
                depth,
                parent_url: Some(parent.url.to_string()),
                origin: parent.origin.clone(),
            })
            .collect();

        if !children.is_empty() {
            self.pending.entry(seq).or_default().extend(children);
        }
    }

    /// Marks a URL as visited without queueing it (e.g. a redirect target)
    pub fn mark_visited(&mut self, url: &Url) {
        self.visited.insert(visit_key(url));
    }

    /// Moves buffered children into the queue, in parent order then link order
    ///
    /// Only valid once every dispatched entry of the level has reported back.
    pub fn advance_level(&mut self) {
        self.depth += 1;
        let pending = std::mem::take(&mut self.pending);
        for entry in pending.into_values().flatten() {
            if self.visited.insert(visit_key(&entry.url)) {
                self.current.push_back(entry);
            }
        }
        tracing::debug!(
            depth = self.depth,
            queued = self.current.len(),
            "Advanced frontier level"
        );
    }

    /// Starts a new traversal from depth 0, keeping the visited set and budget
    ///
    /// Used when one task crawls several seed batches in turn.
    pub fn start_round(&mut self) {
        self.discard();
        self.depth = 0;
    }

    /// Drops every queued and buffered entry; returns how many were discarded
    pub fn discard(&mut self) -> usize {
        let discarded = self.current.len() + self.pending.values().map(Vec::len).sum::<usize>();
        self.current.clear();
        self.pending.clear();
        discarded
    }

    pub fn page_count(&self) -> usize {
        self.page_counter
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn queued(&self) -> usize {
        self.current.len()
    }

    fn budget_spent(&self) -> bool {
        self.max_pages.map_or(false, |max| self.page_counter >= max)
    }
}
