//! Crawl frontier
//!
//! This module handles:
//! - Priority ordering of pending crawl tasks (lower value first)
//! - FIFO ordering among tasks of equal priority
//! - The visited set, consulted and updated at pop time
//! - The page budget and depth bound

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

/// A unit of crawl work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    /// The normalized URL to fetch
    pub url: String,

    /// Link distance from the seeds
    pub depth: u32,

    /// Priority value (0 is highest)
    pub priority: u8,
}

impl CrawlTask {
    pub fn new(url: impl Into<String>, depth: u32, priority: u8) -> Self {
        Self {
            url: url.into(),
            depth,
            priority,
        }
    }
}

/// A task plus its insertion sequence number
#[derive(Debug)]
struct QueuedTask {
    task: CrawlTask,
    seq: u64,
}

// BinaryHeap is a max-heap, so both keys are compared in reverse:
// lower priority values and earlier insertions pop first.
impl Ord for QueuedTask {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .task
            .priority
            .cmp(&self.task.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedTask {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for QueuedTask {}

/// Prioritized, depth-bounded queue of URLs to crawl
///
/// The frontier does not deduplicate on push. A URL may be queued several
/// times; every copy after the first is discarded when popped because the
/// URL is then already visited.
#[derive(Debug)]
pub struct Frontier {
    heap: BinaryHeap<QueuedTask>,
    visited: HashSet<String>,
    next_seq: u64,
    max_pages: usize,
    max_depth: u32,
    pages_processed: usize,
}

impl Frontier {
    /// Creates an empty frontier
    ///
    /// # Arguments
    ///
    /// * `max_pages` - Number of processed pages after which `pop` returns `None`
    /// * `max_depth` - Tasks deeper than this are rejected by `push`
    pub fn new(max_pages: usize, max_depth: u32) -> Self {
        Self {
            heap: BinaryHeap::new(),
            visited: HashSet::new(),
            next_seq: 0,
            max_pages,
            max_depth,
            pages_processed: 0,
        }
    }

    /// Enqueues a task
    ///
    /// # Returns
    ///
    /// * `true` - The task was queued
    /// * `false` - The task exceeds the depth bound and was dropped
    pub fn push(&mut self, task: CrawlTask) -> bool {
        if task.depth > self.max_depth {
            return false;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(QueuedTask { task, seq });
        true
    }

    /// Dequeues the next unvisited task and marks its URL visited
    ///
    /// Returns `None` when the queue is drained or the page budget is spent.
    pub fn pop(&mut self) -> Option<CrawlTask> {
        if self.budget_exhausted() {
            return None;
        }

        while let Some(queued) = self.heap.pop() {
            if self.visited.contains(&queued.task.url) {
                continue;
            }

            self.visited.insert(queued.task.url.clone());
            return Some(queued.task);
        }

        None
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Counts one fetched page against the budget
    pub fn record_processed(&mut self) {
        self.pages_processed += 1;
    }

    pub fn pages_processed(&self) -> usize {
        self.pages_processed
    }

    pub fn budget_exhausted(&self) -> bool {
        self.pages_processed >= self.max_pages
    }

    /// Number of queued entries, including stale duplicates
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}
