//! Fixed capacity binary min-heap.

use std::cmp::Ordering;
use std::error::Error;
use std::fmt;

/// Heap operation error. Both variants indicate misuse of the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapError {
    /// Insertion into a heap that already holds `capacity` entries.
    Full { capacity: usize },
    /// Extraction from an empty heap.
    Empty,
}

impl Error for HeapError {}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeapError::Full { capacity } => write!(f, "heap is full (capacity: {})", capacity),
            HeapError::Empty => write!(f, "heap is empty"),
        }
    }
}

/// Heap entry: a key together with the identity of the reader it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapEntry<K> {
    pub key: K,
    pub reader: usize,
}

impl<K: Ord> PartialOrd for HeapEntry<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord> Ord for HeapEntry<K> {
    /// Orders by key, equal keys are ordered by reader identity.
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key).then(self.reader.cmp(&other.reader))
    }
}

/// Array-backed binary min-heap with capacity fixed at construction.
///
/// Both [`BoundedMinHeap::insert`] and [`BoundedMinHeap::extract_min`] take *O*(log *c*) time
/// where *c* is the heap capacity.
pub struct BoundedMinHeap<K> {
    entries: Vec<HeapEntry<K>>,
    capacity: usize,
}

impl<K: Ord> BoundedMinHeap<K> {
    pub fn with_capacity(capacity: usize) -> Self {
        BoundedMinHeap {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Inserts a new entry.
    ///
    /// # Errors
    /// Returns [`HeapError::Full`] if the heap already holds `capacity` entries.
    pub fn insert(&mut self, key: K, reader: usize) -> Result<(), HeapError> {
        if self.entries.len() >= self.capacity {
            return Err(HeapError::Full {
                capacity: self.capacity,
            });
        }

        self.entries.push(HeapEntry { key, reader });
        self.sift_up(self.entries.len() - 1);

        return Ok(());
    }

    /// Removes and returns the entry with the smallest key.
    ///
    /// # Errors
    /// Returns [`HeapError::Empty`] if the heap holds no entries.
    pub fn extract_min(&mut self) -> Result<HeapEntry<K>, HeapError> {
        if self.entries.is_empty() {
            return Err(HeapError::Empty);
        }

        let min = self.entries.swap_remove(0);
        if !self.entries.is_empty() {
            self.sift_down(0);
        }

        return Ok(min);
    }

    /// Returns the entry with the smallest key without removing it.
    pub fn peek(&self) -> Option<&HeapEntry<K>> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if self.entries[parent] <= self.entries[idx] {
                break;
            }
            self.entries.swap(parent, idx);
            idx = parent;
        }
    }

    fn sift_down(&mut self, mut idx: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * idx + 1;
            let right = left + 1;
            let mut min = idx;

            if left < len && self.entries[left] < self.entries[min] {
                min = left;
            }
            if right < len && self.entries[right] < self.entries[min] {
                min = right;
            }
            if min == idx {
                break;
            }

            self.entries.swap(idx, min);
            idx = min;
        }
    }
}
