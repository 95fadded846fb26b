//! Bounded, reusable storage for cutting planes
//!
//! The pool is an arena of `capacity` fixed-dimension subgradient vectors
//! with an occupied bitmap and an explicit insertion-order index list.
//! Position `i` in that order corresponds to row/column `i` of the Gram
//! matrix and entry `i` of the plane-weight and linear-term arrays, so the
//! driver can keep all of them aligned through evictions. Freed slots are
//! reused by later insertions.

/// Arena of cutting planes with inactivity bookkeeping
#[derive(Debug, Clone)]
pub struct CuttingPlanePool {
    dim: usize,
    storage: Vec<f64>,
    occupied: Vec<bool>,
    /// Occupied slots in insertion order; index = Gram matrix position
    order: Vec<usize>,
    /// Consecutive iterations each slot's QP weight has been zero
    inactive_for: Vec<u32>,
}

impl CuttingPlanePool {
    /// Create an empty pool for `capacity` planes of dimension `dim`
    pub fn new(dim: usize, capacity: usize) -> Self {
        Self {
            dim,
            storage: vec![0.0; dim * capacity],
            occupied: vec![false; capacity],
            order: Vec::with_capacity(capacity),
            inactive_for: vec![0; capacity],
        }
    }

    /// Plane dimension
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of planes currently held
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Maximum number of planes
    pub fn capacity(&self) -> usize {
        self.occupied.len()
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    /// First unoccupied slot, if any
    fn find_free_slot(&self) -> Option<usize> {
        self.occupied.iter().position(|&taken| !taken)
    }

    /// Store a plane in the first free slot and append it to the order.
    ///
    /// Returns the slot index, or `None` when the pool is exhausted; the
    /// caller must treat that as a terminal buffer-exhausted condition.
    ///
    /// # Panics
    /// Panics when `subgradient` has the wrong dimension.
    pub fn insert(&mut self, subgradient: &[f64]) -> Option<usize> {
        assert_eq!(subgradient.len(), self.dim, "plane dimension mismatch");
        let slot = self.find_free_slot()?;
        self.storage[slot * self.dim..(slot + 1) * self.dim].copy_from_slice(subgradient);
        self.occupied[slot] = true;
        self.inactive_for[slot] = 0;
        self.order.push(slot);
        Some(slot)
    }

    /// Plane payload by insertion-order position (the Gram matrix index)
    ///
    /// # Panics
    /// Panics if `position >= len()`.
    pub fn plane(&self, position: usize) -> &[f64] {
        let slot = self.order[position];
        &self.storage[slot * self.dim..(slot + 1) * self.dim]
    }

    /// Record whether the plane at `position` carried weight this iteration
    pub fn record_activity(&mut self, position: usize, active: bool) {
        let slot = self.order[position];
        if active {
            self.inactive_for[slot] = 0;
        } else {
            self.inactive_for[slot] += 1;
        }
    }

    /// Consecutive inactive iterations of the plane at `position`
    pub fn inactive_iterations(&self, position: usize) -> u32 {
        self.inactive_for[self.order[position]]
    }

    /// Free every plane inactive for more than `clean_after` iterations.
    ///
    /// Returns the retained positions (strictly ascending, relative to the
    /// order before the call) when at least one plane was evicted so the
    /// caller can compact its parallel arrays with the same remap, or `None`
    /// when nothing changed. The surviving insertion order is preserved.
    pub fn evict_stale(&mut self, clean_after: u32) -> Option<Vec<usize>> {
        let retained: Vec<usize> = (0..self.order.len())
            .filter(|&position| self.inactive_for[self.order[position]] <= clean_after)
            .collect();
        if retained.len() == self.order.len() {
            return None;
        }

        for &slot in &self.order {
            if self.inactive_for[slot] > clean_after {
                self.occupied[slot] = false;
                self.inactive_for[slot] = 0;
            }
        }
        self.order = retained.iter().map(|&position| self.order[position]).collect();
        Some(retained)
    }
}
