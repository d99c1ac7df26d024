//! Dense tabular action-value store.

use thiserror::Error;

/// Leading bytes of a serialized table.
const MAGIC: &[u8; 4] = b"RCQT";
const HEADER_LEN: usize = 4 + 4 + 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QTableError {
    #[error("Not a Q-table: bad magic bytes")]
    BadMagic,

    #[error("Q-table payload has {actual} bytes, expected {expected}")]
    Truncated { expected: usize, actual: usize },

    #[error("Q-table dimensions must be non-zero, got {states} × {actions}")]
    EmptyShape { states: usize, actions: usize },
}

/// `n_states × n_actions` table of `f64`, zero-initialised.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QTable {
    n_states: usize,
    n_actions: usize,
    values: Vec<f64>,
}

impl QTable {
    pub fn new(n_states: usize, n_actions: usize) -> Result<Self, QTableError> {
        if n_states == 0 || n_actions == 0 {
            return Err(QTableError::EmptyShape {
                states: n_states,
                actions: n_actions,
            });
        }
        Ok(Self {
            n_states,
            n_actions,
            values: vec![0.0; n_states * n_actions],
        })
    }

    pub fn n_states(&self) -> usize {
        self.n_states
    }

    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    /// Action values of `state`, or `None` when out of range.
    pub fn row(&self, state: usize) -> Option<&[f64]> {
        if state >= self.n_states {
            return None;
        }
        let start = state * self.n_actions;
        self.values.get(start..start + self.n_actions)
    }

    pub fn row_mut(&mut self, state: usize) -> Option<&mut [f64]> {
        if state >= self.n_states {
            return None;
        }
        let start = state * self.n_actions;
        self.values.get_mut(start..start + self.n_actions)
    }

    pub fn get(&self, state: usize, action: usize) -> Option<f64> {
        self.row(state).and_then(|row| row.get(action).copied())
    }

    /// Largest action value of `state`, 0 for an out-of-range state.
    pub fn max_value(&self, state: usize) -> f64 {
        self.row(state)
            .and_then(|row| row.iter().copied().reduce(f64::max))
            .unwrap_or(0.0)
    }

    /// Moves `Q(state, action)` toward `target` by step `alpha`.
    ///
    /// Returns `false` when the pair is out of range.
    pub fn update(&mut self, state: usize, action: usize, target: f64, alpha: f64) -> bool {
        match self.row_mut(state).and_then(|row| row.get_mut(action)) {
            Some(q) => {
                *q += alpha * (target - *q);
                true
            }
            None => false,
        }
    }

    /// Serializes as magic, dimensions (`u32` LE), then values (`f64` LE) row-major.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.values.len() * 8);
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&(self.n_states as u32).to_le_bytes());
        out.extend_from_slice(&(self.n_actions as u32).to_le_bytes());
        for value in &self.values {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, QTableError> {
        if bytes.len() < HEADER_LEN {
            return Err(QTableError::Truncated {
                expected: HEADER_LEN,
                actual: bytes.len(),
            });
        }
        let (header, payload) = bytes.split_at(HEADER_LEN);
        if &header[..4] != MAGIC {
            return Err(QTableError::BadMagic);
        }
        let read_u32 = |range: std::ops::Range<usize>| {
            let mut word = [0u8; 4];
            word.copy_from_slice(&header[range]);
            u32::from_le_bytes(word) as usize
        };
        let n_states = read_u32(4..8);
        let n_actions = read_u32(8..12);
        // Validate the length before allocating.
        let expected = n_states.saturating_mul(n_actions).saturating_mul(8);
        if payload.len() != expected {
            return Err(QTableError::Truncated {
                expected: HEADER_LEN.saturating_add(expected),
                actual: bytes.len(),
            });
        }
        let mut table = Self::new(n_states, n_actions)?;
        for (value, chunk) in table.values.iter_mut().zip(payload.chunks_exact(8)) {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            *value = f64::from_le_bytes(word);
        }
        Ok(table)
    }
}
