//! Maximum-weight perfect matching on complete bipartite graphs.
//!
//! The solver is the Kuhn-Munkres labeling method: every vertex carries a
//! potential, edges whose endpoint potentials add up to their weight are
//! *tight*, and an alternating tree of tight edges is grown from a free left
//! vertex until it either reaches a free right vertex (the matching is
//! augmented) or gets stuck (the potentials are tightened). Runs in O(n³).

use std::collections::VecDeque;

use log::{debug, trace};
use nalgebra::{Dim, Matrix, RawStorage};
use num_traits::{NumCast, PrimInt, Signed};

mod error;
pub mod input;

pub use error::{Error, Result};

/// Integer weight usable by the solver.
pub trait Weight: PrimInt + Signed + nalgebra::Scalar {}

impl<T> Weight for T where T: PrimInt + Signed + nalgebra::Scalar {}

/// Vertex potentials and slacks are kept in a type wider than any weight, so
/// that the labeling of extreme weights never leaves its range.
pub type Potential = i128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Init,
    PickRoot,
    Relabel,
    Extend,
    End,
}

/// Alternating tree and augmenting-path buffers, reused between solves.
#[derive(Debug, Clone, Default)]
struct Tree {
    root: usize,
    in_s: Vec<bool>,
    in_t: Vec<bool>,
    // min over i in S of the slack of (i, j); only meaningful for j outside T
    slack: Vec<Potential>,
    visited: Vec<bool>,
    parent: Vec<Option<usize>>,
    queue: VecDeque<usize>,
}

/// A perfect matching together with the vertex potentials that certify it.
///
/// The same value can be handed to [`hungarian`] repeatedly; its buffers are
/// resized to each new matrix.
#[derive(Debug, Clone)]
pub struct Matching<T> {
    mate_of_left: Vec<Option<usize>>,
    mate_of_right: Vec<Option<usize>>,
    left_labels: Vec<Potential>,
    right_labels: Vec<Potential>,
    weight: Option<T>,
    tree: Tree,
}

impl<T> Default for Matching<T> {
    fn default() -> Self {
        Self {
            mate_of_left: Vec::new(),
            mate_of_right: Vec::new(),
            left_labels: Vec::new(),
            right_labels: Vec::new(),
            weight: None,
            tree: Tree::default(),
        }
    }
}

impl<T: Weight> Matching<T> {
    /// `(row, col)` pairs of the matching, ordered by row.
    pub fn assignment(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.mate_of_left
            .iter()
            .enumerate()
            .filter_map(|(row, col)| col.map(|col| (row, col)))
    }

    pub fn mate_of_left(&self, row: usize) -> Option<usize> {
        self.mate_of_left.get(row).copied().flatten()
    }

    pub fn mate_of_right(&self, col: usize) -> Option<usize> {
        self.mate_of_right.get(col).copied().flatten()
    }

    pub fn left_potentials(&self) -> &[Potential] {
        &self.left_labels
    }

    pub fn right_potentials(&self) -> &[Potential] {
        &self.right_labels
    }

    /// Sum of all potentials. After a solve this equals [`Matching::weight`].
    pub fn potential_sum(&self) -> Result<T> {
        let sum = self
            .left_labels
            .iter()
            .chain(self.right_labels.iter())
            .try_fold(0, |acc: Potential, &l| acc.checked_add(l))
            .ok_or(Error::Overflow)?;
        <T as NumCast>::from(sum).ok_or(Error::Overflow)
    }

    /// Total weight of the last successful solve.
    pub fn weight(&self) -> Option<T> {
        self.weight
    }

    /// Number of matched pairs.
    pub fn len(&self) -> usize {
        self.mate_of_left.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_perfect(&self) -> bool {
        !self.mate_of_left.is_empty() && self.mate_of_left.iter().all(Option::is_some)
    }
}

struct Engine<'a, T, R, C, S> {
    weights: &'a Matrix<T, R, C, S>,
    matching: &'a mut Matching<T>,
    n: usize,
    matched: usize,
    state: State,
}

impl<'a, T, R, C, S> Engine<'a, T, R, C, S>
where
    T: Weight,
    R: Dim,
    C: Dim,
    S: RawStorage<T, R, C>,
{
    fn new(weights: &'a Matrix<T, R, C, S>, matching: &'a mut Matching<T>) -> Result<Self> {
        let (rows, cols) = weights.shape();
        if rows == 0 || cols == 0 {
            return Err(Error::Empty);
        }
        if rows != cols {
            return Err(Error::NotSquare { rows, cols });
        }

        Ok(Self {
            weights,
            matching,
            n: rows,
            matched: 0,
            state: State::Init,
        })
    }

    fn run(mut self) -> Result<T> {
        debug!("solving {}x{} assignment", self.n, self.n);
        while self.state != State::End {
            self.step()?;
        }
        self.total()
    }

    fn step(&mut self) -> Result<()> {
        self.state = match self.state {
            State::Init => {
                self.init()?;
                State::PickRoot
            }
            State::PickRoot => self.pick_root()?,
            State::Relabel => {
                if self.has_new_neighbour() {
                    State::Extend
                } else {
                    self.tighten()?;
                    State::Relabel
                }
            }
            State::Extend => self.extend()?,
            State::End => State::End,
        };
        Ok(())
    }

    fn init(&mut self) -> Result<()> {
        let n = self.n;
        let mut row_max = Vec::with_capacity(n);
        for row in 0..n {
            let mut max = self.weight(row, 0)?;
            for col in 1..n {
                max = max.max(self.weight(row, col)?);
            }
            row_max.push(max);
        }

        let m = &mut *self.matching;
        m.weight = None;
        m.mate_of_left.clear();
        m.mate_of_left.resize(n, None);
        m.mate_of_right.clear();
        m.mate_of_right.resize(n, None);

        m.left_labels = row_max;
        m.right_labels.clear();
        m.right_labels.resize(n, 0);

        let tree = &mut m.tree;
        tree.in_s.resize(n, false);
        tree.in_t.resize(n, false);
        tree.slack.resize(n, 0);
        tree.visited.resize(n, false);
        tree.parent.resize(n, None);
        self.matched = 0;
        Ok(())
    }

    fn weight(&self, row: usize, col: usize) -> Result<Potential> {
        self.weights[(row, col)].to_i128().ok_or(Error::Overflow)
    }

    fn slack(&self, row: usize, col: usize) -> Result<Potential> {
        let m = &self.matching;
        m.left_labels[row]
            .checked_add(m.right_labels[col])
            .and_then(|sum| sum.checked_sub(self.weight(row, col).ok()?))
            .ok_or(Error::Overflow)
    }

    fn is_tight(&self, row: usize, col: usize) -> Result<bool> {
        Ok(self.slack(row, col)? == 0)
    }

    fn pick_root(&mut self) -> Result<State> {
        if self.matched == self.n {
            return Ok(State::End);
        }
        let Some(root) = self.matching.mate_of_left.iter().position(Option::is_none) else {
            return Ok(State::End);
        };

        let tree = &mut self.matching.tree;
        tree.root = root;
        tree.in_s.fill(false);
        tree.in_t.fill(false);
        tree.in_s[root] = true;
        for col in 0..self.n {
            let slack = self.slack(root, col)?;
            self.matching.tree.slack[col] = slack;
        }
        trace!("growing tree from left {root}");
        Ok(State::Relabel)
    }

    // N(S) always contains T, so it differs from T iff some column outside T is tight.
    fn has_new_neighbour(&self) -> bool {
        self.next_neighbour().is_some()
    }

    fn next_neighbour(&self) -> Option<usize> {
        let tree = &self.matching.tree;
        (0..self.n).find(|&col| !tree.in_t[col] && tree.slack[col] == 0)
    }

    /// Shifts potentials by the smallest slack leaving the tree and returns it.
    fn tighten(&mut self) -> Result<Potential> {
        let m = &mut *self.matching;
        let tree = &mut m.tree;
        let delta = (0..self.n)
            .filter(|&col| !tree.in_t[col])
            .map(|col| tree.slack[col])
            .min()
            .unwrap_or(0);
        if delta == 0 {
            return Ok(delta);
        }

        for row in 0..self.n {
            if tree.in_s[row] {
                m.left_labels[row] = m.left_labels[row].checked_sub(delta).ok_or(Error::Overflow)?;
            }
        }
        for col in 0..self.n {
            if tree.in_t[col] {
                m.right_labels[col] = m.right_labels[col].checked_add(delta).ok_or(Error::Overflow)?;
            } else {
                tree.slack[col] -= delta;
            }
        }
        trace!("relabeled by {delta:?}");
        Ok(delta)
    }

    fn extend(&mut self) -> Result<State> {
        let Some(col) = self.next_neighbour() else {
            return Ok(State::Relabel);
        };

        match self.matching.mate_of_right[col] {
            Some(row) => {
                let tree = &mut self.matching.tree;
                tree.in_s[row] = true;
                tree.in_t[col] = true;
                for c in 0..self.n {
                    if !self.matching.tree.in_t[c] {
                        let s = self.slack(row, c)?;
                        let slack = &mut self.matching.tree.slack[c];
                        *slack = (*slack).min(s);
                    }
                }
                trace!("tree grows to left {row} through right {col}");
                Ok(State::Relabel)
            }
            None => {
                self.augment(col)?;
                self.matched += 1;
                debug!(
                    "augmented from left {} to right {col} ({}/{} matched)",
                    self.matching.tree.root, self.matched, self.n
                );
                Ok(State::PickRoot)
            }
        }
    }

    // breadth-first over tight edges from the root until `target` is reached
    fn augment(&mut self, target: usize) -> Result<()> {
        let root = self.matching.tree.root;
        {
            let tree = &mut self.matching.tree;
            tree.visited.fill(false);
            tree.parent.fill(None);
            tree.queue.clear();
            tree.queue.push_back(root);
        }

        'search: while let Some(row) = self.matching.tree.queue.pop_front() {
            for col in 0..self.n {
                if self.matching.tree.visited[col] || !self.is_tight(row, col)? {
                    continue;
                }
                let tree = &mut self.matching.tree;
                tree.visited[col] = true;
                tree.parent[col] = Some(row);
                match self.matching.mate_of_right[col] {
                    Some(next) => self.matching.tree.queue.push_back(next),
                    None if col == target => break 'search,
                    None => {}
                }
            }
        }

        let m = &mut *self.matching;
        let mut col = target;
        loop {
            let row = m.tree.parent[col].expect("tight tree reaches target");
            let previous = m.mate_of_left[row];
            m.mate_of_left[row] = Some(col);
            m.mate_of_right[col] = Some(row);
            match previous {
                Some(prev) => col = prev,
                None => break,
            }
        }
        Ok(())
    }

    fn total(&mut self) -> Result<T> {
        let mut total: Potential = 0;
        for (row, col) in self.matching.assignment() {
            total = total
                .checked_add(self.weight(row, col)?)
                .ok_or(Error::Overflow)?;
        }
        let total = <T as NumCast>::from(total).ok_or(Error::Overflow)?;
        self.matching.weight = Some(total);
        debug!("matching weight {total:?}");
        Ok(total)
    }
}

/// Computes a maximum-weight perfect matching of the bipartite graph whose
/// edge `(row, col)` weighs `weights[(row, col)]`.
///
/// The matching and its potentials are written into `matching`; the return
/// value is the total weight.
pub fn hungarian<T, R, C, S>(weights: &Matrix<T, R, C, S>, matching: &mut Matching<T>) -> Result<T>
where
    T: Weight,
    R: Dim,
    C: Dim,
    S: RawStorage<T, R, C>,
{
    Engine::new(weights, matching)?.run()
}

/// Like [`hungarian`], allocating fresh storage and returning only the weight.
pub fn max_weight<T, R, C, S>(weights: &Matrix<T, R, C, S>) -> Result<T>
where
    T: Weight,
    R: Dim,
    C: Dim,
    S: RawStorage<T, R, C>,
{
    hungarian(weights, &mut Matching::default())
}
