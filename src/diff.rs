//! Line-level diff for tree listings
//!
//! ## Overview
//!
//! Tree listings of two large repositories are usually identical apart from a
//! handful of lines, so the diff uses Myers' O((N+M)D) algorithm after
//! stripping the common prefix and suffix. The result is the full edit
//! script: every line of both inputs appears exactly once, tagged as kept,
//! deleted (only in the old text) or inserted (only in the new text).
//!
//! ## Examples
//!
//! ```rust
//! use verify_import::diff::{diff_lines, LineChange};
//!
//! let old = ["a", "b", "c"];
//! let new = ["a", "c", "d"];
//! let changes = diff_lines(&old, &new);
//! assert_eq!(
//!     changes,
//!     vec![
//!         LineChange::Equal("a"),
//!         LineChange::Delete("b"),
//!         LineChange::Equal("c"),
//!         LineChange::Insert("d"),
//!     ]
//! );
//! ```

/// One step of an edit script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineChange<'a> {
    /// Line present in both inputs
    Equal(&'a str),
    /// Line present only in the old input
    Delete(&'a str),
    /// Line present only in the new input
    Insert(&'a str),
}

impl<'a> LineChange<'a> {
    /// Whether this line exists on one side only
    pub fn is_change(&self) -> bool {
        !matches!(self, LineChange::Equal(_))
    }

    /// The line itself
    pub fn line(&self) -> &'a str {
        match *self {
            LineChange::Equal(l) | LineChange::Delete(l) | LineChange::Insert(l) => l,
        }
    }
}

/// Represents a change operation in the diff
#[derive(Debug, Clone, Copy)]
enum ChangeOp {
    Keep(usize, usize), // (old_line_idx, new_line_idx)
    Delete(usize),      // old_line_idx
    Insert(usize),      // new_line_idx
}

/// Compute the edit script turning `old_lines` into `new_lines`
pub fn diff_lines<'a>(old_lines: &[&'a str], new_lines: &[&'a str]) -> Vec<LineChange<'a>> {
    compute_changes(old_lines, new_lines)
        .into_iter()
        .map(|op| match op {
            ChangeOp::Keep(i, _) => LineChange::Equal(old_lines[i]),
            ChangeOp::Delete(i) => LineChange::Delete(old_lines[i]),
            ChangeOp::Insert(j) => LineChange::Insert(new_lines[j]),
        })
        .collect()
}

/// Compute the sequence of change operations
fn compute_changes(old_lines: &[&str], new_lines: &[&str]) -> Vec<ChangeOp> {
    let prefix = old_lines
        .iter()
        .zip(new_lines)
        .take_while(|(a, b)| a == b)
        .count();
    let suffix = old_lines[prefix..]
        .iter()
        .rev()
        .zip(new_lines[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let old_mid = &old_lines[prefix..old_lines.len() - suffix];
    let new_mid = &new_lines[prefix..new_lines.len() - suffix];

    let mut changes = Vec::with_capacity(old_lines.len().max(new_lines.len()));
    changes.extend((0..prefix).map(|i| ChangeOp::Keep(i, i)));

    for op in myers(old_mid, new_mid) {
        changes.push(match op {
            ChangeOp::Keep(i, j) => ChangeOp::Keep(i + prefix, j + prefix),
            ChangeOp::Delete(i) => ChangeOp::Delete(i + prefix),
            ChangeOp::Insert(j) => ChangeOp::Insert(j + prefix),
        });
    }

    let old_tail = old_lines.len() - suffix;
    let new_tail = new_lines.len() - suffix;
    changes.extend((0..suffix).map(|i| ChangeOp::Keep(old_tail + i, new_tail + i)));
    changes
}

/// Greedy Myers diff; returns ops in forward order
fn myers(old: &[&str], new: &[&str]) -> Vec<ChangeOp> {
    // Special cases
    if old.is_empty() {
        return (0..new.len()).map(ChangeOp::Insert).collect();
    }
    if new.is_empty() {
        return (0..old.len()).map(ChangeOp::Delete).collect();
    }

    let n = old.len() as isize;
    let m = new.len() as isize;
    let max = n + m;
    let offset = max + 1;
    let mut v = vec![0isize; (2 * max + 3) as usize];
    // trace[d] holds the furthest x on diagonals -d..=d before round d
    let mut trace: Vec<Vec<isize>> = Vec::new();

    for d in 0..=max {
        trace.push(v[(offset - d) as usize..=(offset + d) as usize].to_vec());

        let mut k = -d;
        while k <= d {
            let idx = (k + offset) as usize;
            let mut x = if k == -d || (k != d && v[idx - 1] < v[idx + 1]) {
                v[idx + 1]
            } else {
                v[idx - 1] + 1
            };
            let mut y = x - k;
            while x < n && y < m && old[x as usize] == new[y as usize] {
                x += 1;
                y += 1;
            }
            v[idx] = x;

            if x >= n && y >= m {
                return backtrack(&trace, n, m);
            }
            k += 2;
        }
    }

    // The loop always reaches (n, m) by d == n + m
    backtrack(&trace, n, m)
}

/// Walk the recorded frontiers back from (n, m) to (0, 0)
fn backtrack(trace: &[Vec<isize>], n: isize, m: isize) -> Vec<ChangeOp> {
    let mut ops = Vec::new();
    let (mut x, mut y) = (n, m);

    for (d, frontier) in trace.iter().enumerate().rev() {
        let d = d as isize;
        if d == 0 {
            while x > 0 && y > 0 {
                ops.push(ChangeOp::Keep((x - 1) as usize, (y - 1) as usize));
                x -= 1;
                y -= 1;
            }
            break;
        }

        let at = |k: isize| frontier[(k + d) as usize];
        let k = x - y;
        let prev_k = if k == -d || (k != d && at(k - 1) < at(k + 1)) {
            k + 1
        } else {
            k - 1
        };
        let prev_x = at(prev_k);
        let prev_y = prev_x - prev_k;

        while x > prev_x && y > prev_y {
            ops.push(ChangeOp::Keep((x - 1) as usize, (y - 1) as usize));
            x -= 1;
            y -= 1;
        }

        if x == prev_x {
            ops.push(ChangeOp::Insert((y - 1) as usize));
        } else {
            ops.push(ChangeOp::Delete((x - 1) as usize));
        }

        x = prev_x;
        y = prev_y;
    }

    ops.reverse();
    ops
}
