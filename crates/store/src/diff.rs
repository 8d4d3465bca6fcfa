//! Diffing two materialized orderings into elementary changes.
//!
//! Records absent from the new ordering are removals, records absent from the
//! old ordering are insertions. Records present in both that a commit touched
//! are either updates (they kept their place relative to the records that did
//! not move) or moves.
//!
//! Choosing which touched records "stay" is what keeps the diff applicable:
//! after removing every removed or moved record (old indices) and inserting
//! every inserted or moved record (new indices), the result must equal the
//! new ordering. That holds when the records that stay appear in the same
//! relative order before and after. Untouched records always stay; their keys
//! did not change, so their relative order cannot either. A touched record
//! stays only if it sits between the same untouched neighbours before and
//! after, and among touched records sharing a gap, only a longest increasing
//! run of old positions stays.

use crate::change::ElementaryChange;
use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;
use hashbrown::{HashMap, HashSet};
use tidemark_core::Record;

/// Computes the elementary changes that turn `old` into `new`.
///
/// Changes are returned grouped as removals, insertions, moves, then updates.
/// Update indices refer to `old`.
pub fn diff_orderings<R: Record>(
    old: &[Rc<R>],
    new: &[Rc<R>],
    touched: &HashSet<R::Id>,
) -> Vec<ElementaryChange<R>> {
    let old_pos: HashMap<R::Id, usize> = old.iter().enumerate().map(|(i, r)| (r.id(), i)).collect();
    let new_pos: HashMap<R::Id, usize> = new.iter().enumerate().map(|(i, r)| (r.id(), i)).collect();

    let mut changes = Vec::new();

    for (index, record) in old.iter().enumerate() {
        if !new_pos.contains_key(&record.id()) {
            changes.push(ElementaryChange::Remove {
                record: Rc::clone(record),
                index,
            });
        }
    }

    for (index, record) in new.iter().enumerate() {
        if !old_pos.contains_key(&record.id()) {
            changes.push(ElementaryChange::Insert {
                record: Rc::clone(record),
                index,
            });
        }
    }

    let staying = touched_records_that_stay(old, new, &old_pos, &new_pos, touched);

    let mut updates = Vec::new();
    for (to, record) in new.iter().enumerate() {
        let id = record.id();
        if !touched.contains(&id) {
            continue;
        }
        let Some(&from) = old_pos.get(&id) else {
            continue;
        };
        if staying.contains(&id) {
            updates.push(ElementaryChange::Update {
                record: Rc::clone(record),
                index: from,
            });
        } else {
            changes.push(ElementaryChange::Move {
                record: Rc::clone(record),
                from,
                to,
            });
        }
    }
    changes.extend(updates);
    changes
}

/// Returns the ids of touched survivors that keep their relative place.
fn touched_records_that_stay<R: Record>(
    old: &[Rc<R>],
    new: &[Rc<R>],
    old_pos: &HashMap<R::Id, usize>,
    new_pos: &HashMap<R::Id, usize>,
    touched: &HashSet<R::Id>,
) -> HashSet<R::Id> {
    // Number of untouched survivors preceding each touched survivor
    let gap_old = untouched_gaps(old, new_pos, touched);
    let gap_new = untouched_gaps(new, old_pos, touched);

    // Touched survivors in new order, grouped by a gap they share in both orderings
    let mut groups: HashMap<usize, Vec<(R::Id, usize)>> = HashMap::new();
    for record in new {
        let id = record.id();
        let (Some(&before), Some(&after)) = (gap_old.get(&id), gap_new.get(&id)) else {
            continue;
        };
        if before == after {
            groups
                .entry(after)
                .or_default()
                .push((id.clone(), old_pos[&id]));
        }
    }

    let mut staying = HashSet::new();
    for members in groups.into_values() {
        let positions: Vec<usize> = members.iter().map(|(_, from)| *from).collect();
        for keep in longest_increasing_run(&positions) {
            staying.insert(members[keep].0.clone());
        }
    }
    staying
}

fn untouched_gaps<R: Record>(
    ordering: &[Rc<R>],
    other_pos: &HashMap<R::Id, usize>,
    touched: &HashSet<R::Id>,
) -> HashMap<R::Id, usize> {
    let mut gaps = HashMap::new();
    let mut untouched_seen = 0;
    for record in ordering {
        let id = record.id();
        if !other_pos.contains_key(&id) {
            continue;
        }
        if touched.contains(&id) {
            gaps.insert(id, untouched_seen);
        } else {
            untouched_seen += 1;
        }
    }
    gaps
}

/// Positions (into `values`) of one longest strictly increasing subsequence.
fn longest_increasing_run(values: &[usize]) -> Vec<usize> {
    // tails[k]: position of the smallest tail of an increasing run of length k + 1
    let mut tails: Vec<usize> = Vec::new();
    let mut previous: Vec<Option<usize>> = vec![None; values.len()];

    for (pos, &value) in values.iter().enumerate() {
        let slot = tails.partition_point(|&t| values[t] < value);
        if slot > 0 {
            previous[pos] = Some(tails[slot - 1]);
        }
        if slot == tails.len() {
            tails.push(pos);
        } else {
            tails[slot] = pos;
        }
    }

    let mut run = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(pos) = cursor {
        run.push(pos);
        cursor = previous[pos];
    }
    run.reverse();
    run
}
