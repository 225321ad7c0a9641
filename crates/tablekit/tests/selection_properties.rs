//! Property tests for selection rank bookkeeping.

use proptest::prelude::*;
use tablekit::{Record, RecordId, SelectionTracker, Table, TableConfig};

#[derive(Debug, Clone)]
enum Op {
    Select(Vec<RecordId>),
    Toggle(RecordId),
    Until(RecordId),
    Clear,
    Sort(bool),
}

fn arb_id() -> impl Strategy<Value = RecordId> {
    // A few ids past the table so unknown ids are exercised.
    0..14i64
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        prop::collection::vec(arb_id(), 0..6).prop_map(Op::Select),
        arb_id().prop_map(Op::Toggle),
        arb_id().prop_map(Op::Until),
        Just(Op::Clear),
        any::<bool>().prop_map(Op::Sort),
    ]
}

fn table() -> Table {
    let records = (0..12)
        .map(|id| Record::new(id).with("score", (id * 7) % 5))
        .collect();
    Table::with_records(TableConfig::new(["id", "score"]), records).unwrap()
}

fn assert_dense(table: &Table) -> Result<(), TestCaseError> {
    let selected = table.selected();
    for (expected_rank, id) in selected.iter().enumerate() {
        prop_assert_eq!(table.rank(*id), Some(expected_rank));
        let classes = table.row_classes(*id);
        prop_assert_eq!(&classes[1], &format!("selected-{expected_rank}"));
    }
    Ok(())
}

proptest! {
    /// Property: after any operation sequence the ranks of the selection
    /// are exactly 0..k-1 and `selected()` lists ids in rank order.
    #[test]
    fn prop_ranks_stay_dense(ops in prop::collection::vec(arb_op(), 0..40)) {
        let table = table();
        for op in ops {
            match op {
                Op::Select(ids) => table.select(&ids),
                Op::Toggle(id) => table.select_toggle(id),
                Op::Until(id) => table.select_until(id),
                Op::Clear => table.clear(),
                Op::Sort(ascending) => {
                    let order = if ascending { tablekit::SortOrder::Asc } else { tablekit::SortOrder::Desc };
                    table.sort("score", order);
                }
            }
            assert_dense(&table)?;
        }
    }

    /// Property: toggling the same id twice restores the selection except
    /// that the id moves to the end.
    #[test]
    fn prop_double_toggle_moves_to_end(ids in prop::collection::vec(0..12i64, 1..8), pick in 0usize..8) {
        let table = table();
        table.select(&ids);
        let before = table.selected();
        let id = before[pick % before.len()];

        table.select_toggle(id);
        prop_assert!(!table.is_selected(id));
        table.select_toggle(id);

        let mut expected: Vec<RecordId> = before.into_iter().filter(|&other| other != id).collect();
        expected.push(id);
        prop_assert_eq!(table.selected(), expected);
    }

    /// Property: the tracker never holds duplicate ids and stays dense
    /// under arbitrary insert/remove interleavings.
    #[test]
    fn prop_tracker_dense(ops in prop::collection::vec((any::<bool>(), 0..20i64), 0..60)) {
        let mut tracker = SelectionTracker::default();
        for (insert, id) in ops {
            if insert {
                tracker.insert(id);
            } else {
                tracker.remove(id);
            }
            prop_assert!(tracker.ranks_are_dense());
            let selected = tracker.selected();
            let mut unique = selected.clone();
            unique.sort_unstable();
            unique.dedup();
            prop_assert_eq!(unique.len(), selected.len());
        }
    }
}
