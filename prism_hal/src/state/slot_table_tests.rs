//! Unit tests for slot_table.rs

use crate::state::slot_table::{BitIter, SlotTable};

#[test]
fn test_bit_iter_yields_set_bits_in_order() {
    let bits: Vec<usize> = BitIter::new(0b1010_0101).collect();
    assert_eq!(bits, vec![0, 2, 5, 7]);
    assert_eq!(BitIter::new(0).count(), 0);
    assert_eq!(BitIter::new(1 << 63).collect::<Vec<_>>(), vec![63]);
}

#[test]
fn test_set_marks_dirty_once() {
    let mut table: SlotTable<u32, 8> = SlotTable::new();
    assert!(table.set(3, Some(7)));
    assert!(!table.set(3, Some(7)));
    assert_eq!(table.dirty_mask(), 1 << 3);
    assert_eq!(table.get(3), Some(&7));
}

#[test]
fn test_identical_value_after_flush_stays_clean() {
    let mut table: SlotTable<u32, 8> = SlotTable::new();
    table.set(1, Some(5));
    assert_eq!(table.take_dirty().collect::<Vec<_>>(), vec![1]);
    assert!(!table.set(1, Some(5)));
    assert_eq!(table.dirty_mask(), 0);
}

#[test]
fn test_unbind_is_a_change() {
    let mut table: SlotTable<u32, 4> = SlotTable::new();
    table.set(0, Some(1));
    table.take_dirty();
    assert!(table.set(0, None));
    assert!(table.is_dirty(0));
    assert_eq!(table.get(0), None);
}

#[test]
fn test_mark_bound_dirty_skips_empty_slots() {
    let mut table: SlotTable<u32, 4> = SlotTable::new();
    table.set(0, Some(1));
    table.set(2, Some(3));
    table.take_dirty();
    table.mark_bound_dirty();
    assert_eq!(table.take_dirty().collect::<Vec<_>>(), vec![0, 2]);
}

#[test]
fn test_clear_forgets_everything() {
    let mut table: SlotTable<u32, 4> = SlotTable::default();
    table.set(1, Some(1));
    table.clear();
    assert_eq!(table.get(1), None);
    assert_eq!(table.dirty_mask(), 0);
    assert_eq!(table.capacity(), 4);
}

#[test]
#[should_panic(expected = "out of range")]
fn test_out_of_range_set_panics() {
    let mut table: SlotTable<u32, 4> = SlotTable::new();
    table.set(4, Some(1));
}

#[test]
#[should_panic(expected = "out of range")]
fn test_out_of_range_get_panics() {
    let table: SlotTable<u32, 4> = SlotTable::new();
    let _ = table.get(9);
}

#[test]
fn test_flush_dirty_clears_only_accepted_slots() {
    let mut table: SlotTable<u32, 8> = SlotTable::new();
    table.set(1, Some(10));
    table.set(3, Some(30));
    table.set(5, Some(50));

    let mut issued = Vec::new();
    let result = table.flush_dirty(|index, value| {
        if index == 3 {
            return Err(index);
        }
        issued.push((index, value.copied()));
        Ok(())
    });

    assert_eq!(result, Err(3));
    assert_eq!(issued, vec![(1, Some(10))]);
    assert_eq!(table.dirty_mask(), (1 << 3) | (1 << 5));

    let mut retried = Vec::new();
    table
        .flush_dirty(|index, _| {
            retried.push(index);
            Ok::<(), ()>(())
        })
        .unwrap();
    assert_eq!(retried, vec![3, 5]);
    assert_eq!(table.dirty_mask(), 0);
}
