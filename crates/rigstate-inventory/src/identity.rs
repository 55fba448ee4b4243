//! Identity and de-duplication engine
//!
//! Two policies, both order-sensitive:
//!
//! * keyed domains reuse the first record whose serial is still open or
//!   exactly equal to the candidate's ([`find_slot`], [`slot_for`]);
//! * unkeyed domains drop a candidate only when it equals the *last* record
//!   ([`push_distinct`]). Non-adjacent duplicates are kept.

use crate::merge::HardwareRecord;

/// Index of the first record whose serial is open or equal to `serial`
#[must_use]
pub fn find_slot<R: HardwareRecord>(records: &[R], serial: &str) -> Option<usize> {
    records.iter().position(|record| {
        let key = &record.node_fields().serial;
        key.is_open() || key.as_str() == serial
    })
}

/// The record `serial` belongs to, appending a fresh one when none matches
///
/// When two candidates in one pass both fit an open slot the first one
/// claims it and the second becomes a new record.
pub fn slot_for<'a, R: HardwareRecord + Default>(records: &'a mut Vec<R>, serial: &str) -> &'a mut R {
    let index = match find_slot(records, serial) {
        Some(index) => index,
        None => {
            records.push(R::default());
            records.len() - 1
        }
    };
    &mut records[index]
}

/// Append `candidate` unless it equals the last record; returns whether it was appended
pub fn push_distinct<R: PartialEq>(records: &mut Vec<R>, candidate: R) -> bool {
    if records.last() == Some(&candidate) {
        return false;
    }
    records.push(candidate);
    true
}
