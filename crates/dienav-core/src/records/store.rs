//! Flat per-unit record storage.

use std::ops::Range;

use super::{DieOffset, Record};

/// All records of one compilation unit, in depth-first order.
///
/// The store is immutable once built. Because depth-first order is also
/// ascending offset order, `record_at` is a binary search and records never
/// move, which is what lets [`Die`](crate::die::Die) handles borrow them
/// directly.
#[derive(Debug, Default)]
pub struct RecordStore
{
    unit_range: Range<DieOffset>,
    root: Option<DieOffset>,
    records: Vec<Record>,
}

impl RecordStore
{
    /// Record at absolute offset `offset`, if this store has one.
    #[must_use]
    pub fn record_at(&self, offset: DieOffset) -> Option<&Record>
    {
        self.records
            .binary_search_by_key(&offset, Record::offset)
            .ok()
            .map(|index| &self.records[index])
    }

    /// The unit's root record (`DW_TAG_compile_unit` or similar).
    #[must_use]
    pub fn root(&self) -> Option<&Record>
    {
        self.root.and_then(|offset| self.record_at(offset))
    }

    /// Whether `offset` lies inside the owning unit's section range.
    ///
    /// A store may hold records outside this range when the decoder attached
    /// DIE trees from a dependent unit; those are still found by `record_at`.
    #[must_use]
    pub fn unit_contains(&self, offset: DieOffset) -> bool
    {
        self.unit_range.contains(&offset)
    }

    /// Section range of the owning unit.
    #[must_use]
    pub fn unit_range(&self) -> Range<DieOffset>
    {
        self.unit_range.clone()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize
    {
        self.records.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.records.is_empty()
    }

    /// Iterate records in offset order.
    pub fn iter(&self) -> impl Iterator<Item = &Record>
    {
        self.records.iter()
    }
}

/// Builds a [`RecordStore`] from a depth-first walk.
///
/// Callers push each record with its tree depth (root = 0) in the order a
/// depth-first traversal visits them; the builder fills in the
/// parent/first-child/sibling links.
///
/// ```rust
/// use dienav_core::records::{Record, RecordStoreBuilder};
/// use gimli::constants;
///
/// let mut builder = RecordStoreBuilder::new(0x0..0x40);
/// builder.push(0, Record::new(0x0b, constants::DW_TAG_compile_unit, true));
/// builder.push(1, Record::new(0x10, constants::DW_TAG_subprogram, false));
/// builder.push(1, Record::new(0x20, constants::DW_TAG_variable, false));
/// let store = builder.finish();
///
/// let func = store.record_at(0x10).unwrap();
/// assert_eq!(func.parent_offset(), Some(0x0b));
/// assert_eq!(func.sibling_offset(), Some(0x20));
/// ```
#[derive(Debug)]
pub struct RecordStoreBuilder
{
    unit_range: Range<DieOffset>,
    root: Option<DieOffset>,
    records: Vec<Record>,
    // path[d] = index of the most recent record pushed at depth d
    path: Vec<usize>,
    sorted: bool,
}

impl RecordStoreBuilder
{
    /// Start a store for the unit occupying `unit_range` of `.debug_info`.
    #[must_use]
    pub fn new(unit_range: Range<DieOffset>) -> Self
    {
        Self {
            unit_range,
            root: None,
            records: Vec::new(),
            path: Vec::new(),
            sorted: true,
        }
    }

    /// Reserve room for `additional` more records.
    pub fn reserve(&mut self, additional: usize)
    {
        self.records.reserve(additional);
    }

    /// Append `record` at tree depth `depth`.
    ///
    /// A depth that skips levels is clamped to one below the current
    /// deepest record.
    pub fn push(&mut self, depth: usize, mut record: Record) -> &mut Self
    {
        let depth = depth.min(self.path.len());
        let index = self.records.len();

        match self.records.last() {
            Some(last) if last.offset() >= record.offset() => self.sorted = false,
            Some(_) => {}
            // Attached foreign trees may sort below the root.
            None => self.root = Some(record.offset()),
        }

        if depth < self.path.len() {
            let previous = self.path[depth];
            self.records[previous].sibling = Some(record.offset());
            self.path.truncate(depth);
        }

        record.parent = None;
        record.first_child = None;
        record.sibling = None;

        if let Some(&parent) = self.path.last() {
            record.parent = Some(self.records[parent].offset());
            if self.records[parent].first_child.is_none() {
                self.records[parent].first_child = Some(record.offset());
            }
        }

        self.records.push(record);
        self.path.push(index);
        self
    }

    /// Finish the store.
    #[must_use]
    pub fn finish(mut self) -> RecordStore
    {
        if !self.sorted {
            tracing::debug!(
                unit = self.unit_range.start,
                "records pushed out of offset order; sorting store"
            );
            self.records.sort_by_key(Record::offset);
        }

        RecordStore {
            unit_range: self.unit_range,
            root: self.root,
            records: self.records,
        }
    }
}
