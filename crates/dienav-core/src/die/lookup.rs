//! Address to function/block resolution.

use gimli::constants;

use super::Die;
use crate::types::Address;

impl<'a> Die<'a>
{
    /// Whether any of the record's code ranges contains `address`.
    #[must_use]
    pub fn contains_address(&self, address: Address) -> bool
    {
        self.ranges().iter().any(|range| range.contains(address))
    }

    /// Find the function under this record whose ranges contain `address`,
    /// together with the innermost lexical block or inlined subroutine of
    /// that function containing it.
    ///
    /// The block is the function itself when no nested block matches.
    #[must_use]
    pub fn lookup_address(&self, address: Address) -> Option<(Die<'a>, Die<'a>)>
    {
        let function = self.find_function(address)?;
        Some((function, function.deepest_block(address)))
    }

    /// Innermost lexical block or inlined subroutine containing `address`.
    ///
    /// Returns an invalid handle when no function contains `address`, or
    /// when the function has no nested block containing it. A block whose
    /// record lies outside this unit's section range (a tree attached from
    /// a dependent unit) is re-resolved through the unit that owns that
    /// range; if that fails the result is invalid.
    #[must_use]
    pub fn lookup_deepest_block(&self, address: Address) -> Die<'a>
    {
        let Some((function, block)) = self.lookup_address(address) else {
            return Die::default();
        };
        if block == function {
            return Die::default();
        }
        block.rehome()
    }

    fn find_function(&self, address: Address) -> Option<Die<'a>>
    {
        if !self.is_valid() {
            return None;
        }
        if self.tag() == constants::DW_TAG_subprogram {
            return self.contains_address(address).then_some(*self);
        }

        for child in self.children() {
            match child.tag() {
                constants::DW_TAG_subprogram => {
                    if child.contains_address(address) {
                        return Some(child);
                    }
                }
                constants::DW_TAG_compile_unit
                | constants::DW_TAG_partial_unit
                | constants::DW_TAG_namespace
                | constants::DW_TAG_module
                | constants::DW_TAG_structure_type
                | constants::DW_TAG_class_type
                | constants::DW_TAG_union_type => {
                    if let Some(function) = child.find_function(address) {
                        return Some(function);
                    }
                }
                _ => {}
            }
        }
        None
    }

    fn deepest_block(&self, address: Address) -> Die<'a>
    {
        let mut current = *self;
        while let Some(inner) = current.block_child(address) {
            current = inner;
        }
        current
    }

    // Blocks without any ranges are transparent: compilers wrap nested
    // scopes in them without a pc range of their own.
    fn block_child(&self, address: Address) -> Option<Die<'a>>
    {
        for child in self.children() {
            if !matches!(child.tag(), constants::DW_TAG_lexical_block | constants::DW_TAG_inlined_subroutine) {
                continue;
            }
            if child.ranges().is_empty() {
                if let Some(inner) = child.block_child(address) {
                    return Some(inner);
                }
            } else if child.contains_address(address) {
                return Some(child);
            }
        }
        None
    }

    fn rehome(&self) -> Die<'a>
    {
        let (Some(unit), Some(offset)) = (self.unit, self.offset()) else {
            return Die::default();
        };
        if unit.contains_offset(offset) {
            return *self;
        }

        let Some(file) = self.file else {
            tracing::debug!(offset = format_args!("0x{offset:08x}"), "block outside unit and no symbol file to re-resolve it");
            return Die::default();
        };
        let owner = file.die_at(offset);
        if !owner.is_valid() {
            tracing::debug!(offset = format_args!("0x{offset:08x}"), "block outside unit could not be re-resolved");
        }
        owner
    }
}
