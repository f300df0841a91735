//! Declaration contexts.
//!
//! The *declaration context* of a record is the scope that owns its
//! declaration (namespace, class, unit), which is not always its raw tree
//! parent: an out-of-line member function definition sits at unit level
//! but belongs to its class through `DW_AT_specification`. What counts as
//! a context is a language decision, so each step asks the unit's
//! [`TypeSystem`](crate::typesystem::TypeSystem).

use std::fmt;

use gimli::{constants, DwTag};
use smallvec::SmallVec;

use super::Die;
use crate::types::SourceLanguage;

/// Bound on chain length when no symbol file supplies one.
pub const DEFAULT_MAX_DECL_CONTEXT_DEPTH: usize = 64;

/// One `(tag, name)` step of a [`DeclContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclContextEntry
{
    /// Tag of the context record.
    pub tag: DwTag,
    /// Name of the context record, if it has one.
    pub name: Option<String>,
}

/// Owned description of where a record is declared, innermost first.
///
/// The first entry is the record itself; the enclosing unit is not
/// included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclContext
{
    entries: Vec<DeclContextEntry>,
    language: SourceLanguage,
}

impl DeclContext
{
    /// Entries from the record outwards.
    #[must_use]
    pub fn entries(&self) -> &[DeclContextEntry]
    {
        &self.entries
    }

    /// Language of the unit the record was found in.
    #[must_use]
    pub fn language(&self) -> SourceLanguage
    {
        self.language
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize
    {
        self.entries.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.entries.is_empty()
    }

    /// `outer::inner::name` rendering. Anonymous namespaces are written as
    /// `(anonymous namespace)`, other anonymous scopes as `(anonymous)`.
    #[must_use]
    pub fn qualified_name(&self) -> String
    {
        let mut parts: Vec<&str> = self
            .entries
            .iter()
            .map(|entry| match (&entry.name, entry.tag) {
                (Some(name), _) => name.as_str(),
                (None, constants::DW_TAG_namespace) => "(anonymous namespace)",
                (None, _) => "(anonymous)",
            })
            .collect();
        parts.reverse();
        parts.join("::")
    }
}

impl fmt::Display for DeclContext
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(&self.qualified_name())
    }
}

impl<'a> Die<'a>
{
    /// Record that owns this record's declaration, per the unit's type
    /// system. Invalid when there is none.
    #[must_use]
    pub fn parent_decl_context(&self) -> Die<'a>
    {
        match self.unit {
            Some(unit) if self.is_valid() => unit.type_system().parent_declaration_context(*self),
            _ => Die::default(),
        }
    }

    /// Chain of declaration contexts from innermost to outermost,
    /// excluding this record.
    ///
    /// The walk stops at the first invalid context, at a context that
    /// refers back to itself, at a context already in the chain (corrupt
    /// input) or after the configured maximum depth.
    #[must_use]
    pub fn declaration_context_chain(&self) -> SmallVec<[Die<'a>; 4]>
    {
        let mut chain = SmallVec::new();
        let limit = self
            .file
            .map_or(DEFAULT_MAX_DECL_CONTEXT_DEPTH, |file| file.options().max_decl_context_depth());

        let mut current = *self;
        while current.is_valid() {
            let parent = current.parent_decl_context();
            if !parent.is_valid() || parent == current {
                break;
            }
            if parent == *self || chain.contains(&parent) {
                tracing::warn!(start = %self.die_ref(), at = %parent.die_ref(), "declaration context cycle; truncating chain");
                break;
            }
            if chain.len() >= limit {
                tracing::warn!(start = %self.die_ref(), limit, "declaration context chain too deep; truncating");
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// `(tag, name)` description of this record and its enclosing
    /// contexts, stopping at the unit.
    #[must_use]
    pub fn decl_context(&self) -> DeclContext
    {
        let mut context = DeclContext {
            entries: Vec::new(),
            language: self.language(),
        };
        if !self.is_valid() {
            return context;
        }

        let entry = |die: &Die<'_>| DeclContextEntry {
            tag: die.tag(),
            name: die.name().map(str::to_string),
        };
        context.entries.push(entry(self));
        for scope in self.declaration_context_chain() {
            if matches!(scope.tag(), constants::DW_TAG_compile_unit | constants::DW_TAG_partial_unit) {
                break;
            }
            context.entries.push(entry(&scope));
        }
        context
    }
}
