//! Symbol file configuration.

use std::sync::Arc;

use crate::die::decl_context::DEFAULT_MAX_DECL_CONTEXT_DEPTH;
use crate::die::names::DEFAULT_ATTRIBUTE_DEPTH;
use crate::identity::ModulePartition;
use crate::types::SourceLanguage;
use crate::typesystem::{TypeSystem, TypeSystemRegistry};

/// Options for opening a [`SymbolFile`](super::SymbolFile).
///
/// ```rust
/// use dienav_core::symbols::SymbolFileOptions;
///
/// let options = SymbolFileOptions::builder()
///     .partition(3)
///     .max_decl_context_depth(32)
///     .max_lookup_units(128)
///     .build();
/// assert_eq!(options.partition().map(|p| p.index()), Some(3));
/// ```
#[derive(Debug, Clone)]
pub struct SymbolFileOptions
{
    partition: Option<ModulePartition>,
    max_decl_context_depth: usize,
    attribute_depth: u32,
    max_lookup_units: usize,
    type_systems: TypeSystemRegistry,
}

impl SymbolFileOptions
{
    /// Start building options from the defaults.
    #[must_use]
    pub fn builder() -> SymbolFileOptionsBuilder
    {
        SymbolFileOptionsBuilder {
            options: Self::default(),
        }
    }

    /// Module id partition, if any.
    #[must_use]
    pub fn partition(&self) -> Option<ModulePartition>
    {
        self.partition
    }

    /// Maximum length of a declaration context chain.
    #[must_use]
    pub fn max_decl_context_depth(&self) -> usize
    {
        self.max_decl_context_depth
    }

    /// Indirection depth used when merging inherited attributes.
    #[must_use]
    pub fn attribute_depth(&self) -> u32
    {
        self.attribute_depth
    }

    /// Maximum number of units a single address lookup may search
    /// (0 = unbounded).
    #[must_use]
    pub fn max_lookup_units(&self) -> usize
    {
        self.max_lookup_units
    }

    /// Type systems by language.
    #[must_use]
    pub fn type_systems(&self) -> &TypeSystemRegistry
    {
        &self.type_systems
    }
}

impl Default for SymbolFileOptions
{
    fn default() -> Self
    {
        Self {
            partition: None,
            max_decl_context_depth: DEFAULT_MAX_DECL_CONTEXT_DEPTH,
            attribute_depth: DEFAULT_ATTRIBUTE_DEPTH,
            max_lookup_units: 0,
            type_systems: TypeSystemRegistry::default(),
        }
    }
}

/// Fluent builder for [`SymbolFileOptions`].
#[derive(Debug, Clone)]
pub struct SymbolFileOptionsBuilder
{
    options: SymbolFileOptions,
}

impl SymbolFileOptionsBuilder
{
    /// Put this module's ids in partition `index`.
    #[must_use]
    pub fn partition(mut self, index: u32) -> Self
    {
        self.options.partition = Some(ModulePartition::new(index));
        self
    }

    /// Bound declaration context chains to `depth` entries.
    #[must_use]
    pub fn max_decl_context_depth(mut self, depth: usize) -> Self
    {
        self.options.max_decl_context_depth = depth;
        self
    }

    /// Follow at most `depth` origin/specification indirections when
    /// merging attributes.
    #[must_use]
    pub fn attribute_depth(mut self, depth: u32) -> Self
    {
        self.options.attribute_depth = depth;
        self
    }

    /// Search at most `units` units per address lookup (0 = unbounded).
    #[must_use]
    pub fn max_lookup_units(mut self, units: usize) -> Self
    {
        self.options.max_lookup_units = units;
        self
    }

    /// Use `type_system` for units of `language`.
    #[must_use]
    pub fn type_system(mut self, language: SourceLanguage, type_system: Arc<dyn TypeSystem>) -> Self
    {
        self.options.type_systems.register(language, type_system);
        self
    }

    /// Replace the whole registry.
    #[must_use]
    pub fn type_systems(mut self, registry: TypeSystemRegistry) -> Self
    {
        self.options.type_systems = registry;
        self
    }

    #[must_use]
    pub fn build(self) -> SymbolFileOptions
    {
        self.options
    }
}
