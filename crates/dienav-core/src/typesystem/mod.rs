//! # Type systems
//!
//! Language plugins that turn type records into [`ResolvedType`] values and
//! decide which records count as declaration contexts.
//!
//! Every compilation unit picks one [`TypeSystem`] from the
//! [`TypeSystemRegistry`] when it's created, based on its language tag. The
//! engine never interprets type records itself; it asks the unit's type
//! system, and the [`SymbolFile`](crate::symbols::SymbolFile) caches the
//! answer by [`UserId`].
//!
//! ## Shipped type systems
//!
//! - [`CFamilyTypeSystem`]: C, C++, Objective-C and Objective-C++, and the
//!   fallback for languages without a dedicated plugin.
//! - [`RustTypeSystem`]: Rust. Variant parts become enums, `dyn` types
//!   become trait objects and enumerations act as declaration contexts.

mod c_family;
mod extractor;
mod rust;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use gimli::{constants, DwAte, DwTag};

pub use c_family::CFamilyTypeSystem;
pub use rust::RustTypeSystem;

use crate::die::Die;
use crate::error::Result;
use crate::identity::UserId;
use crate::reference::DieRef;
use crate::types::SourceLanguage;

/// Bound on specification/abstract-origin redirections followed when
/// computing a parent declaration context.
const MAX_SPECIFICATION_DEPTH: u32 = 8;

/// Tags the default policy treats as declaration contexts.
pub const DEFAULT_CONTEXT_TAGS: &[DwTag] = &[
    constants::DW_TAG_compile_unit,
    constants::DW_TAG_partial_unit,
    constants::DW_TAG_namespace,
    constants::DW_TAG_structure_type,
    constants::DW_TAG_union_type,
    constants::DW_TAG_class_type,
];

/// Language plugin consulted for type resolution and declaration contexts.
pub trait TypeSystem: Send + Sync + fmt::Debug
{
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Build a type from `die`.
    ///
    /// Return [`DwarfError::UnsupportedType`](crate::error::DwarfError::UnsupportedType)
    /// when the record is well formed but isn't a type this plugin can
    /// represent.
    fn resolve_type(&self, die: Die<'_>) -> Result<ResolvedType>;

    /// Record owning `die`'s declaration.
    fn parent_declaration_context<'a>(&self, die: Die<'a>) -> Die<'a>
    {
        default_parent_decl_context(die, DEFAULT_CONTEXT_TAGS)
    }

    /// Fully qualified name of `die`.
    fn qualified_name(&self, die: Die<'_>) -> Option<String>
    {
        default_qualified_name(die)
    }
}

/// Standard DWARF parent-declaration-context policy.
///
/// If `die` has a `DW_AT_specification` or `DW_AT_abstract_origin` pointing
/// at another record, the answer is that record's context. Otherwise the
/// nearest raw ancestor whose tag is in `context_tags` is returned, or an
/// invalid handle if there is none.
#[must_use]
pub fn default_parent_decl_context<'a>(die: Die<'a>, context_tags: &[DwTag]) -> Die<'a>
{
    parent_decl_context_bounded(die, context_tags, MAX_SPECIFICATION_DEPTH)
}

fn parent_decl_context_bounded<'a>(die: Die<'a>, context_tags: &[DwTag], budget: u32) -> Die<'a>
{
    if !die.is_valid() {
        return Die::default();
    }

    if budget > 0 {
        for key in [constants::DW_AT_specification, constants::DW_AT_abstract_origin] {
            let origin = die.referenced_entity(key);
            if origin.is_valid() && origin != die {
                let context = parent_decl_context_bounded(origin, context_tags, budget - 1);
                if context.is_valid() {
                    return context;
                }
            }
        }
    }

    let mut parent = die.parent();
    while parent.is_valid() {
        if context_tags.contains(&parent.tag()) {
            return parent;
        }
        parent = parent.parent();
    }
    Die::default()
}

/// `outer::inner::name` built from the declaration context chain.
#[must_use]
pub fn default_qualified_name(die: Die<'_>) -> Option<String>
{
    die.name()?;
    Some(die.decl_context().qualified_name())
}

/// Broad classification of a [`ResolvedType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind
{
    /// Scalar with a `DW_AT_encoding`.
    Base,
    /// `T *`.
    Pointer,
    /// `T &`.
    Reference,
    /// `T &&`.
    RvalueReference,
    /// Pointer to member.
    MemberPointer,
    /// `const T`.
    Const,
    /// `volatile T`.
    Volatile,
    /// `restrict T`.
    Restrict,
    /// Type alias.
    Typedef,
    /// Fixed or variable length array.
    Array,
    /// `struct`.
    Struct,
    /// `class` (C++ only; Rust reports `Struct`).
    Class,
    /// `union`.
    Union,
    /// Enumeration, or a Rust enum with a variant part.
    Enum,
    /// Function type.
    Subroutine,
    /// Rust `dyn Trait`.
    TraitObject,
    /// `DW_TAG_unspecified_type` (`void`, `decltype(nullptr)`).
    Unspecified,
}

impl TypeKind
{
    /// Whether values of this kind have named members.
    #[must_use]
    pub fn is_aggregate(self) -> bool
    {
        matches!(
            self,
            TypeKind::Struct | TypeKind::Class | TypeKind::Union | TypeKind::Enum | TypeKind::TraitObject
        )
    }

    /// Whether this kind only wraps its target type.
    #[must_use]
    pub fn is_modifier(self) -> bool
    {
        matches!(
            self,
            TypeKind::Const | TypeKind::Volatile | TypeKind::Restrict | TypeKind::Typedef
        )
    }
}

/// Member of an aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeField
{
    /// Member name; `None` for anonymous members.
    pub name: Option<String>,
    /// Id of the member's type record.
    pub type_id: Option<UserId>,
    /// Display name of the member's type.
    pub type_name: Option<String>,
    /// Offset from the start of the aggregate in bits.
    pub offset_bits: Option<u64>,
    /// Width for bit fields.
    pub bit_size: Option<u64>,
}

/// Enumerator or enum variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeVariant
{
    /// Variant name.
    pub name: Option<String>,
    /// Discriminant or enumerator value.
    pub discriminant: Option<i64>,
    /// Payload members (Rust variants).
    pub fields: Vec<TypeField>,
}

/// One source-level type produced by a [`TypeSystem`].
///
/// Referenced types are stored as ids, never resolved eagerly, so recursive
/// types (a list node pointing at itself) resolve in one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType
{
    /// Id of the type record.
    pub id: UserId,
    /// Reference to the type record.
    pub die_ref: DieRef,
    /// Display name.
    pub name: Option<String>,
    /// Fully qualified name.
    pub qualified_name: Option<String>,
    /// Classification.
    pub kind: TypeKind,
    /// `DW_AT_byte_size`.
    pub byte_size: Option<u64>,
    /// Base type encoding.
    pub encoding: Option<DwAte>,
    /// Pointee, element, aliased or return type.
    pub target: Option<UserId>,
    /// Aggregate members.
    pub fields: Vec<TypeField>,
    /// Enumerators or variants.
    pub variants: Vec<TypeVariant>,
    /// Element counts per array dimension (`None` for unknown bounds).
    pub dimensions: Vec<Option<u64>>,
    /// Parameter type ids of a subroutine type.
    pub parameters: Vec<UserId>,
    /// Whether the record is only a forward declaration.
    pub is_declaration: bool,
    /// Language of the owning unit.
    pub language: SourceLanguage,
}

impl ResolvedType
{
    /// Size in bits, if known and representable.
    #[must_use]
    pub fn size_bits(&self) -> Option<u64>
    {
        self.byte_size.and_then(|bytes| bytes.checked_mul(8))
    }

    /// Name to show to a user.
    #[must_use]
    pub fn display_name(&self) -> &str
    {
        self.qualified_name.as_deref().or(self.name.as_deref()).unwrap_or("<anonymous>")
    }
}

/// Selects a [`TypeSystem`] per source language.
#[derive(Debug, Clone)]
pub struct TypeSystemRegistry
{
    by_language: HashMap<SourceLanguage, Arc<dyn TypeSystem>>,
    fallback: Arc<dyn TypeSystem>,
}

impl TypeSystemRegistry
{
    /// Registry with only a fallback; every language maps to it until
    /// something is registered.
    #[must_use]
    pub fn with_fallback(fallback: Arc<dyn TypeSystem>) -> Self
    {
        Self {
            by_language: HashMap::new(),
            fallback,
        }
    }

    /// Use `type_system` for units of `language`.
    pub fn register(&mut self, language: SourceLanguage, type_system: Arc<dyn TypeSystem>) -> &mut Self
    {
        self.by_language.insert(language, type_system);
        self
    }

    /// Type system for `language`.
    #[must_use]
    pub fn for_language(&self, language: SourceLanguage) -> Arc<dyn TypeSystem>
    {
        self.by_language
            .get(&language)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }
}

impl Default for TypeSystemRegistry
{
    fn default() -> Self
    {
        let c_family: Arc<dyn TypeSystem> = Arc::new(CFamilyTypeSystem::new());
        let mut registry = Self::with_fallback(Arc::clone(&c_family));
        for language in [
            SourceLanguage::C,
            SourceLanguage::Cpp,
            SourceLanguage::ObjC,
            SourceLanguage::ObjCpp,
        ] {
            registry.register(language, Arc::clone(&c_family));
        }
        registry.register(SourceLanguage::Rust, Arc::new(RustTypeSystem::new()));
        registry
    }
}
