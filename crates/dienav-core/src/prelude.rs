//! Common module for library exports

pub use crate::die::{Die, DeclContext};
pub use crate::error::{DwarfError, Result};
pub use crate::identity::{ModulePartition, UserId};
pub use crate::records::{AttrValue, DieOffset, Record, RecordStore, RecordStoreBuilder};
pub use crate::reference::DieRef;
pub use crate::symbols::{GimliDecoder, RecordDecoder, SymbolFile, SymbolFileOptions};
pub use crate::types::{Address, AddressRange, SourceLanguage};
pub use crate::typesystem::{ResolvedType, TypeKind, TypeSystem};
pub use crate::unit::{CompileUnit, UnitHeader, UnitId};
