//! Symbol metadata port.

use crate::domain::asset::{AssetClass, SymbolMetadata};
use crate::domain::error::GekkoError;

pub trait MetadataPort: Send + Sync {
    /// Insert metadata for (symbol, asset_class) if absent. Returns `true`
    /// when a row was created.
    fn ensure_metadata(&self, metadata: &SymbolMetadata) -> Result<bool, GekkoError>;

    fn symbols_in_class(&self, asset_class: AssetClass) -> Result<Vec<String>, GekkoError>;

    /// All metadata rows, sorted by asset class then symbol.
    fn all_metadata(&self) -> Result<Vec<SymbolMetadata>, GekkoError>;
}
