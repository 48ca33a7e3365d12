//! Portfolio state persistence port trait.

use crate::domain::error::TraderError;
use crate::domain::portfolio::Portfolio;
use crate::domain::registry::AssetRegistry;

/// Summary of a successful load.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LoadReport {
    /// Catalog assets whose history was replaced.
    pub restored: Vec<String>,
    /// Names in the document that are not in the catalog.
    pub ignored: Vec<String>,
}

pub trait StatePort {
    fn save(&self, portfolio: &Portfolio, registry: &AssetRegistry) -> Result<(), TraderError>;

    /// Overwrite `portfolio` and matching price histories.
    ///
    /// On error neither argument has been modified.
    fn load(
        &self,
        portfolio: &mut Portfolio,
        registry: &mut AssetRegistry,
    ) -> Result<LoadReport, TraderError>;
}
