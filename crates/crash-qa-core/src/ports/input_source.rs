//! Input source port for discovering crash logs and other scan inputs.

use crate::domain::ScanInput;

/// Port for loading scan inputs from a source.
pub trait InputSource: Send + Sync {
    /// Returns an iterator over inputs from this source.
    ///
    /// # Errors
    ///
    /// Individual items may be errors if an input fails to load.
    fn inputs(&self) -> Box<dyn Iterator<Item = anyhow::Result<ScanInput>> + Send + '_>;

    /// Returns the total number of inputs, if known.
    fn count_hint(&self) -> Option<usize>;
}
