//! Explorer options.
//!
//! `ExplorerOptions` carries the tuning knobs of the interactive sales
//! explorer: display batch size, the size of the fast initial scan window,
//! and the comps lookup bounds.

use std::collections::HashMap;

use crate::error::ReaderError;

use super::scan::ScanOptions;

/// Options for the sales explorer and comps lookup.
///
/// # Example
/// ```
/// use dbfscan::api::ExplorerOptions;
///
/// let opts = ExplorerOptions {
///     batch_size: 250,
///     ..Default::default()
/// };
/// assert_eq!(opts.recent_window, 5000);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ExplorerOptions {
    /// Records decoded per display batch (default: 100).
    pub batch_size: usize,

    /// Number of trailing records scanned on the first pass after loading
    /// (default: 5000).
    ///
    /// A full scan is only run once the user applies filters.
    pub recent_window: u32,

    /// Maximum comparable sales returned by a comps lookup (default: 50).
    pub comps_limit: usize,

    /// Minimum sale amount for a comparable sale (default: 10,000).
    ///
    /// Filters out nominal transfers such as $100 family deeds.
    pub comps_min_amount: f64,
}

impl Default for ExplorerOptions {
    fn default() -> Self {
        Self {
            batch_size: 100,
            recent_window: 5000,
            comps_limit: 50,
            comps_min_amount: 10_000.0,
        }
    }
}

impl ExplorerOptions {
    /// Create a new `ExplorerOptions` with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build options from string key/value pairs.
    ///
    /// Recognized keys: `batch_size`, `recent_window`, `comps_limit`,
    /// `comps_min_amount`. Unknown keys are ignored.
    ///
    /// # Errors
    /// `ReaderError::Configuration` if a recognized value does not parse.
    pub fn from_dict(opts: &HashMap<String, String>) -> Result<Self, ReaderError> {
        let mut options = Self::default();

        if let Some(v) = opts.get("batch_size") {
            options.batch_size = parse_option("batch_size", v)?;
        }
        if let Some(v) = opts.get("recent_window") {
            options.recent_window = parse_option("recent_window", v)?;
        }
        if let Some(v) = opts.get("comps_limit") {
            options.comps_limit = parse_option("comps_limit", v)?;
        }
        if let Some(v) = opts.get("comps_min_amount") {
            options.comps_min_amount = parse_option("comps_min_amount", v)?;
        }

        Ok(options)
    }

    /// Scan options for the fast first pass over the last
    /// [`recent_window`](Self::recent_window) records.
    pub fn initial_scan(&self) -> ScanOptions {
        ScanOptions::recent(self.recent_window)
    }

    /// Set the display batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the initial scan window.
    pub fn with_recent_window(mut self, recent_window: u32) -> Self {
        self.recent_window = recent_window;
        self
    }

    /// Set the comps result cap.
    pub fn with_comps_limit(mut self, comps_limit: usize) -> Self {
        self.comps_limit = comps_limit;
        self
    }

    /// Set the comps minimum sale amount.
    pub fn with_comps_min_amount(mut self, amount: f64) -> Self {
        self.comps_min_amount = amount;
        self
    }
}

fn parse_option<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ReaderError> {
    value.trim().parse().map_err(|_| {
        ReaderError::Configuration(format!("Invalid value for {}: {:?}", key, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explorer_options_default() {
        let opts = ExplorerOptions::default();
        assert_eq!(opts.batch_size, 100);
        assert_eq!(opts.recent_window, 5000);
        assert_eq!(opts.comps_limit, 50);
        assert_eq!(opts.comps_min_amount, 10_000.0);
        assert_eq!(ExplorerOptions::new(), opts);
    }

    #[test]
    fn test_explorer_options_builder() {
        let opts = ExplorerOptions::new()
            .with_batch_size(25)
            .with_recent_window(1000)
            .with_comps_limit(10)
            .with_comps_min_amount(50_000.0);
        assert_eq!(opts.batch_size, 25);
        assert_eq!(opts.recent_window, 1000);
        assert_eq!(opts.comps_limit, 10);
        assert_eq!(opts.comps_min_amount, 50_000.0);
    }

    #[test]
    fn test_explorer_options_from_dict() {
        let mut dict = HashMap::new();
        dict.insert("batch_size".to_string(), "200".to_string());
        dict.insert("comps_min_amount".to_string(), " 25000 ".to_string());
        dict.insert("unrelated".to_string(), "x".to_string());

        let opts = ExplorerOptions::from_dict(&dict).unwrap();
        assert_eq!(opts.batch_size, 200);
        assert_eq!(opts.comps_min_amount, 25_000.0);
        assert_eq!(opts.recent_window, 5000);
    }

    #[test]
    fn test_initial_scan_uses_recent_window() {
        assert_eq!(
            ExplorerOptions::default().initial_scan(),
            ScanOptions::recent(5000)
        );

        let mut dict = HashMap::new();
        dict.insert("recent_window".to_string(), "250".to_string());
        let opts = ExplorerOptions::from_dict(&dict).unwrap();
        assert_eq!(opts.initial_scan().window(10_000), (9_750, 10_000));
    }

    #[test]
    fn test_explorer_options_from_dict_invalid() {
        let mut dict = HashMap::new();
        dict.insert("recent_window".to_string(), "lots".to_string());
        assert!(matches!(
            ExplorerOptions::from_dict(&dict),
            Err(ReaderError::Configuration(_))
        ));
    }
}
