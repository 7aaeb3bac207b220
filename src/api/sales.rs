//! Sales explorer filters and comparable-sales lookup.
//!
//! These map the explorer's form inputs and the comps query onto
//! [`FilterPredicate`]s over the county's well-known field names.

use tracing::debug;

use crate::error::ReaderError;
use crate::reader::{DbfFile, Record};

use super::batch::materialize_batch;
use super::fields::{FOLIO, GRANTEE, GRANTOR, NBHC, PIN, QU, QUALIFIED, REA_CD, S_AMT, S_DATE};
use super::filter::FilterPredicate;
use super::options::ExplorerOptions;
use super::scan::{scan, ScanOptions};

/// Explorer filter inputs. Blank inputs add no clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesFilter {
    /// Neighborhood code, exact match.
    pub nbhc: Option<String>,
    /// Earliest sale date, `YYYYMMDD` or `YYYY-MM-DD`.
    pub min_date: Option<String>,
    /// Minimum sale amount. Zero or less adds no clause. Records with a
    /// blank amount are kept.
    pub min_amount: Option<f64>,
    /// Buyer name substring.
    pub buyer: Option<String>,
    /// Seller name substring.
    pub seller: Option<String>,
    /// Parcel ID substring.
    pub pin: Option<String>,
    /// Folio number substring.
    pub folio: Option<String>,
    /// Reason code, exact match.
    pub reason: Option<String>,
    /// Only arm's-length sales (`QU == "Q"`).
    pub qualified_only: bool,
}

impl SalesFilter {
    /// An empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the neighborhood code.
    pub fn with_nbhc(mut self, nbhc: impl Into<String>) -> Self {
        self.nbhc = Some(nbhc.into());
        self
    }

    /// Set the earliest sale date.
    pub fn with_min_date(mut self, date: impl Into<String>) -> Self {
        self.min_date = Some(date.into());
        self
    }

    /// Set the minimum sale amount.
    pub fn with_min_amount(mut self, amount: f64) -> Self {
        self.min_amount = Some(amount);
        self
    }

    /// Set the buyer substring.
    pub fn with_buyer(mut self, buyer: impl Into<String>) -> Self {
        self.buyer = Some(buyer.into());
        self
    }

    /// Set the seller substring.
    pub fn with_seller(mut self, seller: impl Into<String>) -> Self {
        self.seller = Some(seller.into());
        self
    }

    /// Set the parcel ID substring.
    pub fn with_pin(mut self, pin: impl Into<String>) -> Self {
        self.pin = Some(pin.into());
        self
    }

    /// Set the folio substring.
    pub fn with_folio(mut self, folio: impl Into<String>) -> Self {
        self.folio = Some(folio.into());
        self
    }

    /// Set the reason code.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Keep only arm's-length sales.
    pub fn qualified_only(mut self, qualified_only: bool) -> Self {
        self.qualified_only = qualified_only;
        self
    }

    /// Build the predicate for these inputs.
    ///
    /// # Errors
    /// `ReaderError::Configuration` if `min_date` is not a valid date string.
    pub fn to_predicate(&self) -> Result<FilterPredicate, ReaderError> {
        let mut predicate = FilterPredicate::new();

        if self.qualified_only {
            predicate = predicate.equals(QU, QUALIFIED);
        }
        if let Some(reason) = non_blank(&self.reason) {
            predicate = predicate.equals(REA_CD, reason);
        }
        if let Some(nbhc) = non_blank(&self.nbhc) {
            predicate = predicate.equals(NBHC, nbhc);
        }
        if let Some(date) = non_blank(&self.min_date) {
            predicate = predicate.date_on_or_after(S_DATE, date)?;
        }
        if let Some(amount) = self.min_amount.filter(|a| *a > 0.0) {
            predicate = predicate.min_number(S_AMT, amount);
        }
        for (field, needle) in [
            (PIN, &self.pin),
            (FOLIO, &self.folio),
            (GRANTEE, &self.buyer),
            (GRANTOR, &self.seller),
        ] {
            if let Some(needle) = non_blank(needle) {
                predicate = predicate.contains(field, needle);
            }
        }

        Ok(predicate)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Criteria for a comparable-sales lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct CompsCriteria {
    /// Earliest sale date, `YYYYMMDD` or `YYYY-MM-DD`.
    pub min_date: Option<String>,
    /// Only arm's-length sales.
    pub qualified_only: bool,
    /// Maximum number of comps returned (default: 50).
    pub limit: usize,
    /// Minimum sale amount (default: 10,000).
    pub min_amount: f64,
}

impl Default for CompsCriteria {
    fn default() -> Self {
        let options = ExplorerOptions::default();
        Self {
            min_date: None,
            qualified_only: false,
            limit: options.comps_limit,
            min_amount: options.comps_min_amount,
        }
    }
}

impl CompsCriteria {
    /// Default criteria.
    pub fn new() -> Self {
        Self::default()
    }

    /// Criteria using the comps bounds of `options`.
    pub fn from_options(options: &ExplorerOptions) -> Self {
        Self {
            limit: options.comps_limit,
            min_amount: options.comps_min_amount,
            ..Self::default()
        }
    }

    /// Set the earliest sale date.
    pub fn with_min_date(mut self, date: impl Into<String>) -> Self {
        self.min_date = Some(date.into());
        self
    }

    /// Keep only arm's-length sales.
    pub fn qualified_only(mut self, qualified_only: bool) -> Self {
        self.qualified_only = qualified_only;
        self
    }

    /// Set the maximum number of comps.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Find the most recent comparable sales in a neighborhood.
///
/// Scans backward from the newest record and stops after `criteria.limit`
/// matches, so the result is newest first.
///
/// # Returns
/// Decoded records, or an empty list when the file has no `NBHC` field.
///
/// # Errors
/// `ReaderError::Configuration` if `criteria.min_date` is invalid.
pub fn find_comps(
    file: &DbfFile,
    nbhc: &str,
    criteria: &CompsCriteria,
) -> Result<Vec<Record>, ReaderError> {
    if file.field(NBHC).is_none() {
        debug!("File has no NBHC field; no comps");
        return Ok(Vec::new());
    }

    let filter = SalesFilter {
        nbhc: Some(nbhc.to_string()),
        min_date: criteria.min_date.clone(),
        qualified_only: criteria.qualified_only,
        ..SalesFilter::default()
    };
    let predicate = filter
        .to_predicate()?
        .min_number(S_AMT, criteria.min_amount);

    let result = scan(file, &predicate, &ScanOptions::new().with_limit(criteria.limit));
    Ok(materialize_batch(file, &result.indices, 0, result.len()))
}
