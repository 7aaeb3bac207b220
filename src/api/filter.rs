//! Record filter predicates.
//!
//! A `FilterPredicate` is a conjunction of field-level clauses. Before a scan
//! it is compiled against the file's schema, resolving each field name to its
//! descriptor once. The compiled form is evaluated directly on the raw bytes
//! of each candidate record and reads only the byte slice of the field a
//! clause names, so a scan never decodes whole records.

use tracing::warn;

use crate::error::ReaderError;
use crate::reader::{field_slice, parse_numeric, trim_field};
use crate::schema::{FieldDescriptor, Schema};

/// One field-level constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Trimmed field text equals `value` exactly.
    Equals { field: String, value: String },
    /// Field is not a number below `min`. Blank or non-numeric values
    /// carry no amount and pass.
    MinNumber { field: String, min: f64 },
    /// Trimmed `YYYYMMDD` field text sorts at or after `date`.
    DateOnOrAfter { field: String, date: String },
    /// Field contains `needle`, ignoring case for Latin-1 letters.
    Contains { field: String, needle: String },
}

impl Clause {
    /// Name of the field this clause tests.
    pub fn field(&self) -> &str {
        match self {
            Clause::Equals { field, .. }
            | Clause::MinNumber { field, .. }
            | Clause::DateOnOrAfter { field, .. }
            | Clause::Contains { field, .. } => field,
        }
    }
}

/// A conjunction of clauses. The empty predicate matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPredicate {
    clauses: Vec<Clause>,
}

impl FilterPredicate {
    /// Create a predicate with no clauses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an exact-match clause on the trimmed field text.
    pub fn equals(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.clauses.push(Clause::Equals {
            field: field.into(),
            value: value.into().trim().to_string(),
        });
        self
    }

    /// Add a numeric lower bound.
    pub fn min_number(mut self, field: impl Into<String>, min: f64) -> Self {
        self.clauses.push(Clause::MinNumber {
            field: field.into(),
            min,
        });
        self
    }

    /// Add a date lower bound.
    ///
    /// # Errors
    /// `ReaderError::Configuration` if `date` is not `YYYYMMDD` or
    /// `YYYY-MM-DD`.
    pub fn date_on_or_after(
        mut self,
        field: impl Into<String>,
        date: &str,
    ) -> Result<Self, ReaderError> {
        let date = normalize_date(date).ok_or_else(|| {
            ReaderError::Configuration(format!(
                "Invalid date {:?}: expected YYYYMMDD or YYYY-MM-DD",
                date
            ))
        })?;
        self.clauses.push(Clause::DateOnOrAfter {
            field: field.into(),
            date,
        });
        Ok(self)
    }

    /// Add a case-insensitive substring clause.
    pub fn contains(mut self, field: impl Into<String>, needle: impl Into<String>) -> Self {
        self.clauses.push(Clause::Contains {
            field: field.into(),
            needle: needle.into(),
        });
        self
    }

    /// Add an already-built clause.
    pub fn push(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }

    /// The clauses in insertion order.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Whether the predicate has no clauses.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Resolve field names against `schema`.
    ///
    /// Clauses naming a field that the schema does not have are dropped with
    /// a warning, so a filter written for one county layout still runs
    /// against a file that lacks some of its columns.
    pub fn compile(&self, schema: &Schema) -> CompiledPredicate {
        let tests = self
            .clauses
            .iter()
            .filter_map(|clause| {
                let Some(field) = schema.field(clause.field()) else {
                    warn!(field = clause.field(), "Ignoring filter on missing field");
                    return None;
                };
                Some((field.clone(), FieldTest::from_clause(clause)))
            })
            .collect();

        CompiledPredicate { tests }
    }
}

/// Normalize a user-entered date to `YYYYMMDD`.
///
/// Accepts `YYYYMMDD` and `YYYY-MM-DD`. Returns `None` for anything else.
pub fn normalize_date(date: &str) -> Option<String> {
    let date = date.trim();
    let digits: String = match date.len() {
        8 => date.to_string(),
        10 if date.as_bytes()[4] == b'-' && date.as_bytes()[7] == b'-' => {
            date.chars().filter(|&c| c != '-').collect()
        }
        _ => return None,
    };
    (digits.len() == 8 && digits.bytes().all(|b| b.is_ascii_digit())).then_some(digits)
}

#[derive(Debug, Clone)]
enum FieldTest {
    Equals(Vec<u8>),
    MinNumber(f64),
    DateOnOrAfter(Vec<u8>),
    Contains(Vec<u8>),
    /// The clause's text cannot appear in a single-byte field.
    Never,
}

impl FieldTest {
    fn from_clause(clause: &Clause) -> Self {
        match clause {
            Clause::Equals { value, .. } => encode_latin1(value).map_or(Self::Never, Self::Equals),
            Clause::MinNumber { min, .. } => Self::MinNumber(*min),
            Clause::DateOnOrAfter { date, .. } => Self::DateOnOrAfter(date.as_bytes().to_vec()),
            Clause::Contains { needle, .. } => {
                encode_latin1(needle).map_or(Self::Never, |needle| {
                    Self::Contains(needle.into_iter().map(fold_latin1).collect())
                })
            }
        }
    }

    #[inline]
    fn matches(&self, slice: &[u8]) -> bool {
        match self {
            Self::Equals(value) => trim_field(slice) == value.as_slice(),
            Self::MinNumber(min) => std::str::from_utf8(trim_field(slice))
                .ok()
                .and_then(parse_numeric)
                .map_or(true, |v| v >= *min),
            Self::DateOnOrAfter(date) => trim_field(slice) >= date.as_slice(),
            Self::Contains(needle) => contains_folded(slice, needle),
            Self::Never => false,
        }
    }
}

fn encode_latin1(text: &str) -> Option<Vec<u8>> {
    text.chars().map(|c| u8::try_from(u32::from(c)).ok()).collect()
}

/// Lowercase a Latin-1 byte. `ß` and `ÿ` have no single-byte uppercase.
#[inline]
fn fold_latin1(byte: u8) -> u8 {
    match byte {
        b'A'..=b'Z' | 0xC0..=0xD6 | 0xD8..=0xDE => byte + 0x20,
        _ => byte,
    }
}

/// `needle` must already be folded.
fn contains_folded(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty()
        || haystack.windows(needle.len()).any(|window| {
            window
                .iter()
                .zip(needle)
                .all(|(&b, &n)| fold_latin1(b) == n)
        })
}

/// A predicate resolved against one schema.
#[derive(Debug, Clone)]
pub struct CompiledPredicate {
    tests: Vec<(FieldDescriptor, FieldTest)>,
}

impl CompiledPredicate {
    /// Number of active clauses after dropping those on missing fields.
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Whether no clause survived compilation.
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Evaluate every clause against the record at `record_offset`.
    ///
    /// A field whose bytes lie outside `bytes` fails its clause.
    #[inline]
    pub fn matches(&self, bytes: &[u8], record_offset: u64) -> bool {
        self.tests.iter().all(|(field, test)| {
            field_slice(bytes, record_offset, field).is_some_and(|slice| test.matches(slice))
        })
    }
}
