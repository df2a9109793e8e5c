//! Commodity name mapping
//!
//! One `name:ticker` pair per line. The reserved `$` key names the base
//! currency. Lines without exactly one colon are ignored.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::MappingError;
use crate::types::{PricingTarget, BASE_MARKER};

/// Commodity display name → ticker pairs, plus the `$` base currency entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    entries: HashMap<String, String>,
}

impl Mapping {
    /// Read and parse a mapping file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MappingError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| MappingError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        let entries = content
            .lines()
            .filter_map(|line| {
                let mut parts = line.split(':');
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(name), Some(ticker), None) => Some((
                        name.to_string(),
                        ticker.trim_end_matches(&['\r', '\n'][..]).to_string(),
                    )),
                    _ => None,
                }
            })
            .collect();

        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Code of the currency every price is converted into
    pub fn base_currency(&self) -> Option<&str> {
        self.get(BASE_MARKER)
    }

    pub fn require_base_currency(&self) -> Result<&str, MappingError> {
        self.base_currency()
            .filter(|code| !code.is_empty())
            .ok_or(MappingError::MissingBaseCurrency)
    }

    /// Number of entries, `$` included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Commodity names in sorted order, without the `$` entry
    pub fn commodities(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .entries
            .keys()
            .map(String::as_str)
            .filter(|name| *name != BASE_MARKER)
            .collect();
        names.sort_unstable();
        names
    }

    /// Every mapped commodity with its ticker, sorted by commodity
    pub fn targets(&self) -> Vec<PricingTarget> {
        self.commodities()
            .into_iter()
            .filter_map(|name| self.get(name).map(|ticker| PricingTarget::new(name, ticker)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ignores_lines_without_exactly_one_colon() {
        let mapping = Mapping::parse("Gold:GC=F\nbad-line-no-colon\n$:USD\n");

        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.get("Gold"), Some("GC=F"));
        assert_eq!(mapping.get("$"), Some("USD"));
        assert_eq!(mapping.base_currency(), Some("USD"));
    }

    #[test]
    fn test_parse_rejects_extra_colons_and_handles_crlf() {
        let mapping = Mapping::parse("a:b:c\r\nVTI:VTI\r\n$:EUR\r\n");

        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.get("a"), None);
        assert_eq!(mapping.get("VTI"), Some("VTI"));
        assert_eq!(mapping.base_currency(), Some("EUR"));
    }

    #[test]
    fn test_later_line_wins_for_duplicate_names() {
        let mapping = Mapping::parse("Gold:GC=F\nGold:XAUUSD=X\n");
        assert_eq!(mapping.get("Gold"), Some("XAUUSD=X"));
    }

    #[test]
    fn test_targets_exclude_base_entry() {
        let mapping = Mapping::parse("Silver:SI=F\n$:USD\nGold:GC=F\n");
        let targets = mapping.targets();

        assert_eq!(
            targets,
            vec![
                PricingTarget::new("Gold", "GC=F"),
                PricingTarget::new("Silver", "SI=F"),
            ]
        );
    }

    #[test]
    fn test_missing_base_currency_is_an_error() {
        let mapping = Mapping::parse("Gold:GC=F\n");
        assert!(matches!(
            mapping.require_base_currency(),
            Err(MappingError::MissingBaseCurrency)
        ));

        let empty_base = Mapping::parse("$:\n");
        assert!(empty_base.require_base_currency().is_err());
    }

    #[test]
    fn test_load_reports_missing_file() {
        let path = std::env::temp_dir().join(format!("mapping_{}", uuid::Uuid::new_v4()));
        let err = Mapping::load(&path).unwrap_err();
        assert!(matches!(err, MappingError::Io { .. }));
    }
}
