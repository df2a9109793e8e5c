//! Commodity sources
//!
//! Lists the commodities to price, either straight from the mapping file or
//! from an external ledger binary, and reconciles them against the mapping.

use std::collections::HashSet;
use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, info};

use crate::error::ExternalToolError;
use crate::mapping::Mapping;
use crate::types::{PricingTarget, BASE_MARKER};

/// Anything that can list the commodity names to price
pub trait CommoditySource {
    fn list_commodities(&self) -> Result<Vec<String>, ExternalToolError>;
}

/// Uses every commodity named in the mapping file
pub struct MappingCommodities<'a> {
    mapping: &'a Mapping,
}

impl<'a> MappingCommodities<'a> {
    pub fn new(mapping: &'a Mapping) -> Self {
        Self { mapping }
    }
}

impl CommoditySource for MappingCommodities<'_> {
    fn list_commodities(&self) -> Result<Vec<String>, ExternalToolError> {
        Ok(self
            .mapping
            .commodities()
            .into_iter()
            .map(str::to_string)
            .collect())
    }
}

/// Asks a ledger binary for the commodities used in a journal file
#[derive(Debug, Clone)]
pub struct LedgerCommodities {
    binary: PathBuf,
    ledger_file: PathBuf,
}

impl LedgerCommodities {
    pub fn new(binary: impl Into<PathBuf>, ledger_file: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            ledger_file: ledger_file.into(),
        }
    }

    fn args(&self) -> Vec<String> {
        vec![
            "-f".to_string(),
            self.ledger_file.display().to_string(),
            "commodities".to_string(),
        ]
    }
}

impl CommoditySource for LedgerCommodities {
    fn list_commodities(&self) -> Result<Vec<String>, ExternalToolError> {
        let binary = self.binary.display().to_string();
        let args = self.args();
        debug!(binary = %binary, args = ?args, "Listing ledger commodities");

        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .map_err(|source| ExternalToolError::Spawn {
                binary: binary.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ExternalToolError::Failed {
                binary,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|_| ExternalToolError::InvalidOutput { binary })?;

        Ok(parse_ledger_output(&stdout))
    }
}

/// Split ledger output into commodity names, dropping wrapping quotes and empty lines
pub fn parse_ledger_output(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .map(|line| {
            line.strip_prefix('"')
                .and_then(|l| l.strip_suffix('"'))
                .unwrap_or(line)
        })
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// True if the name can be sent to the quote endpoint as-is (`A-Z`, `0-9`, `.`)
pub fn is_ticker(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '.')
}

/// Pair each listed commodity with a ticker.
///
/// Mapped names use their mapped ticker; unmapped names that already look like
/// a ticker are fetched under their own name. The base currency and the `$`
/// marker are never fetched.
pub fn reconcile(commodities: &[String], mapping: &Mapping, base: &str) -> Vec<PricingTarget> {
    let mut seen = HashSet::new();
    let mut targets = Vec::with_capacity(commodities.len());

    for commodity in commodities {
        if commodity == BASE_MARKER || commodity == base {
            continue;
        }
        if !seen.insert(commodity.as_str()) {
            continue;
        }

        match mapping.get(commodity) {
            Some(ticker) if !ticker.is_empty() => {
                targets.push(PricingTarget::new(commodity.as_str(), ticker));
            }
            _ if is_ticker(commodity) => {
                targets.push(PricingTarget::new(commodity.as_str(), commodity.as_str()));
            }
            _ => {
                info!(commodity = %commodity, "No ticker mapping, skipped");
            }
        }
    }

    targets
}
