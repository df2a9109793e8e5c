use clap::Parser;
use std::path::PathBuf;

/// Command line flags. Every flag is optional and overrides the matching
/// configuration key.
#[derive(Debug, Parser)]
#[command(name = "pricedb-updater", version)]
#[command(
    about = "Fetch market quotes and append them to a ledger price database",
    long_about = None
)]
pub struct Cli {
    /// Commodities name mapping file
    #[arg(short = 'm', long)]
    pub mapping: Option<PathBuf>,

    /// Price database file
    #[arg(short = 'p', long)]
    pub pricedb: Option<PathBuf>,

    /// Ledger binary used to list commodities
    #[arg(short = 'l', long)]
    pub ledger_bin: Option<PathBuf>,

    /// Ledger journal; when given, commodities are listed by the ledger binary
    #[arg(short = 'f', long)]
    pub ledger_file: Option<PathBuf>,

    /// API token for quote endpoints that require one
    #[arg(short = 't', long)]
    pub token: Option<String>,

    /// Write prices in the currency they were quoted in
    #[arg(long)]
    pub no_convert: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_are_optional() {
        let cli = Cli::parse_from(["pricedb-updater"]);
        assert!(cli.mapping.is_none());
        assert!(cli.ledger_file.is_none());
        assert!(!cli.no_convert);
    }
}
