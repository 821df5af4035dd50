use alloy::primitives::Address;
use std::str::FromStr;

use crate::risk::classifier::TrustTier;

/// One spender row from a CSV watchlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchlistEntry {
    pub address: Address,
    pub name: String,
    pub tier: TrustTier,
}

/// Parse a spender watchlist CSV.
/// Expected columns: address, name, tier. Rows with a malformed address or an
/// unknown tier are skipped with a warning.
pub fn parse_watchlist_csv(path: &str) -> eyre::Result<Vec<WatchlistEntry>> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("Failed to open spender watchlist '{}': {}", path, e))?;

    let entries = parse_records(reader)?;
    tracing::info!(entries = entries.len(), path, "Parsed spender watchlist");
    Ok(entries)
}

fn parse_records<R: std::io::Read>(mut reader: csv::Reader<R>) -> eyre::Result<Vec<WatchlistEntry>> {
    let mut entries = Vec::new();

    for (line, result) in reader.records().enumerate() {
        let record = result.map_err(|e| eyre::eyre!("Failed to read watchlist row: {}", e))?;
        let raw_address = record.get(0).unwrap_or("");
        let name = record.get(1).unwrap_or("").to_string();
        let raw_tier = record.get(2).unwrap_or("unknown");

        let address = match Address::from_str(raw_address) {
            Ok(a) if raw_address.starts_with("0x") => a,
            _ => {
                tracing::warn!(row = line + 2, address = raw_address, "Invalid watchlist address, skipping");
                continue;
            }
        };
        let tier = match TrustTier::from_str(raw_tier) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(row = line + 2, error = %e, "Invalid watchlist tier, skipping");
                continue;
            }
        };

        entries.push(WatchlistEntry { address, name, tier });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_watchlist_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "address,name,tier").unwrap();
        writeln!(file, "0x00000000000000000000000000000000deadbeef, Evil Drainer, drainer").unwrap();
        writeln!(file, "0x1111111254eeb25477b68fb85ed929f73a960582,1inch V5,trusted").unwrap();
        writeln!(file, "not-an-address,Broken,trusted").unwrap();
        writeln!(file, "0x2222222222222222222222222222222222222222,Odd,sideways").unwrap();
        file.flush().unwrap();

        let entries = parse_watchlist_csv(file.path().to_str().unwrap()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "Evil Drainer");
        assert_eq!(entries[0].tier, TrustTier::Malicious);
        assert_eq!(entries[1].tier, TrustTier::Trusted);
    }

    #[test]
    fn test_missing_file_errors() {
        assert!(parse_watchlist_csv("/nonexistent/watchlist.csv").is_err());
    }
}
