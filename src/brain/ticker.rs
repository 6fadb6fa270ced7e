//! Ticker grammar: `SERIES-DATECODE+AWAY+HOME-THRESHOLD`.
//!
//! The away/home boundary inside the concatenated team-code run is
//! ambiguous from the grammar alone; splitting it is [`super::resolver`]'s
//! job, not this parser's — this module only peels off the series,
//! datecode, team blob, and threshold.

use crate::error::{Error, Result};

const DATECODE_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTicker {
    pub series: String,
    pub datecode: String,
    /// The concatenated, not-yet-split away+home team code run.
    pub team_blob: String,
    pub threshold: u32,
}

/// Parse a raw ticker string against the configured set of valid series
/// prefixes. Does not attempt the away/home split.
pub fn parse(ticker: &str, known_series: &[&str]) -> Result<ParsedTicker> {
    let parts: Vec<&str> = ticker.split('-').collect();
    if parts.len() != 3 {
        return Err(Error::TickerParse(format!(
            "expected exactly two '-' separators, got {}: {ticker}",
            parts.len().saturating_sub(1)
        )));
    }
    let (series, middle, threshold_part) = (parts[0], parts[1], parts[2]);

    if !known_series.contains(&series) {
        return Err(Error::TickerParse(format!("unknown series prefix: {series}")));
    }

    if middle.len() <= DATECODE_LEN {
        return Err(Error::TickerParse(format!(
            "ticker body too short for an {DATECODE_LEN}-char date code plus team codes: {ticker}"
        )));
    }
    let (datecode, team_blob) = middle.split_at(DATECODE_LEN);
    if !datecode.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::TickerParse(format!("malformed date code: {datecode}")));
    }
    if !team_blob.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::TickerParse(format!("malformed team code run: {team_blob}")));
    }

    let digits: String = threshold_part.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(Error::TickerParse(format!(
            "no trailing integer threshold: {threshold_part}"
        )));
    }
    let threshold: u32 = digits
        .parse()
        .map_err(|_| Error::TickerParse(format!("threshold out of range: {threshold_part}")))?;

    Ok(ParsedTicker {
        series: series.to_string(),
        datecode: datecode.to_string(),
        team_blob: team_blob.to_string(),
        threshold,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_ticker() {
        let parsed = parse("NFLTOT-20260103DENKC-T44", &["NFLTOT"]).unwrap();
        assert_eq!(parsed.series, "NFLTOT");
        assert_eq!(parsed.datecode, "20260103");
        assert_eq!(parsed.team_blob, "DENKC");
        assert_eq!(parsed.threshold, 44);
    }

    #[test]
    fn rejects_unknown_series() {
        assert!(parse("NBATOT-20260103DENKC-T44", &["NFLTOT"]).is_err());
    }

    #[test]
    fn rejects_wrong_dash_count() {
        assert!(parse("NFLTOT-20260103DENKC-T44-extra", &["NFLTOT"]).is_err());
        assert!(parse("NFLTOT20260103DENKCT44", &["NFLTOT"]).is_err());
    }

    #[test]
    fn rejects_missing_threshold_digits() {
        assert!(parse("NFLTOT-20260103DENKC-T", &["NFLTOT"]).is_err());
    }
}
