//! Fuzzy team-code resolution, and the away/home split it makes possible.
//!
//! The exchange's team codes and the score provider's team abbreviations
//! are not identical (spec §4.4, scenario 6: exchange `RAD`/`WEBB` vs.
//! provider `RADF`/`WEBB`). Matching tries, in order: exact, prefix
//! (length ≥ 3), consonant-skeleton, compound-name, and leading-`U`-prefix
//! stripping. First match wins; resolution is memoized per (series,
//! game_id) by the caller ([`super::threshold_map`]).

use std::collections::HashMap;
use std::sync::Mutex;

const VOWELS: &[char] = &['A', 'E', 'I', 'O', 'U'];

fn normalize(code: &str) -> String {
    code.chars().filter(|c| c.is_ascii_alphabetic()).map(|c| c.to_ascii_uppercase()).collect()
}

fn consonant_skeleton(code: &str) -> String {
    let mut chars = code.chars();
    let mut skeleton = String::new();
    if let Some(first) = chars.next() {
        skeleton.push(first);
    }
    for c in chars {
        if !VOWELS.contains(&c) {
            skeleton.push(c);
        }
    }
    skeleton
}

fn words(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == '_' || c == ' ' || c == '-')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_ascii_uppercase())
        .collect()
}

fn strip_leading_u(code: &str) -> &str {
    code.strip_prefix('U').unwrap_or(code)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Prefix,
    ConsonantSkeleton,
    CompoundName,
    UPrefixStripped,
}

/// Try to resolve `exchange_code` against `provider_code`. `raw_a`/`raw_b`
/// (the pre-normalization originals) are used only for the compound-name
/// check, which looks at word boundaries normalization would erase.
pub fn resolve(exchange_code: &str, provider_code: &str) -> Option<MatchKind> {
    let a = normalize(exchange_code);
    let b = normalize(provider_code);
    if a.is_empty() || b.is_empty() {
        return None;
    }

    if a == b {
        return Some(MatchKind::Exact);
    }

    let (shorter, longer) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    if shorter.len() >= 3 && longer.starts_with(shorter.as_str()) {
        return Some(MatchKind::Prefix);
    }

    if consonant_skeleton(&a) == consonant_skeleton(&b) {
        return Some(MatchKind::ConsonantSkeleton);
    }

    let wa = words(exchange_code);
    let wb = words(provider_code);
    if !wa.is_empty() && !wb.is_empty() {
        let (small, big) = if wa.len() <= wb.len() { (&wa, &wb) } else { (&wb, &wa) };
        if small.iter().all(|w| big.contains(w)) {
            return Some(MatchKind::CompoundName);
        }
    }

    let stripped_a = strip_leading_u(&a);
    let stripped_b = strip_leading_u(&b);
    if stripped_a == stripped_b && (a != stripped_a || b != stripped_b) {
        return Some(MatchKind::UPrefixStripped);
    }

    None
}

/// Longest common prefix length, used to break ties between candidate
/// splits that both produce a resolver match.
fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

/// Given a concatenated away+home team-code run and the game's known away
/// and home codes (from the score provider), find the split point that
/// makes both halves resolve. Ties (multiple valid splits) are broken by
/// longest common prefix against the known codes.
pub fn split_team_blob(blob: &str, away_code: &str, home_code: &str) -> Option<(String, String)> {
    let chars: Vec<char> = blob.chars().collect();
    let mut best: Option<(usize, String, String)> = None;

    for split in 1..chars.len() {
        let away_part: String = chars[..split].iter().collect();
        let home_part: String = chars[split..].iter().collect();

        if resolve(&away_part, away_code).is_some() && resolve(&home_part, home_code).is_some() {
            let score = common_prefix_len(&away_part, away_code) + common_prefix_len(&home_part, home_code);
            if best.as_ref().map(|(best_score, ..)| score > *best_score).unwrap_or(true) {
                best = Some((score, away_part, home_part));
            }
        }
    }

    best.map(|(_, a, h)| (a, h))
}

/// Per-(series, game_id) memoization of resolver calls, per spec §4.4.
pub struct ResolverMemo {
    memo: Mutex<HashMap<(String, String), Option<(String, String)>>>,
}

impl ResolverMemo {
    pub fn new() -> Self {
        Self { memo: Mutex::new(HashMap::new()) }
    }

    pub fn split(&self, series: &str, game_id: &str, blob: &str, away_code: &str, home_code: &str) -> Option<(String, String)> {
        let key = (series.to_string(), game_id.to_string());
        if let Some(cached) = self.memo.lock().unwrap().get(&key) {
            return cached.clone();
        }
        let result = split_team_blob(blob, away_code, home_code);
        self.memo.lock().unwrap().insert(key, result.clone());
        result
    }
}

impl Default for ResolverMemo {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match() {
        assert_eq!(resolve("WEBB", "WEBB"), Some(MatchKind::Exact));
    }

    #[test]
    fn prefix_match() {
        assert_eq!(resolve("RAD", "RADF"), Some(MatchKind::Prefix));
    }

    #[test]
    fn no_match_for_unrelated_codes() {
        assert_eq!(resolve("XYZ", "ABC"), None);
    }

    #[test]
    fn u_prefix_stripping_matches() {
        assert_eq!(resolve("UCLA", "CLA"), Some(MatchKind::UPrefixStripped));
    }

    #[test]
    fn scenario_six_resolves_both_teams() {
        // exchange team codes {RAD, WEBB}; provider abbreviations {RADF, WEBB}
        assert_eq!(resolve("RAD", "RADF"), Some(MatchKind::Prefix));
        assert_eq!(resolve("WEBB", "WEBB"), Some(MatchKind::Exact));
    }

    #[test]
    fn split_team_blob_finds_the_boundary() {
        let (away, home) = split_team_blob("RADWEBB", "RADF", "WEBB").unwrap();
        assert_eq!(away, "RAD");
        assert_eq!(home, "WEBB");
    }

    #[test]
    fn split_team_blob_returns_none_when_no_boundary_resolves() {
        assert!(split_team_blob("ZZZZZZ", "RADF", "WEBB").is_none());
    }
}
