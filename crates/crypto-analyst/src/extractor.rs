//! Token Extraction
//!
//! Recognizes which asset a free-form message is about. Pure and
//! case-insensitive; never touches the network.

/// Known assets: canonical ticker followed by every alias that maps to it.
///
/// Scanned in order, the first entry with a whole-word match wins.
pub const TOKEN_TABLE: &[(&str, &[&str])] = &[
    ("btc", &["bitcoin", "btc"]),
    ("eth", &["ethereum", "eth"]),
    ("sol", &["solana", "sol"]),
    ("ada", &["cardano", "ada"]),
    ("xrp", &["ripple", "xrp"]),
    ("dot", &["polkadot", "dot"]),
    ("doge", &["doge", "dogecoin"]),
    ("shib", &["shib", "shiba"]),
    ("bnb", &["bnb", "binance"]),
    ("usdt", &["usdt", "tether"]),
    ("usdc", &["usdc", "usd coin"]),
    ("matic", &["matic", "polygon"]),
    ("avax", &["avax", "avalanche"]),
    ("link", &["link", "chainlink"]),
    ("uni", &["uni", "uniswap"]),
    ("cake", &["cake", "pancakeswap"]),
];

/// Words after "analyze" that never name an asset
const FILLER_WORDS: &[&str] = &["the", "a", "an", "my", "this", "it", "market"];

/// Extract the asset symbol a message refers to.
///
/// An explicit `analyze <word>` takes priority and accepts symbols outside
/// the table; otherwise the table is scanned. Returns a lowercase ticker.
pub fn extract_token(text: &str) -> Option<String> {
    let words = tokenize(text);
    analyze_target(&words).or_else(|| table_lookup(&words).map(str::to_string))
}

/// Canonical ticker for a known name or ticker
pub fn canonical_ticker(word: &str) -> Option<&'static str> {
    let word = word.to_lowercase();
    TOKEN_TABLE
        .iter()
        .find(|(_, aliases)| aliases.contains(&word.as_str()))
        .map(|(ticker, _)| *ticker)
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn analyze_target(words: &[String]) -> Option<String> {
    let position = words
        .iter()
        .position(|w| w == "analyze" || w == "analyse")?;
    let target = words.get(position + 1)?;

    if FILLER_WORDS.contains(&target.as_str()) {
        return None;
    }

    Some(
        canonical_ticker(target)
            .map_or_else(|| target.clone(), str::to_string),
    )
}

fn table_lookup(words: &[String]) -> Option<&'static str> {
    TOKEN_TABLE
        .iter()
        .find(|(_, aliases)| aliases.iter().any(|alias| contains_phrase(words, alias)))
        .map(|(ticker, _)| *ticker)
}

fn contains_phrase(words: &[String], phrase: &str) -> bool {
    let parts: Vec<&str> = phrase.split(' ').collect();
    words
        .windows(parts.len())
        .any(|window| window.iter().zip(&parts).all(|(w, p)| w == p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lookup_by_name_and_ticker() {
        assert_eq!(extract_token("What do you think about Bitcoin?").as_deref(), Some("btc"));
        assert_eq!(extract_token("ETH price please").as_deref(), Some("eth"));
        assert_eq!(extract_token("is polygon still alive").as_deref(), Some("matic"));
        assert_eq!(extract_token("thoughts on USD Coin").as_deref(), Some("usdc"));
    }

    #[test]
    fn test_whole_word_only() {
        // "solution" contains "sol", "linked" contains "link"
        assert_eq!(extract_token("I need a solution"), None);
        assert_eq!(extract_token("we linked the docs"), None);
        assert_eq!(extract_token("the universe is big"), None);
    }

    #[test]
    fn test_table_order_wins() {
        // eth precedes sol in the table regardless of text order
        assert_eq!(extract_token("compare sol with eth").as_deref(), Some("eth"));
    }

    #[test]
    fn test_analyze_pattern_accepts_unknown_symbols() {
        assert_eq!(extract_token("I want to analyze Pepe").as_deref(), Some("pepe"));
        assert_eq!(extract_token("Analyse WIF now").as_deref(), Some("wif"));
    }

    #[test]
    fn test_analyze_pattern_normalizes_known_names() {
        assert_eq!(extract_token("analyze bitcoin").as_deref(), Some("btc"));
        assert_eq!(extract_token("Analyze Avalanche please").as_deref(), Some("avax"));
    }

    #[test]
    fn test_analyze_pattern_has_priority_over_table() {
        assert_eq!(extract_token("forget bitcoin, analyze pepe").as_deref(), Some("pepe"));
    }

    #[test]
    fn test_filler_words_fall_through() {
        assert_eq!(extract_token("analyze the solana chart").as_deref(), Some("sol"));
        assert_eq!(extract_token("analyze the market"), None);
        assert_eq!(extract_token("analyze"), None);
    }

    #[test]
    fn test_no_match() {
        assert_eq!(extract_token("hello there"), None);
        assert_eq!(extract_token(""), None);
    }
}
