#![no_main]

use cairn_core::filter::{Query, matches};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let (query, haystack) = text.split_once('\n').unwrap_or((text, ""));
    let query = Query::parse(query);
    let haystack = haystack.to_lowercase();
    let exact = matches(&haystack, &query, false);
    // Fuzzy matching only widens the result.
    if exact {
        assert!(matches(&haystack, &query, true));
    }
    assert!(query.tokens().iter().all(|t| !t.is_empty()));
});
