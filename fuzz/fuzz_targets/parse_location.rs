#![no_main]

use cairn_core::location::{parse_issue_number, parse_location};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(selection) = parse_location(text) {
        assert!(selection.number > 0);
    }
    if let Ok(number) = parse_issue_number(text) {
        assert!(number > 0);
    }
});
