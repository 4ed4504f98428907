#![no_main]

use cairn_core::model::listing::Listing;
use cairn_core::tree::EntityTree;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(listing) = Listing::from_json(text) else {
        return;
    };
    if let Ok(tree) = EntityTree::from_listing(&listing) {
        assert_eq!(tree.item_count(), listing.item_count());
    }
});
