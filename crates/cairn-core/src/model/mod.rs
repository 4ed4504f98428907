//! Plain data carried between the listing source and the entity tree.

pub mod key;
pub mod listing;
