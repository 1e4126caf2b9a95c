//! Demotion victim selection.
//!
//! The coordinator demotes strictly by recency: [`lru::RecencyIndex`] tracks
//! hot keys in use order and hands out the least recently used one when
//! memory runs over the threshold.

pub mod lru;
