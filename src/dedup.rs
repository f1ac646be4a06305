//! Cross-source deduplication.
//!
//! Candidates are grouped first by an exact identity key and then by the fuzzy
//! [`similarity::are_duplicates`] predicate against every group formed so far. The fuzzy
//! pass is O(candidates × groups), quadratic when nothing shares a key. That is fine for
//! the low thousands of candidates a run produces, and is the first thing to revisit if
//! the source count grows by an order of magnitude.
//!
//! Candidates are visited in a total order (quality, then content), and a final regrouping
//! pass folds together groups whose grown anchors have become duplicates. The outcome does
//! not depend on input order, and merging an already merged list changes nothing.

pub mod merge;
pub mod similarity;
