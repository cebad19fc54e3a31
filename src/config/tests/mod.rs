//! Configuration tests, split by concern: layer merging, mode selection,
//! derived values, and cross-field validation.

mod helpers;
