//! Algorithms for building study datasets

pub mod matching;
