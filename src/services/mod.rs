pub mod normalizer;
pub mod providers;
pub mod verdict;
