pub mod feature;
pub mod sequence;

// re-export for cleaner imports
pub use self::feature::Feature;
pub use self::sequence::Sequence;
