pub mod kind;
pub mod metadata;
pub mod record;

// re-export for cleaner imports
pub use self::kind::{Group, Kind};
pub use self::metadata::Metadata;
pub use self::record::Record;
