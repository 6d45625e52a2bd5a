pub mod court;
pub mod entry;
pub mod interval;
pub mod macros;
pub mod time;

pub use court::*;
pub use entry::*;
pub use interval::*;
pub use time::*;
