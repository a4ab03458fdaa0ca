// Domain value objects
pub mod event_kind;
pub mod identifiers;
pub mod seat_coordinate;
pub mod status;

pub use event_kind::*;
pub use identifiers::*;
pub use seat_coordinate::*;
pub use status::*;
