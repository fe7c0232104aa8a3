pub mod segment;
pub mod session;

pub use segment::Segment;
pub use session::Session;
