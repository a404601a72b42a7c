pub mod frequency;
pub mod scroll;
pub mod width;

pub use frequency::FrequencyModel;
pub use scroll::{ScrollActivityMonitor, ScrollEvent, ScrollListener, ScrollState};
