mod clock;

pub use clock::{ClockState, SessionClock, DEFAULT_SESSION_LENGTH_SECS};
