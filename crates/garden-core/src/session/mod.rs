mod identity;
mod record;
mod recorder;

pub use identity::{
    link_with_nickname, nickname_from_query, normalize_user_name, ANONYMOUS, NICKNAME_PARAM,
};
pub use record::{SessionRecord, SessionTally};
pub use recorder::{
    PersistStatus, SessionOutcome, SessionRecorder, SessionView, DEFAULT_TOLERANCE_SECS,
};
