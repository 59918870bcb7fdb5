// beatsync-core/src/types/mod.rs

pub mod beat_type;
pub mod note_value;
pub mod sync_config;

pub use beat_type::BeatType;
pub use note_value::NoteValue;
pub use sync_config::{BoundarySpec, SyncConfig, DEFAULT_LOOP_TIME_MS};
