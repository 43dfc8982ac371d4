// Room module: per-room state machine, snapshots, and the connection set

pub mod connections;
pub mod snapshot;
pub mod state;

pub use connections::{ConnectionId, ConnectionSet, RoomConnection, StateSink};

pub use snapshot::{
    ActiveQuestionSnapshot, PlayerRef, PlayerSnapshot, QuestionResultSnapshot, RoomSnapshot,
    SnapshotOptions,
};

pub use state::{ActivationPlan, ActiveQuestion, Player, QuestionResult, RoomState, SHARE_CODE_TTL_MS};
