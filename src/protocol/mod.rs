// Protocol module: message types, code/token generation, validation

pub mod codes;
pub mod messages;
pub mod types;
pub mod validation;

pub use codes::{
    generate_host_secret, generate_player_id, generate_room_code, generate_share_code,
    is_share_code, normalize_room_code,
};

pub use messages::{ClientEvent, ServerEvent};

pub use types::{
    now_ms, points_for_difficulty, ConnectionRole, Difficulty, PlayerId, QuestionId, QuestionStage,
};

pub use validation::validate_player_name;
