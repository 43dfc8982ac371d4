use rand::RngExt;

/// Room code alphabet: uppercase letters and digits minus the confusable
/// characters 0, O, I and 1, so codes survive being read out loud.
const ROOM_CODE_CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// URL-safe alphabet for host secrets and player ids.
const TOKEN_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

pub const ROOM_CODE_LENGTH: usize = 4;
pub const SHARE_CODE_LENGTH: usize = 4;
pub const HOST_SECRET_LENGTH: usize = 24;
pub const PLAYER_ID_LENGTH: usize = 16;

/// Generate a 4-character room code from the clean alphabet.
pub fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..ROOM_CODE_CHARS.len());
            // SAFETY: `idx` is produced by `random_range(0..len)`, so it is
            // always within [0, len).
            #[allow(clippy::indexing_slicing)]
            let ch = ROOM_CODE_CHARS[idx] as char;
            ch
        })
        .collect()
}

/// Generate an opaque URL-safe token of the requested length.
fn generate_token(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..TOKEN_CHARS.len());
            // SAFETY: `idx` is produced by `random_range(0..len)`, so it is
            // always within [0, len).
            #[allow(clippy::indexing_slicing)]
            let ch = TOKEN_CHARS[idx] as char;
            ch
        })
        .collect()
}

/// Generate a per-room host secret.
pub fn generate_host_secret() -> String {
    generate_token(HOST_SECRET_LENGTH)
}

/// Generate a server-issued player id.
pub fn generate_player_id() -> String {
    generate_token(PLAYER_ID_LENGTH)
}

/// Generate a 4-decimal-digit share code.
pub fn generate_share_code() -> String {
    let mut rng = rand::rng();
    (0..SHARE_CODE_LENGTH)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

/// Whether `code` is syntactically a share code (exactly 4 ASCII digits).
pub fn is_share_code(code: &str) -> bool {
    code.len() == SHARE_CODE_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}

/// Canonical room-code form: codes are stored and compared uppercase.
pub fn normalize_room_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
