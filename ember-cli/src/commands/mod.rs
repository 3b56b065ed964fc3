//! CLI command implementations.

pub mod browse;
pub mod init;
pub mod message;
pub mod status;
pub mod swipe;
pub mod sync;

use anyhow::{Context, Result};
use ember_types::MatchId;

/// Parse a match id argument.
pub fn parse_match_id(raw: &str) -> Result<MatchId> {
    MatchId::parse(raw).with_context(|| format!("Invalid match id: {raw}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_types::UserId;

    #[test]
    fn parse_match_id_accepts_uuid_form() {
        let id = MatchId::from_pair(&UserId::new("a"), &UserId::new("b"));
        assert_eq!(parse_match_id(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn parse_match_id_rejects_garbage() {
        assert!(parse_match_id("nope").is_err());
    }
}
