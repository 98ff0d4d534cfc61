//! Control channel messages

/// Token a page posts to make a waiting worker take over immediately
pub const SKIP_WAITING: &str = "skipWaiting";

/// Recognized control messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    /// Stop waiting and activate now
    SkipWaiting,
}

impl ControlMessage {
    /// Parse a raw message; anything unrecognized is ignored (None)
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            SKIP_WAITING => Some(Self::SkipWaiting),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_skip_waiting() {
        assert_eq!(ControlMessage::parse("skipWaiting"), Some(ControlMessage::SkipWaiting));
    }

    #[test]
    fn ignores_everything_else() {
        assert!(ControlMessage::parse("skipwaiting").is_none());
        assert!(ControlMessage::parse(" skipWaiting").is_none());
        assert!(ControlMessage::parse("reload").is_none());
        assert!(ControlMessage::parse("").is_none());
    }
}
