//! Classification of inbound text into a typed intent.

use std::sync::OnceLock;

use regex::Regex;

use crate::messaging::types::ChatKind;

const DOWNLOAD_PREFIX: &str = "/download";
const BARE_LINK_PREFIX: &str = "https://";

/// What an inbound message asks the bot to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    Start,
    Help,
    /// Candidate URL; not validated yet (see [`is_link`]).
    Download(String),
}

/// Classify `text`. Returns `None` for messages the bot ignores.
///
/// Commands are matched before the download triggers, so a message maps to at
/// most one intent.
pub fn parse_intent(text: &str, chat_kind: ChatKind) -> Option<Intent> {
    if text.starts_with('/') {
        let (cmd, _) = parse_command(text);
        match cmd.as_str() {
            "start" => return Some(Intent::Start),
            "help" | "about" => return Some(Intent::Help),
            _ => {}
        }
    }

    // Both triggers are case-sensitive prefixes, while `is_link` is not.
    if let Some(rest) = text.strip_prefix(DOWNLOAD_PREFIX) {
        return Some(Intent::Download(strip_bot_mention(rest).trim().to_string()));
    }
    if chat_kind == ChatKind::Private && text.starts_with(BARE_LINK_PREFIX) {
        return Some(Intent::Download(text.trim().to_string()));
    }

    None
}

/// `true` when `candidate` starts with `http://` or `https://`, ignoring case.
pub fn is_link(candidate: &str) -> bool {
    static LINK_RE: OnceLock<Regex> = OnceLock::new();
    LINK_RE
        .get_or_init(|| Regex::new(r"(?i)^https?://").expect("valid regex"))
        .is_match(candidate)
}

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

/// Drop a `@botname` suffix glued to the command (`/download@my_bot <url>`).
fn strip_bot_mention(rest: &str) -> &str {
    match rest.strip_prefix('@') {
        Some(mention) => mention
            .split_once(char::is_whitespace)
            .map(|(_, tail)| tail)
            .unwrap_or(""),
        None => rest,
    }
}
