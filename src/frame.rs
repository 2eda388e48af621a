//! Line normalization and wire framing.
//!
//! One queued entry always yields exactly one terminated frame: embedded
//! line breaks are folded into U+2028 LINE SEPARATOR before the frame is
//! assembled, so multi-line messages survive transports that treat `\n` as
//! a frame delimiter.

/// Separator substituted for embedded line breaks inside a single entry.
pub const LINE_SEPARATOR: char = '\u{2028}';

/// Strip the trailing line ending from a line handed to the queue.
pub(crate) fn trim_line_ending(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}

/// Fold every embedded CRLF, then every remaining LF, into [`LINE_SEPARATOR`].
pub(crate) fn normalize(line: &str) -> String {
    line.replace("\r\n", "\u{2028}").replace('\n', "\u{2028}")
}

/// Assemble one terminated wire frame for a queued entry.
///
/// Layout is `<prefix><token?><normalized-line>\n`; the token is present in
/// token mode only, the prefix only when the run resolved a non-empty one.
pub(crate) fn build_frame(prefix: &str, token: Option<&str>, line: &str) -> String {
    let normalized = normalize(line);
    let token = token.unwrap_or_default();
    let mut frame = String::with_capacity(prefix.len() + token.len() + normalized.len() + 1);
    frame.push_str(prefix);
    frame.push_str(token);
    frame.push_str(&normalized);
    frame.push('\n');
    frame
}

/// One-time request line written after connecting in HTTP-PUT mode.
pub(crate) fn handshake_line(account_key: &str, location: &str) -> String {
    format!("PUT /{account_key}/hosts/{location}/?realtime=1 HTTP/1.1\r\n\r\n")
}
