//! Output classification for task streams.
//!
//! Raw chunks arrive tagged with the stream they came from; this module
//! decodes them and decides whether they signal an error before they are
//! appended to the task log.

use strip_ansi_escapes::strip;

/// Indicates the source stream of an output chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// Standard Output.
    Stdout,
    /// Standard Error.
    Stderr,
}

/// Marker create-react-app's build pipeline prints on stdout when the
/// compile fails, even though it is an error. Chunks carrying it are
/// reclassified; nothing else on stdout is.
const COMPILE_FAILURE_MARKER: &str = "Failed to compile.";

/// Decodes a raw chunk and tags it as normal or error-signaling output.
///
/// Everything received on stderr is an error. A stdout chunk is an error
/// only when its text, with ANSI escapes stripped, contains the known
/// compile-failure marker. The returned text keeps the original escapes.
pub fn classify(chunk: &[u8], stream: StreamKind) -> (String, bool) {
    let text = String::from_utf8_lossy(chunk).to_string();
    let is_error = match stream {
        StreamKind::Stderr => true,
        StreamKind::Stdout => {
            let stripped = strip(chunk);
            String::from_utf8_lossy(&stripped).contains(COMPILE_FAILURE_MARKER)
        }
    };
    (text, is_error)
}

/// Colors used for synthetic status messages.
#[derive(Debug, Clone, Copy)]
pub enum AnsiColor {
    Red,
    Green,
}

/// Wraps text in a bold ANSI color for terminal display.
pub fn colorize(text: &str, color: AnsiColor) -> String {
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Green => "32",
    };
    format!("\u{1b}[{};1m{}\u{1b}[0m", code, text)
}
