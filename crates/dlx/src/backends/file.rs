// ai
//! 📂 Previously, on "Things That Could Go Wrong With A File"...
//!
//! The disk was quiet. Too quiet. A lone process had been tasked with reading
//! a screenplay. Just a text file, they said. Simple, they said.
//!
//! The file didn't exist. The file was gzipped. The file had Windows line endings.
//! And somewhere in the middle, someone had pasted an entire novel into one line
//! of dialogue because "the character has a lot to say".
//!
//! 🚰 Source → BufReader → PageBuilder → page → partitioner → shards
//! 🕳️ report → FileSink → `<name>.partial` → rename on close → `<name>`
//! 🦆 (mandatory, no notes)

mod file_sink;
mod file_source;
mod gzip_source;

pub(crate) use file_sink::FileSink;
pub use file_sink::FileSinkConfig;
pub(crate) use file_source::FileSource;
pub use file_source::FileSourceConfig;
pub(crate) use gzip_source::GzipFileSource;

use crate::backends::CommonSourceConfig;
use crate::common::Page;

/// 🗜️ `.gz` on the end means we decompress. Case-insensitive, because people.
pub(crate) fn is_gzip_path(file_name: &str) -> bool {
    file_name.to_ascii_lowercase().ends_with(".gz")
}

/// 📄 Accumulates raw lines into a page until either size cap fires.
///
/// Shared by the plain and gzip sources so both cut pages exactly the same way.
/// Blank lines are dropped here: they would be skipped by the parser anyway.
#[derive(Debug)]
pub(crate) struct PageBuilder {
    page: String,
    bytes_read: usize,
    lines: usize,
    max_lines: usize,
    max_bytes: usize,
}

impl PageBuilder {
    pub(crate) fn new(common_config: &CommonSourceConfig) -> Self {
        Self {
            page: String::new(),
            bytes_read: 0,
            lines: 0,
            // -- a limit of 0 would mean pages that never fill. one line minimum.
            max_lines: common_config.max_batch_size_lines.max(1),
            max_bytes: common_config.max_batch_size_bytes.max(1),
        }
    }

    /// 📥 Add one line as returned by `read_until(b'\n')` (terminator included).
    /// Returns `true` once the page is full.
    ///
    /// Bytes that aren't UTF-8 become U+FFFD. A stray Latin-1 byte costs one word its
    /// spelling, not the whole run its report.
    pub(crate) fn push_line(&mut self, raw_line: &[u8]) -> bool {
        self.bytes_read += raw_line.len();
        let line = String::from_utf8_lossy(raw_line);
        let trimmed = line.trim_end_matches('\n').trim_end_matches('\r');
        // -- same notion of blank as the parser: nothing above ' '
        if !trimmed.bytes().all(|b| b <= b' ') {
            if !self.page.is_empty() {
                self.page.push('\n');
            }
            self.page.push_str(trimmed);
            self.lines += 1;
        }
        self.lines >= self.max_lines || self.bytes_read >= self.max_bytes
    }

    pub(crate) fn bytes_read(&self) -> u64 {
        self.bytes_read as u64
    }

    pub(crate) fn lines(&self) -> u64 {
        self.lines as u64
    }

    /// 🏁 Hand over the page. `None` if every line we saw was blank.
    pub(crate) fn finish(self) -> Option<Page> {
        (!self.page.is_empty()).then_some(self.page)
    }
}
