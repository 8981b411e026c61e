// ai
//! 📦 Common plumbing: pages and the lines inside them.
//!
//! A "page" is what travels through the pipeline channels: a run of raw lines joined by
//! `\n`, produced by a `Source` and consumed by a shard. Sources never look inside.
//! Shards and the hash partitioner split it back up with [`page_lines`].
//!
//! 🦆 the duck reads one line at a time, as all ducks should

use memchr::memchr;

/// 📄 A newline-delimited run of raw input lines.
pub type Page = String;

/// ✂️ Iterate the lines of a page without allocating. `\r` is left for the parser's trim.
pub fn page_lines(page: &str) -> PageLines<'_> {
    PageLines {
        page,
        position: 0,
        finished: page.is_empty(),
    }
}

/// Iterator returned by [`page_lines`].
#[derive(Debug, Clone)]
pub struct PageLines<'a> {
    page: &'a str,
    position: usize,
    finished: bool,
}

impl<'a> Iterator for PageLines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.finished {
            return None;
        }

        let rest = &self.page[self.position..];
        match memchr(b'\n', rest.as_bytes()) {
            Some(offset) => {
                self.position += offset + 1;
                Some(&rest[..offset])
            }
            None => {
                self.finished = true;
                Some(rest)
            }
        }
    }
}
