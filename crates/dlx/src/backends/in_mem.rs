//! # Previously, on dlx...
//!
//! 🎬 The screenplay never touched a disk. It was born in a `Vec<String>`, it lived in a
//! `Vec<String>`, and when the test was over it was gone like a deleted scene.
//!
//! `in_mem` provides an in-memory [`Source`](crate::backends::Source) and
//! [`Sink`](crate::backends::Sink). The source pages through a list of lines exactly like
//! the file source pages through a file. The sink keeps every rendered payload behind an
//! `Arc<Mutex<...>>` so callers can read the report back. Great for assertions, great for
//! embedding, great for trust issues.
//!
//! ✅ No network calls. No disk I/O. Just vibes and heap memory. 🦆

mod in_mem_sink;
mod in_mem_source;

pub(crate) use in_mem_sink::InMemorySink;
pub(crate) use in_mem_source::InMemorySource;
pub use in_mem_source::InMemorySourceConfig;
