// AI
//! 📊 progress.rs: "Are we there yet?" Every screenplay, every time, forever.
//!
//! 🚀 The source worker feeds this after every page it reads: bytes pulled off disk and
//! raw lines handed to the partitioner. We turn that into a bar and a small comfy-table.
//!
//! ⚠️ Watching this progress bar will not make the shards go faster. We've tried.
//!
//! 🦆 The duck has nothing to do with this module. It's just vibing.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::NOTHING};
use indicatif::{ProgressBar, ProgressStyle};

// -- 📏 one mebibyte. not a megabyte. I will die on this hill.
const MIB: u64 = 1024 * 1024;

// -- 🔄 rates are averaged over this much recent history
const RATE_WINDOW: Duration = Duration::from_secs(5);

fn format_bytes(bytes: u64, scale_hint: u64) -> String {
    if scale_hint >= 512 * MIB {
        format!("{:.2} MiB", bytes as f64 / MIB as f64)
    } else if scale_hint >= MIB {
        format!("{:.2} KiB", bytes as f64 / 1024.0)
    } else {
        format!("{} bytes", bytes)
    }
}

/// 🔢 "1000000 lines" → "1,000,000 lines". You're welcome, eyes.
pub(crate) fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// ⏱️ MM:SS, or HH:MM:SS for scripts long enough to need an intermission.
fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Rates {
    lines_per_sec: f64,
    mib_per_sec: f64,
}

/// 📊 Tracks bytes and lines read by a source, with a sliding window for rates.
///
/// `total_size == 0` means "no idea", which is what a gzip stream or an in-memory source
/// reports. Percent and ETA quietly disappear in that case.
pub(crate) struct ProgressMetrics {
    source_name: String,
    total_size: u64,
    total_bytes: u64,
    total_lines: u64,
    progress_bar: ProgressBar,
    rate_samples: VecDeque<(Instant, u64, u64)>,
    start_time: Instant,
}

impl std::fmt::Debug for ProgressMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // -- 🎭 ProgressBar is a diva and doesn't derive Debug
        f.debug_struct("ProgressMetrics")
            .field("source_name", &self.source_name)
            .field("total_size", &self.total_size)
            .field("total_bytes", &self.total_bytes)
            .field("total_lines", &self.total_lines)
            .finish()
    }
}

impl ProgressMetrics {
    /// 🚀 A visible progress bar on stderr.
    pub(crate) fn new(source_name: String, total_size: u64) -> Self {
        let progress_bar = ProgressBar::new(total_size);
        // -- the template is a literal. if indicatif ever rejects it, fall back to the stock bar
        let style = ProgressStyle::default_bar()
            .template("{msg}\n| [{bar:40.cyan/blue}]")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        progress_bar.set_style(style);
        Self::with_bar(source_name, total_size, progress_bar)
    }

    /// 🙈 Same bookkeeping, nothing drawn. In-memory sources and tests use this.
    pub(crate) fn hidden(source_name: String) -> Self {
        Self::with_bar(source_name, 0, ProgressBar::hidden())
    }

    fn with_bar(source_name: String, total_size: u64, progress_bar: ProgressBar) -> Self {
        let start_time = Instant::now();
        let mut rate_samples = VecDeque::new();
        // -- 🔄 seed the window with t=0 so we never divide by an empty deque
        rate_samples.push_back((start_time, 0u64, 0u64));

        Self {
            source_name,
            total_size,
            total_bytes: 0,
            total_lines: 0,
            progress_bar,
            rate_samples,
            start_time,
        }
    }

    /// 🔄 Record one page worth of reading.
    pub(crate) fn update(&mut self, bytes_read: u64, lines_read: u64) {
        self.total_bytes += bytes_read;
        self.total_lines += lines_read;

        // -- nobody will ever see a hidden table, so don't build one
        if self.progress_bar.is_hidden() {
            return;
        }
        let rates = self.calculate_rates(Instant::now());
        self.render(rates);
        self.progress_bar.set_position(self.total_bytes);
    }

    /// ✅ EOF. Ring the bell.
    pub(crate) fn finish(&self) {
        self.progress_bar.finish();
    }

    pub(crate) fn total_lines(&self) -> u64 {
        self.total_lines
    }

    pub(crate) fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    fn calculate_rates(&mut self, now: Instant) -> Rates {
        while let Some(&(timestamp, _, _)) = self.rate_samples.front() {
            if now.duration_since(timestamp) > RATE_WINDOW {
                self.rate_samples.pop_front();
            } else {
                break;
            }
        }
        self.rate_samples
            .push_back((now, self.total_bytes, self.total_lines));

        let Some(&(oldest_time, oldest_bytes, oldest_lines)) = self.rate_samples.front() else {
            return Rates::default();
        };
        let elapsed = now.duration_since(oldest_time).as_secs_f64();
        if elapsed <= 0.0 {
            return Rates::default();
        }

        let bytes_delta = self.total_bytes.saturating_sub(oldest_bytes);
        let lines_delta = self.total_lines.saturating_sub(oldest_lines);
        Rates {
            lines_per_sec: lines_delta as f64 / elapsed,
            mib_per_sec: (bytes_delta as f64 / elapsed) / MIB as f64,
        }
    }

    fn percent_done(&self) -> Option<f64> {
        (self.total_size > 0)
            .then(|| (self.total_bytes as f64 / self.total_size as f64) * 100.0)
    }

    /// 🎨 Layout:
    /// ```text
    /// source: <name>
    ///   <lines/s>    <total lines>
    ///   <MiB/s>      <bytes progress>
    ///   <elapsed>    <remaining>
    /// | [=====>----------]
    /// ```
    fn render(&self, rates: Rates) {
        let scale_hint = self.total_size.max(self.total_bytes);
        let bytes_progress = match self.percent_done() {
            Some(percent) => format!(
                "{} / {} ({:.2}%)",
                format_bytes(self.total_bytes, scale_hint),
                format_bytes(self.total_size, scale_hint),
                percent
            ),
            None => format_bytes(self.total_bytes, scale_hint),
        };

        let elapsed = self.start_time.elapsed();
        let remaining = match self.percent_done() {
            Some(percent) if percent > 0.0 => {
                // 🔮 linear extrapolation. assumes act three reads like act one.
                let total_estimated = elapsed.as_secs_f64() / (percent / 100.0);
                let remaining_secs = total_estimated - elapsed.as_secs_f64();
                if remaining_secs > 0.0 {
                    format_duration(Duration::from_secs_f64(remaining_secs))
                } else {
                    "--:--".to_string()
                }
            }
            _ => "--:--".to_string(),
        };

        let mut table = Table::new();
        table.load_preset(NOTHING);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.add_row(vec![
            Cell::new(format!("{} Lines/s", format_number(rates.lines_per_sec as u64)))
                .set_alignment(CellAlignment::Right),
            Cell::new(format!("{} Lines", format_number(self.total_lines)))
                .set_alignment(CellAlignment::Right),
        ]);
        table.add_row(vec![
            Cell::new(format!("{:.2} MiB/s", rates.mib_per_sec))
                .set_alignment(CellAlignment::Right),
            Cell::new(bytes_progress).set_alignment(CellAlignment::Right),
        ]);
        table.add_row(vec![
            Cell::new(format!("{} elapsed", format_duration(elapsed)))
                .set_alignment(CellAlignment::Right),
            Cell::new(format!("{} remaining", remaining)).set_alignment(CellAlignment::Right),
        ]);

        self.progress_bar
            .set_message(format!("source: {}\n{}", self.source_name, table));
    }
}
