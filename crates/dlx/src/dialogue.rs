// ai
//! 🎭 Dialogue: turning a raw screenplay line into "who said what".
//!
//! 🎬 *[INT. WRITERS' ROOM - 2:14 AM. A line of text slides under the door.]*
//! *["JOHN: Hello there!" it says. Somebody has to figure out who JOHN is.]*
//!
//! A dialogue line looks like `SPEAKER: dialogue text`. We trim the line, split on the
//! FIRST colon only (everything after it belongs to the dialogue, colons and all), and
//! trim both halves. "Trim" means ASCII space and control characters (`<= ' '`) only.
//! A no-break space is content, not padding. Lines with no colon, or nothing at all, are not dialogue. They are
//! stage directions, scene headings, or the void. We skip them without a peep.
//!
//! 🧠 Knowledge graph:
//! - Feeds: `aggregator::LocalAggregator::fold_line`
//! - An empty speaker (`": hello"`) is still a speaker. Its name is `""`.
//!   It counts toward the speaking characters. It counts toward lines. We don't judge.
//! - Speaker names are compared as-is: `JOHN` and `John` are two different people.
//!   Possibly twins. Possibly a typo. Not our call.
//!
//! 🦆 (the duck speaks only in stage directions, and therefore never parses)

/// 🎯 One parsed line of dialogue. Borrows from the raw line; lives for one fold and dies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogueRecord<'a> {
    /// 🗣️ who's talking, trimmed, case untouched
    pub speaker: &'a str,
    /// 💬 what they said, trimmed, punctuation and all
    pub dialogue: &'a str,
}

/// 🔍 Parse one raw line into a [`DialogueRecord`], or `None` if it isn't dialogue.
///
/// - Trim the line. Empty after trimming → `None`.
/// - No `:` anywhere → `None`.
/// - Otherwise split at the first `:` and trim both sides. No further validation.
pub fn parse_line(raw: &str) -> Option<DialogueRecord<'_>> {
    let line = trim_padding(raw);
    if line.is_empty() {
        return None;
    }

    // -- ✂️ first colon wins. "NARRATOR: Time: 3pm" is NARRATOR saying "Time: 3pm".
    let (speaker, dialogue) = line.split_once(':')?;

    Some(DialogueRecord {
        speaker: trim_padding(speaker),
        dialogue: trim_padding(dialogue),
    })
}

fn trim_padding(text: &str) -> &str {
    text.trim_matches(|c: char| c <= ' ')
}
