//! Where verse text comes from.

use std::{collections::HashMap, io::Read};

use serde::Deserialize;

use crate::CompanionError;

/// One numbered verse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verse {
    pub number: u16,
    pub text: String,
}

impl Verse {
    pub fn new(number: u16, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

/// Supplies the verses of a chapter.
pub trait VerseSource {
    /// Verses of `book` `chapter` in order, or `None` if the source has no
    /// text for it.
    fn chapter(&self, book: &str, chapter: u8) -> Option<Vec<Verse>>;
}

/// Verse text held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticVerseSource {
    chapters: HashMap<(String, u8), Vec<Verse>>,
}

#[derive(Deserialize)]
struct VerseRow {
    book: String,
    chapter: u8,
    verse: u16,
    text: String,
}

impl StaticVerseSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON array of `{"book", "chapter", "verse", "text"}` rows.
    pub fn from_json(reader: impl Read) -> Result<Self, CompanionError> {
        let rows: Vec<VerseRow> = serde_json::from_reader(reader)?;
        let mut source = Self::new();
        for row in rows {
            source.push(&row.book, row.chapter, Verse::new(row.verse, row.text));
        }
        source.sort();
        Ok(source)
    }

    /// A few passages, enough to browse without a verse file.
    pub fn sample() -> Self {
        let mut source = Self::new();
        for (book, chapter, number, text) in SAMPLE {
            source.push(book, *chapter, Verse::new(*number, *text));
        }
        source
    }

    /// Append a verse to a chapter.
    pub fn push(&mut self, book: &str, chapter: u8, verse: Verse) {
        self.chapters
            .entry((book.to_ascii_lowercase(), chapter))
            .or_default()
            .push(verse);
    }

    /// Number of chapters held.
    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    fn sort(&mut self) {
        for verses in self.chapters.values_mut() {
            verses.sort_by_key(|verse| verse.number);
        }
    }
}

impl VerseSource for StaticVerseSource {
    fn chapter(&self, book: &str, chapter: u8) -> Option<Vec<Verse>> {
        self.chapters
            .get(&(book.to_ascii_lowercase(), chapter))
            .cloned()
    }
}

const SAMPLE: &[(&str, u8, u16, &str)] = &[
    ("Genesis", 1, 1, "In the beginning God created the heaven and the earth."),
    (
        "Genesis",
        1,
        2,
        "And the earth was without form, and void; and darkness was upon the face of the deep. \
         And the Spirit of God moved upon the face of the waters.",
    ),
    ("Genesis", 1, 3, "And God said, Let there be light: and there was light."),
    (
        "Genesis",
        1,
        4,
        "And God saw the light, that it was good: and God divided the light from the darkness.",
    ),
    (
        "Genesis",
        1,
        5,
        "And God called the light Day, and the darkness he called Night. \
         And the evening and the morning were the first day.",
    ),
    (
        "John",
        11,
        33,
        "When Jesus therefore saw her weeping, and the Jews also weeping which came with her, \
         he groaned in the spirit, and was troubled,",
    ),
    ("John", 11, 34, "And said, Where have ye laid him? They said unto him, Lord, come and see."),
    ("John", 11, 35, "Jesus wept."),
    ("John", 11, 36, "Then said the Jews, Behold how he loved him!"),
    (
        "Ruth",
        1,
        16,
        "And Ruth said, Intreat me not to leave thee, or to return from following after thee: \
         for whither thou goest, I will go; and where thou lodgest, I will lodge: \
         thy people shall be my people, and thy God my God:",
    ),
];
