//! The book catalogue.

use pericope_wire::Testament;
use strum::IntoEnumIterator;

/// A book and its chapter count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogBook {
    pub name: &'static str,
    pub chapters: u8,
}

impl CatalogBook {
    const fn new(name: &'static str, chapters: u8) -> Self {
        Self { name, chapters }
    }

    pub fn has_chapter(&self, chapter: u8) -> bool {
        (1..=self.chapters).contains(&chapter)
    }
}

/// Books of `testament` in canonical order.
pub fn books(testament: Testament) -> &'static [CatalogBook] {
    match testament {
        Testament::Old => &OLD_TESTAMENT,
        Testament::New => &NEW_TESTAMENT,
    }
}

/// Look a book up by name, ignoring ASCII case.
pub fn find(name: &str) -> Option<(Testament, &'static CatalogBook)> {
    Testament::iter().find_map(|testament| {
        books(testament)
            .iter()
            .find(|book| book.name.eq_ignore_ascii_case(name))
            .map(|book| (testament, book))
    })
}

const OLD_TESTAMENT: [CatalogBook; 39] = [
    CatalogBook::new("Genesis", 50),
    CatalogBook::new("Exodus", 40),
    CatalogBook::new("Leviticus", 27),
    CatalogBook::new("Numbers", 36),
    CatalogBook::new("Deuteronomy", 34),
    CatalogBook::new("Joshua", 24),
    CatalogBook::new("Judges", 21),
    CatalogBook::new("Ruth", 4),
    CatalogBook::new("1 Samuel", 31),
    CatalogBook::new("2 Samuel", 24),
    CatalogBook::new("1 Kings", 22),
    CatalogBook::new("2 Kings", 25),
    CatalogBook::new("1 Chronicles", 29),
    CatalogBook::new("2 Chronicles", 36),
    CatalogBook::new("Ezra", 10),
    CatalogBook::new("Nehemiah", 13),
    CatalogBook::new("Esther", 10),
    CatalogBook::new("Job", 42),
    CatalogBook::new("Psalms", 150),
    CatalogBook::new("Proverbs", 31),
    CatalogBook::new("Ecclesiastes", 12),
    CatalogBook::new("Song of Solomon", 8),
    CatalogBook::new("Isaiah", 66),
    CatalogBook::new("Jeremiah", 52),
    CatalogBook::new("Lamentations", 5),
    CatalogBook::new("Ezekiel", 48),
    CatalogBook::new("Daniel", 12),
    CatalogBook::new("Hosea", 14),
    CatalogBook::new("Joel", 3),
    CatalogBook::new("Amos", 9),
    CatalogBook::new("Obadiah", 1),
    CatalogBook::new("Jonah", 4),
    CatalogBook::new("Micah", 7),
    CatalogBook::new("Nahum", 3),
    CatalogBook::new("Habakkuk", 3),
    CatalogBook::new("Zephaniah", 3),
    CatalogBook::new("Haggai", 2),
    CatalogBook::new("Zechariah", 14),
    CatalogBook::new("Malachi", 4),
];

const NEW_TESTAMENT: [CatalogBook; 27] = [
    CatalogBook::new("Matthew", 28),
    CatalogBook::new("Mark", 16),
    CatalogBook::new("Luke", 24),
    CatalogBook::new("John", 21),
    CatalogBook::new("Acts", 28),
    CatalogBook::new("Romans", 16),
    CatalogBook::new("1 Corinthians", 16),
    CatalogBook::new("2 Corinthians", 13),
    CatalogBook::new("Galatians", 6),
    CatalogBook::new("Ephesians", 6),
    CatalogBook::new("Philippians", 4),
    CatalogBook::new("Colossians", 4),
    CatalogBook::new("1 Thessalonians", 5),
    CatalogBook::new("2 Thessalonians", 3),
    CatalogBook::new("1 Timothy", 6),
    CatalogBook::new("2 Timothy", 4),
    CatalogBook::new("Titus", 3),
    CatalogBook::new("Philemon", 1),
    CatalogBook::new("Hebrews", 13),
    CatalogBook::new("James", 5),
    CatalogBook::new("1 Peter", 5),
    CatalogBook::new("2 Peter", 3),
    CatalogBook::new("1 John", 5),
    CatalogBook::new("2 John", 1),
    CatalogBook::new("3 John", 1),
    CatalogBook::new("Jude", 1),
    CatalogBook::new("Revelation", 22),
];
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_testament_sizes() {
        assert_eq!(books(Testament::Old).len(), 39);
        assert_eq!(books(Testament::New).len(), 27);
    }

    #[test]
    fn test_find_ignores_case() {
        let (testament, book) = find("song of solomon").unwrap();
        assert_eq!(testament, Testament::Old);
        assert_eq!(book.chapters, 8);
        assert_eq!(find("Revelation").map(|(t, _)| t), Some(Testament::New));
        assert!(find("Maccabees").is_none());
    }

    #[test]
    fn test_has_chapter() {
        let (_, psalms) = find("Psalms").unwrap();
        assert!(psalms.has_chapter(150));
        assert!(!psalms.has_chapter(0));
        assert!(!psalms.has_chapter(151));
    }
}
