use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
};

use pericope_wire::{CorrelationToken, Passage, Request, Response, Testament};
use tracing::{debug, info, warn};

use crate::{
    CompanionError, FavoriteStore, Toggle, Verse, VerseSource, catalog,
    passage::{self, CHUNK_LEN},
};

/// The peer that answers client requests.
///
/// Each request fills a response queue keyed by its token, replacing any
/// previous queue for that token. A cancel empties the queue so nothing more
/// is sent for it. [`next_response`](Self::next_response) interleaves the
/// queues one response at a time.
#[derive(Debug)]
pub struct Companion<S> {
    source: S,
    favorites: FavoriteStore,
    favorites_path: Option<PathBuf>,
    /// Sent before anything queued per token.
    control: VecDeque<Response>,
    queues: VecDeque<(CorrelationToken, VecDeque<Response>)>,
}

impl<S: VerseSource> Companion<S> {
    pub fn new(source: S, favorites: FavoriteStore) -> Self {
        Self {
            source,
            favorites,
            favorites_path: None,
            control: VecDeque::new(),
            queues: VecDeque::new(),
        }
    }

    /// Persist favorites to `path` after every change.
    pub fn with_favorites_path(mut self, path: impl AsRef<Path>) -> Self {
        self.favorites_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn favorites(&self) -> &FavoriteStore {
        &self.favorites
    }

    /// Queue the ready announcement.
    pub fn announce_ready(&mut self) {
        info!("Companion ready");
        self.control.push_back(Response::PeerReady);
    }

    /// Serve one request.
    pub fn handle(&mut self, request: Request) {
        let token = request.token();
        debug!(%token, kind = %request.kind(), "Handling request");

        let responses = match request {
            Request::Books { testament, .. } => books(token, testament),
            Request::VerseRanges { book, chapter, .. } => {
                self.verse_ranges(token, &book, chapter)
            }
            Request::Viewer { passage, .. } => self.passage_text(token, &passage),
            Request::Cancel { .. } => {
                self.cancel(token);
                return;
            }
            Request::Favorites { .. } => self.list_favorites(token),
            Request::ToggleFavorite { passage, .. } => self.toggle_favorite(token, passage),
        };

        if responses.is_empty() {
            return;
        }
        self.replace_queue(token, responses.into());
    }

    /// Next response to send, round-robin across tokens.
    pub fn next_response(&mut self) -> Option<Response> {
        if let Some(response) = self.control.pop_front() {
            return Some(response);
        }
        let (token, mut queue) = self.queues.pop_front()?;
        let response = queue.pop_front();
        if !queue.is_empty() {
            self.queues.push_back((token, queue));
        }
        response
    }

    /// Responses still queued across all tokens.
    pub fn pending(&self) -> usize {
        self.control.len() + self.queues.iter().map(|(_, queue)| queue.len()).sum::<usize>()
    }

    fn cancel(&mut self, token: CorrelationToken) {
        let before = self.pending();
        self.queues.retain(|(queued, _)| *queued != token);
        debug!(%token, dropped = before - self.pending(), "Cancelled responses");
    }

    fn replace_queue(&mut self, token: CorrelationToken, responses: VecDeque<Response>) {
        match self.queues.iter_mut().find(|(queued, _)| *queued == token) {
            Some((_, queue)) => *queue = responses,
            None => self.queues.push_back((token, responses)),
        }
    }

    fn verse_ranges(&self, token: CorrelationToken, book: &str, chapter: u8) -> Vec<Response> {
        let verses = match self.chapter(book, chapter) {
            Ok(verses) => verses,
            Err(error) => return vec![report(token, &error)],
        };
        passage::verse_ranges(verses.len())
            .into_iter()
            .zip(0u16..)
            .map(|(range, index)| Response::VerseRange {
                token,
                index,
                range,
            })
            .collect()
    }

    fn passage_text(&self, token: CorrelationToken, passage: &Passage) -> Vec<Response> {
        let text = self
            .chapter(&passage.book, passage.chapter)
            .and_then(|verses| passage::render(&verses, &passage.range));
        let text = match text {
            Ok(text) => text,
            Err(error) => return vec![report(token, &error)],
        };
        passage::chunk(&text, CHUNK_LEN)
            .into_iter()
            .zip(0u16..)
            .map(|(content, index)| Response::ViewerChunk {
                token,
                index,
                content,
            })
            .collect()
    }

    fn list_favorites(&self, token: CorrelationToken) -> Vec<Response> {
        if self.favorites.is_empty() {
            return vec![Response::FavoritesEmpty { token }];
        }
        self.favorites
            .iter()
            .zip(0u16..)
            .map(|(passage, index)| Response::FavoriteEntry {
                token,
                index,
                passage: passage.clone(),
            })
            .collect()
    }

    fn toggle_favorite(&mut self, token: CorrelationToken, passage: Passage) -> Vec<Response> {
        let toggle = self.favorites.toggle(passage.clone());
        match toggle {
            Toggle::Added => info!(%passage, "Favorite added"),
            Toggle::Removed => info!(%passage, "Favorite removed"),
        }
        if let Some(path) = &self.favorites_path
            && let Err(error) = self.favorites.save(path)
        {
            warn!(%error, "Failed to save favorites");
        }
        vec![Response::FavoritesChanged { token }]
    }

    fn chapter(&self, book: &str, chapter: u8) -> Result<Vec<Verse>, CompanionError> {
        let (_, entry) =
            catalog::find(book).ok_or_else(|| CompanionError::UnknownBook(book.to_owned()))?;
        let missing = || CompanionError::MissingChapter {
            book: entry.name.to_owned(),
            chapter,
        };
        if !entry.has_chapter(chapter) {
            return Err(missing());
        }
        self.source.chapter(entry.name, chapter).ok_or_else(missing)
    }
}

/// Book entries for `testament`.
fn books(token: CorrelationToken, testament: Testament) -> Vec<Response> {
    catalog::books(testament)
        .iter()
        .zip(0u16..)
        .map(|(book, index)| Response::BookEntry {
            token,
            index,
            name: book.name.to_owned(),
            chapters: book.chapters,
        })
        .collect()
}

fn report(token: CorrelationToken, error: &CompanionError) -> Response {
    warn!(%token, %error, "Request failed");
    Response::Error {
        message: error.to_string(),
    }
}
