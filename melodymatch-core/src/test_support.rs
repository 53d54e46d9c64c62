//! Scripted backend for controller tests.

use crate::backend::Backend;
use crate::error::CoreError;
use crate::item::RecommendedItem;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Build `count` items with ids `{prefix}-{n}` and a preview each
pub fn items(prefix: &str, count: usize) -> Vec<RecommendedItem> {
    (0..count)
        .map(|n| {
            let id = format!("{prefix}-{n}");
            RecommendedItem::new(&id, format!("Song {n}"))
                .with_performer("Artist")
                .with_artwork(format!("https://i.example/{id}.jpg"))
                .with_preview(format!("https://p.example/{id}.mp3"))
        })
        .collect()
}

/// Let spawned tasks run until they block
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Scripted answer to one recommendations request
pub struct Reply {
    delay: Duration,
    result: Result<Vec<RecommendedItem>, u16>,
}

impl Reply {
    pub fn items(items: Vec<RecommendedItem>) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(items),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(status),
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ProbeReply {
    Authenticated,
    Rejected,
    NetworkError,
}

struct MockState {
    replies: VecDeque<Reply>,
    fallback: Vec<RecommendedItem>,
    fetches: Vec<String>,
    likes: Vec<String>,
    fail_likes: bool,
    probe: ProbeReply,
    probes: usize,
    playlist: Result<String, u16>,
}

pub struct MockBackend {
    state: Mutex<MockState>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(MockState {
                replies: VecDeque::new(),
                fallback: Vec::new(),
                fetches: Vec::new(),
                likes: Vec::new(),
                fail_likes: false,
                probe: ProbeReply::Authenticated,
                probes: 0,
                playlist: Ok(String::new()),
            }),
        })
    }

    fn with<T>(&self, f: impl FnOnce(&mut MockState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    pub fn push_reply(&self, reply: Reply) {
        self.with(|s| s.replies.push_back(reply));
    }

    /// Items returned once the scripted replies run out
    pub fn set_fallback(&self, items: Vec<RecommendedItem>) {
        self.with(|s| s.fallback = items);
    }

    pub fn fail_likes(&self) {
        self.with(|s| s.fail_likes = true);
    }

    pub fn set_probe(&self, probe: ProbeReply) {
        self.with(|s| s.probe = probe);
    }

    pub fn set_playlist_reply(&self, reply: Result<String, u16>) {
        self.with(|s| s.playlist = reply);
    }

    pub fn fetches(&self) -> Vec<String> {
        self.with(|s| s.fetches.clone())
    }

    pub fn likes(&self) -> Vec<String> {
        self.with(|s| s.likes.clone())
    }

    pub fn probes(&self) -> usize {
        self.with(|s| s.probes)
    }
}

#[async_trait]
impl Backend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn probe_session(&self) -> Result<bool, CoreError> {
        let probe = self.with(|s| {
            s.probes += 1;
            s.probe
        });
        match probe {
            ProbeReply::Authenticated => Ok(true),
            ProbeReply::Rejected => Ok(false),
            ProbeReply::NetworkError => Err(CoreError::IoError(std::io::Error::other(
                "connection refused",
            ))),
        }
    }

    async fn fetch_recommendations(&self, genre: &str) -> Result<Vec<RecommendedItem>, CoreError> {
        let reply = self.with(|s| {
            s.fetches.push(genre.to_string());
            s.replies
                .pop_front()
                .unwrap_or_else(|| Reply::items(s.fallback.clone()))
        });

        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }

        reply.result.map_err(|status| CoreError::BackendStatus {
            endpoint: "getRecommendations",
            status,
        })
    }

    async fn like_item(&self, id: &str) -> Result<(), CoreError> {
        let fail = self.with(|s| {
            s.likes.push(id.to_string());
            s.fail_likes
        });
        if fail {
            Err(CoreError::BackendStatus {
                endpoint: "likedSong",
                status: 500,
            })
        } else {
            Ok(())
        }
    }

    async fn request_playlist_creation(&self) -> Result<String, CoreError> {
        self.with(|s| s.playlist.clone())
            .map_err(|status| CoreError::BackendStatus {
                endpoint: "createPlaylist",
                status,
            })
    }
}
