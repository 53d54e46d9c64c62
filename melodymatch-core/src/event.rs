use crate::item::RecommendedItem;
use crate::notice::Notice;

/// Events emitted by the feed controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// The feed was cleared for a new genre (empty genre means no feed)
    FeedReset { genre: String },
    /// A recommendation request went out
    FetchStarted { genre: String },
    /// A fetch completed and its items were appended
    ItemsAppended { added: usize, total: usize },
    /// A fetch completed for a genre that is no longer active
    FetchDiscarded { genre: String },
    /// A new card is displayed at `cursor`
    CardShown { cursor: usize, item: RecommendedItem },
    /// The dwell interval elapsed for the card at `cursor`
    SwipeEligible { cursor: usize },
    /// A swipe was refused because the dwell interval had not elapsed
    SwipeRejected { cursor: usize },
    /// The card was swiped away and the cursor now points at `cursor`
    Advanced { cursor: usize, liked: bool },
    /// The cursor reached the end of the fetched items
    Exhausted,
    /// A user-visible notice
    Notice(Notice),
}
