use melodymatch_core::SwipeDirection;
use std::str::FromStr;
use thiserror::Error;

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Switch the feed to a genre; an empty genre clears the feed
    Genre(String),
    Swipe(SwipeDirection),
    /// Fetch more songs for the active genre now
    More,
    Playlist,
    Status,
    SignIn,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseCommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command: {0}")]
    Unknown(String),
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(word, rest)| (word, rest.trim()));

        match word.to_ascii_lowercase().as_str() {
            "" => Err(ParseCommandError::Empty),
            "genre" | "g" => Ok(Self::Genre(rest.to_string())),
            "more" | "m" => Ok(Self::More),
            "playlist" | "p" => Ok(Self::Playlist),
            "status" | "s" => Ok(Self::Status),
            "signin" | "login" => Ok(Self::SignIn),
            "help" | "h" | "?" => Ok(Self::Help),
            "quit" | "q" | "exit" => Ok(Self::Quit),
            other => other
                .parse::<SwipeDirection>()
                .map(Self::Swipe)
                .map_err(|_| ParseCommandError::Unknown(word.to_string())),
        }
    }
}
