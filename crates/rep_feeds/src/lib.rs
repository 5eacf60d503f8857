pub mod content;
pub mod fetcher;
pub mod logging;
pub mod rss;

pub use fetcher::RssFetcher;
pub use rss::{parse_feed, FeedEntry};

pub mod prelude {
    pub use super::fetcher::RssFetcher;
    pub use rep_core::{ArticleFetcher, RawArticle, Result, Error};
}
