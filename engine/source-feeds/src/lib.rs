//! Source Feeds - vendor APIs and local exports
//!
//! Thin, typed access to every upstream the warehouse ingests: SportsData.io,
//! Sleeper, Footballguys, Underdog and NFFC over HTTP, plus the nflreadr and
//! hand-exported CSVs on disk. Matching and writing live elsewhere.

pub mod csv_files;
pub mod de;
pub mod error;
pub mod footballguys;
pub mod http;
pub mod imports;
pub mod nffc;
pub mod nflreadr;
pub mod sleeper;
pub mod sportsdata;
pub mod underdog;

pub use csv_files::{parse_csv, read_csv, read_headers, write_csv};
pub use error::{FeedError, Result};
pub use footballguys::{FbgPlayer, FbgStatLine, FootballguysClient};
pub use nffc::{
    AdpEntry, LeagueDetail, LeagueDraft, LeagueFetch, NffcClient, NffcLeague, NffcPick, TeamOutcome,
};
pub use nflreadr::{NflreadrDir, NflreadrRecord};
pub use sleeper::{SleeperClient, SleeperPlayer, SleeperPlayers};
pub use sportsdata::{SportsDataClient, SportsDataPlayer};
pub use underdog::{UnderdogClient, UnderdogRanking};
