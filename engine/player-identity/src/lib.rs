//! Player Identity - Resolves external player records to canonical player IDs
//!
//! Every loader in the ingest pipeline maps a vendor record (Sleeper,
//! SportsData.io, Underdog, Footballguys, ...) onto a row of the `players`
//! table keyed by `player_id`. This crate holds the shared pieces: name and
//! team normalization, the nickname alias table, a lookup index over DB
//! players, and the ID -> secondary ID -> name+position -> name cascade.

pub mod aliases;
pub mod index;
pub mod matched;
pub mod normalize;
pub mod resolver;
pub mod suggest;
pub mod table;
pub mod types;

pub use index::PlayerIndex;
pub use matched::{MatchedIds, RecordOutcome};
pub use normalize::{
    convert_height, fbg_position, is_skill_position, normalize_name, normalize_position,
    normalize_team, team_abbr_from_full_name, SKILL_POSITIONS,
};
pub use resolver::{MatchMethod, MatchQuery, NameFallback, Resolution, Resolver};
pub use suggest::{suggest, Suggestion};
pub use table::NameTable;
pub use types::{value_as_string, IdentityError, PlayerRow};
