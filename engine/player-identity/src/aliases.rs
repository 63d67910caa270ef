//! Static lookup tables: player nicknames and franchise names

/// Normalized alternate name -> normalized canonical name.
///
/// Most pairs appear in both directions so a DB player stored under either
/// spelling is also indexed under the other one.
pub const PLAYER_ALIASES: &[(&str, &str)] = &[
    ("hollywood brown", "marquise brown"),
    ("chig okonkwo", "chigoziem okonkwo"),
    ("chigoziem okonkwo", "chig okonkwo"),
    ("gabe davis", "gabriel davis"),
    ("gabriel davis", "gabe davis"),
    ("scotty miller", "scott miller"),
    ("scott miller", "scotty miller"),
    ("robbie chosen anderson", "robbie anderson"),
    ("chosen anderson", "robbie anderson"),
    ("robbie anderson", "chosen anderson"),
    ("keandre lambert", "keandre lambert-smith"),
    ("keandre lambert-smith", "keandre lambert"),
];

/// Lowercase franchise name -> team abbreviation
pub const TEAM_FULL_NAMES: &[(&str, &str)] = &[
    ("arizona cardinals", "ARI"),
    ("atlanta falcons", "ATL"),
    ("baltimore ravens", "BAL"),
    ("buffalo bills", "BUF"),
    ("carolina panthers", "CAR"),
    ("chicago bears", "CHI"),
    ("cincinnati bengals", "CIN"),
    ("cleveland browns", "CLE"),
    ("dallas cowboys", "DAL"),
    ("denver broncos", "DEN"),
    ("detroit lions", "DET"),
    ("green bay packers", "GB"),
    ("houston texans", "HOU"),
    ("indianapolis colts", "IND"),
    ("jacksonville jaguars", "JAX"),
    ("kansas city chiefs", "KC"),
    ("las vegas raiders", "LV"),
    ("los angeles chargers", "LAC"),
    ("los angeles rams", "LAR"),
    ("miami dolphins", "MIA"),
    ("minnesota vikings", "MIN"),
    ("new england patriots", "NE"),
    ("new orleans saints", "NO"),
    ("new york giants", "NYG"),
    ("new york jets", "NYJ"),
    ("philadelphia eagles", "PHI"),
    ("pittsburgh steelers", "PIT"),
    ("san francisco 49ers", "SF"),
    ("seattle seahawks", "SEA"),
    ("tampa bay buccaneers", "TB"),
    ("tennessee titans", "TEN"),
    ("washington commanders", "WAS"),
];

/// Look up the alias for an already-normalized name
pub fn alias_for(normalized: &str) -> Option<&'static str> {
    PLAYER_ALIASES.iter().find(|(from, _)| *from == normalized).map(|(_, to)| *to)
}
