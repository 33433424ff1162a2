//! Team logo lookup for row backgrounds. Logos come from the ESPN CDN, keyed by the
//! league's ESPN abbreviation.

/// `(full name, nickname, ESPN abbreviation)`
type Team = (&'static str, &'static str, &'static str);

const NFL: [Team; 32] = [
    ("Arizona Cardinals", "Cardinals", "ari"),
    ("Atlanta Falcons", "Falcons", "atl"),
    ("Baltimore Ravens", "Ravens", "bal"),
    ("Buffalo Bills", "Bills", "buf"),
    ("Carolina Panthers", "Panthers", "car"),
    ("Chicago Bears", "Bears", "chi"),
    ("Cincinnati Bengals", "Bengals", "cin"),
    ("Cleveland Browns", "Browns", "cle"),
    ("Dallas Cowboys", "Cowboys", "dal"),
    ("Denver Broncos", "Broncos", "den"),
    ("Detroit Lions", "Lions", "det"),
    ("Green Bay Packers", "Packers", "gb"),
    ("Houston Texans", "Texans", "hou"),
    ("Indianapolis Colts", "Colts", "ind"),
    ("Jacksonville Jaguars", "Jaguars", "jax"),
    ("Kansas City Chiefs", "Chiefs", "kc"),
    ("Las Vegas Raiders", "Raiders", "lv"),
    ("Los Angeles Chargers", "Chargers", "lac"),
    ("Los Angeles Rams", "Rams", "lar"),
    ("Miami Dolphins", "Dolphins", "mia"),
    ("Minnesota Vikings", "Vikings", "min"),
    ("New England Patriots", "Patriots", "ne"),
    ("New Orleans Saints", "Saints", "no"),
    ("New York Giants", "Giants", "nyg"),
    ("New York Jets", "Jets", "nyj"),
    ("Philadelphia Eagles", "Eagles", "phi"),
    ("Pittsburgh Steelers", "Steelers", "pit"),
    ("San Francisco 49ers", "49ers", "sf"),
    ("Seattle Seahawks", "Seahawks", "sea"),
    ("Tampa Bay Buccaneers", "Buccaneers", "tb"),
    ("Tennessee Titans", "Titans", "ten"),
    ("Washington Commanders", "Commanders", "wsh"),
];

const NBA: [Team; 30] = [
    ("Atlanta Hawks", "Hawks", "atl"),
    ("Boston Celtics", "Celtics", "bos"),
    ("Brooklyn Nets", "Nets", "bkn"),
    ("Charlotte Hornets", "Hornets", "cha"),
    ("Chicago Bulls", "Bulls", "chi"),
    ("Cleveland Cavaliers", "Cavaliers", "cle"),
    ("Dallas Mavericks", "Mavericks", "dal"),
    ("Denver Nuggets", "Nuggets", "den"),
    ("Detroit Pistons", "Pistons", "det"),
    ("Golden State Warriors", "Warriors", "gs"),
    ("Houston Rockets", "Rockets", "hou"),
    ("Indiana Pacers", "Pacers", "ind"),
    ("Los Angeles Clippers", "Clippers", "lac"),
    ("Los Angeles Lakers", "Lakers", "lal"),
    ("Memphis Grizzlies", "Grizzlies", "mem"),
    ("Miami Heat", "Heat", "mia"),
    ("Milwaukee Bucks", "Bucks", "mil"),
    ("Minnesota Timberwolves", "Timberwolves", "min"),
    ("New Orleans Pelicans", "Pelicans", "no"),
    ("New York Knicks", "Knicks", "ny"),
    ("Oklahoma City Thunder", "Thunder", "okc"),
    ("Orlando Magic", "Magic", "orl"),
    ("Philadelphia 76ers", "76ers", "phi"),
    ("Phoenix Suns", "Suns", "phx"),
    ("Portland Trail Blazers", "Trail Blazers", "por"),
    ("Sacramento Kings", "Kings", "sac"),
    ("San Antonio Spurs", "Spurs", "sa"),
    ("Toronto Raptors", "Raptors", "tor"),
    ("Utah Jazz", "Jazz", "utah"),
    ("Washington Wizards", "Wizards", "wsh"),
];

const MLB: [Team; 30] = [
    ("Arizona Diamondbacks", "Diamondbacks", "ari"),
    ("Atlanta Braves", "Braves", "atl"),
    ("Baltimore Orioles", "Orioles", "bal"),
    ("Boston Red Sox", "Red Sox", "bos"),
    ("Chicago Cubs", "Cubs", "chc"),
    ("Chicago White Sox", "White Sox", "chw"),
    ("Cincinnati Reds", "Reds", "cin"),
    ("Cleveland Guardians", "Guardians", "cle"),
    ("Colorado Rockies", "Rockies", "col"),
    ("Detroit Tigers", "Tigers", "det"),
    ("Houston Astros", "Astros", "hou"),
    ("Kansas City Royals", "Royals", "kc"),
    ("Los Angeles Angels", "Angels", "laa"),
    ("Los Angeles Dodgers", "Dodgers", "lad"),
    ("Miami Marlins", "Marlins", "mia"),
    ("Milwaukee Brewers", "Brewers", "mil"),
    ("Minnesota Twins", "Twins", "min"),
    ("New York Mets", "Mets", "nym"),
    ("New York Yankees", "Yankees", "nyy"),
    ("Oakland Athletics", "Athletics", "oak"),
    ("Philadelphia Phillies", "Phillies", "phi"),
    ("Pittsburgh Pirates", "Pirates", "pit"),
    ("San Diego Padres", "Padres", "sd"),
    ("San Francisco Giants", "Giants", "sf"),
    ("Seattle Mariners", "Mariners", "sea"),
    ("St. Louis Cardinals", "Cardinals", "stl"),
    ("Tampa Bay Rays", "Rays", "tb"),
    ("Texas Rangers", "Rangers", "tex"),
    ("Toronto Blue Jays", "Blue Jays", "tor"),
    ("Washington Nationals", "Nationals", "wsh"),
];

fn league(sport: &str) -> Option<(&'static str, &'static [Team])> {
    match sport.trim().to_uppercase().as_str() {
        "NFL" => Some(("nfl", &NFL)),
        "NBA" => Some(("nba", &NBA)),
        "MLB" => Some(("mlb", &MLB)),
        _ => None,
    }
}

/// Logo URL when `selection` names a team of `sport` by full name, nickname or abbreviation.
pub fn team_logo(sport: &str, selection: &str) -> Option<String> {
    let (slug, teams) = league(sport)?;
    let wanted = selection.trim();
    teams
        .iter()
        .find(|(full, nick, abbr)| {
            wanted.eq_ignore_ascii_case(full)
                || wanted.eq_ignore_ascii_case(nick)
                || wanted.eq_ignore_ascii_case(abbr)
        })
        .map(|(_, _, abbr)| format!("https://a.espncdn.com/i/teamlogos/{slug}/500/{abbr}.png"))
}
