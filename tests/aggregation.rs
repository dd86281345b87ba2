//! End-to-end season aggregation against a mocked upstream: real HTTP
//! client, real XML bodies, real fold.

use chrono::{DateTime, Utc};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use courtside::analysis::models::Position;
use courtside::analysis::SeasonContext;
use courtside::config::UpstreamConfig;
use courtside::history::FileStore;
use courtside::upstream::{FetchError, UpstreamClient};

const SEASON: u32 = 69;
const TEAM: &str = "10";

fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-07-20T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn client_for(server: &MockServer) -> UpstreamClient {
    UpstreamClient::new(&UpstreamConfig {
        base_url: server.uri(),
        timeout_seconds: 5,
    })
    .unwrap()
}

fn temp_store() -> (TempDir, FileStore) {
    let tmp = tempfile::tempdir().unwrap();
    let store = FileStore::from_dirs(tmp.path().join("teams"), tmp.path().join("players"));
    (tmp, store)
}

fn schedule_xml() -> String {
    // Four entries: two good past matches, one whose boxscore fails, one
    // in the future.
    "<bbapi><schedule>\
     <match id='1' start='2025-07-12T18:00:00Z'><homeTeam id='10'/><awayTeam id='20'/></match>\
     <match id='2' start='2025-07-13T18:00:00Z'><homeTeam id='30'/><awayTeam id='10'/></match>\
     <match id='3' start='2025-07-14T18:00:00Z'><homeTeam id='10'/><awayTeam id='40'/></match>\
     <match id='4' start='2025-08-01T18:00:00Z'><homeTeam id='10'/><awayTeam id='50'/></match>\
     </schedule></bbapi>"
        .to_string()
}

fn boxscore_one() -> String {
    // Ada plays; Benched Guy is listed with an N/A line.
    "<bbapi><match><effortDelta>3.2</effortDelta>\
     <homeTeam id='10'><teamName>Harbor Hawks</teamName>\
     <offStrategy>Motion</offStrategy><defStrategy>ManToMan</defStrategy>\
     <ratings><Offense>72.5</Offense></ratings>\
     <efficiency><PG>100.0</PG></efficiency>\
     <boxscore>\
     <player id='100'><firstName>Ada</firstName><lastName>Lovelace</lastName>\
     <performance><pts>12</pts><ast>4</ast><reb>6</reb></performance>\
     <minutes><PG>30</PG></minutes></player>\
     <player id='101'><firstName>Benched</firstName><lastName>Guy</lastName>\
     <performance><pts>N/A</pts></performance></player>\
     </boxscore></homeTeam>\
     <awayTeam id='20'><teamName>Visitors</teamName></awayTeam>\
     </match></bbapi>"
        .to_string()
}

fn boxscore_three() -> String {
    "<bbapi><match><effortDelta>-1.0</effortDelta>\
     <homeTeam id='10'><teamName>Harbor Hawks</teamName>\
     <offStrategy>LookInside</offStrategy><defStrategy>Zone23</defStrategy>\
     <ratings><Offense>77.5</Offense><Defense>64.0</Defense></ratings>\
     <efficiency><PG>110.0</PG><C>90.0</C></efficiency>\
     <boxscore>\
     <player id='100'><firstName>Ada</firstName><lastName>Lovelace</lastName>\
     <performance><pts>20</pts><ast>2</ast><reb>8</reb></performance>\
     <minutes><PG>25</PG><SG>10</SG></minutes></player>\
     </boxscore></homeTeam>\
     <awayTeam id='40'><teamName>Thirds</teamName></awayTeam>\
     </match></bbapi>"
        .to_string()
}

async fn mount_boxscore(server: &MockServer, match_id: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/boxscore.aspx"))
        .and(query_param("matchid", match_id))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn aggregates_a_season_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/schedule.aspx"))
        .and(query_param("teamid", TEAM))
        .and(query_param("season", "69"))
        .respond_with(ResponseTemplate::new(200).set_body_string(schedule_xml()))
        .mount(&server)
        .await;
    mount_boxscore(&server, "1", ResponseTemplate::new(200).set_body_string(boxscore_one()))
        .await;
    mount_boxscore(&server, "2", ResponseTemplate::new(500)).await;
    mount_boxscore(&server, "3", ResponseTemplate::new(200).set_body_string(boxscore_three()))
        .await;

    let client = client_for(&server);
    let (_tmp, store) = temp_store();
    let context = SeasonContext {
        api: &client,
        store: &store,
        session: "",
        current_season: SEASON,
        current_week_id: 2,
        now: now(),
    };

    let analysis = context.aggregate(TEAM, SEASON).await.unwrap();

    // Match 2 failed and was skipped, match 4 is in the future.
    assert_eq!(analysis.matches.len(), 2);
    assert_eq!(analysis.team_name, "Harbor Hawks");

    // Per-category denominators: Offense over two matches, Defense over one.
    assert_eq!(analysis.avg_ratings["Offense"], 75.0);
    assert_eq!(analysis.avg_ratings["Defense"], 64.0);
    assert_eq!(analysis.avg_efficiency[&Position::PG], 105.0);
    assert_eq!(analysis.avg_efficiency[&Position::C], 90.0);

    assert_eq!(analysis.offense_strategies["Motion"], 1);
    assert_eq!(analysis.offense_strategies["LookInside"], 1);

    // Effort series ascending by date.
    let deltas: Vec<f64> = analysis
        .effort_delta_list
        .iter()
        .map(|point| point.effort_delta)
        .collect();
    assert_eq!(deltas, vec![3.2, -1.0]);

    // The N/A player is on the roster but has no season totals.
    let ada = &analysis.player_sum_stats["100"];
    assert_eq!(ada.games, 2);
    assert_eq!(ada.pts, 32);
    assert_eq!(ada.min, 65);
    assert!(!analysis.player_sum_stats.contains_key("101"));
    assert!(analysis.players.iter().any(|player| player.id == "101"));

    // No history files exist, so no player has current-week form.
    assert!(analysis
        .players
        .iter()
        .all(|player| !player.is_current_week_data_available));
}

#[tokio::test]
async fn forwards_the_session_cookie_when_present() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/schedule.aspx"))
        .and(header("cookie", "sessionId=abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<bbapi><schedule/></bbapi>".to_string()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let (_tmp, store) = temp_store();
    let context = SeasonContext {
        api: &client,
        store: &store,
        session: "sessionId=abc",
        current_season: SEASON,
        current_week_id: 2,
        now: now(),
    };

    let analysis = context.aggregate(TEAM, SEASON).await.unwrap();
    assert!(analysis.matches.is_empty());
}

#[tokio::test]
async fn schedule_fetch_failure_aborts_the_season() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/schedule.aspx"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let (_tmp, store) = temp_store();
    let context = SeasonContext {
        api: &client,
        store: &store,
        session: "",
        current_season: SEASON,
        current_week_id: 2,
        now: now(),
    };

    let err = context.aggregate(TEAM, SEASON).await.unwrap_err();
    assert!(matches!(err, FetchError::Status(_)));
}

#[tokio::test]
async fn non_xml_schedule_body_is_a_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/schedule.aspx"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login page</html"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let (_tmp, store) = temp_store();
    let context = SeasonContext {
        api: &client,
        store: &store,
        session: "",
        current_season: SEASON,
        current_week_id: 2,
        now: now(),
    };

    let err = context.aggregate(TEAM, SEASON).await.unwrap_err();
    assert!(matches!(err, FetchError::InvalidXml(_)));
}
