use em_core::{EntityMatcher, GroupLabels, MatchConfig, MemoryBudget, ResourcePolicy};
use polars::prelude::{DataFrame, IntoColumn, NamedFrom, Series};

const SONGS: [(&str, &str, &str); 32] = [
    ("yesterday", "the beatles", "help"),
    ("bohemian rhapsody", "queen", "a night at the opera"),
    ("hotel california", "eagles", "hotel california"),
    ("purple rain", "prince", "purple rain"),
    ("smells like teen spirit", "nirvana", "nevermind"),
    ("billie jean", "michael jackson", "thriller"),
    ("like a rolling stone", "bob dylan", "highway 61 revisited"),
    ("imagine", "john lennon", "imagine"),
    ("hey jude", "the beatles", "past masters"),
    ("stairway to heaven", "led zeppelin", "led zeppelin iv"),
    ("good vibrations", "the beach boys", "smiley smile"),
    ("respect", "aretha franklin", "i never loved a man"),
    ("london calling", "the clash", "london calling"),
    ("waterloo sunset", "the kinks", "something else"),
    ("born to run", "bruce springsteen", "born to run"),
    ("superstition", "stevie wonder", "talking book"),
    ("wonderwall", "oasis", "morning glory"),
    ("one", "u2", "achtung baby"),
    ("losing my religion", "rem", "out of time"),
    ("heroes", "david bowie", "heroes"),
    ("my generation", "the who", "my generation"),
    ("dancing queen", "abba", "arrival"),
    ("sweet child o mine", "guns n roses", "appetite for destruction"),
    ("hotel california", "eagles", "hotel california"),
    ("let it be", "the beatles", "let it be"),
    ("blackbird", "alter bridge", "blackbird"),
    ("let it be", "the beatles", "let it be"),
    ("blackbird", "the beatles", "white album"),
    ("paint it black", "the rolling stones", "aftermath"),
    ("space oddity", "david bowie", "space oddity"),
    ("come together", "the beatles", "abbey road"),
    ("light my fire", "the doors", "the doors"),
];

fn songs() -> DataFrame {
    let titles: Vec<&str> = SONGS.iter().map(|song| song.0).collect();
    let artists: Vec<&str> = SONGS.iter().map(|song| song.1).collect();
    let albums: Vec<&str> = SONGS.iter().map(|song| song.2).collect();
    let numbers: Vec<i64> = (1..=32).collect();
    DataFrame::new(vec![
        Series::new("number".into(), numbers).into_column(),
        Series::new("title".into(), titles).into_column(),
        Series::new("artist".into(), artists).into_column(),
        Series::new("album".into(), albums).into_column(),
    ])
    .expect("fixture frame")
}

fn matcher(json: &str) -> EntityMatcher {
    let config = MatchConfig::from_json_str(json).expect("valid config");
    EntityMatcher::new(config).with_resource_policy(MemoryBudget::new(u64::MAX))
}

fn groups(labels: &GroupLabels) -> Vec<Vec<usize>> {
    labels.groups().into_values().collect()
}

struct OverBudget;

impl ResourcePolicy for OverBudget {
    fn exceeds_budget(&self, _record_count: usize, _item_size: usize) -> bool {
        true
    }
}

#[test]
fn title_only_without_blocking() {
    let resolution = matcher(r#"{"scoring": {"title": "fuzzy"}}"#)
        .resolve(&songs())
        .expect("resolve");

    assert_eq!(resolution.candidate_count, 32 * 31 / 2);
    assert_eq!(resolution.labels.len(), 32);
    assert_eq!(resolution.labels.labeled_count(), 6);
    insta::assert_json_snapshot!(groups(&resolution.labels), @r###"
    [
      [
        2,
        23
      ],
      [
        24,
        26
      ],
      [
        25,
        27
      ]
    ]
    "###);
}

#[test]
fn title_only_with_standard_purge() {
    let resolution = matcher(
        r#"{"blocking": {"operation": "standard", "process": "purge"},
            "scoring": {"title": "fuzzy"}}"#,
    )
    .resolve(&songs())
    .expect("resolve");

    assert_eq!(resolution.candidate_count, 3);
    assert_eq!(resolution.labels.labeled_count(), 6);
    assert_eq!(groups(&resolution.labels), vec![vec![2, 23], vec![24, 26], vec![25, 27]]);
}

#[test]
fn three_fields_with_blocking() {
    let resolution = matcher(
        r#"{"blocking": {"operation": "standard", "process": "purge"},
            "scoring": {"title": "fuzzy", "artist": "fuzzy", "album": "fuzzy"}}"#,
    )
    .resolve(&songs())
    .expect("resolve");

    assert_eq!(resolution.labels.labeled_count(), 4);
    insta::assert_json_snapshot!(groups(&resolution.labels), @r###"
    [
      [
        2,
        23
      ],
      [
        24,
        26
      ]
    ]
    "###);
    let same_title = resolution
        .matches
        .rows()
        .iter()
        .find(|row| row.pair.left() == 25);
    assert!(same_title.is_none(), "shared title alone must not match");
}

#[test]
fn token_and_sorted_neighborhood_find_the_same_duplicates() {
    for blocking in [
        r#"{"operation": "token", "process": "purge"}"#,
        r#"{"operation": "sorted_neighborhood", "window_size": 3}"#,
    ] {
        let json = format!(r#"{{"blocking": {blocking}, "scoring": {{"title": "fuzzy"}}}}"#);
        let resolution = matcher(&json).resolve(&songs()).expect("resolve");
        assert_eq!(
            groups(&resolution.labels),
            vec![vec![2, 23], vec![24, 26], vec![25, 27]],
            "{blocking}"
        );
    }
}

#[test]
fn exact_number_matches_nothing() {
    let labels = matcher(r#"{"scoring": {"number": "exact"}}"#)
        .get_matches(&songs())
        .expect("resolve");
    assert_eq!(labels.labeled_count(), 0);
}

#[test]
fn memory_pressure_applies_default_blocking() {
    let config = MatchConfig::from_json_str(r#"{"scoring": {"title": "fuzzy"}}"#).unwrap();
    let resolution = EntityMatcher::new(config)
        .with_resource_policy(OverBudget)
        .resolve(&songs())
        .expect("adaptation is not an error");

    assert!(resolution.blocking_adapted);
    assert_eq!(resolution.blocking.map(|b| b.to_string()).as_deref(), Some("standard+purge"));
    assert_eq!(resolution.candidate_count, 3);
    assert_eq!(resolution.labels.labeled_count(), 6);
}

#[test]
fn labels_attach_as_group_column() {
    let df = songs();
    let labels = matcher(r#"{"scoring": {"title": "fuzzy"}}"#)
        .get_matches(&df)
        .expect("resolve");
    let labeled = labels.attach(&df, em_core::DEFAULT_GROUP_COLUMN).expect("attach");
    assert_eq!(labeled.width(), df.width() + 1);
    assert_eq!(labeled.column("group").expect("group column").null_count(), 26);
}

#[test]
fn threshold_separates_near_duplicates() {
    let titles = ["something live", "something else", "penny lane", "blackbird", "come together"];
    let df = DataFrame::new(vec![Series::new("title".into(), titles.to_vec()).into_column()])
        .expect("fixture frame");

    let loose = matcher(r#"{"scoring": {"title": "fuzzy"}}"#)
        .with_threshold(0.64)
        .resolve(&df)
        .expect("resolve");
    assert_eq!(loose.match_count(), 1);
    assert_eq!(loose.labels.labeled_count(), 2);
    assert_eq!(groups(&loose.labels), vec![vec![0, 1]]);
    let score = loose.matches.rows()[0].aggregate;
    assert!(score > 0.64 && score < 0.70, "{score}");

    let strict = matcher(r#"{"scoring": {"title": "fuzzy"}}"#)
        .with_threshold(0.70)
        .get_matches(&df)
        .expect("resolve");
    assert_eq!(strict.labeled_count(), 0);
}
