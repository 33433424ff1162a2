use std::collections::BTreeMap;
use std::path::PathBuf;

use bet_store::{next_push_id, Bet, BetStore, DeleteMatcher, JsonFileStore, NewBet, StoreError};
use serde_json::json;

fn temp_path(tag: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("bet-store-{tag}-{}", next_push_id()))
        .join("bets.json")
}

fn new_bet(selection: &str, created_at: i64) -> Bet {
    let nb: NewBet = serde_json::from_value(json!({
        "sport": "NFL",
        "category": "Awards",
        "market": "MVP",
        "selection": selection,
        "odds_american": "+450",
        "book": "FD"
    }))
    .unwrap();
    nb.into_bet(next_push_id(), created_at).unwrap()
}

#[tokio::test]
async fn insert_prepends_to_bucket() {
    let store = JsonFileStore::new(temp_path("prepend"), 100);

    let first = store.insert(new_bet("Josh Allen", 1)).await.unwrap();
    let second = store.insert(new_bet("Patrick Mahomes", 2)).await.unwrap();
    assert_eq!(first.evicted, 0);
    assert_eq!(second.evicted, 0);

    let book = store.load().await.unwrap();
    let bucket = book.bucket("NFL", "Awards").unwrap();
    assert_eq!(bucket.len(), 2);
    assert_eq!(bucket[0], second.bet);
    assert_eq!(bucket[1], first.bet);
}

#[tokio::test]
async fn bucket_is_capped() {
    let store = JsonFileStore::new(temp_path("cap"), 3);

    let mut evicted = 0;
    for i in 0..5 {
        evicted += store.insert(new_bet(&format!("Player {i}"), i)).await.unwrap().evicted;
    }
    assert_eq!(evicted, 2);

    let book = store.load().await.unwrap();
    let bucket = book.bucket("NFL", "Awards").unwrap();
    assert_eq!(bucket.len(), 3);
    assert_eq!(bucket[0].selection, "Player 4");
    assert_eq!(bucket[2].selection, "Player 2");
}

#[tokio::test]
async fn remove_by_id_is_idempotent() {
    let store = JsonFileStore::new(temp_path("idem"), 100);
    let kept = store.insert(new_bet("Keep", 1)).await.unwrap().bet;
    let gone = store.insert(new_bet("Drop", 2)).await.unwrap().bet;

    let m = DeleteMatcher::ById(gone.id.clone());
    assert_eq!(store.remove("NFL", "Awards", &m).await.unwrap(), 1);
    assert_eq!(store.remove("NFL", "Awards", &m).await.unwrap(), 0);

    let book = store.load().await.unwrap();
    assert_eq!(book.bucket("NFL", "Awards").unwrap(), &[kept][..]);
}

#[tokio::test]
async fn zero_match_leaves_file_untouched() {
    let path = temp_path("nomatch");
    let store = JsonFileStore::new(path.clone(), 100);
    store.insert(new_bet("Keep", 1)).await.unwrap();
    let before = std::fs::read_to_string(&path).unwrap();

    let fields: BTreeMap<String, String> =
        [("selection".to_string(), "Nobody".to_string())].into_iter().collect();
    let removed = store
        .remove("NFL", "Awards", &DeleteMatcher::ByFields(fields))
        .await
        .unwrap();
    assert_eq!(removed, 0);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[tokio::test]
async fn unknown_bucket_is_reported() {
    let store = JsonFileStore::new(temp_path("bucket"), 100);
    store.insert(new_bet("Someone", 1)).await.unwrap();

    let err = store
        .remove("NBA", "Props", &DeleteMatcher::ById("x".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::BucketNotFound { .. }));
}

#[tokio::test]
async fn missing_file_loads_empty() {
    let store = JsonFileStore::new(temp_path("missing"), 100);
    assert_eq!(store.load().await.unwrap().total(), 0);
}

#[tokio::test]
async fn legacy_file_is_read_and_deletable_by_fields() {
    let path = temp_path("legacy");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(
        &path,
        serde_json::to_string_pretty(&json!({
            "NFL": {
                "MVP": [
                    {"type": "Awards", "player": "Lamar Jackson", "odds": "600", "site": "DK",
                     "date": "2025-08-02T00:00:00.000Z"},
                    {"type": "Awards", "player": "Joe Burrow", "odds": "+800", "site": "FD",
                     "date": "2025-08-01T00:00:00.000Z"}
                ]
            }
        }))
        .unwrap(),
    )
    .unwrap();

    let store = JsonFileStore::new(path, 100);
    let book = store.load().await.unwrap();
    let bucket = book.bucket("NFL", "MVP").unwrap();
    assert_eq!(bucket[0].selection, "Lamar Jackson");
    assert_eq!(bucket[0].odds_american, "+600");
    assert_eq!(bucket[1].book, "FD");

    let fields: BTreeMap<String, String> = [
        ("player".to_string(), "Joe Burrow".to_string()),
        ("date".to_string(), "2025-08-01T00:00:00.000Z".to_string()),
    ]
    .into_iter()
    .collect();
    let removed = store
        .remove("NFL", "MVP", &DeleteMatcher::ByFields(fields))
        .await
        .unwrap();
    assert_eq!(removed, 1);
    assert_eq!(store.load().await.unwrap().bucket("NFL", "MVP").unwrap().len(), 1);
}
