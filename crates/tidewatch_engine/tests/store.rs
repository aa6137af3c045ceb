use std::fs;

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tidewatch_core::State;
use tidewatch_engine::{
    ensure_output_dir, state_key, AtomicFileWriter, Comic, Content, HourForecast, JsonFileStore,
    MemoryStore, StateStore, StoreError, StoredState, Strip, TorrentFile, WeatherSnapshot,
    WindDirection,
};

fn comics() -> State<Content> {
    State::success(Content::Comics(vec![Comic::new(
        "Strip 1",
        vec![Strip::new(
            "https://c.example/1.png",
            Some("alt text".into()),
        )],
    )]))
}

fn stored(state: State<Content>, fail_count: u32) -> StoredState<Content> {
    let updated_at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    StoredState::new(state, updated_at, fail_count)
}

#[test]
fn json_store_round_trips_success() {
    let temp = TempDir::new().unwrap();
    let store = JsonFileStore::new(temp.path());
    let saved = stored(comics(), 0);

    store.save("daily comic", &saved).unwrap();

    let last: Option<StoredState<Content>> = store.load_last("daily comic").unwrap();
    let success: Option<StoredState<Content>> = store.load_last_success("daily comic").unwrap();
    assert_eq!(last, Some(saved.clone()));
    assert_eq!(success, Some(saved));
}

fn weather(temperature: f64) -> State<Content> {
    let hour = |index: u32, temperature: f64| HourForecast {
        hour_index: index,
        temperature,
        felt_temperature: Some(temperature - 1.0 / 3.0),
        rain_probability: 0.1 + 0.2,
        rain_amount: temperature / 7.0,
        wind_direction: WindDirection::from_degrees(temperature * 11.0),
        wind_speed: temperature.abs().sqrt(),
        gust_speed: None,
        humidity: Some(0.6666666666666666),
        description: "Cloudy".to_string(),
        image: None,
    };
    State::success(Content::Weather(WeatherSnapshot {
        service: "yr.no".to_string(),
        date_time: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        hours: vec![hour(0, temperature), hour(1, -temperature / 3.0)],
    }))
}

#[test]
fn json_store_round_trips_weather_floats_exactly() {
    let temp = TempDir::new().unwrap();
    let store = JsonFileStore::new(temp.path());

    let mut temperature = 18.926758544961622;
    for _ in 0..500 {
        let saved = stored(weather(temperature), 0);
        store.save("forecast", &saved).unwrap();

        let loaded: Option<StoredState<Content>> = store.load_last("forecast").unwrap();
        assert_eq!(loaded, Some(saved), "temperature {temperature:?}");
        temperature = (temperature * 1.618033988749895 + 0.7071067811865476) % 40.0 - 10.0;
    }
}

#[test]
fn failures_replace_last_but_keep_last_success() {
    let temp = TempDir::new().unwrap();
    let store = JsonFileStore::new(temp.path());
    let good = stored(comics(), 0);
    let bad = stored(State::failure("http status 503"), 1);

    store.save("daily comic", &good).unwrap();
    store.save("daily comic", &bad).unwrap();

    let last: Option<StoredState<Content>> = store.load_last("daily comic").unwrap();
    let success: Option<StoredState<Content>> = store.load_last_success("daily comic").unwrap();
    assert_eq!(last, Some(bad));
    assert_eq!(success, Some(good));
}

#[test]
fn files_are_named_after_state_key() {
    let temp = TempDir::new().unwrap();
    let store = JsonFileStore::new(temp.path());
    store.save("torrents/show", &stored(State::failure("x"), 1)).unwrap();

    let key = state_key("torrents/show");
    assert!(temp.path().join(format!("{key}.last.json")).is_file());
    assert!(!temp.path().join(format!("{key}.success.json")).exists());
}

#[test]
fn unknown_reaction_has_no_state() {
    let temp = TempDir::new().unwrap();
    let store = JsonFileStore::new(temp.path());
    let last: Option<StoredState<Content>> = store.load_last("never ran").unwrap();
    assert_eq!(last, None);
}

#[test]
fn corrupt_state_file_is_reported() {
    let temp = TempDir::new().unwrap();
    let store = JsonFileStore::new(temp.path());
    let key = state_key("broken");
    fs::write(temp.path().join(format!("{key}.last.json")), "{not json").unwrap();

    let result: Result<Option<StoredState<Content>>, StoreError> = store.load_last("broken");

    assert!(matches!(result, Err(StoreError::Corrupt { .. })));
}

#[test]
fn persisted_json_keeps_tagged_layout() {
    let temp = TempDir::new().unwrap();
    let store = JsonFileStore::new(temp.path());
    let state = State::success(Content::Torrents(vec![TorrentFile::new("a", "1 MB")]));
    store.save("t", &stored(state, 0)).unwrap();

    let raw = fs::read_to_string(temp.path().join(format!("{}.last.json", state_key("t")))).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert_eq!(json["state"]["status"], "success");
    assert_eq!(json["state"]["payload"]["kind"], "torrents");
    assert_eq!(json["state"]["payload"]["data"][0]["size"], "1 MB");
    assert_eq!(json["fail_count"], 0);
}

#[test]
fn memory_store_follows_same_contract() {
    let store = MemoryStore::<Content>::new();
    let good = stored(comics(), 0);
    let bad = stored(State::failure("down"), 1);

    store.save("r", &good).unwrap();
    store.save("r", &bad).unwrap();

    assert_eq!(store.load_last("r").unwrap(), Some(bad));
    assert_eq!(store.load_last_success("r").unwrap(), Some(good));
    assert_eq!(store.load_last("other").unwrap(), None);
}

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("state").join("nested");
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing_file() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path());

    let first = writer.write("state.json", b"hello").unwrap();
    let second = writer.write("state.json", b"world").unwrap();

    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "world");
    assert_eq!(writer.read("state.json").unwrap(), Some(b"world".to_vec()));
    assert_eq!(writer.read("missing.json").unwrap(), None);
}

#[test]
fn writing_into_a_file_path_fails_without_partial_output() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());

    assert!(writer.write("state.json", b"data").is_err());
    assert!(!temp.path().join("state.json").exists());
}
