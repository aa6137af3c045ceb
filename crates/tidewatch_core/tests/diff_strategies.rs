use std::sync::Once;

use pretty_assertions::assert_eq;
use tidewatch_core::{
    AppendMerge, AppendOnly, Appended, Changed, DiffError, DiffStrategy, LastWins, Payload, State,
    TEXT_HTML, TEXT_PLAIN,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(tidewatch_logging::initialize_for_tests);
}

#[derive(Debug, Clone, PartialEq)]
struct Strip {
    title: String,
    image: String,
}

#[derive(Debug, Clone, PartialEq)]
struct Strips(Vec<Strip>);

impl Payload for Strips {
    fn kind(&self) -> &'static str {
        "strips"
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn summary(&self, reaction: &str) -> String {
        format!("{} new strip(s) for {reaction}", self.0.len())
    }

    fn plain_text(&self) -> String {
        self.0
            .iter()
            .map(|strip| format!("{}: {}\n", strip.title, strip.image))
            .collect()
    }
}

impl AppendMerge for Strips {
    fn append_merge(previous: Option<&Self>, current: &Self) -> Result<Appended<Self>, DiffError> {
        let appended = Vec::<Strip>::append_merge(previous.map(|strips| &strips.0), &current.0)?;
        Ok(Appended {
            merged: Strips(appended.merged),
            fresh: Strips(appended.fresh),
            fresh_count: appended.fresh_count,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Hour {
    index: u32,
    temperature: i32,
    rain_probability: f64,
    description: String,
}

#[derive(Debug, Clone, PartialEq)]
struct Forecast {
    service: String,
    hours: Vec<Hour>,
}

impl Payload for Forecast {
    fn kind(&self) -> &'static str {
        "forecast"
    }

    fn is_empty(&self) -> bool {
        self.hours.is_empty()
    }

    fn plain_text(&self) -> String {
        format!("{} hours from {}", self.hours.len(), self.service)
    }
}

fn strip(n: usize) -> Strip {
    Strip {
        title: format!("Strip {n}"),
        image: format!("https://comics.example/{n}.png"),
    }
}

fn forty_strips() -> Vec<Strip> {
    (1..=40).map(strip).collect()
}

fn forecast() -> Forecast {
    Forecast {
        service: "example weather".to_string(),
        hours: (0..3)
            .map(|index| Hour {
                index,
                temperature: 10 + index as i32,
                rain_probability: 0.25,
                description: "cloudy".to_string(),
            })
            .collect(),
    }
}

#[test]
fn append_only_appends_single_new_strip_in_order() {
    init_logging();
    let previous = State::success(Strips(forty_strips()));
    let mut current = forty_strips();
    current.push(strip(41));

    let merged = AppendOnly
        .merge(&previous, State::success(Strips(current.clone())))
        .unwrap();

    assert!(merged.notify());
    assert_eq!(merged.state(), &State::success(Strips(current)));
    assert_eq!(merged.fresh(), Some(&Strips(vec![strip(41)])));
}

#[test]
fn append_only_unchanged_listing_does_not_notify() {
    init_logging();
    let previous = State::success(Strips(forty_strips()));

    let merged = AppendOnly
        .merge(&previous, State::success(Strips(forty_strips())))
        .unwrap();

    assert!(!merged.notify());
    assert_eq!(merged.state(), &previous);
    assert_eq!(merged.fresh(), None);
}

#[test]
fn append_only_never_drops_or_reorders_known_strips() {
    init_logging();
    let previous = State::success(Strips(vec![strip(1), strip(2), strip(3)]));
    // Upstream truncated strip 1 and moved strip 3 to the front.
    let current = Strips(vec![strip(3), strip(4), strip(2), strip(4)]);

    let merged = AppendOnly.merge(&previous, State::success(current)).unwrap();

    assert!(merged.notify());
    assert_eq!(
        merged.state(),
        &State::success(Strips(vec![strip(1), strip(2), strip(3), strip(4)]))
    );
    assert_eq!(merged.fresh(), Some(&Strips(vec![strip(4)])));
}

#[test]
fn append_only_without_previous_takes_everything_as_new() {
    init_logging();
    let merged = AppendOnly
        .merge(
            &State::unknown_failure(),
            State::success(Strips(vec![strip(1), strip(2)])),
        )
        .unwrap();

    assert!(merged.notify());
    assert_eq!(merged.fresh(), Some(&Strips(vec![strip(1), strip(2)])));
}

#[test]
fn append_only_passes_failure_through_without_notifying() {
    init_logging();
    let previous = State::success(Strips(forty_strips()));

    let merged = AppendOnly
        .merge(&previous, State::failure("upstream down"))
        .unwrap();

    assert!(!merged.notify());
    assert_eq!(merged.state().cause(), Some("upstream down"));
}

#[test]
fn changed_identical_snapshots_do_not_notify() {
    init_logging();
    let merged = Changed
        .merge(&State::success(forecast()), State::success(forecast()))
        .unwrap();

    assert!(!merged.notify());
    assert_eq!(merged.state(), &State::success(forecast()));
}

#[test]
fn changed_single_field_difference_notifies() {
    init_logging();
    let mut current = forecast();
    current.hours[1].temperature += 1;

    let merged = Changed
        .merge(&State::success(forecast()), State::success(current.clone()))
        .unwrap();

    assert!(merged.notify());
    assert_eq!(merged.state(), &State::success(current.clone()));
    assert_eq!(merged.fresh(), Some(&current));
}

#[test]
fn changed_without_previous_counts_as_different() {
    init_logging();
    let merged = Changed
        .merge(&State::unknown_failure(), State::success(forecast()))
        .unwrap();
    assert!(merged.notify());
}

#[test]
fn last_wins_replaces_and_always_notifies() {
    init_logging();
    let merged = LastWins
        .merge(&State::success(forecast()), State::success(forecast()))
        .unwrap();
    assert!(merged.notify());
    assert_eq!(merged.state(), &State::success(forecast()));

    let first_run = LastWins
        .merge(&State::unknown_failure(), State::success(forecast()))
        .unwrap();
    assert!(first_run.notify());
}

#[test]
fn render_uses_fresh_part_of_merge() {
    init_logging();
    let previous = State::success(Strips(vec![strip(1)]));
    let merged = AppendOnly
        .merge(&previous, State::success(Strips(vec![strip(1), strip(2)])))
        .unwrap();

    let output = AppendOnly.render("comics", &merged);

    assert_eq!(output.summary(), "1 new strip(s) for comics");
    assert_eq!(
        output.text(TEXT_PLAIN),
        Some("Strip 2: https://comics.example/2.png\n")
    );
    assert_eq!(
        output.text(TEXT_HTML),
        Some("<div>Strip 2: https://comics.example/2.png\n</div>")
    );
    assert_eq!(output.text("application/x-unknown"), None);
}
