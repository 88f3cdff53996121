//! Unit tests for edition windows

use chrono::{Days, NaiveDate, TimeZone, Utc};
use wordle_harvester::edition::{epoch, latest_edition, EditionArg, SearchWindow};

#[test]
fn test_window_matches_epoch_offset_for_many_editions() {
    let first = NaiveDate::from_ymd_opt(2021, 6, 18).unwrap();
    assert_eq!(epoch(), first);

    for edition in (0u32..2000).step_by(7) {
        let window = SearchWindow::for_edition(edition);
        let expected_start = first + Days::new(u64::from(edition));
        assert_eq!(window.start(), expected_start, "edition {edition}");
        assert_eq!(window.end(), expected_start + Days::new(3), "edition {edition}");
        assert_eq!(window.edition(), edition);
    }
}

#[test]
fn test_latest_edition_window_has_closed() {
    let now = Utc.with_ymd_and_hms(2023, 1, 15, 9, 0, 0).unwrap();
    let latest = latest_edition(now).unwrap();

    assert!(!SearchWindow::for_edition(latest).is_too_early(now));
    assert!(SearchWindow::for_edition(latest + 1).is_too_early(now));
}

#[test]
fn test_edition_arg_resolution() {
    let now = Utc.with_ymd_and_hms(2022, 2, 27, 12, 0, 0).unwrap();
    assert_eq!("250".parse::<EditionArg>().unwrap().resolve(now).unwrap(), 250);
    assert_eq!("latest".parse::<EditionArg>().unwrap().resolve(now).unwrap(), 251);
    assert!("yesterday".parse::<EditionArg>().is_err());
}

#[test]
fn test_search_phrase_names_window() {
    let phrase = SearchWindow::for_edition(250).search_phrase();
    assert!(phrase.contains("\"wordle 250\""));
    assert!(phrase.contains("since:2022-02-23"));
    assert!(phrase.contains("until:2022-02-26"));
    assert!(phrase.contains("-filter:retweets"));
}
