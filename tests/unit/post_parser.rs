//! Unit tests for PostParser

use wordle_harvester::fetcher::response::PostAuthor;
use wordle_harvester::fetcher::RawPost;
use wordle_harvester::{PostParser, RejectReason, Rounds, Theme};

const DARK_MISS: &str = "⬛";
const LIGHT_MISS: &str = "⬜";
const PRESENT: &str = "🟨";
const PRESENT_CB: &str = "🟦";
const CORRECT: &str = "🟩";
const CORRECT_CB: &str = "🟧";

/// Build one grid row from canonical letters
fn row(letters: &str, palette: (&str, &str, &str)) -> String {
    letters
        .chars()
        .map(|c| match c {
            'A' => palette.0,
            'B' => palette.1,
            _ => palette.2,
        })
        .collect()
}

fn dark_row(letters: &str) -> String {
    row(letters, (DARK_MISS, PRESENT, CORRECT))
}

fn grid(rows: &[&str]) -> String {
    rows.iter()
        .map(|r| dark_row(r))
        .collect::<Vec<_>>()
        .join("\n")
}

fn create_post(text: &str) -> RawPost {
    RawPost {
        id: 1_496_100_000_000_000_001,
        created_at: "Thu Feb 24 18:30:05 +0000 2022".to_string(),
        user: PostAuthor { id: 31337 },
        source: "<a href=\"http://twitter.com/download/android\" rel=\"nofollow\">Twitter for Android</a>"
            .to_string(),
        in_reply_to_user_id: Some(4),
        is_quote_status: false,
        retweet_count: 0,
        quote_count: Some(0),
        favorite_count: 1,
        reply_count: Some(0),
        lang: "en".to_string(),
        text: text.to_string(),
    }
}

#[test]
fn test_three_round_win() {
    let text = format!("Wordle 250 3/6\n\n{}", grid(&["AAAAA", "BBBBB", "CCCCC"]));
    let record = PostParser::parse(&create_post(&text), 250).unwrap();

    assert_eq!(record.rounds, Rounds::Solved(3));
    assert_eq!(record.rounds.to_string(), "3");
    assert!(record.win);
    assert!(!record.hard_mode);
    assert_eq!(record.matrix, "AAAAABBBBBCCCCC");
    assert_eq!(record.theme, Theme::Dark);
    assert!(!record.colorblind);
    assert!(record.is_reply);
    assert_eq!(record.surface.index(), 2);
}

#[test]
fn test_hard_mode_marker() {
    let text = format!("Wordle 250 2/6*\n{}", grid(&["ABAAA", "CCCCC"]));
    let record = PostParser::parse(&create_post(&text), 250).unwrap();
    assert!(record.hard_mode);
    assert_eq!(record.rounds, Rounds::Solved(2));
}

#[test]
fn test_interior_win_rejected_regardless_of_final_row() {
    // Winning row at position 2 of 4, final row also a win
    let text = format!("Wordle 250 4/6\n{}", grid(&["AAAAA", "CCCCC", "BBBBB", "CCCCC"]));
    assert_eq!(
        PostParser::parse(&create_post(&text), 250),
        Err(RejectReason::InteriorWin)
    );

    // Same, final row not a win
    let text = format!("Wordle 250 4/6\n{}", grid(&["AAAAA", "CCCCC", "BBBBB", "ABABA"]));
    assert_eq!(
        PostParser::parse(&create_post(&text), 250),
        Err(RejectReason::InteriorWin)
    );
}

#[test]
fn test_six_round_loss_rewritten_to_x() {
    let rows = ["AAAAA", "BAAAA", "BBAAA", "BBBAA", "BBBBA", "BBBBB"];
    let text = format!("Wordle 250 6/6\n{}", grid(&rows));
    let record = PostParser::parse(&create_post(&text), 250).unwrap();

    assert_eq!(record.rounds, Rounds::Failed);
    assert_eq!(record.rounds.to_string(), "X");
    assert!(!record.win);
    assert_eq!(record.matrix.len(), 30);
}

#[test]
fn test_x_announcement_loss() {
    let rows = ["AAAAA", "AAAAA", "AAAAA", "AAAAA", "AAAAA", "ABBBA"];
    for symbol in ["X", "x"] {
        let text = format!("Wordle 250 {symbol}/6\n{}", grid(&rows));
        let record = PostParser::parse(&create_post(&text), 250).unwrap();
        assert_eq!(record.rounds, Rounds::Failed);
        assert!(!record.win);
    }
}

#[test]
fn test_colorblind_win_is_forced() {
    let palette = (LIGHT_MISS, PRESENT_CB, CORRECT_CB);
    let text = format!(
        "Wordle 250 2/6\n{}\n{}",
        row("ABAAA", palette),
        row("CCCCC", palette)
    );
    let record = PostParser::parse(&create_post(&text), 250).unwrap();

    assert!(record.colorblind);
    assert!(record.win);
    assert_eq!(record.theme, Theme::Light);
    assert_eq!(record.matrix, "ABAAACCCCC");
}

#[test]
fn test_theme_unknown_without_misses() {
    let text = format!("Wordle 250 2/6\n{}", grid(&["BBBBB", "CCCCC"]));
    let record = PostParser::parse(&create_post(&text), 250).unwrap();
    assert_eq!(record.theme, Theme::Unknown);
}

#[test]
fn test_single_row_win_is_valid() {
    let text = format!("Wordle 250 1/6\n{}", grid(&["CCCCC"]));
    let record = PostParser::parse(&create_post(&text), 250).unwrap();
    assert_eq!(record.matrix, "CCCCC");
    assert_eq!(record.rounds, Rounds::Solved(1));
}

#[test]
fn test_rejections() {
    let cases = [
        ("no puzzle here", RejectReason::NoAnnouncement),
        (
            "Wordle 249 1/6\n🟩🟩🟩🟩🟩",
            RejectReason::WrongEdition { found: Some(249) },
        ),
        ("Wordle 250 1/6 no grid", RejectReason::GridRowCount(0)),
        ("Wordle 250 1/6\n🟩🟩🟩🟩🟩🟩", RejectReason::GridRowWidth),
        ("Wordle 250 3/6\n⬛⬛⬛⬛⬛\n🟩🟩🟩🟩🟩", RejectReason::SizeMismatch),
        ("Wordle 250 2/6\n⬛⬛⬛⬛⬛\n🟨🟩🟩🟩🟩", RejectReason::WinRoundMismatch),
    ];

    for (text, expected) in cases {
        assert_eq!(
            PostParser::parse(&create_post(text), 250),
            Err(expected),
            "text: {text}"
        );
    }
}

#[test]
fn test_seven_rows_rejected() {
    let rows = ["AAAAA"; 7];
    let text = format!("Wordle 250 6/6\n{}", grid(&rows));
    assert_eq!(
        PostParser::parse(&create_post(&text), 250),
        Err(RejectReason::GridRowCount(7))
    );
}

#[test]
fn test_parse_is_idempotent() {
    let text = format!("Wordle 250 3/6*\n{}", grid(&["ABABA", "BBCCA", "CCCCC"]));
    let post = create_post(&text);
    let first = PostParser::parse(&post, 250).unwrap();
    let second = PostParser::parse(&post, 250).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_every_accepted_record_validates() {
    let texts = [
        format!("Wordle 250 1/6\n{}", grid(&["CCCCC"])),
        format!("Wordle 250 4/6\n{}", grid(&["AAAAA", "ABAAA", "BBAAC", "CCCCC"])),
        format!("Wordle 250 X/6\n{}", grid(&["AAAAA"; 6])),
    ];
    for text in &texts {
        let record = PostParser::parse(&create_post(text), 250).unwrap();
        assert!(record.validate().is_ok(), "text: {text}");
    }
}
