use super::*;

use shared::domain::{Item, ItemId, RatingRecord};

fn settings() -> PageSettings {
    PageSettings {
        title: "SEO Content Review".to_string(),
        image_width: 300,
    }
}

fn reviewing(pending: Option<Rating>) -> View {
    View::Reviewing(ReviewView {
        item: Item {
            id: ItemId::from("item-1"),
            description: "A <b>bold</b> claim".to_string(),
            image: String::new(),
        },
        image: b"\x89PNG\r\n\x1a\nrest".to_vec(),
        pending,
        rated: 3,
        skipped: 1,
        position: 1,
        remaining: 5,
    })
}

#[test]
fn unrated_item_offers_skip_only() {
    let html = review_page(&settings(), &reviewing(None));
    assert!(html.contains(r#"action="/actions/skip""#));
    assert!(!html.contains(r#"action="/actions/submit""#));
    assert!(!html.contains("choice selected"));
}

#[test]
fn pending_choice_offers_submit_only_and_marks_the_choice() {
    let html = review_page(&settings(), &reviewing(Some(Rating::Bad)));
    assert!(html.contains(r#"action="/actions/submit""#));
    assert!(!html.contains(r#"action="/actions/skip""#));
    assert!(html.contains(r#"class="choice selected">Bad 👎"#));
    assert!(html.contains(r#"class="choice">Good 👍"#));
}

#[test]
fn item_details_and_counters_are_rendered() {
    let html = review_page(&settings(), &reviewing(None));
    assert!(html.contains("<title>SEO Content Review</title>"));
    assert!(html.contains(r#"src="data:image/png;base64,"#));
    assert!(html.contains(r#"width="300""#));
    assert!(html.contains("<figcaption>item-1</figcaption>"));
    assert!(html.contains("<strong>Item:</strong> item-1"));
    assert!(html.contains("<strong>Description:</strong> A &lt;b&gt;bold&lt;/b&gt; claim"));
    assert!(html.contains("Record 2 of 5 unrated"));
    assert!(html.contains("Rated Records: 3"));
    assert!(html.contains("Skipped Records: 1"));
}

#[test]
fn completion_page_lists_records_and_download_link() {
    let view = View::Complete(CompleteView {
        records: vec![RatingRecord {
            item: ItemId::from("x"),
            description: "d".to_string(),
            rating: Rating::Good,
            timestamp: "2024-01-01 00:00:00".to_string(),
        }],
        rated: 1,
        skipped: 2,
    });
    let html = review_page(&settings(), &view);

    assert!(html.contains("Selected records have been rated. Thank you!"));
    assert!(html.contains("<strong>Total Rated Records:</strong> 1"));
    assert!(html.contains("<strong>Total Skipped Records:</strong> 2"));
    assert!(html.contains(
        "<tr><td>0</td><td>x</td><td>d</td><td>Good</td><td>2024-01-01 00:00:00</td></tr>"
    ));
    assert!(html.contains(r#"href="/ratings.csv" download="ratings.csv""#));
    assert!(!html.contains("/actions/"));
}

#[test]
fn error_page_escapes_message() {
    let html = error_page(&settings(), "The file at path `<data.csv>` was not found.");
    assert!(html.contains("`&lt;data.csv&gt;`"));
}

#[test]
fn escapes_markup_characters() {
    assert_eq!(
        escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
        "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
    );
}
