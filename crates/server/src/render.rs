//! HTML projection of a review pass. Nothing here touches session state.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use session::{export::EXPORT_FILE_NAME, CompleteView, ReviewView, View};
use shared::domain::{image_mime, Rating};

#[derive(Debug, Clone)]
pub(crate) struct PageSettings {
    pub(crate) title: String,
    pub(crate) image_width: u32,
}

const STYLE: &str = r#"
    body {
        background-color: #b1dee9;
        font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
        margin: 0;
    }
    main {
        max-width: 760px;
        margin: 0 auto;
        padding: 24px;
    }
    .highlight-box {
        border: 2px solid;
        padding: 10px;
        margin: 10px 0;
        background-color: #FFFFFF;
        border-radius: 5px;
    }
    figure {
        text-align: center;
        margin: 16px 0;
    }
    .centered-image {
        display: block;
        margin-left: auto;
        margin-right: auto;
    }
    .choices {
        display: flex;
        gap: 16px;
    }
    .choices form {
        flex: 1;
    }
    button, .button {
        display: inline-block;
        padding: 8px 18px;
        border: 1px solid #31333f33;
        border-radius: 6px;
        background: #ffffff;
        color: #31333f;
        font-size: 16px;
        text-decoration: none;
        cursor: pointer;
    }
    button.selected {
        border-color: #ff4b4b;
        color: #ff4b4b;
        font-weight: 600;
    }
    .action {
        margin-top: 16px;
    }
    .error {
        background: #ffe4e4;
        border: 1px solid #ff4b4b;
        border-radius: 6px;
        padding: 12px 16px;
        color: #7d1a1a;
    }
    table {
        border-collapse: collapse;
        width: 100%;
        background: #ffffff;
        margin: 12px 0;
    }
    th, td {
        border: 1px solid #d0d7de;
        padding: 4px 8px;
        text-align: left;
    }
"#;

pub(crate) fn review_page(settings: &PageSettings, view: &View) -> String {
    let body = match view {
        View::Reviewing(review) => reviewing_body(settings, review),
        View::Complete(complete) => complete_body(complete),
    };
    layout(settings, &body)
}

pub(crate) fn error_page(settings: &PageSettings, message: &str) -> String {
    layout(
        settings,
        &format!(r#"<div class="error">{}</div>"#, escape_html(message)),
    )
}

fn layout(settings: &PageSettings, body: &str) -> String {
    let title = escape_html(&settings.title);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{STYLE}</style>
</head>
<body>
<main>
    <h1>{title}</h1>
    <hr>
{body}
</main>
</body>
</html>
"#
    )
}

fn reviewing_body(settings: &PageSettings, review: &ReviewView) -> String {
    let item = &review.item;
    let id = escape_html(item.id.as_str());
    let description = escape_html(&item.description);
    let image = STANDARD.encode(&review.image);
    let mime = image_mime(&review.image);
    let width = settings.image_width;

    let choice = |rating: Rating, label: &str, path: &str| {
        let class = if review.pending == Some(rating) {
            "choice selected"
        } else {
            "choice"
        };
        format!(
            r#"<form method="post" action="{path}"><button type="submit" class="{class}">{label}</button></form>"#
        )
    };
    let good = choice(Rating::Good, "Good 👍", "/actions/good");
    let bad = choice(Rating::Bad, "Bad 👎", "/actions/bad");

    // Submit and Skip are never offered together.
    let action = if review.pending.is_some() {
        r#"<form method="post" action="/actions/submit"><button type="submit">Submit</button></form>"#
    } else {
        r#"<form method="post" action="/actions/skip"><button type="submit">Skip</button></form>"#
    };

    format!(
        r#"    <figure>
        <img class="centered-image" src="data:{mime};base64,{image}" alt="{id}" width="{width}">
        <figcaption>{id}</figcaption>
    </figure>
    <p class="progress">Record {ordinal} of {remaining} unrated</p>
    <p><strong>Item:</strong> {id}</p>
    <p><strong>Description:</strong> {description}</p>
    <br>
    <h4>Please select your rating or skip</h4>
    <div class="choices">
        {good}
        {bad}
    </div>
    <div class="action">{action}</div>
    <br>
    <p>Rated Records: {rated}</p>
    <p>Skipped Records: {skipped}</p>"#,
        ordinal = review.position + 1,
        remaining = review.remaining,
        rated = review.rated,
        skipped = review.skipped,
    )
}

fn complete_body(complete: &CompleteView) -> String {
    let rows: String = complete
        .records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            format!(
                "            <tr><td>{index}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape_html(record.item.as_str()),
                escape_html(&record.description),
                record.rating,
                escape_html(&record.timestamp),
            )
        })
        .collect();

    format!(
        r#"    <h4>Selected records have been rated. Thank you!</h4>
    <p><strong>Total Rated Records:</strong> {rated}</p>
    <p><strong>Total Skipped Records:</strong> {skipped}</p>
    <table>
        <thead>
            <tr><th></th><th>item</th><th>Description</th><th>Rating</th><th>Timestamp</th></tr>
        </thead>
        <tbody>
{rows}        </tbody>
    </table>
    <a class="button" href="/ratings.csv" download="{EXPORT_FILE_NAME}">Download Ratings as CSV</a>"#,
        rated = complete.rated,
        skipped = complete.skipped,
    )
}

pub(crate) fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
