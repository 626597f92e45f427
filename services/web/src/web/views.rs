//! services/web/src/web/views.rs
//!
//! Server-side HTML for the screens. Every function returns a complete document
//! wrapped in the navigation shell, except the login page, which has no navigation.

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use nebulearn_core::calendar::{session_for, CalendarWindow, ProgressSummary};
use nebulearn_core::domain::{Deck, DeckStatus, Page, StudySession, User};
use std::fmt::Write;

const STYLE: &str = r#"
body { margin: 0; background: #0a0a0a; color: #fff; font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; }
.container { max-width: 1200px; margin: 0 auto; padding: 20px; }
.nav { display: flex; align-items: center; justify-content: space-between; padding: 10px 0 30px; }
.logo { font-size: 1.6rem; font-weight: bold; color: #e1bee7; }
.nav-links { display: flex; gap: 20px; align-items: center; }
.nav-link { color: #bbb; text-decoration: none; }
.nav-link.active { color: #7c4dff; font-weight: 600; }
.nav-links form { margin: 0; }
button, .btn { background: #7c4dff; color: #fff; border: 0; border-radius: 8px; padding: 8px 16px; cursor: pointer; text-decoration: none; font: inherit; }
.intro { text-align: center; padding: 120px 0; }
.main-title { font-size: 4rem; color: #e1bee7; margin: 0; }
.subtitle { color: #bbb; margin-bottom: 40px; }
.main-buttons { display: flex; gap: 20px; justify-content: center; }
.notice { background: rgba(124, 77, 255, 0.15); border: 1px solid #7c4dff; border-radius: 10px; padding: 12px 16px; margin-bottom: 20px; }
.error { color: #f44336; }
.decks-header { display: flex; justify-content: space-between; align-items: center; gap: 10px; }
.decks-grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(280px, 1fr)); gap: 20px; }
.deck-card { background: rgba(255, 255, 255, 0.05); border-radius: 15px; padding: 20px; position: relative; }
.deck-difficulty { display: inline-block; padding: 2px 10px; border-radius: 10px; font-size: 0.8rem; }
.difficulty-easy { background: #4caf50; } .difficulty-medium { background: #ff9800; } .difficulty-hard { background: #f44336; }
.deck-stats { display: flex; gap: 15px; color: #bbb; margin: 10px 0; }
.status { position: absolute; top: 20px; right: 20px; width: 14px; height: 14px; border-radius: 50%; }
.status-green { background: #4caf50; } .status-orange { background: #ff9800; } .status-red { background: #f44336; }
.legend { display: flex; gap: 20px; justify-content: center; font-size: 0.9rem; margin-bottom: 20px; }
.calendar { background: rgba(255, 255, 255, 0.05); border-radius: 20px; padding: 30px; overflow-x: auto; }
.calendar th { color: #bbb; font-size: 0.75rem; font-weight: 500; }
.calendar td.deck-name { width: 180px; padding-right: 20px; }
.calendar form { margin: 0; text-align: center; }
.dot { width: 20px; height: 20px; border-radius: 50%; padding: 0; background: rgba(255, 255, 255, 0.1); opacity: 0.6; }
.dot.hard { background: #f44336; opacity: 1; } .dot.medium { background: #ff9800; opacity: 1; } .dot.easy { background: #4caf50; opacity: 1; }
.summary { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 20px; margin-top: 30px; }
.figure { background: rgba(255, 255, 255, 0.05); border-radius: 15px; padding: 20px; text-align: center; }
.figure-value { font-size: 2rem; font-weight: bold; color: #7c4dff; }
.figure-label { color: #bbb; margin-top: 5px; }
"#;

fn document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n<div class=\"container\">\n{}\n</div>\n</body>\n</html>\n",
        text(title),
        STYLE,
        body
    )
}

/// Wraps `content` in the navigation shell with `active` highlighted.
fn shell(active: Page, user: &User, content: &str) -> String {
    let mut nav = String::from("<nav class=\"nav\">\n<div class=\"logo\">NebuLearn</div>\n<div class=\"nav-links\">\n");
    for (page, label) in [(Page::Home, "Home"), (Page::Decks, "Decks"), (Page::Progress, "Progress")] {
        let class = if page == active { "nav-link active" } else { "nav-link" };
        let _ = writeln!(nav, "<a class=\"{}\" href=\"{}\">{}</a>", class, page.path(), label);
    }
    let _ = write!(
        nav,
        "<span class=\"nav-link\">{}</span>\n\
         <form method=\"post\" action=\"/logout\"><button type=\"submit\">Log out</button></form>\n</div>\n</nav>\n",
        text(&user.username)
    );

    let title = match active {
        Page::Home => "NebuLearn",
        Page::Decks => "Study Decks - NebuLearn",
        Page::Progress => "Study Progress - NebuLearn",
    };
    document(title, &format!("{}<main class=\"main-content\">\n{}</main>", nav, content))
}

//=========================================================================================
// Screens
//=========================================================================================

pub fn login_page(error: Option<&str>, username: &str) -> String {
    let error_html = error
        .map(|e| format!("<p class=\"error\">{}</p>\n", text(e)))
        .unwrap_or_default();
    let body = format!(
        "<div class=\"intro\">\n<h1 class=\"main-title\">NebuLearn</h1>\n<p class=\"subtitle\">Sign in to continue</p>\n{}\
         <form method=\"post\" action=\"/login\">\n\
         <p><input name=\"username\" placeholder=\"Username\" value=\"{}\" autofocus></p>\n\
         <p><input name=\"password\" type=\"password\" placeholder=\"Password\"></p>\n\
         <p><button type=\"submit\">Log in</button></p>\n</form>\n</div>",
        error_html,
        attr(username)
    );
    document("Log in - NebuLearn", &body)
}

pub fn home_page(user: &User) -> String {
    let content = "<div class=\"intro\">\n<h1 class=\"main-title\">NebuLearn</h1>\n\
                   <p class=\"subtitle\">Expand your mind</p>\n<div class=\"main-buttons\">\n\
                   <a class=\"btn\" href=\"/decks\">📚 Explore Decks</a>\n\
                   <a class=\"btn\" href=\"/progress\">📊 Check Progress</a>\n</div>\n</div>\n";
    shell(Page::Home, user, content)
}

pub fn decks_page(
    user: &User,
    decks: &[Deck],
    statuses: &[DeckStatus],
    notice: Option<&str>,
) -> String {
    let mut content = String::new();
    if let Some(notice) = notice {
        let _ = writeln!(content, "<div class=\"notice\">{}</div>", text(notice));
    }
    content.push_str(
        "<div class=\"decks-header\">\n<h2 class=\"page-title\">Study Decks</h2>\n<div>\n\
         <form method=\"post\" action=\"/decks/statuses\" style=\"display:inline\"><button type=\"submit\">Refresh status</button></form>\n\
         <a class=\"btn\" href=\"/decks?notice=upload\">➕ Upload New Deck</a>\n</div>\n</div>\n\
         <div class=\"decks-grid\">\n",
    );

    for deck in decks {
        let status_html = statuses
            .iter()
            .find(|s| s.deck_id == deck.id)
            .map(|s| {
                format!(
                    "<span class=\"status status-{}\" title=\"{}% average success\"></span>",
                    s.status.as_str(),
                    s.success_rate.round()
                )
            })
            .unwrap_or_default();
        let _ = write!(
            content,
            "<div class=\"deck-card {difficulty}\">{status}\n\
             <div class=\"deck-difficulty difficulty-{difficulty}\">{label}</div>\n\
             <h3 class=\"deck-title\">{name}</h3>\n<p class=\"deck-description\">{description}</p>\n\
             <div class=\"deck-stats\"><span>{total} cards</span><span>{due} due</span></div>\n\
             <a class=\"btn study-btn\" href=\"/decks?notice=study&amp;deck={id}\">Study Now</a>\n</div>\n",
            difficulty = deck.difficulty.as_str(),
            status = status_html,
            label = deck.difficulty.label(),
            name = text(&deck.name),
            description = text(&deck.description),
            total = deck.total_cards,
            due = deck.due_cards,
            id = attr(&deck.id),
        );
    }
    content.push_str("</div>\n");
    shell(Page::Decks, user, &content)
}

/// Tooltip for a calendar cell.
pub fn cell_title(date: chrono::NaiveDate, session: Option<&StudySession>) -> String {
    match session {
        Some(s) => format!(
            "{} - {} session ({}% success, {} cards)",
            date,
            s.difficulty.as_str().to_uppercase(),
            s.success_rate,
            s.cards_studied
        ),
        None => format!("Click to add study session for {}", date),
    }
}

pub fn progress_page(
    user: &User,
    decks: &[Deck],
    sessions: &[StudySession],
    window: &CalendarWindow,
) -> String {
    let dates = window.dates();
    let summary = ProgressSummary::compute(decks, sessions);

    let mut content = String::from(
        "<h2 class=\"page-title\">Study Progress</h2>\n<h3>Interactive Study Calendar</h3>\n\
         <p>Click on any date to add a study session. Click again to cycle through difficulty levels.</p>\n\
         <div class=\"legend\">\n\
         <span><button class=\"dot hard\" disabled></button> Hard (Just Started)</span>\n\
         <span><button class=\"dot medium\" disabled></button> Medium (Getting Better)</span>\n\
         <span><button class=\"dot easy\" disabled></button> Easy (Mastered)</span>\n</div>\n\
         <div class=\"calendar\">\n<table>\n<tr><th>Deck</th>",
    );
    for date in &dates {
        let _ = write!(content, "<th>{}</th>", CalendarWindow::label(*date));
    }
    content.push_str("</tr>\n");

    for deck in decks {
        let _ = write!(content, "<tr><td class=\"deck-name\">{}</td>", text(&deck.name));
        for date in &dates {
            let session = session_for(sessions, &deck.id, *date);
            let class = session
                .map(|s| s.difficulty.as_str())
                .unwrap_or("empty");
            let _ = write!(
                content,
                "<td><form method=\"post\" action=\"/progress/toggle\">\
                 <input type=\"hidden\" name=\"deck_id\" value=\"{}\">\
                 <input type=\"hidden\" name=\"date\" value=\"{}\">\
                 <button type=\"submit\" class=\"dot {}\" title=\"{}\"></button></form></td>",
                attr(&deck.id),
                date,
                class,
                attr(&cell_title(*date, session))
            );
        }
        content.push_str("</tr>\n");
    }
    content.push_str("</table>\n</div>\n");

    let _ = write!(
        content,
        "<div class=\"summary\">\n{}{}{}{}</div>\n",
        figure(&summary.total_sessions.to_string(), "Total Sessions"),
        figure(&summary.active_decks.to_string(), "Active Decks"),
        figure(&format!("{}%", summary.average_success_rate), "Avg Success Rate"),
        figure(&summary.total_cards.to_string(), "Total Cards"),
    );
    shell(Page::Progress, user, &content)
}

fn figure(value: &str, label: &str) -> String {
    format!(
        "<div class=\"figure\"><div class=\"figure-value\">{}</div><div class=\"figure-label\">{}</div></div>\n",
        value, label
    )
}

/// Placeholder text for gallery actions that have no implementation.
pub fn deck_notice(kind: &str, deck_id: Option<&str>) -> Option<String> {
    match (kind, deck_id) {
        ("upload", _) => Some("Deck upload is not available yet.".to_string()),
        ("study", Some(id)) => Some(format!("Study sessions for deck {} are not available yet.", id)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::seed::seed_snapshot;
    use chrono::{NaiveDate, Utc};
    use nebulearn_core::domain::{Difficulty, StatusLevel};

    fn user() -> User {
        User {
            id: "user1".to_string(),
            username: "demo_user".to_string(),
            email: "demo@nebulearn.com".to_string(),
            last_login_at: Utc::now(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn shell_marks_the_active_link() {
        let html = home_page(&user());
        assert!(html.contains("<a class=\"nav-link active\" href=\"/\">Home</a>"));
        assert!(html.contains("<a class=\"nav-link\" href=\"/decks\">Decks</a>"));
        assert!(html.contains("Expand your mind"));
    }

    #[test]
    fn deck_cards_show_badge_counts_and_status() {
        let snapshot = seed_snapshot();
        let statuses = vec![DeckStatus {
            deck_id: "deck_1".to_string(),
            status: StatusLevel::Orange,
            last_studied: None,
            success_rate: 66.67,
        }];
        let html = decks_page(&user(), &snapshot.decks, &statuses, Some("Deck upload is not available yet."));

        assert!(html.contains("TypeScript Basics"));
        assert!(html.contains(">Medium</div>"));
        assert!(html.contains("<span>156 cards</span><span>23 due</span>"));
        assert!(html.contains("status-orange"));
        assert!(html.contains("67% average success"));
        assert!(html.contains("Deck upload is not available yet."));
    }

    #[test]
    fn user_text_is_escaped() {
        let mut snapshot = seed_snapshot();
        snapshot.decks[0].name = "<script>alert(1)</script>".to_string();
        let html = decks_page(&user(), &snapshot.decks, &[], None);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn calendar_cells_reflect_sessions() {
        let snapshot = seed_snapshot();
        let html = progress_page(
            &user(),
            &snapshot.decks,
            &snapshot.study_sessions,
            &CalendarWindow::default(),
        );

        assert!(html.contains("<th>Jun 1</th>"));
        assert!(html.contains("<th>Jun 15</th>"));
        assert!(!html.contains("<th>Jun 16</th>"));
        assert!(html.contains("2025-06-03 - HARD session (65% success, 15 cards)"));
        assert!(html.contains("Click to add study session for 2025-06-02"));
        assert!(html.contains("<div class=\"figure-value\">67%</div>"));
        assert!(html.contains("<div class=\"figure-value\">245</div>"));
    }

    #[test]
    fn cell_title_formats() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 9).unwrap();
        assert_eq!(cell_title(date, None), "Click to add study session for 2025-06-09");
        let session = StudySession {
            deck_id: "deck2".to_string(),
            deck_name: "React Hooks".to_string(),
            date,
            difficulty: Difficulty::Easy,
            cards_studied: 7,
            success_rate: 91,
        };
        assert_eq!(
            cell_title(date, Some(&session)),
            "2025-06-09 - EASY session (91% success, 7 cards)"
        );
    }

    #[test]
    fn notices_for_placeholder_actions() {
        assert!(deck_notice("upload", None).is_some());
        assert_eq!(
            deck_notice("study", Some("deck2")).as_deref(),
            Some("Study sessions for deck deck2 are not available yet.")
        );
        assert_eq!(deck_notice("study", None), None);
        assert_eq!(deck_notice("delete", None), None);
    }
}
