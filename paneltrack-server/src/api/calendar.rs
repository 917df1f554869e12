//! Calendar feed endpoint
//!
//! Serves the panel schedule as an iCalendar feed of all-day events.
//! DTSTART is the first day, DTEND the day after the last (exclusive,
//! per RFC 5545). Cancelled panels are left out.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::{Duration, NaiveDate, Utc};
use sqlx::Row;

use crate::auth::require_user;
use crate::db;
use crate::{ApiResult, AppState};

/// Escape text per RFC 5545 (backslash, semicolon, comma, newline)
fn escape_ics_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            other => out.push(other),
        }
    }
    out
}

fn format_ics_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Render one panel as a VEVENT block
fn panel_event(
    panel: &db::panels::Panel,
    venue_name: Option<&str>,
    dtstamp: &str,
) -> Vec<String> {
    let mut lines = vec![
        "BEGIN:VEVENT".to_string(),
        format!("UID:{}@paneltrack", panel.guid),
        format!("DTSTAMP:{}", dtstamp),
        format!("DTSTART;VALUE=DATE:{}", format_ics_date(panel.start_date)),
        format!(
            "DTEND;VALUE=DATE:{}",
            format_ics_date(panel.end_date + Duration::days(1))
        ),
        format!(
            "SUMMARY:{}",
            escape_ics_text(&format!("{} ({})", panel.name, panel.panel_type))
        ),
    ];

    if let Some(venue) = venue_name {
        lines.push(format!("LOCATION:{}", escape_ics_text(venue)));
    }
    if let Some(notes) = &panel.notes {
        lines.push(format!("DESCRIPTION:{}", escape_ics_text(notes)));
    }
    lines.push(format!("STATUS:{}", ics_status(&panel.status)));
    lines.push("END:VEVENT".to_string());

    lines
}

fn ics_status(status: &str) -> &'static str {
    match status {
        "confirmed" | "completed" => "CONFIRMED",
        _ => "TENTATIVE",
    }
}

/// Build the whole feed
pub fn render_calendar(panels: &[(db::panels::Panel, Option<String>)], dtstamp: &str) -> String {
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        "PRODID:-//paneltrack//EN".to_string(),
        "CALSCALE:GREGORIAN".to_string(),
    ];

    for (panel, venue_name) in panels {
        lines.extend(panel_event(panel, venue_name.as_deref(), dtstamp));
    }

    lines.push("END:VCALENDAR".to_string());
    // RFC 5545 mandates CRLF line endings
    let mut out = lines.join("\r\n");
    out.push_str("\r\n");
    out
}

/// GET /api/calendar/panels.ics
pub async fn panels_feed(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    require_user(&state, &headers).await?;

    let panels = db::panels::list_calendar_panels(&state.db).await?;

    // Resolve venue names in one pass
    let venue_rows = sqlx::query("SELECT guid, name FROM venues")
        .fetch_all(&state.db)
        .await
        .map_err(paneltrack_common::Error::Database)?;
    let venues: std::collections::HashMap<String, String> = venue_rows
        .iter()
        .map(|row| (row.get("guid"), row.get("name")))
        .collect();

    let entries: Vec<(db::panels::Panel, Option<String>)> = panels
        .into_iter()
        .map(|panel| {
            let venue = panel
                .venue_guid
                .and_then(|g| venues.get(&g.to_string()).cloned());
            (panel, venue)
        })
        .collect();

    let dtstamp = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
    let body = render_calendar(&entries, &dtstamp);

    Ok((
        [(header::CONTENT_TYPE, "text/calendar; charset=utf-8")],
        body,
    )
        .into_response())
}

/// Build calendar routes
pub fn calendar_routes() -> Router<AppState> {
    Router::new().route("/api/calendar/panels.ics", get(panels_feed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample_panel(notes: Option<&str>) -> db::panels::Panel {
        db::panels::Panel {
            guid: Uuid::nil(),
            name: "March Panel".to_string(),
            panel_type: "panel".to_string(),
            venue_guid: None,
            start_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(),
            status: "confirmed".to_string(),
            notes: notes.map(|s| s.to_string()),
        }
    }

    #[test]
    fn test_escaping() {
        assert_eq!(escape_ics_text("a,b;c\\d"), "a\\,b\\;c\\\\d");
        assert_eq!(escape_ics_text("line one\nline two"), "line one\\nline two");
    }

    #[test]
    fn test_dtend_is_exclusive() {
        let panel = sample_panel(None);
        let lines = panel_event(&panel, None, "20260101T000000Z");

        assert!(lines.contains(&"DTSTART;VALUE=DATE:20260302".to_string()));
        // Three-day panel ending on the 4th: DTEND names the 5th
        assert!(lines.contains(&"DTEND;VALUE=DATE:20260305".to_string()));
    }

    #[test]
    fn test_feed_structure_and_crlf() {
        let entries = vec![(sample_panel(Some("Bring robes, please")), Some("St Anselm House".to_string()))];
        let feed = render_calendar(&entries, "20260101T000000Z");

        assert!(feed.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(feed.ends_with("END:VCALENDAR\r\n"));
        assert!(feed.contains("SUMMARY:March Panel (panel)"));
        assert!(feed.contains("LOCATION:St Anselm House"));
        assert!(feed.contains("DESCRIPTION:Bring robes\\, please"));
        assert!(!feed.contains('\n') || feed.matches("\r\n").count() == feed.matches('\n').count());
    }
}
