//! Spreadsheet column-name normalization
//!
//! Workbooks arrive with human-formatted headers ("Start Date", "e-mail
//! address", "DOB"). A mechanical pass lower-cases and collapses
//! non-alphanumerics to underscores; headers that do not normalize to a
//! canonical field name that way go through the exception table.

/// Headers whose mechanical normalization does not land on the field
/// name the sheets use
const HEADER_EXCEPTIONS: &[(&str, &str)] = &[
    ("dob", "date_of_birth"),
    ("d_o_b", "date_of_birth"),
    ("birth_date", "date_of_birth"),
    ("e_mail", "email"),
    ("e_mail_address", "email"),
    ("email_address", "email"),
    ("forename", "first_name"),
    ("surname", "last_name"),
    ("family_name", "last_name"),
    ("given_name", "first_name"),
    ("qty", "quantity"),
    ("no_required", "quantity"),
    ("panel_name", "panel"),
    ("venue_name", "venue"),
    ("event_type", "panel_type"),
    ("type", "attendee_type"),
    ("role", "attendee_type"),
    ("adviser", "adviser_email"),
    ("candidate", "candidate_email"),
    ("assessment_subject", "subject"),
    ("quality_assessed", "subject"),
    ("mark", "score"),
    ("record", "record_type"),
    ("check", "record_type"),
    ("item", "item_name"),
    ("assignee", "assigned_to"),
    ("due", "due_date"),
];

/// Mechanical header pass: trim, lower-case, collapse runs of
/// non-alphanumerics into single underscores
pub fn normalize_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_underscore = false;

    for ch in raw.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_underscore && !out.is_empty() {
                out.push('_');
            }
            pending_underscore = false;
            for lower in ch.to_lowercase() {
                out.push(lower);
            }
        } else {
            pending_underscore = true;
        }
    }

    out
}

/// Resolve a raw header to its canonical field name
pub fn canonical_field(raw: &str) -> String {
    let normalized = normalize_header(raw);

    for (from, to) in HEADER_EXCEPTIONS {
        if normalized == *from {
            return (*to).to_string();
        }
    }

    normalized
}
