use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use tracing::warn;

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Uses the `iana-time-zone` crate directly – no subprocess calls.
/// Falls back to `"UTC"` if detection fails or the name is unknown to
/// `chrono-tz`.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone()
        .ok()
        .filter(|tz| validate_timezone(tz))
        .unwrap_or_else(|| "UTC".to_string())
}

/// Resolve an IANA timezone name, falling back to UTC with a warning.
pub fn resolve_timezone(tz_name: &str) -> Tz {
    tz_name.parse::<Tz>().unwrap_or_else(|_| {
        warn!("unrecognised timezone \"{}\", falling back to UTC", tz_name);
        Tz::UTC
    })
}

/// Validate that `tz_name` is a recognised IANA timezone identifier.
pub fn validate_timezone(tz_name: &str) -> bool {
    tz_name.parse::<Tz>().is_ok()
}

/// Footer timestamp, e.g. `"March 04, 2024"`, rendered in `tz_name`.
pub fn format_last_updated(now: DateTime<Utc>, tz_name: &str) -> String {
    let tz = resolve_timezone(tz_name);
    now.with_timezone(&tz).format("%B %d, %Y").to_string()
}

// ── Invoice date parsing ──────────────────────────────────────────────────────

/// Date-time patterns accepted for textual invoice dates. The time part is
/// discarded.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

/// Date-only patterns accepted for textual invoice dates.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Strictly parse a textual invoice date.
///
/// Accepts RFC 3339 and the patterns in [`DATETIME_FORMATS`] /
/// [`DATE_FORMATS`]. Returns `None` for blank or unrecognised input; callers
/// substitute the sentinel rather than failing the load.
pub fn parse_invoice_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.date());
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Convert an Excel serial day number (1900 date system) to a date.
///
/// Serial 1 is 1900-01-01; Excel's phantom 1900-02-29 means serials from 61
/// onwards count from 1899-12-30. Non-finite or non-positive serials yield
/// `None`.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let days = serial.trunc() as i64;
    let epoch = if days < 61 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    epoch.checked_add_signed(chrono::Duration::days(days))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
