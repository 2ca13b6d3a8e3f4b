//! Console Report
//!
//! Plain-text rendering of lookup results for the CLI.

use crate::domain::entities::{GeoRecord, HistoryEntry};
use std::fmt::Write;

const UNKNOWN: &str = "Unknown";

/// Render a record the way the CLI prints it.
///
/// Missing fields show as "Unknown". When the location could not be
/// determined an explicit notice replaces the coordinates.
pub fn render_report(record: &GeoRecord) -> String {
    let field = |v: &Option<String>| v.clone().unwrap_or_else(|| UNKNOWN.to_string());

    let mut out = String::new();
    let _ = writeln!(out, "Your public IP address: {}", record.ip);
    let _ = writeln!(out);
    let _ = writeln!(out, "Country:     {}", field(&record.country));
    let _ = writeln!(out, "Region:      {}", field(&record.region));
    let _ = writeln!(out, "City:        {}", field(&record.city));
    let _ = writeln!(out, "Postal code: {}", field(&record.postal));
    let _ = writeln!(out, "Timezone:    {}", field(&record.timezone));
    let _ = writeln!(out, "ISP:         {}", field(&record.org));

    match (&record.coordinates, &record.location_error) {
        (Some(coords), _) => {
            let _ = writeln!(out);
            let _ = writeln!(out, "Latitude:    {}", coords.latitude());
            let _ = writeln!(out, "Longitude:   {}", coords.longitude());
            let _ = writeln!(
                out,
                "Map:         https://www.openstreetmap.org/?mlat={}&mlon={}",
                coords.latitude(),
                coords.longitude()
            );
        }
        (None, Some(reason)) => {
            let _ = writeln!(out);
            let _ = writeln!(out, "Location unavailable: {}", reason);
        }
        (None, None) => {
            let _ = writeln!(out);
            let _ = writeln!(out, "Location unavailable");
        }
    }

    out
}

/// One summary line per history entry, oldest first.
pub fn render_history(entries: &[HistoryEntry]) -> String {
    entries
        .iter()
        .map(HistoryEntry::summary_line)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::domain::entities::Coordinates;
    use crate::domain::value_objects::PublicAddress;

    fn record() -> GeoRecord {
        let mut r = GeoRecord::bare(PublicAddress::parse("203.0.113.5").unwrap());
        r.country = Some("PL".into());
        r.city = Some("Warsaw".into());
        r
    }

    #[test]
    fn test_report_with_coordinates() {
        let mut r = record();
        r.coordinates = Coordinates::from_combined("52.2,21.0");

        let out = render_report(&r);

        assert!(out.contains("Your public IP address: 203.0.113.5"));
        assert!(out.contains("Country:     PL"));
        assert!(out.contains("Region:      Unknown"));
        assert!(out.contains("https://www.openstreetmap.org/?mlat=52.2&mlon=21.0"));
        assert!(!out.contains("Location unavailable"));
    }

    #[test]
    fn test_report_with_location_error() {
        let r = GeoRecord::location_unavailable(
            PublicAddress::parse("203.0.113.5").unwrap(),
            "location unavailable: DNS resolution is not working",
        );

        let out = render_report(&r);

        assert!(out.contains("203.0.113.5"));
        assert!(out.contains("Location unavailable: location unavailable: DNS resolution"));
        assert!(!out.contains("openstreetmap"));
    }

    #[test]
    fn test_report_without_location_or_error() {
        let out = render_report(&record());
        assert!(out.trim_end().ends_with("Location unavailable"));
    }

    #[test]
    fn test_render_history() {
        let entries = vec![
            HistoryEntry {
                timestamp: "2024-01-01 10:00:00".into(),
                ip: "203.0.113.5".into(),
                city: Some("Warsaw".into()),
                country: Some("PL".into()),
                region: None,
                postal: None,
                timezone: None,
                org: None,
                loc: None,
            },
            HistoryEntry {
                timestamp: "2024-01-02 10:00:00".into(),
                ip: "198.51.100.7".into(),
                city: None,
                country: None,
                region: None,
                postal: None,
                timezone: None,
                org: None,
                loc: None,
            },
        ];

        assert_eq!(
            render_history(&entries),
            "[2024-01-01 10:00:00] 203.0.113.5 - Warsaw, PL\n[2024-01-02 10:00:00] 198.51.100.7 - Unknown, Unknown"
        );
        assert_eq!(render_history(&[]), "");
    }
}
