use sgp4::{Constants, Elements};

use crate::catalog::error::CatalogParseError;
use crate::catalog::types::OrbitalElements;

/// Result of parsing a whole feed. Bad groups end up in `skipped`.
#[derive(Debug, Default)]
pub struct ParsedFeed {
    pub entries: Vec<OrbitalElements>,
    pub skipped: Vec<CatalogParseError>,
}

/// Parse feed text made of repeating name / line 1 / line 2 groups.
///
/// Bare two-line groups without a name line are accepted too. Lines that
/// belong to no group are reported and skipped.
pub fn parse_feed(content: &str) -> ParsedFeed {
    let mut parsed = ParsedFeed::default();

    for group in split_groups(content) {
        match group {
            Ok((name, line1, line2)) => match parse_group(name, line1, line2) {
                Ok(entry) => parsed.entries.push(entry),
                Err(e) => {
                    log::debug!("Skipping catalog entry: {}", e);
                    parsed.skipped.push(e);
                }
            },
            Err(e) => {
                log::debug!("Skipping catalog line: {}", e);
                parsed.skipped.push(e);
            }
        }
    }

    parsed
}

/// Catalog identifier from columns 3-7 of element line 1.
pub fn catalog_id(line1: &str) -> Result<u32, CatalogParseError> {
    line1
        .get(2..7)
        .map(str::trim)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| CatalogParseError::MalformedIdentifier {
            line: line1.to_string(),
        })
}

fn parse_group(
    name: Option<&str>,
    line1: &str,
    line2: &str,
) -> Result<OrbitalElements, CatalogParseError> {
    let norad_id = catalog_id(line1)?;
    let invalid = |message: String| CatalogParseError::InvalidElements { norad_id, message };

    let elements = Elements::from_tle(
        name.map(String::from),
        line1.as_bytes(),
        line2.as_bytes(),
    )
    .map_err(|e| invalid(e.to_string()))?;
    let constants = Constants::from_elements(&elements).map_err(|e| invalid(e.to_string()))?;

    Ok(OrbitalElements {
        norad_id,
        name: name
            .map(String::from)
            .unwrap_or_else(|| format!("NORAD {}", norad_id)),
        line1: line1.to_string(),
        line2: line2.to_string(),
        elements,
        constants,
    })
}

type Group<'a> = (Option<&'a str>, &'a str, &'a str);

fn split_groups(content: &str) -> Vec<Result<Group<'_>, CatalogParseError>> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let mut result = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if is_line1(lines[i]) && i + 1 < lines.len() && is_line2(lines[i + 1]) {
            result.push(Ok((None, lines[i], lines[i + 1])));
            i += 2;
        } else if i + 2 < lines.len() && is_line1(lines[i + 1]) && is_line2(lines[i + 2]) {
            result.push(Ok((Some(lines[i]), lines[i + 1], lines[i + 2])));
            i += 3;
        } else {
            result.push(Err(CatalogParseError::UnrecognizedLine {
                line: lines[i].to_string(),
            }));
            i += 1;
        }
    }

    result
}

fn is_line1(line: &str) -> bool {
    line.starts_with("1 ")
}

fn is_line2(line: &str) -> bool {
    line.starts_with("2 ")
}
