//! Content metadata and front-matter extraction.
//!
//! Every content file starts with a front-matter block:
//!
//! ```text
//! ---
//! title: hello world
//! author: me
//! created: 2024-01-01
//! last_updated: 2024-01-02
//! tags: [go, rust]
//! home: false
//! ---
//! body...
//! ```
//!
//! The block is located with a non-greedy multi-line match anchored at the
//! start of the file and decoded as YAML into [`Metadata`]. The `filepath`
//! field is never read from the block; callers stamp it from the source path.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::{
    fmt, fs,
    path::Path,
    sync::LazyLock,
};
use thiserror::Error;

/// Match everything between the opening `---` pair at the head of the file.
static FRONT_MATTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^---\r?\n(.*?)\r?\n---").unwrap());

/// Date format used everywhere: front-matter, store, listings.
const DATE_FMT: &str = "%Y-%m-%d";

// ============================================================================
// Errors
// ============================================================================

/// Front-matter extraction errors.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The `---` delimiter pair is absent. The message carries a ready-to-use
    /// template so the user can fix the file without reading docs.
    #[error("no front-matter found. use this template:\n{template}")]
    Missing { template: String },

    #[error("unable to parse front-matter")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Calendar Dates
// ============================================================================

/// A calendar date at day granularity.
///
/// Front-matter dates are strict `YYYY-MM-DD`. Values read back from the
/// store are parsed leniently: a time-of-day suffix (older databases stored
/// full datetimes) is truncated, so equality and grouping always compare the
/// calendar day only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Day(NaiveDate);

impl Day {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Day)
    }

    pub fn today() -> Self {
        Day(chrono::Local::now().date_naive())
    }

    /// Strict `YYYY-MM-DD` parse, used for front-matter values.
    pub fn parse(s: &str) -> Option<Self> {
        NaiveDate::parse_from_str(s, DATE_FMT).ok().map(Day)
    }

    /// Lenient parse for values coming back from the store: take the
    /// `YYYY-MM-DD` prefix and ignore any time-of-day suffix.
    pub fn parse_lenient(s: &str) -> Option<Self> {
        Self::parse(s.get(..10)?)
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FMT))
    }
}

impl<'de> Deserialize<'de> for Day {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Day::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date `{s}`, expected YYYY-MM-DD")))
    }
}

// ============================================================================
// Metadata Record
// ============================================================================

/// The persisted descriptor for one content file.
///
/// `id` is assigned by the store on creation and never changes afterwards.
/// `filepath` (relative to the content root) is the natural key used to
/// decide create-vs-update; neither field comes from the front-matter block.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Metadata {
    #[serde(skip)]
    pub id: i64,
    #[serde(skip)]
    pub filepath: String,
    pub title: String,
    pub author: String,
    pub created: Day,
    pub last_updated: Day,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, rename = "home")]
    pub is_home: bool,
}

impl fmt::Display for Metadata {
    /// Render back to the front-matter block form. `extract` of this output
    /// reproduces the record (modulo `id`/`filepath`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "---")?;
        writeln!(f, "title: {}", self.title)?;
        writeln!(f, "author: {}", self.author)?;
        writeln!(f, "created: {}", self.created)?;
        writeln!(f, "last_updated: {}", self.last_updated)?;
        writeln!(f, "tags: [{}]", self.tags.join(", "))?;
        writeln!(f, "home: {}", self.is_home)?;
        write!(f, "---")
    }
}

/// Fill-in-the-blanks front-matter block, shown on extraction failure and
/// written into files created by `loam new`.
pub fn metadata_template() -> String {
    Metadata {
        id: 0,
        filepath: String::new(),
        title: "<title>".to_string(),
        author: "<author>".to_string(),
        created: Day::today(),
        last_updated: Day::today(),
        tags: vec!["list".to_string(), "of".to_string(), "tags".to_string()],
        is_home: false,
    }
    .to_string()
}

// ============================================================================
// Extraction
// ============================================================================

/// Parse the front-matter block out of raw file content.
pub fn parse_front_matter(content: &str) -> Result<Metadata, ExtractError> {
    let block = FRONT_MATTER
        .captures(content)
        .and_then(|c| c.get(1))
        .ok_or_else(|| ExtractError::Missing {
            template: metadata_template(),
        })?;
    Ok(serde_yaml::from_str(block.as_str())?)
}

/// Read a content file and extract its metadata record.
///
/// `filepath` is the logical path (relative to the content root) stamped
/// onto the record; `path` is where the file actually lives on disk.
pub fn extract_from_file(path: &Path, filepath: &str) -> Result<Metadata, ExtractError> {
    let content = fs::read_to_string(path)?;
    let mut md = parse_front_matter(&content)?;
    md.filepath = filepath.to_string();
    Ok(md)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Metadata {
        Metadata {
            id: 0,
            filepath: String::new(),
            title: "hello world".to_string(),
            author: "someone".to_string(),
            created: Day::from_ymd(2024, 1, 1).unwrap(),
            last_updated: Day::from_ymd(2024, 2, 3).unwrap(),
            tags: vec!["go".to_string(), "rust".to_string()],
            is_home: false,
        }
    }

    #[test]
    fn test_round_trip() {
        let m = sample();
        let parsed = parse_front_matter(&m.to_string()).unwrap();
        assert_eq!(parsed, m);
    }

    #[test]
    fn test_template_round_trips() {
        // The template is itself a valid front-matter block.
        let parsed = parse_front_matter(&metadata_template()).unwrap();
        assert_eq!(parsed.title, "<title>");
        assert_eq!(parsed.tags, vec!["list", "of", "tags"]);
        assert!(!parsed.is_home);
    }

    #[test]
    fn test_missing_front_matter() {
        let err = parse_front_matter("just a body, no block").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("no front-matter found"));
        assert!(msg.contains("use this template"));
        assert!(msg.contains("title: <title>"));
    }

    #[test]
    fn test_body_after_block_is_ignored() {
        let content = format!("{}\n\n# heading\n\nbody text\n", sample());
        let parsed = parse_front_matter(&content).unwrap();
        assert_eq!(parsed.title, "hello world");
    }

    #[test]
    fn test_block_must_be_at_start() {
        let content = format!("intro line\n{}", sample());
        assert!(matches!(
            parse_front_matter(&content),
            Err(ExtractError::Missing { .. })
        ));
    }

    #[test]
    fn test_malformed_date_fails() {
        let content = "---\ntitle: t\nauthor: a\ncreated: January 1st\nlast_updated: 2024-01-01\n---";
        assert!(matches!(
            parse_front_matter(content),
            Err(ExtractError::Yaml(_))
        ));
    }

    #[test]
    fn test_tags_and_home_are_optional() {
        let content = "---\ntitle: t\nauthor: a\ncreated: 2024-01-01\nlast_updated: 2024-01-01\n---";
        let parsed = parse_front_matter(content).unwrap();
        assert!(parsed.tags.is_empty());
        assert!(!parsed.is_home);
    }

    #[test]
    fn test_extract_from_file_stamps_filepath() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.md");
        fs::write(&path, sample().to_string()).unwrap();

        let md = extract_from_file(&path, "posts/a.md").unwrap();
        assert_eq!(md.filepath, "posts/a.md");
    }

    #[test]
    fn test_day_display() {
        assert_eq!(Day::from_ymd(2024, 3, 7).unwrap().to_string(), "2024-03-07");
    }

    #[test]
    fn test_day_lenient_truncates_time_of_day() {
        let a = Day::parse_lenient("2024-01-02 15:04:05+00:00").unwrap();
        let b = Day::parse_lenient("2024-01-02").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_day_strict_rejects_datetime() {
        assert!(Day::parse("2024-01-02 15:04:05").is_none());
        assert!(Day::parse("02-01-2024").is_none());
    }
}
