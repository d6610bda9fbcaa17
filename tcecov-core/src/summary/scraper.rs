//! Extract totals from one coverage summary page.
//!
//! The page must contain a `<table border>` whose rows are exactly
//!
//! ```text
//! <tr><td><a href="...">file</a></td><td>87.50% of 8</td><td>50.00% of 4</td></tr>
//! ```
//!
//! The scraper walks a fixed state machine over the tag/text stream of that
//! table and fails on the first event its current state does not expect.
//! It never guesses at other layouts.

use super::stat::SummaryStat;
use crate::CovError;
use regex::Regex;
use std::sync::OnceLock;

/// Lexical events of an HTML document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlEvent {
    Start { name: String, attrs: String },
    End { name: String },
    Text(String),
}

fn tag_regex() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| {
        Regex::new(r"(?s)<!--.*?-->|<![^>]*>|<\?[^>]*>|<(/?)([A-Za-z][A-Za-z0-9]*)([^>]*)>")
            .expect("tag pattern is valid")
    })
}

fn count_regex() -> &'static Regex {
    static COUNT: OnceLock<Regex> = OnceLock::new();
    COUNT.get_or_init(|| {
        Regex::new(r"^\s*(\d+(?:\.\d+)?)%\s+of\s+(\d+)\s*$").expect("count pattern is valid")
    })
}

/// Split HTML into start tags, end tags and text. Comments and
/// declarations are dropped; tag names are lower-cased.
pub fn tokenize(html: &str) -> Vec<HtmlEvent> {
    let mut events = Vec::new();
    let mut last = 0;
    for caps in tag_regex().captures_iter(html) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > last {
            events.push(HtmlEvent::Text(decode_entities(&html[last..whole.start()])));
        }
        last = whole.end();

        let Some(name) = caps.get(2) else {
            continue;
        };
        let name = name.as_str().to_ascii_lowercase();
        if caps.get(1).is_some_and(|m| m.as_str() == "/") {
            events.push(HtmlEvent::End { name });
        } else {
            let attrs = caps.get(3).map_or("", |m| m.as_str()).trim().to_string();
            events.push(HtmlEvent::Start { name, attrs });
        }
    }
    if last < html.len() {
        events.push(HtmlEvent::Text(decode_entities(&html[last..])));
    }
    events
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// What the scraper expects next inside the summary table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScraperState {
    RowStart,
    FileCellStart,
    LinkStart,
    LinkData,
    LinkEnd,
    FileCellEnd,
    LineCellStart,
    LineCellData,
    LineCellEnd,
    BranchCellStart,
    BranchCellData,
    BranchCellEnd,
}

impl ScraperState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RowStart => "table-row-start",
            Self::FileCellStart => "file-cell-start",
            Self::LinkStart => "link-start",
            Self::LinkData => "link-data",
            Self::LinkEnd => "link-end",
            Self::FileCellEnd => "file-cell-end",
            Self::LineCellStart => "line-cell-start",
            Self::LineCellData => "line-cell-data",
            Self::LineCellEnd => "line-cell-end",
            Self::BranchCellStart => "branch-cell-start",
            Self::BranchCellData => "branch-cell-data",
            Self::BranchCellEnd => "branch-cell-end",
        }
    }
}

/// Event shape a transition accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Start(&'static str),
    End(&'static str),
    Data,
}

/// Every legal move inside the table; anything else is a format error
const TRANSITIONS: &[(ScraperState, Expect, ScraperState)] = {
    use Expect::{Data, End, Start};
    use ScraperState::*;
    &[
        (RowStart, Start("tr"), FileCellStart),
        // `</tr>` may be present or omitted
        (RowStart, End("tr"), RowStart),
        (FileCellStart, Start("td"), LinkStart),
        (LinkStart, Start("a"), LinkData),
        (LinkData, Data, LinkEnd),
        (LinkEnd, End("a"), FileCellEnd),
        (FileCellEnd, End("td"), LineCellStart),
        (LineCellStart, Start("td"), LineCellData),
        (LineCellData, Data, LineCellEnd),
        (LineCellEnd, End("td"), BranchCellStart),
        (BranchCellStart, Start("td"), BranchCellData),
        (BranchCellData, Data, BranchCellEnd),
        (BranchCellEnd, End("td"), RowStart),
    ]
};

fn transition(state: ScraperState, event: &HtmlEvent) -> Option<ScraperState> {
    TRANSITIONS
        .iter()
        .find(|(from, expect, _)| {
            *from == state
                && match (expect, event) {
                    (Expect::Start(tag), HtmlEvent::Start { name, .. }) => name == tag,
                    (Expect::End(tag), HtmlEvent::End { name }) => name == tag,
                    (Expect::Data, HtmlEvent::Text(_)) => true,
                    _ => false,
                }
        })
        .map(|(_, _, to)| *to)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    BeforeTable,
    InTable(ScraperState),
    Done,
}

/// Streaming scraper; feed it events, then call [`SummaryScraper::finish`]
#[derive(Debug)]
pub struct SummaryScraper {
    phase: Phase,
    row_name: String,
    stat: SummaryStat,
}

impl Default for SummaryScraper {
    fn default() -> Self {
        Self::new()
    }
}

impl SummaryScraper {
    pub fn new() -> Self {
        Self {
            phase: Phase::BeforeTable,
            row_name: String::new(),
            stat: SummaryStat::default(),
        }
    }

    pub fn feed(&mut self, event: &HtmlEvent) -> crate::Result<()> {
        let state = match self.phase {
            Phase::BeforeTable => {
                if let HtmlEvent::Start { name, attrs } = event {
                    if name == "table" && has_border(attrs) {
                        self.phase = Phase::InTable(ScraperState::RowStart);
                    }
                }
                return Ok(());
            }
            Phase::Done => return Ok(()),
            Phase::InTable(state) => state,
        };

        // Layout whitespace between tags carries nothing
        if let HtmlEvent::Text(text) = event {
            if text.trim().is_empty() {
                return Ok(());
            }
        }

        let closes_table = matches!(event, HtmlEvent::End { name } if name == "table");
        if state == ScraperState::RowStart && closes_table {
            self.phase = Phase::Done;
            return Ok(());
        }

        let next = transition(state, event).ok_or_else(|| {
            CovError::format(
                "summary table",
                format!("unexpected {} while expecting {}", describe(event), state.as_str()),
            )
        })?;

        if let HtmlEvent::Text(text) = event {
            self.take_data(state, text.trim())?;
        }
        self.phase = Phase::InTable(next);
        Ok(())
    }

    fn take_data(&mut self, state: ScraperState, text: &str) -> crate::Result<()> {
        match state {
            ScraperState::LinkData => {
                self.row_name = text.to_string();
                self.stat.files += 1;
            }
            ScraperState::LineCellData => {
                let (executed, total) = self.parse_count(text)?;
                self.stat.lines_executed += executed;
                self.stat.lines_total += total;
            }
            ScraperState::BranchCellData => {
                let (executed, total) = self.parse_count(text)?;
                self.stat.branches_executed += executed;
                self.stat.branches_total += total;
            }
            _ => {}
        }
        Ok(())
    }

    fn parse_count(&self, text: &str) -> crate::Result<(u64, u64)> {
        parse_count(text).map_err(|e| e.at(format!("row '{}'", self.row_name)))
    }

    /// Totals of the table; fails if it was never found or never closed
    pub fn finish(self) -> crate::Result<SummaryStat> {
        match self.phase {
            Phase::Done => Ok(self.stat),
            Phase::BeforeTable => Err(CovError::format(
                "summary page",
                "no <table border> found",
            )),
            Phase::InTable(state) => Err(CovError::format(
                "summary table",
                format!("document ended while expecting {}", state.as_str()),
            )),
        }
    }
}

fn has_border(attrs: &str) -> bool {
    attrs
        .split(|c: char| c.is_whitespace() || c == '=')
        .any(|word| word.eq_ignore_ascii_case("border"))
}

fn describe(event: &HtmlEvent) -> String {
    match event {
        HtmlEvent::Start { name, .. } => format!("<{}>", name),
        HtmlEvent::End { name } => format!("</{}>", name),
        HtmlEvent::Text(text) => format!("text '{}'", text.trim()),
    }
}

/// Parse `"<percent>% of <total>"` into `(executed, total)`.
///
/// `executed = round(percent / 100 * total)`, rounding halves away from
/// zero (`f64::round`), so `12.5% of 4` gives 1 and `62.5% of 4` gives 3.
pub fn parse_count(text: &str) -> crate::Result<(u64, u64)> {
    let caps = count_regex().captures(text).ok_or_else(|| {
        CovError::format("count cell", format!("'{}' is not '<percent>% of <total>'", text))
    })?;
    let percent: f64 = caps[1]
        .parse()
        .map_err(|_| CovError::format("count cell", format!("bad percentage in '{}'", text)))?;
    let total: u64 = caps[2]
        .parse()
        .map_err(|_| CovError::format("count cell", format!("bad total in '{}'", text)))?;
    if percent > 100.0 {
        return Err(CovError::format(
            "count cell",
            format!("percentage above 100 in '{}'", text),
        ));
    }
    let executed = (percent / 100.0 * total as f64).round() as u64;
    Ok((executed, total))
}

/// Scrape a whole summary page
pub fn scrape_summary(html: &str) -> crate::Result<SummaryStat> {
    let mut scraper = SummaryScraper::new();
    for event in tokenize(html) {
        scraper.feed(&event)?;
    }
    scraper.finish()
}
