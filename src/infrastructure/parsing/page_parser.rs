//! Page response parser: envelope -> table fragment -> rows -> records

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::config::ParsingConfig;
use super::context::PageContext;
use super::envelope::{FragmentExtractor, ReportedTotal, is_partial_response};
use super::error::{ParsingError, ParsingResult};
use super::table_mapper::{TableRecordMapper, row_cells};
use super::validator::RecordValidator;
use super::ContextualParser;
use crate::domain::RegistryRecord;

/// Everything the search flow needs from one page response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    pub records: Vec<RegistryRecord>,
    pub reported_total: Option<ReportedTotal>,
    pub raw_byte_length: usize,
    /// Rows found in the table body, data and noise alike
    pub rows_seen: usize,
    /// Rows below the minimum cell count
    pub rows_skipped: usize,
    /// Rows mapped but dropped by the validator
    pub rows_rejected: usize,
    /// The registry rendered its "no records" row
    pub empty_table: bool,
}

/// Parser for phonetic search page responses
#[derive(Debug, Clone)]
pub struct PageParser {
    config: ParsingConfig,
    extractor: FragmentExtractor,
    body_selectors: Vec<Selector>,
    row_selectors: Vec<Selector>,
    mapper: TableRecordMapper,
    validator: RecordValidator,
}

impl PageParser {
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(ParsingConfig::default())
    }

    pub fn with_config(config: ParsingConfig) -> ParsingResult<Self> {
        Ok(Self {
            extractor: FragmentExtractor::new()?,
            body_selectors: compile_selectors(&config.table_body_selectors)?,
            row_selectors: compile_selectors(&config.row_selectors)?,
            mapper: TableRecordMapper::new(config.columns),
            validator: RecordValidator::new(),
            config,
        })
    }

    pub const fn extractor(&self) -> &FragmentExtractor {
        &self.extractor
    }

    fn mentions_table(&self, markup: &str) -> bool {
        self.config.table_hints.iter().any(|hint| markup.contains(hint.as_str()))
    }

    fn mentions_empty_marker(&self, markup: &str) -> bool {
        markup.contains(self.config.empty_marker.as_str())
    }

    fn parse_envelope(&self, body: &str) -> ParsingResult<ParsedPage> {
        let fragments = self.extractor.extract(body);
        if fragments.is_empty() {
            return Err(ParsingError::NoFragments);
        }
        debug!("📦 {} fragments in partial response", fragments.len());

        match fragments.iter().find(|fragment| self.mentions_table(fragment)) {
            Some(fragment) => self.parse_table_markup(fragment),
            None => {
                // Status-only update (messages, view state); nothing to map
                debug!("No fragment carries the result table");
                Ok(ParsedPage {
                    empty_table: fragments.iter().any(|f| self.mentions_empty_marker(f)),
                    ..ParsedPage::default()
                })
            }
        }
    }

    fn parse_plain_html(&self, body: &str) -> ParsingResult<ParsedPage> {
        if self.mentions_table(body) {
            return self.parse_table_markup(body);
        }
        if self.mentions_empty_marker(body) {
            return Ok(ParsedPage {
                empty_table: true,
                ..ParsedPage::default()
            });
        }
        Err(ParsingError::unrecognized(
            "HTML response without result table or empty marker",
        ))
    }

    fn parse_table_markup(&self, markup: &str) -> ParsingResult<ParsedPage> {
        let reported_total = self.extractor.detect_reported_total(markup);
        let document = Html::parse_document(markup);

        let Some(table_body) = self
            .body_selectors
            .iter()
            .find_map(|selector| document.select(selector).next())
        else {
            if self.mentions_empty_marker(markup) {
                return Ok(ParsedPage {
                    reported_total,
                    empty_table: true,
                    ..ParsedPage::default()
                });
            }
            return Err(ParsingError::unrecognized(
                "result table marker present but no table body found",
            ));
        };

        let rows = self.select_rows(table_body);
        let mut page = ParsedPage {
            reported_total,
            rows_seen: rows.len(),
            ..ParsedPage::default()
        };

        for row in rows {
            if self.is_empty_marker_row(row) {
                page.empty_table = true;
                continue;
            }
            let cells = row_cells(row);
            match self.mapper.map_row(&cells) {
                None => page.rows_skipped += 1,
                Some(record) => match self.validator.accept(record) {
                    Some(record) => page.records.push(record),
                    None => page.rows_rejected += 1,
                },
            }
        }

        Ok(page)
    }

    /// Rows from the first row selector that matches anything.
    fn select_rows<'a>(&self, table_body: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        self.row_selectors
            .iter()
            .map(|selector| table_body.select(selector).collect::<Vec<_>>())
            .find(|rows| !rows.is_empty())
            .unwrap_or_default()
    }

    fn is_empty_marker_row(&self, row: ElementRef<'_>) -> bool {
        let marker = self.config.empty_marker.as_str();
        let has_marker = |element: ElementRef<'_>| element.value().classes().any(|class| class == marker);
        has_marker(row) || row.children().filter_map(ElementRef::wrap).any(has_marker)
    }
}

impl ContextualParser for PageParser {
    type Output = ParsedPage;
    type Context = PageContext;

    fn parse_with_context(&self, body: &str, context: &PageContext) -> ParsingResult<ParsedPage> {
        if body.trim().is_empty() {
            return Err(ParsingError::EmptyBody);
        }
        if let Some(message) = self.extractor.detect_server_error(body) {
            return Err(ParsingError::ServerError { message });
        }

        let mut page = if is_partial_response(body) {
            self.parse_envelope(body)?
        } else {
            debug!("Response is not a partial response; parsing as HTML document");
            self.parse_plain_html(body)?
        };
        page.raw_byte_length = body.len();

        if page.rows_rejected > 0 || page.rows_skipped > 0 {
            debug!(
                "Page {}: {} rows, {} accepted, {} skipped, {} rejected",
                context.page_index,
                page.rows_seen,
                page.records.len(),
                page.rows_skipped,
                page.rows_rejected
            );
        }
        if page.records.len() > context.page_size as usize {
            warn!(
                "Page {} returned {} records, more than the page size {}",
                context.page_index,
                page.records.len(),
                context.page_size
            );
        }

        Ok(page)
    }
}

fn compile_selectors(selector_strings: &[String]) -> ParsingResult<Vec<Selector>> {
    let mut selectors = Vec::with_capacity(selector_strings.len());
    for selector_str in selector_strings {
        let selector = Selector::parse(selector_str).map_err(|e| ParsingError::InvalidSelector {
            selector: selector_str.clone(),
            reason: e.to_string(),
        })?;
        selectors.push(selector);
    }

    if selectors.is_empty() {
        return Err(ParsingError::InvalidSelector {
            selector: String::new(),
            reason: "no selectors configured".to_string(),
        });
    }
    Ok(selectors)
}
