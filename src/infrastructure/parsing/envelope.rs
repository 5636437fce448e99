//! JSF partial-response envelope handling
//!
//! PrimeFaces answers ajax requests with a small XML document whose
//! `<update>` elements carry escaped HTML inside CDATA sections. The inner
//! markup is not reliably well-formed and can be very large, so fragments are
//! pulled out with a non-greedy scan instead of an XML parser.

use regex::Regex;

use super::error::{ParsingError, ParsingResult};

const CDATA_PATTERN: &str = r"(?s)<!\[CDATA\[(.*?)\]\]>";
const ABSOLUTE_TOTAL_PATTERN: &str = r"(?i)total\s+de\s+registros\s*[=:]\s*(\d+)";
const REMAINING_TOTAL_PATTERN: &str = r"(?i)\by\s+(\d+)\s+marcas?\s+m(?:á|a|&aacute;)s\b";
const ERROR_NAME_PATTERN: &str = r"(?s)<error>.*?<error-name>\s*(.*?)\s*</error-name>";
const VIEW_EXPIRED: &str = "ViewExpiredException";

/// Result-count hint embedded in the table markup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportedTotal {
    /// "Total de registros = N"
    Absolute(usize),
    /// "... y N marcas más": records beyond those listed on the page
    Remaining(usize),
}

impl ReportedTotal {
    /// Total implied by the hint on a page that listed `rows_on_page` records.
    /// The registry repeats the same footer on every page.
    pub const fn resolve(self, rows_on_page: usize) -> usize {
        match self {
            Self::Absolute(total) => total,
            Self::Remaining(remaining) => rows_on_page + remaining,
        }
    }
}

/// Whether the body is an XML partial response rather than a full HTML page.
pub fn is_partial_response(body: &str) -> bool {
    body.trim_start().starts_with("<?xml") && body.contains("<partial-response")
}

/// Compiled envelope patterns; build once per parser.
#[derive(Debug, Clone)]
pub struct FragmentExtractor {
    cdata: Regex,
    absolute_total: Regex,
    remaining_total: Regex,
    error_name: Regex,
}

impl FragmentExtractor {
    pub fn new() -> ParsingResult<Self> {
        Ok(Self {
            cdata: compile(CDATA_PATTERN)?,
            absolute_total: compile(ABSOLUTE_TOTAL_PATTERN)?,
            remaining_total: compile(REMAINING_TOTAL_PATTERN)?,
            error_name: compile(ERROR_NAME_PATTERN)?,
        })
    }

    /// Every CDATA payload in document order. Zero fragments is not an error here.
    pub fn extract<'a>(&self, body: &'a str) -> Vec<&'a str> {
        self.cdata
            .captures_iter(body)
            .filter_map(|captures| captures.get(1))
            .map(|fragment| fragment.as_str())
            .collect()
    }

    /// Name of a JSF `<error>` element or an expired-view marker.
    pub fn detect_server_error(&self, body: &str) -> Option<String> {
        if let Some(captures) = self.error_name.captures(body) {
            let name = captures.get(1).map_or("", |m| m.as_str()).trim();
            return Some(if name.is_empty() {
                "unnamed JSF error".to_string()
            } else {
                name.to_string()
            });
        }
        body.contains(VIEW_EXPIRED)
            .then(|| format!("javax.faces.application.{VIEW_EXPIRED}"))
    }

    /// Absolute totals win over "N more" hints.
    pub fn detect_reported_total(&self, markup: &str) -> Option<ReportedTotal> {
        if let Some(total) = first_number(&self.absolute_total, markup) {
            return Some(ReportedTotal::Absolute(total));
        }
        first_number(&self.remaining_total, markup).map(ReportedTotal::Remaining)
    }
}

fn compile(pattern: &str) -> ParsingResult<Regex> {
    Regex::new(pattern).map_err(|e| ParsingError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

fn first_number(pattern: &Regex, text: &str) -> Option<usize> {
    pattern
        .captures(text)
        .and_then(|captures| captures.get(1))
        .and_then(|digits| digits.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn extractor() -> FragmentExtractor {
        FragmentExtractor::new().unwrap()
    }

    const ENVELOPE: &str = r#"<?xml version='1.0' encoding='UTF-8'?>
<partial-response id="j_id1"><changes><update id="frmBsqFonetica"><![CDATA[<form id="frmBsqFonetica"><table><tbody id="frmBsqFonetica:resultadoExpediente_data"></tbody></table></form>]]></update><update id="j_id1:javax.faces.ViewState:0"><![CDATA[-4411:9022]]></update></changes></partial-response>"#;

    #[test]
    fn extracts_fragments_in_order() {
        let fragments = extractor().extract(ENVELOPE);
        assert_eq!(fragments.len(), 2);
        assert!(fragments[0].starts_with("<form id=\"frmBsqFonetica\">"));
        assert_eq!(fragments[1], "-4411:9022");
    }

    #[test]
    fn fragments_may_span_lines() {
        let body = "<?xml version='1.0'?><partial-response><![CDATA[<p>\nuno\n</p>]]></partial-response>";
        assert_eq!(extractor().extract(body), vec!["<p>\nuno\n</p>"]);
    }

    #[test]
    fn envelope_without_cdata_yields_nothing() {
        let body = "<?xml version='1.0'?><partial-response><changes/></partial-response>";
        assert!(is_partial_response(body));
        assert!(extractor().extract(body).is_empty());
    }

    #[rstest]
    #[case("<?xml version='1.0'?><partial-response/>", true)]
    #[case("  \n<?xml version='1.0'?>\n<partial-response id='x'>", true)]
    #[case("<html><body></body></html>", false)]
    #[case("<?xml version='1.0'?><root/>", false)]
    fn recognizes_partial_responses(#[case] body: &str, #[case] expected: bool) {
        assert_eq!(is_partial_response(body), expected);
    }

    #[rstest]
    #[case("Total de registros = 42", Some(ReportedTotal::Absolute(42)))]
    #[case("TOTAL DE REGISTROS: 7", Some(ReportedTotal::Absolute(7)))]
    #[case("LUNA, SOL y 280 marcas más", Some(ReportedTotal::Remaining(280)))]
    #[case("y 1 marca mas", Some(ReportedTotal::Remaining(1)))]
    #[case("y 5 marcas m&aacute;s", Some(ReportedTotal::Remaining(5)))]
    #[case("sin coincidencias", None)]
    fn detects_reported_totals(#[case] markup: &str, #[case] expected: Option<ReportedTotal>) {
        assert_eq!(extractor().detect_reported_total(markup), expected);
    }

    #[test]
    fn absolute_total_takes_precedence() {
        let markup = "y 3 marcas más ... Total de registros = 18";
        assert_eq!(
            extractor().detect_reported_total(markup),
            Some(ReportedTotal::Absolute(18))
        );
    }

    #[test]
    fn resolves_remaining_against_rows_on_page() {
        assert_eq!(ReportedTotal::Remaining(280).resolve(15), 295);
        assert_eq!(ReportedTotal::Remaining(30).resolve(7), 37);
        assert_eq!(ReportedTotal::Absolute(40).resolve(15), 40);
    }

    #[test]
    fn detects_server_errors() {
        let body = "<?xml version='1.0'?><partial-response><error><error-name>java.lang.NullPointerException</error-name><error-message><![CDATA[boom]]></error-message></error></partial-response>";
        assert_eq!(
            extractor().detect_server_error(body).as_deref(),
            Some("java.lang.NullPointerException")
        );

        let expired = "<?xml version='1.0'?><partial-response><![CDATA[javax.faces.application.ViewExpiredException]]></partial-response>";
        assert!(extractor().detect_server_error(expired).is_some());
        assert!(extractor().detect_server_error(ENVELOPE).is_none());
    }
}
