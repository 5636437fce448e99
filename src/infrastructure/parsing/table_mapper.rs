//! Positional mapping of result-table rows into records

use scraper::ElementRef;
use tracing::trace;

use super::config::ColumnLayout;
use crate::domain::RegistryRecord;

/// Maps one `<tr>` worth of cell texts to a record, by fixed column offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableRecordMapper {
    layout: ColumnLayout,
}

impl TableRecordMapper {
    pub const fn new(layout: ColumnLayout) -> Self {
        Self { layout }
    }

    /// `None` for rows below the minimum cell count (headers, footers, padding).
    /// A missing trailing logo column is fine.
    pub fn map_row(&self, cells: &[String]) -> Option<RegistryRecord> {
        if cells.len() < self.layout.min_cells {
            trace!("Skipping row with {} cells", cells.len());
            return None;
        }

        let cell = |index: usize| cells.get(index).map_or("", |text| text.trim());
        let optional = |index: usize| Some(cell(index)).filter(|text| !text.is_empty()).map(str::to_string);

        Some(RegistryRecord {
            name: cell(self.layout.name).to_string(),
            case_number: cell(self.layout.case_number).to_string(),
            registration_number: optional(self.layout.registration_number),
            holder: cell(self.layout.holder).to_string(),
            nice_class: cell(self.layout.nice_class).to_string(),
            sign_type: optional(self.layout.sign_type),
        })
    }
}

/// Texts of the row's own `<td>` children; nested tables are not descended into.
pub fn row_cells(row: ElementRef<'_>) -> Vec<String> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "td")
        .map(cell_text)
        .collect()
}

/// Anchor text when the cell wraps its value in a link, the cell text otherwise.
pub fn cell_text(cell: ElementRef<'_>) -> String {
    let anchor_text = cell
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| element.value().name() == "a")
        .map(|anchor| collapse_whitespace(&anchor.text().collect::<String>()))
        .find(|text| !text.is_empty());

    anchor_text.unwrap_or_else(|| collapse_whitespace(&cell.text().collect::<String>()))
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn maps_full_row_by_position() {
        let row = cells(&[
            "1", "M", "", "CAFETALERA DEL SUR", "2345678", "1987654", "LUNA AZUL", "30", "",
        ]);
        let record = TableRecordMapper::default().map_row(&row).unwrap();
        assert_eq!(record.name, "LUNA AZUL");
        assert_eq!(record.case_number, "2345678");
        assert_eq!(record.registration_number.as_deref(), Some("1987654"));
        assert_eq!(record.holder, "CAFETALERA DEL SUR");
        assert_eq!(record.nice_class, "30");
        assert_eq!(record.sign_type.as_deref(), Some("M"));
    }

    #[test]
    fn tolerates_missing_logo_column() {
        let row = cells(&["1", "", "", "TITULAR", "100", "", "SOL", "43"]);
        let record = TableRecordMapper::default().map_row(&row).unwrap();
        assert_eq!(record.name, "SOL");
        assert!(record.registration_number.is_none());
        assert!(record.sign_type.is_none());
    }

    #[test]
    fn short_rows_are_skipped() {
        let mapper = TableRecordMapper::default();
        assert!(mapper.map_row(&cells(&["1", "M", "", "TITULAR", "100"])).is_none());
        assert!(mapper.map_row(&[]).is_none());
    }

    #[test]
    fn prefers_anchor_text_and_collapses_whitespace() {
        let html = Html::parse_fragment(
            r#"<table><tr data-ri="0"><td>1</td><td> <a href="/x">  2345678 </a> <span>ver</span></td><td>LUNA
               AZUL</td><td><table><tr><td>nested</td></tr></table></td></tr></table>"#,
        );
        let selector = Selector::parse("tr[data-ri]").unwrap();
        let row = html.select(&selector).next().unwrap();
        let texts = row_cells(row);
        assert_eq!(texts.len(), 4);
        assert_eq!(texts[1], "2345678");
        assert_eq!(texts[2], "LUNA AZUL");
        assert_eq!(texts[3], "nested");
    }
}
