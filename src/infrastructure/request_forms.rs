//! Form bodies for the registry's JSF partial requests

use super::config::marcanet::{denomination, faces, phonetic};
use super::session::ContinuationToken;
use crate::domain::SearchRequest;

/// Which action a phonetic search page request performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAction {
    /// Page 0: press the search button
    Submit,
    /// Page >= 1: ask the data table for rows `first..first + rows`
    Paginate { first: u32, rows: u32 },
}

impl PageAction {
    pub const fn for_page(page_index: u32, page_size: u32) -> Self {
        if page_index == 0 {
            Self::Submit
        } else {
            Self::Paginate {
                first: page_index * page_size,
                rows: page_size,
            }
        }
    }
}

/// Form fields for one phonetic search page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequestForm {
    fields: Vec<(String, String)>,
}

impl PageRequestForm {
    pub fn new(request: &SearchRequest, action: PageAction, token: &ContinuationToken) -> Self {
        let source = match action {
            PageAction::Submit => phonetic::SUBMIT_BUTTON,
            PageAction::Paginate { .. } => phonetic::RESULT_TABLE,
        };

        let mut fields = vec![
            field(faces::PARTIAL_AJAX, "true"),
            field(faces::SOURCE, source),
            field(faces::PARTIAL_EXECUTE, "@all"),
            field(faces::PARTIAL_RENDER, phonetic::FORM),
            field(phonetic::FORM, phonetic::FORM),
            field(phonetic::TERM_FIELD, request.term()),
        ];

        match action {
            PageAction::Submit => {
                fields.push(field(phonetic::SUBMIT_BUTTON, phonetic::SUBMIT_BUTTON));
            }
            PageAction::Paginate { first, rows } => {
                fields.push(field(phonetic::PAGINATION_FLAG, "true"));
                fields.push(field(phonetic::FIRST_ROW, &first.to_string()));
                fields.push(field(phonetic::ROW_COUNT, &rows.to_string()));
            }
        }

        if let Some(class) = request.category_filter() {
            fields.push(field(phonetic::CLASS_FIELD, &class.to_string()));
        }
        if !token.is_empty() {
            fields.push(field(faces::VIEW_STATE, token.as_str()));
        }

        Self { fields }
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Single-request denomination lookup form
pub fn denomination_form(term: &str, token: &ContinuationToken) -> Vec<(String, String)> {
    let execute = format!(
        "{} {} {}",
        denomination::SUBMIT_BUTTON,
        denomination::TERM_FIELD,
        denomination::EXACT_SWITCH
    );
    vec![
        field(faces::PARTIAL_AJAX, "true"),
        field(faces::SOURCE, denomination::SUBMIT_BUTTON),
        field(faces::PARTIAL_EXECUTE, &execute),
        field(faces::PARTIAL_RENDER, denomination::FORM),
        field(denomination::SUBMIT_BUTTON, denomination::SUBMIT_BUTTON),
        field(denomination::FORM, denomination::FORM),
        field(denomination::TERM_FIELD, term),
        field(faces::VIEW_STATE, token.as_str()),
    ]
}

fn field(name: &str, value: &str) -> (String, String) {
    (name.to_string(), value.to_string())
}
