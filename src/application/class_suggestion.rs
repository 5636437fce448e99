//! Nice class recovery from the classification service's free text
//!
//! The service is asked for `NUMBER|NAME|NOTE`, but replies drift: fenced
//! blocks, JSON objects, prose with a number in it, or nothing usable. Every
//! shape ends in a `ClassSuggestion`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::NiceClass;
use crate::infrastructure::parsing::json_repair::{parse_lenient, strip_fences};

const NOTE_MAX_CHARS: usize = 100;

static STANDALONE_NUMBER: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\b\d{1,2}\b").ok());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusinessKind {
    Product,
    Service,
}

impl BusinessKind {
    /// "producto"/"product" (any case, plural too) is a product; anything else
    /// is treated as a service.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim().to_lowercase();
        if label.starts_with("producto") || label.starts_with("product") {
            Self::Product
        } else {
            Self::Service
        }
    }
}

/// Which reply shape produced the suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuggestionSource {
    Delimited,
    Structured,
    StandaloneNumber,
    KeywordFallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSuggestion {
    pub primary: NiceClass,
    pub class_name: String,
    pub additional: Vec<NiceClass>,
    pub note: String,
    pub source: SuggestionSource,
}

impl ClassSuggestion {
    fn new(primary: NiceClass, class_name: Option<String>, note: String, source: SuggestionSource) -> Self {
        Self {
            class_name: class_name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| primary.name().to_string()),
            primary,
            additional: Vec::new(),
            note,
            source,
        }
    }
}

/// Never fails; the keyword fallback always yields a class.
pub fn parse_class_suggestion(raw: &str, kind: BusinessKind, description: &str) -> ClassSuggestion {
    let text = strip_fences(raw).replace("```", "");
    let text = text.trim();

    let suggestion = if text.starts_with('{') {
        from_structured(text).or_else(|| from_delimited(text))
    } else {
        from_delimited(text).or_else(|| from_structured(text))
    };

    suggestion
        .or_else(|| from_standalone_number(text))
        .unwrap_or_else(|| {
            warn!("Class suggestion unreadable ({} chars); using keyword fallback", raw.len());
            keyword_fallback(kind, description)
        })
}

fn from_delimited(text: &str) -> Option<ClassSuggestion> {
    let parts: Vec<&str> = text.split('|').map(str::trim).collect();
    if parts.len() < 2 {
        return None;
    }

    let name = parts[1].to_string();
    let note = parts.get(2).map_or_else(|| name.clone(), |note| (*note).to_string());
    let digits: String = parts[0]
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();

    match digits.parse::<i64>().ok().and_then(|n| NiceClass::new(n).ok()) {
        Some(class) => {
            debug!("Delimited class suggestion: {}", class);
            Some(ClassSuggestion::new(class, Some(name), note, SuggestionSource::Delimited))
        }
        None => {
            let fallback = NiceClass::GENERAL_SERVICES;
            warn!("Delimited class {:?} is not in 1-45; using {}", parts[0], fallback);
            Some(ClassSuggestion::new(fallback, None, note, SuggestionSource::Delimited))
        }
    }
}

fn from_structured(text: &str) -> Option<ClassSuggestion> {
    let (value, _) = parse_lenient(text)?;
    let object = value.as_object()?;
    let primary = object.get("clase_principal").and_then(class_from_value)?;

    let mut suggestion = ClassSuggestion::new(
        primary,
        object.get("clase_nombre").and_then(Value::as_str).map(str::to_string),
        object
            .get("nota")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        SuggestionSource::Structured,
    );
    if let Some(Value::Array(items)) = object.get("clases_adicionales") {
        suggestion.additional = items
            .iter()
            .filter_map(class_from_value)
            .filter(|class| *class != primary)
            .collect();
    }
    Some(suggestion)
}

fn class_from_value(value: &Value) -> Option<NiceClass> {
    match value {
        Value::Number(number) => number.as_i64().and_then(|n| NiceClass::new(n).ok()),
        Value::String(text) => text.parse().ok(),
        _ => None,
    }
}

fn from_standalone_number(text: &str) -> Option<ClassSuggestion> {
    let pattern = STANDALONE_NUMBER.as_ref()?;
    let first = pattern.find(text)?;
    let class = first.as_str().parse::<i64>().ok().and_then(|n| NiceClass::new(n).ok())?;
    let note: String = text.chars().take(NOTE_MAX_CHARS).collect();
    Some(ClassSuggestion::new(class, None, note, SuggestionSource::StandaloneNumber))
}

const PRODUCT_RULES: &[(&[&str], u8)] = &[
    (&["bebida", "refresco", "agua", "jugo"], 32),
    (&["comida", "alimento", "snack"], 29),
    (&["ropa", "vestido", "calzado"], 25),
];
const PRODUCT_DEFAULT: u8 = 1;

const SERVICE_RULES: &[(&[&str], u8)] = &[
    (&["restaurante", "cafetería", "cafeteria", "bar", "comida", "café", "cafe"], 43),
    (&["software", "desarrollo", "tecnolog", "it", "sistemas"], 42),
];
const SERVICE_DEFAULT: u8 = 35;

/// Keyword rules over the business description.
pub fn keyword_fallback(kind: BusinessKind, description: &str) -> ClassSuggestion {
    let (rules, default) = match kind {
        BusinessKind::Product => (PRODUCT_RULES, PRODUCT_DEFAULT),
        BusinessKind::Service => (SERVICE_RULES, SERVICE_DEFAULT),
    };
    let description = description.to_lowercase();
    let words: Vec<&str> = description
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect();

    let matched = rules
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|keyword| mentions(&description, &words, keyword)))
        .map(|(_, class)| *class);

    let (number, note) = match matched {
        Some(class) => (class, "Clasificación automática"),
        None => (default, "Clasificación por defecto"),
    };
    let class = NiceClass::try_from(number).unwrap_or(NiceClass::GENERAL_SERVICES);
    ClassSuggestion::new(class, None, note.to_string(), SuggestionSource::KeywordFallback)
}

// Short keywords ("it", "bar") must be whole words; longer ones are stems.
fn mentions(description: &str, words: &[&str], keyword: &str) -> bool {
    if keyword.chars().count() <= 3 {
        words.contains(&keyword)
    } else {
        description.contains(keyword)
    }
}
