//! Viability analysis payload -> `RepairedAnalysis`
//!
//! Never fails: a missing key gets its field default, a payload that cannot be
//! recovered at all becomes [`RepairedAnalysis::unrecoverable`].

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::json_repair::parse_lenient;
use crate::domain::analysis::MAX_VIABILITY_SCORE;
use crate::domain::{RepairPath, RepairedAnalysis};

const DEFAULT_VIABILITY_SCORE: i64 = 50;
const DEFAULT_RISK_LEVEL: &str = "MEDIO";

/// Keys as the analysis service emits them; every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AnalysisPayload {
    porcentaje_viabilidad: Option<Value>,
    nivel_riesgo: Option<Value>,
    top_15_conflictivas: Option<Value>,
    marcas_conflictivas: Option<Value>,
    analisis_detallado: Option<Value>,
    recomendaciones: Option<Value>,
    factores_riesgo: Option<Value>,
    factores_favorables: Option<Value>,
}

/// Best-effort structured analysis from raw service text. Pure.
pub fn repair_analysis(raw: &str) -> RepairedAnalysis {
    let Some((value, repair_path)) = parse_lenient(raw) else {
        warn!("Analysis response unrecoverable ({} chars); using fallback", raw.len());
        return RepairedAnalysis::unrecoverable();
    };

    if !value.is_object() {
        warn!("Analysis response is not an object; using fallback");
        return RepairedAnalysis::unrecoverable();
    }

    let payload = match serde_json::from_value::<AnalysisPayload>(value) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Analysis response has unexpected shape: {}; using fallback", e);
            return RepairedAnalysis::unrecoverable();
        }
    };

    if repair_path == RepairPath::BracketRepair {
        debug!("Analysis response recovered by bracket repair");
    }

    from_payload(payload, repair_path)
}

fn from_payload(payload: AnalysisPayload, repair_path: RepairPath) -> RepairedAnalysis {
    let conflicting = payload
        .top_15_conflictivas
        .filter(Value::is_array)
        .or(payload.marcas_conflictivas);

    RepairedAnalysis {
        viability_score: viability_score(payload.porcentaje_viabilidad.as_ref()),
        risk_level: risk_level(payload.nivel_riesgo.as_ref()),
        conflicting_entries: object_list(conflicting),
        narrative: payload
            .analisis_detallado
            .as_ref()
            .map(scalar_text)
            .unwrap_or_default(),
        recommendations: string_list(payload.recomendaciones),
        risk_factors: string_list(payload.factores_riesgo),
        favorable_factors: string_list(payload.factores_favorables),
        repair_path,
    }
}

/// Clamped into [0, 85]; accepts integers, floats and strings like "40%".
pub fn viability_score(value: Option<&Value>) -> u8 {
    let raw = value.and_then(score_number).unwrap_or(DEFAULT_VIABILITY_SCORE);
    let clamped = raw.clamp(0, i64::from(MAX_VIABILITY_SCORE));
    u8::try_from(clamped).unwrap_or(MAX_VIABILITY_SCORE)
}

fn score_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.is_finite())
                .map(|float| float.round().clamp(-1.0, 1000.0) as i64)
        }),
        Value::String(text) => {
            let trimmed = text.trim();
            let negative = trimmed.starts_with('-');
            let digits: String = trimmed
                .chars()
                .skip_while(|c| !c.is_ascii_digit())
                .take_while(char::is_ascii_digit)
                .take(6)
                .collect();
            digits
                .parse::<i64>()
                .ok()
                .map(|number| if negative { -number } else { number })
        }
        _ => None,
    }
}

fn risk_level(value: Option<&Value>) -> String {
    value
        .map(scalar_text)
        .map(|text| text.trim().to_uppercase())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| DEFAULT_RISK_LEVEL.to_string())
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
        other => other.to_string(),
    }
}

fn string_list(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(scalar_text)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .collect(),
        Some(Value::String(text)) if !text.trim().is_empty() => vec![text.trim().to_string()],
        _ => Vec::new(),
    }
}

fn object_list(value: Option<Value>) -> Vec<Map<String, Value>> {
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}
