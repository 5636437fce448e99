//! Viability analysis recovered from the analysis service

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Write as _;

use super::nice_class::NiceClass;

/// Highest viability the business ever reports; a human examiner always decides.
pub const MAX_VIABILITY_SCORE: u8 = 85;

pub const FALLBACK_VIABILITY_SCORE: u8 = 25;
pub const FALLBACK_RISK_LEVEL: &str = "ALTO";
pub const FALLBACK_NARRATIVE: &str = "La respuesta del servicio de análisis no pudo recuperarse; \
     se asigna una viabilidad conservadora pendiente de revisión manual.";

/// How the structured payload was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairPath {
    Direct,
    BracketRepair,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairedAnalysis {
    pub viability_score: u8,
    pub risk_level: String,
    pub conflicting_entries: Vec<Map<String, Value>>,
    pub narrative: String,
    pub recommendations: Vec<String>,
    pub risk_factors: Vec<String>,
    pub favorable_factors: Vec<String>,
    pub repair_path: RepairPath,
}

impl RepairedAnalysis {
    /// Fixed payload used when nothing could be recovered.
    pub fn unrecoverable() -> Self {
        Self {
            viability_score: FALLBACK_VIABILITY_SCORE,
            risk_level: FALLBACK_RISK_LEVEL.to_string(),
            conflicting_entries: Vec::new(),
            narrative: FALLBACK_NARRATIVE.to_string(),
            recommendations: Vec::new(),
            risk_factors: Vec::new(),
            favorable_factors: Vec::new(),
            repair_path: RepairPath::Fallback,
        }
    }

    pub fn category(&self) -> ViabilityCategory {
        ViabilityCategory::from_score(self.viability_score)
    }

    pub fn is_fallback(&self) -> bool {
        self.repair_path == RepairPath::Fallback
    }

    /// Plain-text summary block shown at the top of the opinion.
    pub fn executive_summary(&self, term: &str, class: Option<NiceClass>) -> String {
        let rule = "=".repeat(60);
        let category = self.category();
        let class_label =
            class.map_or_else(|| "No especificada".to_string(), |class| class.to_string());

        let mut summary = String::new();
        let _ = writeln!(summary, "RESUMEN EJECUTIVO - ANÁLISIS DE VIABILIDAD");
        let _ = writeln!(summary, "{rule}");
        let _ = writeln!(summary);
        let _ = writeln!(summary, "Marca: {term}");
        let _ = writeln!(summary, "Clase: {class_label}");
        let _ = writeln!(summary);
        let _ = writeln!(summary, "VIABILIDAD: {}%", self.viability_score);
        let _ = writeln!(summary, "CATEGORÍA: {}", category.code());
        let _ = writeln!(summary, "NIVEL DE RIESGO: {}", self.risk_level);
        let _ = writeln!(summary);
        let _ = writeln!(summary, "{}", category.description());
        let _ = writeln!(summary);
        let _ = writeln!(summary, "{rule}");
        summary
    }
}

impl Default for RepairedAnalysis {
    fn default() -> Self {
        Self::unrecoverable()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViabilityCategory {
    VeryLow,
    Low,
    Medium,
    High,
}

impl ViabilityCategory {
    pub const fn from_score(score: u8) -> Self {
        match score {
            0..=25 => Self::VeryLow,
            26..=50 => Self::Low,
            51..=65 => Self::Medium,
            _ => Self::High,
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::VeryLow => "MUY_BAJA",
            Self::Low => "BAJA",
            Self::Medium => "MEDIA",
            Self::High => "ALTA",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::VeryLow => "Muy pocas posibilidades - No recomendado registrar",
            Self::Low => "Pocas posibilidades - Riesgoso, considerar alternativas",
            Self::Medium => "Posible con cambios - Agregar slogan o modificar descripción",
            Self::High => "Buena posibilidad - Recomendado para registro",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, ViabilityCategory::VeryLow)]
    #[case(25, ViabilityCategory::VeryLow)]
    #[case(26, ViabilityCategory::Low)]
    #[case(50, ViabilityCategory::Low)]
    #[case(65, ViabilityCategory::Medium)]
    #[case(66, ViabilityCategory::High)]
    #[case(85, ViabilityCategory::High)]
    fn categorizes_scores(#[case] score: u8, #[case] expected: ViabilityCategory) {
        assert_eq!(ViabilityCategory::from_score(score), expected);
    }

    #[test]
    fn fallback_payload_is_fixed() {
        let fallback = RepairedAnalysis::unrecoverable();
        assert_eq!(fallback.viability_score, 25);
        assert_eq!(fallback.risk_level, "ALTO");
        assert!(fallback.conflicting_entries.is_empty());
        assert!(fallback.is_fallback());
        assert!(!fallback.narrative.is_empty());
    }

    #[test]
    fn summary_mentions_term_score_and_category() {
        let analysis = RepairedAnalysis {
            viability_score: 60,
            risk_level: "MEDIO".to_string(),
            repair_path: RepairPath::Direct,
            ..RepairedAnalysis::unrecoverable()
        };
        let summary = analysis.executive_summary("LUNA AZUL", NiceClass::new(30).ok());
        assert!(summary.contains("Marca: LUNA AZUL"));
        assert!(summary.contains("Clase: 30"));
        assert!(summary.contains("VIABILIDAD: 60%"));
        assert!(summary.contains("CATEGORÍA: MEDIA"));

        let unclassified = analysis.executive_summary("LUNA AZUL", None);
        assert!(unclassified.contains("Clase: No especificada"));
    }
}
