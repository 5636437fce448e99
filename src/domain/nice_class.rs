//! Nice classification (goods and services classes 1-45)
//!
//! The registry files every trademark under exactly one Nice class. Classes
//! 1-34 cover goods, 35-45 cover services.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const MIN_NICE_CLASS: u8 = 1;
pub const MAX_NICE_CLASS: u8 = 45;

/// Last class number that still describes goods.
const LAST_GOODS_CLASS: u8 = 34;

/// Short customer-facing names, index 0 = class 1.
const CLASS_NAMES: [&str; MAX_NICE_CLASS as usize] = [
    "Productos químicos",
    "Pinturas y barnices",
    "Cosméticos y productos de limpieza",
    "Lubricantes y combustibles",
    "Productos farmacéuticos",
    "Metales comunes y sus aleaciones",
    "Máquinas y máquinas herramientas",
    "Herramientas e instrumentos de mano",
    "Aparatos e instrumentos científicos y electrónicos",
    "Aparatos e instrumentos médicos",
    "Aparatos de iluminación, calefacción y cocción",
    "Vehículos y medios de transporte",
    "Armas de fuego y pirotecnia",
    "Joyería y relojería",
    "Instrumentos musicales",
    "Papel, cartón y artículos de oficina",
    "Caucho, plásticos y materiales aislantes",
    "Cuero, equipaje y artículos de viaje",
    "Materiales de construcción no metálicos",
    "Muebles y artículos de madera",
    "Utensilios de cocina y recipientes",
    "Cuerdas, lonas y materiales textiles",
    "Hilos para uso textil",
    "Tejidos y cubiertas textiles",
    "Prendas de vestir, calzado y sombreros",
    "Artículos de mercería y pasamanería",
    "Alfombras y revestimientos de suelos",
    "Juegos, juguetes y artículos deportivos",
    "Carne, pescado, frutas y verduras procesadas",
    "Café, té, cacao, pan y pastelería",
    "Productos agrícolas y forestales",
    "Cervezas, bebidas sin alcohol y aguas",
    "Bebidas alcohólicas (excepto cervezas)",
    "Tabaco y artículos para fumadores",
    "Publicidad y gestión de negocios",
    "Servicios financieros y de seguros",
    "Servicios de construcción y reparación",
    "Servicios de telecomunicaciones",
    "Servicios de transporte y almacenamiento",
    "Tratamiento de materiales",
    "Educación, formación y entretenimiento",
    "Servicios científicos y tecnológicos",
    "Servicios de restauración y hospedaje",
    "Servicios médicos y de belleza",
    "Servicios jurídicos y de seguridad",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NiceClassError {
    #[error("Nice class {0} is outside 1-45")]
    OutOfRange(i64),

    #[error("Nice class '{0}' is not numeric")]
    NotNumeric(String),
}

/// A class number guaranteed to be within 1-45.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct NiceClass(u8);

impl NiceClass {
    /// Advertising and business management; the catch-all for services
    pub const GENERAL_SERVICES: Self = Self(35);

    pub fn new(number: i64) -> Result<Self, NiceClassError> {
        if (i64::from(MIN_NICE_CLASS)..=i64::from(MAX_NICE_CLASS)).contains(&number) {
            // Range checked above
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Ok(Self(number as u8))
        } else {
            Err(NiceClassError::OutOfRange(number))
        }
    }

    pub const fn number(self) -> u8 {
        self.0
    }

    pub fn name(self) -> &'static str {
        CLASS_NAMES[usize::from(self.0 - 1)]
    }

    pub const fn is_goods(self) -> bool {
        self.0 <= LAST_GOODS_CLASS
    }

    pub const fn is_services(self) -> bool {
        self.0 > LAST_GOODS_CLASS
    }

    /// All 45 classes in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (MIN_NICE_CLASS..=MAX_NICE_CLASS).map(Self)
    }
}

impl TryFrom<i64> for NiceClass {
    type Error = NiceClassError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<u8> for NiceClass {
    type Error = NiceClassError;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        Self::new(i64::from(number))
    }
}

impl From<NiceClass> for u8 {
    fn from(class: NiceClass) -> Self {
        class.0
    }
}

impl FromStr for NiceClass {
    type Err = NiceClassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let number: i64 = trimmed
            .parse()
            .map_err(|_| NiceClassError::NotNumeric(trimmed.to_string()))?;
        Self::new(number)
    }
}

impl fmt::Display for NiceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name lookup that tolerates out-of-range input, e.g. for display of raw cells.
pub fn nice_class_label(number: i64) -> String {
    NiceClass::new(number).map_or_else(
        |_| format!("Clase {number}"),
        |class| class.name().to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1", 1)]
    #[case(" 45 ", 45)]
    #[case("09", 9)]
    fn parses_valid_classes(#[case] raw: &str, #[case] expected: u8) {
        assert_eq!(raw.parse::<NiceClass>().unwrap().number(), expected);
    }

    #[rstest]
    #[case("0")]
    #[case("46")]
    #[case("-3")]
    #[case("")]
    #[case("32a")]
    fn rejects_invalid_classes(#[case] raw: &str) {
        assert!(raw.parse::<NiceClass>().is_err());
    }

    #[test]
    fn goods_and_services_split_at_35() {
        assert!(NiceClass::new(34).unwrap().is_goods());
        assert!(NiceClass::new(35).unwrap().is_services());
        assert_eq!(NiceClass::all().count(), 45);
    }

    #[test]
    fn names_line_up_with_numbers() {
        assert_eq!(NiceClass::new(32).unwrap().name(), "Cervezas, bebidas sin alcohol y aguas");
        assert_eq!(NiceClass::new(45).unwrap().name(), "Servicios jurídicos y de seguridad");
        assert_eq!(nice_class_label(99), "Clase 99");
    }

    #[test]
    fn serde_rejects_out_of_range() {
        assert!(serde_json::from_str::<NiceClass>("46").is_err());
        let class: NiceClass = serde_json::from_str("25").unwrap();
        assert_eq!(serde_json::to_string(&class).unwrap(), "25");
    }
}
