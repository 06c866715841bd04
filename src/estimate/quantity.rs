//! Measuring an element in metric units, by category.
//!
//! Hosts store lengths in feet, areas in square feet and volumes in cubic
//! feet. Every quantity leaving this module is metric.
//!
//! Structural columns and framing have two measurement rules that are kept
//! apart on purpose: [`MeasurePolicy::ExactMaterial`] prices per-element
//! amounts and only accepts two known column materials, while
//! [`MeasurePolicy::MaterialKeyword`] fills BOQ bills and picks the method by
//! keyword in the material name.

use crate::error::QuantityError;
use crate::host::HostModel;
use crate::model::{Category, ElementId};
use serde::Serialize;
use std::fmt;

pub const FT_TO_M: f64 = 0.3048;
pub const FT2_TO_M2: f64 = 0.092903;
pub const FT3_TO_M3: f64 = 0.028_316_8;

pub const CONCRETE_COLUMN_MATERIAL: &str = "Concrete - Cast-in-Place Concrete";
pub const STEEL_COLUMN_MATERIAL: &str = "Metal - Steel 43-275";

pub const VOLUME_FIELD: &str = "Volume";
pub const AREA_FIELD: &str = "Area";
pub const LENGTH_FIELD: &str = "Length";
pub const TOTAL_BAR_LENGTH_FIELD: &str = "Total Bar Length";
pub const STRUCTURAL_MATERIAL_FIELD: &str = "Structural Material";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MeasureMethod {
    Count,
    Length,
    Area,
    Volume,
}

impl MeasureMethod {
    #[must_use]
    pub fn unit(self) -> &'static str {
        match self {
            Self::Count => "No.",
            Self::Length => "m",
            Self::Area => "m²",
            Self::Volume => "m³",
        }
    }

    /// Factor from the host's internal unit to the metric unit.
    #[must_use]
    pub fn conversion(self) -> f64 {
        match self {
            Self::Count => 1.0,
            Self::Length => FT_TO_M,
            Self::Area => FT2_TO_M2,
            Self::Volume => FT3_TO_M3,
        }
    }
}

impl fmt::Display for MeasureMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Count => "count",
            Self::Length => "length",
            Self::Area => "area",
            Self::Volume => "volume",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurePolicy {
    /// Columns by exact material name; anything else is unsupported.
    ExactMaterial,
    /// Columns and framing by `concrete`/`steel`/`metal` keyword.
    MaterialKeyword,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quantity {
    pub method: MeasureMethod,
    pub value: f64,
}

impl Quantity {
    #[must_use]
    pub fn unit(&self) -> &'static str {
        self.method.unit()
    }
}

/// Measurement method for categories priced per element. Structural columns
/// and categories only measured for bills return `None`.
#[must_use]
pub fn category_method(category: Category) -> Option<MeasureMethod> {
    use Category as C;
    use MeasureMethod as M;

    match category {
        C::Doors
        | C::Windows
        | C::LightingFixtures
        | C::LightingDevices
        | C::ElectricalFixtures
        | C::ElectricalEquipment
        | C::PlumbingFixtures
        | C::PipeFitting
        | C::PipeAccessory => Some(M::Count),
        C::StructuralFraming | C::Conduit | C::Rebar | C::PipeCurves => Some(M::Length),
        C::Walls | C::Roofs | C::Ceilings | C::GenericModel => Some(M::Area),
        C::Floors | C::StructuralFoundation => Some(M::Volume),
        _ => None,
    }
}

/// Whether per-element amounts cover `category`.
#[must_use]
pub fn is_priced_category(category: Category) -> bool {
    category == Category::StructuralColumns || category_method(category).is_some()
}

/// Categories that only appear in BOQ bills, counted per element.
fn bill_method(category: Category) -> Option<MeasureMethod> {
    use Category as C;

    match category {
        C::Stairs
        | C::MechanicalEquipment
        | C::SpecialityEquipment
        | C::Furniture
        | C::FurnitureSystems
        | C::Parking
        | C::Planting
        | C::Site => Some(MeasureMethod::Count),
        _ => None,
    }
}

/// Parses the element's category, distinguishing "no category" from "a
/// category this crate does not measure".
pub fn element_category<H: HostModel + ?Sized>(
    host: &H,
    id: ElementId,
) -> Result<Category, QuantityError> {
    let name = host.category(id).ok_or(QuantityError::MissingCategory)?;
    Category::from_name(&name).ok_or(QuantityError::UnrecognizedCategory(name))
}

/// Picks the measurement method for one element under `policy`.
pub fn resolve_method<H: HostModel + ?Sized>(
    host: &H,
    id: ElementId,
    policy: MeasurePolicy,
) -> Result<MeasureMethod, QuantityError> {
    let category = element_category(host, id)?;

    match (category, policy) {
        (Category::StructuralColumns, MeasurePolicy::ExactMaterial) => {
            let material = structural_material(host, id)?;
            match material.as_str() {
                CONCRETE_COLUMN_MATERIAL => Ok(MeasureMethod::Volume),
                STEEL_COLUMN_MATERIAL => Ok(MeasureMethod::Length),
                _ => Err(QuantityError::UnsupportedMaterial(material)),
            }
        }
        (Category::StructuralColumns, MeasurePolicy::MaterialKeyword) => {
            let material = structural_material(host, id)
                .unwrap_or_default()
                .to_lowercase();
            let volume = host.read_number(id, VOLUME_FIELD);
            let length = host.read_number(id, LENGTH_FIELD);
            let preferred = if material.contains("concrete") {
                [(volume, MeasureMethod::Volume), (length, MeasureMethod::Length)]
            } else if material.contains("steel") || material.contains("metal") {
                [(length, MeasureMethod::Length), (volume, MeasureMethod::Volume)]
            } else {
                [
                    (volume.filter(|v| *v > 0.0), MeasureMethod::Volume),
                    (length, MeasureMethod::Length),
                ]
            };
            preferred
                .into_iter()
                .find_map(|(value, method)| value.map(|_| method))
                .ok_or_else(|| QuantityError::MissingField {
                    field: format!("{VOLUME_FIELD}/{LENGTH_FIELD}"),
                })
        }
        (Category::StructuralFraming, MeasurePolicy::MaterialKeyword) => {
            let material = structural_material(host, id)
                .unwrap_or_default()
                .to_lowercase();
            Ok(if material.contains("concrete") {
                MeasureMethod::Volume
            } else {
                MeasureMethod::Length
            })
        }
        (category, MeasurePolicy::ExactMaterial) => category_method(category)
            .ok_or_else(|| QuantityError::UnrecognizedCategory(category.to_string())),
        (category, MeasurePolicy::MaterialKeyword) => category_method(category)
            .or_else(|| bill_method(category))
            .ok_or_else(|| QuantityError::UnrecognizedCategory(category.to_string())),
    }
}

/// Measures one element under `policy`.
///
/// # Errors
///
/// Fails with a distinct [`QuantityError`] for a missing or unknown
/// category, an unsupported column material, or a missing geometry field.
/// A missing value is never read as zero.
pub fn measure<H: HostModel + ?Sized>(
    host: &H,
    id: ElementId,
    policy: MeasurePolicy,
) -> Result<Quantity, QuantityError> {
    let method = resolve_method(host, id, policy)?;

    let field = match method {
        MeasureMethod::Count => {
            return Ok(Quantity { method, value: 1.0 });
        }
        MeasureMethod::Volume => VOLUME_FIELD,
        MeasureMethod::Area => AREA_FIELD,
        MeasureMethod::Length => {
            if element_category(host, id)? == Category::Rebar {
                TOTAL_BAR_LENGTH_FIELD
            } else {
                LENGTH_FIELD
            }
        }
    };

    let raw = host
        .read_number(id, field)
        .ok_or_else(|| QuantityError::MissingField {
            field: field.to_string(),
        })?;

    Ok(Quantity {
        method,
        value: raw * method.conversion(),
    })
}

/// Structural material name from the element, or from its type.
fn structural_material<H: HostModel + ?Sized>(
    host: &H,
    id: ElementId,
) -> Result<String, QuantityError> {
    host.read_text(id, STRUCTURAL_MATERIAL_FIELD)
        .or_else(|| {
            host.type_of(id)
                .and_then(|t| host.read_text(t, STRUCTURAL_MATERIAL_FIELD))
        })
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .ok_or_else(|| QuantityError::MissingField {
            field: STRUCTURAL_MATERIAL_FIELD.to_string(),
        })
}
