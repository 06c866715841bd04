use serde::Serialize;
use std::fmt;

/// Host categories the estimator knows how to price or measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    Walls,
    Floors,
    Roofs,
    Ceilings,
    Doors,
    Windows,
    Stairs,
    StructuralColumns,
    StructuralFraming,
    StructuralFoundation,
    Rebar,
    Conduit,
    LightingFixtures,
    LightingDevices,
    ElectricalFixtures,
    ElectricalEquipment,
    MechanicalEquipment,
    PlumbingFixtures,
    PipeCurves,
    PipeFitting,
    PipeAccessory,
    GenericModel,
    SpecialityEquipment,
    Furniture,
    FurnitureSystems,
    Parking,
    Planting,
    Site,
}

// (category, display name, host built-in name)
const CATEGORY_NAMES: &[(Category, &str, &str)] = &[
    (Category::Walls, "Walls", "OST_Walls"),
    (Category::Floors, "Floors", "OST_Floors"),
    (Category::Roofs, "Roofs", "OST_Roofs"),
    (Category::Ceilings, "Ceilings", "OST_Ceilings"),
    (Category::Doors, "Doors", "OST_Doors"),
    (Category::Windows, "Windows", "OST_Windows"),
    (Category::Stairs, "Stairs", "OST_Stairs"),
    (
        Category::StructuralColumns,
        "Structural Columns",
        "OST_StructuralColumns",
    ),
    (
        Category::StructuralFraming,
        "Structural Framing",
        "OST_StructuralFraming",
    ),
    (
        Category::StructuralFoundation,
        "Structural Foundations",
        "OST_StructuralFoundation",
    ),
    (Category::Rebar, "Structural Rebar", "OST_Rebar"),
    (Category::Conduit, "Conduits", "OST_Conduit"),
    (
        Category::LightingFixtures,
        "Lighting Fixtures",
        "OST_LightingFixtures",
    ),
    (
        Category::LightingDevices,
        "Lighting Devices",
        "OST_LightingDevices",
    ),
    (
        Category::ElectricalFixtures,
        "Electrical Fixtures",
        "OST_ElectricalFixtures",
    ),
    (
        Category::ElectricalEquipment,
        "Electrical Equipment",
        "OST_ElectricalEquipment",
    ),
    (
        Category::MechanicalEquipment,
        "Mechanical Equipment",
        "OST_MechanicalEquipment",
    ),
    (
        Category::PlumbingFixtures,
        "Plumbing Fixtures",
        "OST_PlumbingFixtures",
    ),
    (Category::PipeCurves, "Pipes", "OST_PipeCurves"),
    (Category::PipeFitting, "Pipe Fittings", "OST_PipeFitting"),
    (Category::PipeAccessory, "Pipe Accessories", "OST_PipeAccessory"),
    (Category::GenericModel, "Generic Models", "OST_GenericModel"),
    (
        Category::SpecialityEquipment,
        "Specialty Equipment",
        "OST_SpecialityEquipment",
    ),
    (Category::Furniture, "Furniture", "OST_Furniture"),
    (
        Category::FurnitureSystems,
        "Furniture Systems",
        "OST_FurnitureSystems",
    ),
    (Category::Parking, "Parking", "OST_Parking"),
    (Category::Planting, "Planting", "OST_Planting"),
    (Category::Site, "Site", "OST_Site"),
];

/// Type categories whose `Cost` is built from a recipe.
pub const RATED_CATEGORIES: &[Category] = &[
    Category::Walls,
    Category::Floors,
    Category::Roofs,
    Category::Ceilings,
    Category::Doors,
    Category::Windows,
    Category::StructuralColumns,
    Category::StructuralFraming,
    Category::StructuralFoundation,
    Category::Rebar,
    Category::Conduit,
    Category::ElectricalFixtures,
    Category::ElectricalEquipment,
    Category::LightingFixtures,
    Category::LightingDevices,
    Category::PlumbingFixtures,
    Category::PipeCurves,
    Category::PipeFitting,
    Category::PipeAccessory,
    Category::GenericModel,
    Category::SpecialityEquipment,
];

/// Type categories whose comments feed BOQ descriptions.
pub const DESCRIBED_CATEGORIES: &[Category] = &[
    Category::Walls,
    Category::Floors,
    Category::Roofs,
    Category::StructuralFraming,
    Category::StructuralColumns,
    Category::Doors,
    Category::Windows,
    Category::PlumbingFixtures,
    Category::MechanicalEquipment,
    Category::ElectricalEquipment,
    Category::ElectricalFixtures,
    Category::GenericModel,
];

impl Category {
    /// Resolves a display name ("Structural Columns") or a built-in name
    /// ("OST_StructuralColumns"), ignoring case and surrounding whitespace.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        CATEGORY_NAMES
            .iter()
            .find(|(_, display, builtin)| {
                display.eq_ignore_ascii_case(name) || builtin.eq_ignore_ascii_case(name)
            })
            .map(|(category, _, _)| *category)
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        CATEGORY_NAMES
            .iter()
            .find(|(c, _, _)| *c == self)
            .map_or("Other", |(_, display, _)| display)
    }

    #[must_use]
    pub fn is_rated(self) -> bool {
        RATED_CATEGORIES.contains(&self)
    }

    #[must_use]
    pub fn is_described(self) -> bool {
        DESCRIBED_CATEGORIES.contains(&self)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
