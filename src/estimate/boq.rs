//! Bill of quantities: model elements grouped into bills, sections and
//! items, with the tender summary on top.

use super::amount::SkippedElement;
use super::comments::clean_description;
use super::quantity::{
    element_category, measure, MeasureMethod, MeasurePolicy, FT2_TO_M2, FT3_TO_M3, VOLUME_FIELD,
};
use crate::host::HostModel;
use crate::model::{Category, ElementId, ElementKind};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use Category as C;

pub const EARTHWORKS_SECTION: &str = "Cut and Fill";
pub const PAINTING_SECTION: &str = "Painting";

/// Host category of graded site surfaces, carrying cut and fill volumes.
pub const TOPOGRAPHY_CATEGORY: &str = "Topography";
pub const BUILDING_PAD_CATEGORIES: &[&str] = &["Pads", "Building Pads"];
pub const CUT_FIELD: &str = "Cut";
pub const FILL_FIELD: &str = "Fill";

const DEFAULT_PAINT: &str = "Paint";
const PAD_ESTIMATE_NOTE: &str =
    "Estimated from building pad volumes; the site has no graded cut or fill.";
const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Bill {
    Building,
    Services,
    External,
}

impl Bill {
    pub const ALL: [Bill; 3] = [Bill::Building, Bill::Services, Bill::External];

    #[must_use]
    pub fn number(self) -> usize {
        match self {
            Self::Building => 1,
            Self::Services => 2,
            Self::External => 3,
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Building => "Sub & Superstructure",
            Self::Services => "MEP",
            Self::External => "External Works",
        }
    }

    /// Worksheet name, e.g. `Bill 1`.
    #[must_use]
    pub fn sheet_name(self) -> String {
        format!("Bill {}", self.number())
    }
}

impl fmt::Display for Bill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bill No. {}: {}", self.number(), self.title().to_uppercase())
    }
}

/// Where a floor, wall or stair sits, read from its type's function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Internal,
    External,
}

impl Placement {
    #[must_use]
    pub fn from_function(function: &str) -> Self {
        let function = function.to_lowercase();
        if ["exterior", "external", "outside"]
            .iter()
            .any(|k| function.contains(k))
        {
            Self::External
        } else {
            Self::Internal
        }
    }
}

/// One section of a bill and the categories that feed it.
#[derive(Debug, Clone, Copy)]
pub struct SectionSpec {
    pub name: &'static str,
    pub bill: Bill,
    pub categories: &'static [Category],
    /// Only elements with this placement; `None` takes all.
    pub placement: Option<Placement>,
    pub preamble: &'static str,
}

const fn section(
    name: &'static str,
    bill: Bill,
    categories: &'static [Category],
    placement: Option<Placement>,
    preamble: &'static str,
) -> SectionSpec {
    SectionSpec {
        name,
        bill,
        categories,
        placement,
        preamble,
    }
}

/// Sections in printing order. An element lands in the first section that
/// takes its category and placement.
pub const SECTIONS: &[SectionSpec] = &[
    section(
        EARTHWORKS_SECTION,
        Bill::Building,
        &[],
        None,
        "Bulk excavation and filling to reduce levels, measured from the graded site.",
    ),
    section(
        "Structural Foundations",
        Bill::Building,
        &[C::StructuralFoundation],
        None,
        "Concrete footings including bedding, membrane and formwork.",
    ),
    section(
        "Internal Floors",
        Bill::Building,
        &[C::Floors],
        Some(Placement::Internal),
        "Floor slabs, screeds and finishes within the building footprint.",
    ),
    section(
        "Internal Walls",
        Bill::Building,
        &[C::Walls],
        Some(Placement::Internal),
        "Walling within the building envelope including plaster and finishes.",
    ),
    section(
        "Internal Stairs",
        Bill::Building,
        &[C::Stairs],
        Some(Placement::Internal),
        "Stair flights and landings within the building including balustrades.",
    ),
    section(
        "Structural Columns",
        Bill::Building,
        &[C::StructuralColumns],
        None,
        "Concrete or steel columns including reinforcement, ties and shuttering.",
    ),
    section(
        "Structural Framing",
        Bill::Building,
        &[C::StructuralFraming],
        None,
        "Beams and trusses, fabricated, fixed and primed.",
    ),
    section(
        "Structural Rebar",
        Bill::Building,
        &[C::Rebar],
        None,
        "Deformed bars cut, bent and fixed with chairs and spacers.",
    ),
    section(
        "Roofs",
        Bill::Building,
        &[C::Roofs],
        None,
        "Roof sheeting fixed to purlins complete with capping and flashings.",
    ),
    section(
        "Ceilings",
        Bill::Building,
        &[C::Ceilings],
        None,
        "Fixed or suspended ceilings to manufacturer's instructions.",
    ),
    section(
        "Windows",
        Bill::Building,
        &[C::Windows],
        None,
        "Glazed windows complete with ironmongery and fixings.",
    ),
    section(
        "Doors",
        Bill::Building,
        &[C::Doors],
        None,
        "Doors with frames, architraves, ironmongery and finishes.",
    ),
    section(
        "Electrical",
        Bill::Services,
        &[
            C::Conduit,
            C::LightingFixtures,
            C::LightingDevices,
            C::ElectricalFixtures,
            C::ElectricalEquipment,
        ],
        None,
        "Conduits, cabling, fittings and switchgear as specified.",
    ),
    section(
        "Plumbing",
        Bill::Services,
        &[C::PlumbingFixtures, C::PipeCurves, C::PipeFitting, C::PipeAccessory],
        None,
        "Sanitary appliances with pipework, fittings, valves and traps.",
    ),
    section(
        PAINTING_SECTION,
        Bill::Building,
        &[],
        None,
        "Painted wall faces on both sides, measured by area and grouped by paint material. \
         Rates are the paint material's cost where one is set.",
    ),
    section(
        "Wall and Floor Finishes",
        Bill::Building,
        &[C::GenericModel],
        None,
        "Tiling, screeds, plaster and paint finishes.",
    ),
    section(
        "Furniture",
        Bill::Building,
        &[C::Furniture, C::FurnitureSystems],
        None,
        "",
    ),
    section(
        "External Floors",
        Bill::External,
        &[C::Floors],
        Some(Placement::External),
        "External slabs, aprons, walkways and ramps exposed to weather.",
    ),
    section(
        "External Walls",
        Bill::External,
        &[C::Walls],
        Some(Placement::External),
        "External, retaining and boundary walling including weatherproofing.",
    ),
    section(
        "External Stairs",
        Bill::External,
        &[C::Stairs],
        Some(Placement::External),
        "External steps and stepped access including nosings and balustrades.",
    ),
    section(
        "Parking",
        Bill::External,
        &[C::Parking],
        None,
        "Parking bays including sub-base, wearing course, kerbs and markings.",
    ),
    section(
        "Planting",
        Bill::External,
        &[C::Planting],
        None,
        "Trees, shrubs and grassing including topsoil preparation.",
    ),
    section(
        "Site Works",
        Bill::External,
        &[C::Site, C::SpecialityEquipment],
        None,
        "Site preparation, street furniture and other external works.",
    ),
];

impl SectionSpec {
    #[must_use]
    pub fn takes(&self, category: Category, placement: Placement) -> bool {
        self.categories.contains(&category)
            && (self.placement.is_none() || self.placement == Some(placement))
    }
}

fn section_named(name: &str) -> Option<usize> {
    SECTIONS.iter().position(|s| s.name == name)
}

/// Index into [`SECTIONS`] of the section an element is billed under.
#[must_use]
pub fn section_for(category: Category, placement: Placement) -> Option<usize> {
    SECTIONS.iter().position(|s| s.takes(category, placement))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoqItem {
    pub name: String,
    pub description: String,
    pub unit: &'static str,
    /// Rounded to two decimals, as printed.
    pub quantity: f64,
    /// Rounded to two decimals, as printed.
    pub rate: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoqSection {
    pub name: &'static str,
    pub preamble: &'static str,
    pub items: Vec<BoqItem>,
}

impl BoqSection {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.items.iter().map(|i| i.amount).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillSheet {
    pub bill: Bill,
    pub sections: Vec<BoqSection>,
}

impl BillSheet {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.sections.iter().map(BoqSection::total).sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TenderSummary {
    pub sub_total_1: f64,
    pub discount: f64,
    pub sub_total_2: f64,
    pub contingency_rate: f64,
    pub contingency: f64,
    pub sub_total_3: f64,
    pub grand_total: f64,
}

impl TenderSummary {
    #[must_use]
    pub fn from_bills(bill_totals: &[f64], discount: f64, contingency_rate: f64) -> Self {
        let sub_total_1: f64 = bill_totals.iter().sum();
        let sub_total_2 = sub_total_1 * (1.0 - discount);
        let contingency = sub_total_2 * contingency_rate;
        let sub_total_3 = sub_total_2 + contingency;
        Self {
            sub_total_1,
            discount,
            sub_total_2,
            contingency_rate,
            contingency,
            sub_total_3,
            grand_total: sub_total_3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillOfQuantities {
    pub title: String,
    pub address: Option<String>,
    /// Always all three bills, in order, even when empty.
    pub bills: Vec<BillSheet>,
    pub summary: TenderSummary,
    pub skipped: Vec<SkippedElement>,
}

/// Inputs to [`build_boq`] that do not come from the model.
#[derive(Debug, Clone)]
pub struct BoqOptions {
    pub title: String,
    pub address: Option<String>,
    pub cost_field: String,
    pub comments_field: String,
    pub function_field: String,
    pub discount: f64,
    pub contingency: f64,
}

/// Items are keyed by name and unit, so one type measured two ways gives
/// two lines.
type ItemKey = (String, &'static str);
type Items = BTreeMap<ItemKey, ItemAccumulator>;

#[derive(Debug, Default)]
struct ItemAccumulator {
    quantity: f64,
    rate: f64,
    description: String,
}

impl ItemAccumulator {
    /// The first positive rate and the first description stick.
    fn add(&mut self, quantity: f64, rate: f64, description: &str) {
        self.quantity += quantity;
        if self.rate <= 0.0 && rate > 0.0 {
            self.rate = rate;
        }
        if self.description.is_empty() {
            self.description = description.to_string();
        }
    }
}

/// Measures every instance and groups it into the bill of quantities.
///
/// Elements in categories no section takes are left out silently; elements
/// in a billed category that cannot be measured are listed as skipped.
pub fn build_boq<H: HostModel + ?Sized>(host: &H, options: &BoqOptions) -> BillOfQuantities {
    // section index -> (type name, unit) -> item
    let mut grouped: BTreeMap<usize, Items> = BTreeMap::new();
    let mut skipped = Vec::new();

    for id in host.element_ids(ElementKind::Instance) {
        let Ok(category) = element_category(host, id) else {
            continue;
        };
        let type_id = host.type_of(id);
        let placement = type_id
            .and_then(|t| host.read_text(t, &options.function_field))
            .map_or(Placement::Internal, |f| Placement::from_function(&f));
        let Some(index) = section_for(category, placement) else {
            continue;
        };

        let quantity = match measure(host, id, MeasurePolicy::MaterialKeyword) {
            Ok(q) => q,
            Err(err) => {
                tracing::debug!(element = %id, reason = %err, "left out of bill");
                skipped.push(SkippedElement {
                    id,
                    reason: err.to_string(),
                });
                continue;
            }
        };

        let name = item_name(host, id, type_id);
        let rate = item_rate(host, id, type_id, &options.cost_field);
        let description = type_id
            .and_then(|t| host.read_text(t, &options.comments_field))
            .map(|c| clean_description(&c, &name))
            .unwrap_or_default();

        grouped
            .entry(index)
            .or_default()
            .entry((name, quantity.unit()))
            .or_default()
            .add(quantity.value, rate, &description);
    }

    for (section, items) in [
        (EARTHWORKS_SECTION, earthwork_items(host)),
        (PAINTING_SECTION, paint_items(host, &options.cost_field)),
    ] {
        if let Some(index) = section_named(section).filter(|_| !items.is_empty()) {
            grouped.insert(index, items);
        }
    }

    let bills: Vec<BillSheet> = Bill::ALL
        .iter()
        .map(|&bill| BillSheet {
            bill,
            sections: grouped
                .iter()
                .filter(|(index, _)| SECTIONS[**index].bill == bill)
                .map(|(index, items)| to_section(&SECTIONS[*index], items))
                .collect(),
        })
        .collect();

    let totals: Vec<f64> = bills.iter().map(BillSheet::total).collect();
    let summary = TenderSummary::from_bills(&totals, options.discount, options.contingency);

    tracing::info!(
        sections = bills.iter().map(|b| b.sections.len()).sum::<usize>(),
        skipped = skipped.len(),
        grand_total = summary.grand_total,
        "built bill of quantities"
    );

    BillOfQuantities {
        title: options.title.clone(),
        address: options.address.clone(),
        bills,
        summary,
        skipped,
    }
}

/// Cut and fill volumes summed over the graded site. Without any, building
/// pad volumes stand in as an excavation estimate.
fn earthwork_items<H: HostModel + ?Sized>(host: &H) -> Items {
    let (mut cut, mut fill, mut pads) = (0.0, 0.0, 0.0);
    let volume = |id: ElementId, field: &str| {
        host.read_number(id, field).unwrap_or(0.0).max(0.0) * FT3_TO_M3
    };

    for id in host.element_ids(ElementKind::Instance) {
        let Some(category) = host.category(id) else {
            continue;
        };
        if category == TOPOGRAPHY_CATEGORY {
            cut += volume(id, CUT_FIELD);
            fill += volume(id, FILL_FIELD);
        } else if BUILDING_PAD_CATEGORIES.contains(&category.as_str()) {
            pads += volume(id, VOLUME_FIELD);
        }
    }

    let unit = MeasureMethod::Volume.unit();
    let mut items = Items::new();
    if cut > EPSILON {
        items.entry(("Cut Volume".into(), unit)).or_default().add(cut, 0.0, "");
    }
    if fill > EPSILON {
        items.entry(("Fill Volume".into(), unit)).or_default().add(fill, 0.0, "");
    }
    if items.is_empty() && pads > EPSILON {
        items
            .entry(("Pad Excavation (est.)".into(), unit))
            .or_default()
            .add(pads, 0.0, PAD_ESTIMATE_NOTE);
    }
    items
}

/// Painted wall faces as `Paint - {material}` items in square metres.
fn paint_items<H: HostModel + ?Sized>(host: &H, cost_field: &str) -> Items {
    let mut items = Items::new();

    for id in host.element_ids(ElementKind::Instance) {
        if element_category(host, id) != Ok(Category::Walls) {
            continue;
        }
        for face in host.painted_faces(id) {
            let material = face
                .material
                .and_then(|m| host.name(m))
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PAINT.to_string());
            let rate = face
                .material
                .and_then(|m| host.read_number(m, cost_field))
                .unwrap_or(0.0);
            items
                .entry((format!("Paint - {material}"), MeasureMethod::Area.unit()))
                .or_default()
                .add(face.area * FT2_TO_M2, rate, "");
        }
    }
    items
}

fn to_section(section: &SectionSpec, items: &Items) -> BoqSection {
    BoqSection {
        name: section.name,
        preamble: section.preamble,
        items: items
            .iter()
            .map(|((name, unit), acc)| {
                let quantity = round2(acc.quantity);
                let rate = round2(acc.rate);
                BoqItem {
                    name: name.clone(),
                    description: acc.description.clone(),
                    unit: *unit,
                    quantity,
                    rate,
                    amount: quantity * rate,
                }
            })
            .collect(),
    }
}

fn item_name<H: HostModel + ?Sized>(host: &H, id: ElementId, type_id: Option<ElementId>) -> String {
    type_id
        .and_then(|t| host.name(t))
        .or_else(|| host.name(id))
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| format!("Element {id}"))
}

/// Type cost, or the instance's own cost when the type has none.
fn item_rate<H: HostModel + ?Sized>(
    host: &H,
    id: ElementId,
    type_id: Option<ElementId>,
    cost_field: &str,
) -> f64 {
    type_id
        .and_then(|t| host.read_number(t, cost_field))
        .filter(|c| *c > 0.0)
        .or_else(|| host.read_number(id, cost_field))
        .unwrap_or(0.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
