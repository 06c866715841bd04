use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque identifier the host gives every element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// A placed element (wall segment, door, pipe run).
    Instance,
    /// A type shared by instances; carries the unit `Cost`.
    Type,
    /// A paint or finish material.
    Material,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }
}

/// A named parameter. `value == None` is a parameter that exists but has no
/// value yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "FieldRepr", into = "FieldRepr")]
pub struct Field {
    pub value: Option<FieldValue>,
    pub read_only: bool,
}

impl Field {
    #[must_use]
    pub fn number(value: f64) -> Self {
        Self {
            value: Some(FieldValue::Number(value)),
            read_only: false,
        }
    }

    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: Some(FieldValue::Text(value.into())),
            read_only: false,
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            value: None,
            read_only: false,
        }
    }

    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

// Snapshot files may write `"Area": 12.5` or `{"value": 12.5, "read_only": true}`.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum FieldRepr {
    Bare(Option<FieldValue>),
    Full {
        value: Option<FieldValue>,
        #[serde(default)]
        read_only: bool,
    },
}

impl From<FieldRepr> for Field {
    fn from(repr: FieldRepr) -> Self {
        match repr {
            FieldRepr::Bare(value) => Self {
                value,
                read_only: false,
            },
            FieldRepr::Full { value, read_only } => Self { value, read_only },
        }
    }
}

impl From<Field> for FieldRepr {
    fn from(field: Field) -> Self {
        if field.read_only {
            FieldRepr::Full {
                value: field.value,
                read_only: true,
            }
        } else {
            FieldRepr::Bare(field.value)
        }
    }
}

/// A painted face on a host element, as the paint tool records it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaintedFace {
    /// Paint material element; `None` when the host lost track of it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<ElementId>,
    /// Face area in square feet.
    pub area: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub kind: ElementKind,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_id: Option<ElementId>,
    #[serde(default)]
    pub fields: BTreeMap<String, Field>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paint: Vec<PaintedFace>,
}

impl Element {
    #[must_use]
    pub fn new(id: u64, kind: ElementKind, name: impl Into<String>) -> Self {
        Self {
            id: ElementId(id),
            kind,
            name: name.into(),
            category: None,
            type_id: None,
            fields: BTreeMap::new(),
            paint: Vec::new(),
        }
    }

    #[must_use]
    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn of_type(mut self, type_id: u64) -> Self {
        self.type_id = Some(ElementId(type_id));
        self
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    #[must_use]
    pub fn painted(mut self, material: u64, area: f64) -> Self {
        self.paint.push(PaintedFace {
            material: Some(ElementId(material)),
            area,
        });
        self
    }

    #[must_use]
    pub fn number(&self, field: &str) -> Option<f64> {
        self.fields
            .get(field)
            .and_then(|f| f.value.as_ref())
            .and_then(FieldValue::as_number)
    }

    #[must_use]
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(|f| f.value.as_ref())
            .and_then(FieldValue::as_text)
    }
}
