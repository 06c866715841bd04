pub mod category;
pub mod element;
pub mod price;
pub mod project;
pub mod recipe;

pub use category::Category;
pub use element::{Element, ElementId, ElementKind, Field, FieldValue, PaintedFace};
pub use price::{
    KeyNormalization, PriceColumn, PriceEntry, PriceLookup, PriceSource, Tier, UnitPriceTable,
    NATIONAL_REGION,
};
pub use project::Project;
pub use recipe::{
    MarkupBucket, MaterialLine, Recipe, RecipeBook, RecipeSchema, RejectedRow, RowEffect,
};
