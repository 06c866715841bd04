//! Cost estimation over a host model: recipe evaluation, quantities and the
//! batch operations built on them.

pub mod amount;
pub mod boq;
pub mod check;
pub mod comments;
pub mod evaluator;
pub mod materials;
pub mod quantity;
pub mod rate;
pub mod total;

pub use amount::{apply_amounts, plan_amounts, AmountFields, AmountReport};
pub use boq::{build_boq, BillOfQuantities, BoqOptions};
pub use check::{
    apply_renames, check_types, search_types, RenameReport, SearchResult, TypeCheck,
};
pub use comments::{apply_type_comments, extract_type_comments, CommentReport, TypeComment};
pub use evaluator::{evaluate, CostBreakdown};
pub use materials::{material_list, MaterialList};
pub use quantity::{measure, MeasureMethod, MeasurePolicy, Quantity};
pub use rate::{apply_rates, plan_rates, RateReport};
pub use total::{grand_total, instance_total, AmountTotal, GrandTotal};
