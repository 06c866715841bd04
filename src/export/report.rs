//! Markdown run summaries printed after each operation.

use crate::estimate::boq::BillOfQuantities;
use crate::estimate::{
    AmountReport, AmountTotal, CommentReport, GrandTotal, MaterialList, RateReport,
    RenameReport, SearchResult, TypeCheck,
};
use std::fmt;

/// Renders a report as markdown. `currency` prefixes money amounts.
pub struct Markdown<'a, T> {
    pub report: &'a T,
    pub currency: &'a str,
}

impl<'a, T> Markdown<'a, T> {
    #[must_use]
    pub fn new(report: &'a T, currency: &'a str) -> Self {
        Self { report, currency }
    }

    fn money(&self, value: f64) -> String {
        format!("{} {}", self.currency, thousands(value))
    }
}

/// `1234567.891` → `1,234,567.89`
#[must_use]
pub fn thousands(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac}")
}

impl fmt::Display for Markdown<'_, RateReport> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.report;
        writeln!(f, "## Composite & paint cost update ({})", r.column)?;

        if !r.sources.is_empty() {
            writeln!(f, "\n### Price files loaded")?;
            for path in &r.sources {
                writeln!(f, "- {}", path.display())?;
            }
        }

        if r.is_empty() {
            return writeln!(f, "\nNo matching types or materials found.");
        }

        if !r.updated.is_empty() {
            writeln!(f, "\n### Updated types")?;
            for t in &r.updated {
                let applied = t.breakdown.applied.labels();
                let markups = if applied.is_empty() {
                    String::new()
                } else {
                    format!(" (+ {})", applied.join(", "))
                };
                let fallback = if t.breakdown.used_national_fallback() {
                    " [national price used]"
                } else {
                    ""
                };
                writeln!(
                    f,
                    "- {}: {}{}{}",
                    t.name,
                    self.money(t.breakdown.total),
                    markups,
                    fallback
                )?;
            }
        }

        if !r.skipped.is_empty() {
            writeln!(f, "\n### Skipped types")?;
            for t in &r.skipped {
                writeln!(f, "- {} ({})", t.name, t.reason)?;
            }
        }

        if !r.materials_updated.is_empty() {
            writeln!(f, "\n### Updated paint / finish materials")?;
            for m in &r.materials_updated {
                writeln!(f, "- {}: {}", m.name, self.money(m.price))?;
            }
        }

        if !r.materials_skipped.is_empty() {
            writeln!(f, "\n### Skipped materials (no editable cost)")?;
            for name in &r.materials_skipped {
                writeln!(f, "- {name}")?;
            }
        }

        if !r.missing_materials.is_empty() {
            writeln!(f, "\n### Materials not priced in the unit cost files")?;
            for name in &r.missing_materials {
                writeln!(f, "- {name}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Markdown<'_, AmountReport> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.report;
        writeln!(
            f,
            "Updated **{}** element(s) with **{} = Quantity × Rate** (total {}).",
            r.updated.len(),
            r.field,
            self.money(r.total())
        )?;
        if !r.skipped.is_empty() {
            writeln!(f, "\nSkipped **{}** element(s):", r.skipped.len())?;
            for s in &r.skipped {
                writeln!(f, "- Element ID {} | Reason: {}", s.id, s.reason)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Markdown<'_, GrandTotal> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.report;
        writeln!(f, "## Grand total: {}", self.money(r.total))?;
        writeln!(f)?;
        writeln!(f, "| Category | Types | Total |")?;
        writeln!(f, "|---|---:|---:|")?;
        for c in &r.categories {
            writeln!(
                f,
                "| {} | {} | {} |",
                c.category,
                c.types.len(),
                self.money(c.total)
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for Markdown<'_, AmountTotal> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.report;
        writeln!(
            f,
            "## Total of {} across {} element(s): {}",
            r.field,
            r.count,
            self.money(r.total)
        )?;
        writeln!(f)?;
        for c in &r.categories {
            writeln!(f, "- {} ({}): {}", c.category, c.count, self.money(c.total))?;
        }
        Ok(())
    }
}

impl fmt::Display for Markdown<'_, MaterialList> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.report;
        writeln!(
            f,
            "## Material list: {} type(s), {}",
            r.types.len(),
            self.money(r.total_cost())
        )?;
        if !r.unmatched_types.is_empty() {
            writeln!(f, "\nTypes without a recipe: {}", r.unmatched_types.join(", "))?;
        }
        if !r.missing_prices.is_empty() {
            let names: Vec<&str> = r.missing_prices.iter().map(String::as_str).collect();
            writeln!(f, "\nMaterials without a price: {}", names.join(", "))?;
        }
        if r.skipped_elements > 0 {
            writeln!(f, "\nElements not measured: {}", r.skipped_elements)?;
        }
        Ok(())
    }
}

impl fmt::Display for Markdown<'_, CommentReport> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.report;
        writeln!(f, "Type Comments update complete.")?;
        writeln!(f, "\nUpdated: {}", r.updated)?;
        writeln!(f, "Skipped: {}", r.skipped.len())?;
        for name in &r.skipped {
            writeln!(f, "- {name}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Markdown<'_, TypeCheck> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.report;
        writeln!(f, "## Type check: {} type(s)", r.checked)?;
        if r.issues.is_empty() {
            return writeln!(f, "\nEvery type matches a recipe by name.");
        }

        let missing: Vec<_> = r.without_recipe().collect();
        if !missing.is_empty() {
            writeln!(f, "\n### No recipe")?;
            for i in missing {
                writeln!(f, "- {} | {}", i.category, i.name)?;
            }
        }
        let mismatched: Vec<_> = r.mismatched().collect();
        if !mismatched.is_empty() {
            writeln!(f, "\n### Named differently from the recipe")?;
            for (i, recipe) in mismatched {
                writeln!(f, "- {} | '{}' → '{}'", i.category, i.name, recipe)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Markdown<'_, RenameReport> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.report;
        writeln!(f, "Renamed **{}** type(s).", r.renamed.len())?;
        for rename in &r.renamed {
            writeln!(f, "- {} → {}", rename.from, rename.to)?;
        }
        if !r.conflicts.is_empty() {
            writeln!(f, "\nNot renamed, name already taken:")?;
            for rename in &r.conflicts {
                writeln!(f, "- {} → {}", rename.from, rename.to)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Markdown<'_, SearchResult> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.report;
        if r.types.is_empty() {
            return writeln!(f, "No type names contain '{}'.", r.query);
        }
        writeln!(
            f,
            "Found **{}** element(s) of {} type(s) matching '{}'.",
            r.instance_count(),
            r.types.len(),
            r.query
        )?;
        for t in &r.types {
            let ids: Vec<String> = t.instances.iter().map(ToString::to_string).collect();
            let placed = if ids.is_empty() {
                "no instances placed".to_string()
            } else {
                ids.join(", ")
            };
            writeln!(f, "- {} ({}): {}", t.name, t.instances.len(), placed)?;
        }
        Ok(())
    }
}

impl fmt::Display for Markdown<'_, BillOfQuantities> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.report;
        writeln!(f, "## {}", r.title)?;
        writeln!(f)?;
        for bill in &r.bills {
            writeln!(f, "- {}: {}", bill.bill, self.money(bill.total()))?;
        }
        let s = &r.summary;
        writeln!(f, "\nSub total 1: {}", self.money(s.sub_total_1))?;
        writeln!(f, "Sub total 2: {}", self.money(s.sub_total_2))?;
        writeln!(f, "Contingency: {}", self.money(s.contingency))?;
        writeln!(f, "**Grand total: {}**", self.money(s.grand_total))?;
        if !r.skipped.is_empty() {
            writeln!(f, "\nSkipped: {}", r.skipped.len())?;
        }
        Ok(())
    }
}
