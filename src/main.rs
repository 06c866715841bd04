use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use std::path::{Path, PathBuf};

use boq_estimator::config::Settings;
use boq_estimator::estimate::{
    apply_amounts, apply_rates, apply_renames, apply_type_comments, build_boq, check_types,
    extract_type_comments, grand_total, instance_total, material_list, plan_rates,
    search_types, AmountFields, BoqOptions,
};
use boq_estimator::export::report::Markdown;
use boq_estimator::export::{
    build_workbook, export_amounts, export_json, export_material_list, export_type_comments,
    write_workbook,
};
use boq_estimator::model::{Project, RecipeBook, Tier, UnitPriceTable};
use boq_estimator::parser::{load_price_table, load_project, load_recipes, load_type_comments};
use boq_estimator::ui::App;

#[derive(Parser, Debug)]
#[command(name = "boq-estimator")]
#[command(about = "BOQ Estimator - price building model elements and produce a Bill of Quantities")]
#[command(version)]
struct Args {
    /// Model snapshot (JSON)
    #[arg(short, long, global = true, value_name = "FILE")]
    model: Option<PathBuf>,

    /// Settings file (TOML)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Price region, overriding the settings file
    #[arg(long, global = true)]
    region: Option<String>,

    /// Cost tier: Min, Avg or Max
    #[arg(long, global = true)]
    tier: Option<Tier>,

    /// Unit-cost CSV file or directory (repeatable)
    #[arg(long = "prices", global = true, value_name = "PATH")]
    prices: Vec<PathBuf>,

    /// Recipe CSV file
    #[arg(long, global = true, value_name = "FILE")]
    recipes: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Price every type with a recipe and every priced paint material
    Rate {
        /// Where to save the updated model (defaults to the input)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Write Quantity × Rate into every measurable instance
    Amount {
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Also write the per-element lines to CSV
        #[arg(long, value_name = "FILE")]
        csv: Option<PathBuf>,
    },
    /// Sum type costs by category
    Total {
        /// Sum the instance amount field instead of type costs
        #[arg(long)]
        amounts: bool,

        #[arg(long, value_name = "FILE")]
        json: Option<PathBuf>,
    },
    /// Material quantities and costs grouped by type
    Materials {
        #[arg(short, long, value_name = "FILE", default_value = "materials.csv")]
        output: PathBuf,
    },
    /// Build the bill of quantities workbook
    Boq {
        #[arg(short, long, value_name = "DIR", default_value = "boq")]
        output: PathBuf,

        /// Cover title (defaults to the project name)
        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        address: Option<String>,
    },
    /// Move type descriptions to and from CSV
    #[command(subcommand)]
    Comments(CommentsCommand),
    /// Check model type names against the recipe book
    #[command(subcommand)]
    Check(CheckCommand),
    /// Find types whose name contains some text, and their instances
    Search {
        #[arg(value_name = "TEXT")]
        query: String,
    },
    /// Browse costs by category in the terminal
    Browse,
}

#[derive(Subcommand, Debug)]
enum CommentsCommand {
    /// Write type descriptions to CSV
    Extract {
        #[arg(short, long, value_name = "FILE", default_value = "type_comments.csv")]
        output: PathBuf,
    },
    /// Read type descriptions from CSV into the model
    Apply {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum CheckCommand {
    /// List types with no recipe or with a misspelt name
    Types {
        /// Rename misspelt types to their recipe names and save
        #[arg(long)]
        rename: bool,

        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

impl Args {
    fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        if let Some(region) = &self.region {
            settings.pricing.region.clone_from(region);
        }
        if let Some(tier) = self.tier {
            settings.pricing.tier = tier;
        }
        if !self.prices.is_empty() {
            settings.inputs.prices.clone_from(&self.prices);
        }
        if let Some(recipes) = &self.recipes {
            settings.inputs.recipes = Some(recipes.clone());
        }
        Ok(settings)
    }

    fn model_path(&self) -> Result<&Path> {
        self.model
            .as_deref()
            .ok_or_else(|| eyre!("no model given, pass --model <FILE>"))
    }
}

fn load_prices(settings: &Settings) -> Result<UnitPriceTable> {
    if settings.inputs.prices.is_empty() {
        return Err(eyre!("no unit-cost files given, pass --prices or set [inputs].prices"));
    }
    Ok(load_price_table(
        &settings.inputs.prices,
        &settings.pricing.column(),
        settings.pricing.normalization,
    )?)
}

fn load_recipe_book(settings: &Settings) -> Result<RecipeBook> {
    let path = settings
        .inputs
        .recipes
        .as_ref()
        .ok_or_else(|| eyre!("no recipe file given, pass --recipes or set [inputs].recipes"))?;
    Ok(load_recipes(path, settings.pricing.normalization)?)
}

/// Prices and recipes for the browser's cost breakdowns. Paths given on
/// the command line must load; inputs that only come from the settings file
/// are optional and the browser falls back to stored costs without them.
fn browse_inputs(args: &Args, settings: &Settings) -> Result<Option<(UnitPriceTable, RecipeBook)>> {
    let inputs = load_prices(settings).and_then(|prices| Ok((prices, load_recipe_book(settings)?)));
    match inputs {
        Ok(inputs) => Ok(Some(inputs)),
        Err(e) if !args.prices.is_empty() || args.recipes.is_some() => Err(e),
        Err(e) => {
            tracing::warn!("browsing without cost breakdowns: {e}");
            Ok(None)
        }
    }
}

fn save(project: &Project, path: &Path) -> Result<()> {
    export_json(project, path).wrap_err_with(|| format!("saving {}", path.display()))?;
    tracing::info!(file = %path.display(), "saved model");
    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;
    boq_estimator::init_tracing();
    let args = Args::parse();
    let settings = args.settings()?;
    let currency = settings.pricing.currency.as_str();

    let model_path = args.model_path()?;
    let mut project = load_project(model_path)?;

    match &args.command {
        Command::Rate { output } => {
            let prices = load_prices(&settings)?;
            let recipes = load_recipe_book(&settings)?;
            let column = settings.pricing.column().to_string();

            let report = apply_rates(
                &mut project,
                &recipes,
                &prices,
                &settings.fields.cost,
                &column,
            )?;
            print!("{}", Markdown::new(&report, currency));

            if report.committed > 0 {
                save(&project, output.as_deref().unwrap_or(model_path))?;
            }
        }
        Command::Amount { output, csv } => {
            let fields = AmountFields {
                cost: &settings.fields.cost,
                amount: &settings.fields.amount,
            };
            let report = apply_amounts(&mut project, fields)?;
            print!("{}", Markdown::new(&report, currency));

            if let Some(path) = csv {
                export_amounts(&report, path)?;
                println!("\nExported to CSV: {}", path.display());
            }
            if report.committed > 0 {
                save(&project, output.as_deref().unwrap_or(model_path))?;
            }
        }
        Command::Total { amounts, json } => {
            if *amounts {
                let totals = instance_total(&project, &settings.fields.amount);
                print!("{}", Markdown::new(&totals, currency));
                if let Some(path) = json {
                    export_json(&totals, path)?;
                    println!("\nExported to JSON: {}", path.display());
                }
            } else {
                let totals = grand_total(&project, &settings.fields.cost);
                print!("{}", Markdown::new(&totals, currency));
                if let Some(path) = json {
                    export_json(&totals, path)?;
                    println!("\nExported to JSON: {}", path.display());
                }
            }
        }
        Command::Materials { output } => {
            let prices = load_prices(&settings)?;
            let recipes = load_recipe_book(&settings)?;

            let list = material_list(&project, &recipes, &prices);
            print!("{}", Markdown::new(&list, currency));

            export_material_list(&list, output)?;
            println!("\nExported to CSV: {}", output.display());
        }
        Command::Boq {
            output,
            title,
            address,
        } => {
            let options = BoqOptions {
                title: title.clone().unwrap_or_else(|| project.name.clone()),
                address: address.clone().or_else(|| project.address.clone()),
                cost_field: settings.fields.cost.clone(),
                comments_field: settings.fields.type_comments.clone(),
                function_field: settings.fields.function.clone(),
                discount: settings.bill.discount,
                contingency: settings.bill.contingency,
            };
            let boq = build_boq(&project, &options);
            print!("{}", Markdown::new(&boq, currency));

            let workbook = build_workbook(&boq, currency);
            let files = write_workbook(&workbook, output)?;
            println!("\nWrote {} file(s) to {}", files.len(), output.display());
        }
        Command::Comments(CommentsCommand::Extract { output }) => {
            let rows = extract_type_comments(&project, &settings.fields.type_comments);
            export_type_comments(&rows, output)?;
            println!(
                "Exported {} type description(s) to {}",
                rows.len(),
                output.display()
            );
        }
        Command::Comments(CommentsCommand::Apply { file, output }) => {
            let comments = load_type_comments(file)?;
            let report =
                apply_type_comments(&mut project, &comments, &settings.fields.type_comments)?;
            print!("{}", Markdown::new(&report, currency));

            if report.updated > 0 {
                save(&project, output.as_deref().unwrap_or(model_path))?;
            }
        }
        Command::Check(CheckCommand::Types { rename, output }) => {
            let recipes = load_recipe_book(&settings)?;
            let check = check_types(&project, &recipes);
            print!("{}", Markdown::new(&check, currency));

            if *rename {
                let report = apply_renames(&mut project, &recipes)?;
                print!("\n{}", Markdown::new(&report, currency));
                if report.committed > 0 {
                    save(&project, output.as_deref().unwrap_or(model_path))?;
                }
            }
        }
        Command::Search { query } => {
            let result = search_types(&project, query);
            print!("{}", Markdown::new(&result, currency));
        }
        Command::Browse => {
            let rated = match browse_inputs(&args, &settings)? {
                Some((prices, recipes)) => {
                    plan_rates(&project, &recipes, &prices, &settings.fields.cost)
                        .1
                        .updated
                }
                None => Vec::new(),
            };

            let app = App::new(project, &settings.fields.cost, currency).with_breakdowns(rated);
            let terminal = ratatui::init();
            let result = app.run(terminal);
            ratatui::restore();
            return result;
        }
    }

    Ok(())
}
