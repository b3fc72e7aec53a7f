mod cli;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::util::pretty::pretty_format_batches;
use clap::Parser;
use serde_json::json;

use cli::{Cli, Commands, FilterArgs};
use purine_lookup::cache::DatasetCache;
use purine_lookup::data::export::record_batch;
use purine_lookup::state::{ResultView, Session};
use purine_lookup::{
    category_averages, export_file_name, top_n, write_parquet, FoodRecord, FoodTable,
    HeaderStyle, PurineRange, SortOrder,
};

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut cache = DatasetCache::default();
    let table = cache
        .get_or_load(&cli.data)
        .with_context(|| format!("loading {}", cli.data.display()))?;
    if table.is_empty() {
        log::warn!("{} contains no food records", cli.data.display());
    }

    match cli.command {
        Commands::Search { filter } => {
            let session = session_for(table, &filter);
            print_view(cli.json, &session)
        }
        Commands::Insights { top, ascending } => {
            let order = if ascending {
                SortOrder::Ascending
            } else {
                SortOrder::Descending
            };
            print_insights(cli.json, &table, top, order)
        }
        Commands::Export {
            filter,
            out,
            header,
        } => {
            let session = session_for(table, &filter);
            if let ResultView::Prompt = session.view() {
                bail!("no active filter: give a search term, --category, --min or --max");
            }
            let bytes = session.export_visible(header.into())?;
            let out = out.unwrap_or_else(|| {
                export_file_name(filter.term.as_deref().unwrap_or_default()).into()
            });
            std::fs::write(&out, bytes).with_context(|| format!("writing {}", out.display()))?;
            log::info!(
                "Exported {} records to {}",
                session.visible_records().len(),
                out.display()
            );
            Ok(())
        }
        Commands::Convert { out } => {
            let rows = write_parquet(&table.records, &out)
                .with_context(|| format!("writing {}", out.display()))?;
            if cli.json {
                println!("{}", json!({ "rows": rows, "out": out }));
            } else {
                println!("Wrote {rows} records to {}", out.display());
            }
            Ok(())
        }
        Commands::Categories => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&table.categories)?);
            } else {
                for category in &table.categories {
                    println!("{category}");
                }
            }
            Ok(())
        }
    }
}

/// Build a session from the table and apply the command-line filter.
fn session_for(table: Arc<FoodTable>, filter: &FilterArgs) -> Session {
    let max_total = table.max_total();
    let mut session = match &filter.preset {
        Some(preset) => Session::new(table, preset.clone()),
        None => Session::for_table(table),
    };

    if let Some(term) = &filter.term {
        session.set_search_term(term);
    }
    if !filter.categories.is_empty() {
        session.select_categories(filter.categories.iter().cloned());
    }
    if filter.min.is_some() || filter.max.is_some() {
        let range = PurineRange::new(
            filter.min.unwrap_or(0.0),
            filter.max.unwrap_or(max_total),
        );
        session.set_range(range);
    }
    session
}

fn print_view(json: bool, session: &Session) -> Result<()> {
    let view = session.view();
    if json {
        let (status, records): (&str, Vec<&FoodRecord>) = match view {
            ResultView::Prompt => ("prompt", Vec::new()),
            ResultView::Empty => ("empty", Vec::new()),
            ResultView::Rows(rows) => ("rows", rows),
        };
        let out = json!({ "status": status, "count": records.len(), "records": records });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    match view {
        ResultView::Prompt => {
            println!("Enter a food name, pinyin or initials, or set a filter, to see results.")
        }
        ResultView::Empty => println!("No matching foods. Try adjusting the filters."),
        ResultView::Rows(rows) => {
            println!("Found {} records", rows.len());
            let batch = record_batch(rows, HeaderStyle::Plain, false)?;
            println!("{}", pretty_format_batches(&[batch])?);
        }
    }
    Ok(())
}

fn print_insights(json: bool, table: &FoodTable, top: usize, order: SortOrder) -> Result<()> {
    let averages = category_averages(&table.records, order);
    let ranking = top_n(&table.records, top);

    if json {
        let ranking: Vec<_> = ranking
            .iter()
            .map(|(name, total)| json!({ "name": name, "total": total }))
            .collect();
        let out = json!({ "category_averages": averages, "top": ranking });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Average total purine by category (mg/100g)");
    for avg in &averages {
        println!("  {:<16} {:>8.1}  ({} foods)", avg.category, avg.mean_total, avg.count);
    }
    println!();
    println!("Top {} highest-purine foods", ranking.len());
    for (rank, (name, total)) in ranking.iter().enumerate() {
        println!("  {:>2}. {:<16} {:>8.1}", rank + 1, name, total);
    }
    Ok(())
}
