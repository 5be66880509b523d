//! Catalog maintenance: slug backfill and keyword classification.

use std::collections::HashSet;

use clap::Subcommand;
use flowershop_core::{classify_product, slugify, unique_slug, CategoryRef};
use flowershop_db::{MissingSlugRow, SlugTarget};

/// Suffix of the first collision (`base-2`), matching slugs made by hand.
const FIRST_SLUG_SUFFIX: u32 = 2;

/// Sub-commands available under `catalog`.
#[derive(Debug, Subcommand)]
pub enum CatalogCommands {
    /// Fill empty slugs of categories, flower tags and products
    Slugs {
        /// Print the slugs that would be written without saving them
        #[arg(long)]
        dry_run: bool,
    },
    /// Assign a primary category to every product by keyword rules
    Classify {
        /// Print the outcome without saving it
        #[arg(long)]
        dry_run: bool,
    },
}

pub(crate) async fn run(pool: &sqlx::PgPool, command: CatalogCommands) -> anyhow::Result<()> {
    match command {
        CatalogCommands::Slugs { dry_run } => run_slugs(pool, dry_run).await,
        CatalogCommands::Classify { dry_run } => run_classify(pool, dry_run).await,
    }
}

// ---------------------------------------------------------------------------
// Slugs
// ---------------------------------------------------------------------------

/// Slugs for rows that lack one. `taken` is extended as slugs are handed out,
/// so two rows with the same label get distinct slugs.
pub(crate) fn plan_slugs(
    target: SlugTarget,
    rows: &[MissingSlugRow],
    taken: &mut HashSet<String>,
) -> Vec<(i64, String)> {
    rows.iter()
        .map(|row| {
            let base = slugify(&row.label);
            let base = if base.is_empty() {
                format!("{}-{}", target.fallback_prefix(), row.id)
            } else {
                base
            };
            let slug = unique_slug(&base, FIRST_SLUG_SUFFIX, |s| taken.contains(s));
            taken.insert(slug.clone());
            (row.id, slug)
        })
        .collect()
}

/// Fill empty slugs in every slugged table.
///
/// # Errors
///
/// Returns an error if a query or update fails.
pub(crate) async fn run_slugs(pool: &sqlx::PgPool, dry_run: bool) -> anyhow::Result<()> {
    for target in [SlugTarget::Category, SlugTarget::FlowerTag, SlugTarget::Product] {
        let rows = flowershop_db::list_missing_slugs(pool, target).await?;
        if rows.is_empty() {
            println!("{target:?}: all slugs present");
            continue;
        }

        let mut taken: HashSet<String> = flowershop_db::list_taken_slugs(pool, target)
            .await?
            .into_iter()
            .collect();
        let plan = plan_slugs(target, &rows, &mut taken);

        if dry_run {
            for (id, slug) in &plan {
                println!("dry-run: {target:?} {id} -> {slug}");
            }
            continue;
        }

        for (id, slug) in &plan {
            flowershop_db::set_slug(pool, target, *id, slug).await?;
        }
        tracing::info!(?target, filled = plan.len(), "slugs filled");
        println!("{target:?}: filled {} slugs", plan.len());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ClassifyReport {
    pub updated: usize,
    pub unchanged: usize,
    pub unclassified: usize,
}

/// Assign a primary category to every product.
///
/// # Errors
///
/// Returns an error if a query or update fails.
pub(crate) async fn run_classify(pool: &sqlx::PgPool, dry_run: bool) -> anyhow::Result<()> {
    let categories: Vec<CategoryRef> = flowershop_db::list_categories(pool)
        .await?
        .into_iter()
        .map(|c| CategoryRef {
            id: c.id,
            name: c.name,
        })
        .collect();
    if categories.is_empty() {
        println!("no categories; run `db seed` first");
        return Ok(());
    }

    let products = flowershop_db::list_all_products(pool).await?;
    let mut report = ClassifyReport::default();

    for product in &products {
        let composition = flowershop_db::product_composition(pool, product.id).await?;
        let Some(category_id) = classify_product(&product.title, &composition, &categories)
        else {
            tracing::debug!(product_id = product.id, title = %product.title, "no rule matched");
            report.unclassified += 1;
            continue;
        };

        if product.category_id == Some(category_id) {
            report.unchanged += 1;
            continue;
        }

        if dry_run {
            println!(
                "dry-run: product {} '{}' -> category {category_id}",
                product.id, product.title
            );
        } else {
            flowershop_db::set_primary_category(pool, product.id, Some(category_id)).await?;
        }
        report.updated += 1;
    }

    let verb = if dry_run { "would update" } else { "updated" };
    println!(
        "{verb} {}, unchanged {}, unclassified {}",
        report.updated, report.unchanged, report.unclassified
    );
    Ok(())
}
