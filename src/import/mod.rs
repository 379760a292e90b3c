pub mod table;

use std::thread;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::catalog::{Catalog, Refresh, Result};
use crate::db::models::Item;
use crate::poster::{PosterLookup, fetch_poster};

pub use table::{Row, RowError, map_row, normalize_type, parse_release_year, parse_table};

/// Item drafts mapped from a table, with the rows that couldn't be mapped.
#[derive(Debug, Default)]
pub struct MappedTable {
    pub drafts: Vec<Item>,
    pub skipped: usize,
    pub posters_found: usize,
}

/// Result of an import run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub posters_found: usize,
}

/// Parse `raw` and map every row to a draft, looking up a poster for each.
///
/// Rows run strictly one after another; `rate_limit` is slept between
/// lookups. A row that can't be mapped is logged and skipped. A failed
/// lookup leaves the poster blank.
pub fn map_table(raw: &str, posters: &dyn PosterLookup, rate_limit: Duration) -> MappedTable {
    let rows = parse_table(raw);
    let mut mapped = MappedTable::default();
    if rows.is_empty() {
        log::info!("Nothing to import");
        return mapped;
    }

    let pb = ProgressBar::new(rows.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        )
        .unwrap()
        .progress_chars("#>-"),
    );

    for (i, row) in rows.iter().enumerate() {
        match map_row(row) {
            Ok(mut item) => {
                pb.set_message(item.title.clone());
                item.poster = fetch_poster(posters, &item.title, item.year);
                if !item.poster.is_empty() {
                    mapped.posters_found += 1;
                }
                mapped.drafts.push(item);
            }
            Err(e) => {
                log::warn!("Skipping row: {e}");
                mapped.skipped += 1;
            }
        }
        pb.inc(1);

        if !rate_limit.is_zero() && i + 1 < rows.len() {
            thread::sleep(rate_limit);
        }
    }

    pb.finish_with_message("done");
    if mapped.skipped > 0 {
        log::info!("{} blank row(s) skipped", mapped.skipped);
    }
    mapped
}

/// Import a table into the catalog. Every mapped row becomes a new item,
/// even when a similar one exists. The items collection is refreshed once
/// at the end.
pub fn import_table(
    catalog: &mut Catalog,
    raw: &str,
    posters: &dyn PosterLookup,
    rate_limit: Duration,
) -> Result<ImportResult> {
    let mapped = map_table(raw, posters, rate_limit);
    let mut result = ImportResult {
        imported: 0,
        skipped: mapped.skipped,
        posters_found: mapped.posters_found,
    };
    if mapped.drafts.is_empty() {
        return Ok(result);
    }

    for mut item in mapped.drafts {
        item.id = None;
        catalog.db().upsert_item(&item)?;
        result.imported += 1;
    }
    catalog.refresh(Refresh::Items)?;

    log::info!(
        "Imported {} items ({} skipped, {} posters)",
        result.imported,
        result.skipped,
        result.posters_found
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::poster::NoPosters;

    struct EveryOther;

    impl PosterLookup for EveryOther {
        fn lookup(&self, title: &str, _year: Option<i32>) -> anyhow::Result<Option<String>> {
            if title.starts_with('D') {
                Ok(Some(format!("https://img/{title}.jpg")))
            } else {
                anyhow::bail!("timed out")
            }
        }
    }

    fn empty_catalog() -> Catalog {
        Catalog::open(Database::open_in_memory().unwrap(), false).unwrap()
    }

    #[test]
    fn test_map_table_attaches_posters() {
        let mapped = map_table("Title\nDune\nHeat", &EveryOther, Duration::ZERO);
        assert_eq!(mapped.drafts.len(), 2);
        assert_eq!(mapped.drafts[0].poster, "https://img/Dune.jpg");
        assert_eq!(mapped.drafts[1].poster, "");
        assert_eq!(mapped.posters_found, 1);
    }

    #[test]
    fn test_import_inserts_and_refreshes_once() {
        let mut catalog = empty_catalog();
        let text = "Title,Format,Type\nDune,bluray,bluray\n,,\nHeat,dvd,";
        let result = import_table(&mut catalog, text, &EveryOther, Duration::ZERO).unwrap();

        assert_eq!(
            result,
            ImportResult { imported: 2, skipped: 1, posters_found: 1 }
        );
        assert_eq!(catalog.refresh_count(), 1);
        assert_eq!(catalog.last_refresh(), Some(Refresh::Items));

        let dune = &catalog.items()[0];
        assert_eq!(dune.title, "Dune");
        assert_eq!(dune.media_type, "Blu-ray");
        assert_eq!(dune.format, "Blu-ray");
        assert_eq!(catalog.items()[1].format, "DVD");
    }

    #[test]
    fn test_import_never_deduplicates() {
        let mut catalog = empty_catalog();
        import_table(&mut catalog, "Title\nRan", &NoPosters, Duration::ZERO).unwrap();
        import_table(&mut catalog, "Title\nRan", &NoPosters, Duration::ZERO).unwrap();
        assert_eq!(catalog.items().len(), 2);
        assert_ne!(catalog.items()[0].id, catalog.items()[1].id);
    }

    #[test]
    fn test_import_empty_table_writes_nothing() {
        let mut catalog = empty_catalog();
        let result = import_table(&mut catalog, "Title,Format\n", &NoPosters, Duration::ZERO).unwrap();
        assert_eq!(result, ImportResult::default());
        assert_eq!(catalog.refresh_count(), 0);
    }
}
