use super::models::{Item, List};
use super::{Collection, Database, Result};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};

const ITEM_COLUMNS: &str = "id, title, year, genre, type, format, region, runtime, audio, hdr,
     languages, subtitles, edition, discs, barcode, packaging, poster, notes, custom";

/// What a cascading item delete touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeResult {
    pub item_removed: bool,
    pub lists_pruned: usize,
}

impl Database {
    /// Get every item in key order.
    pub fn all_items(&self) -> Result<Vec<Item>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY id"))?;
        let items = stmt
            .query_map([], item_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(items)
    }

    pub fn get_item(&self, id: i64) -> Result<Option<Item>> {
        let item = self
            .conn
            .query_row(
                &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"),
                params![id],
                item_from_row,
            )
            .optional()?;
        Ok(item)
    }

    /// Insert an item (no key) or overwrite the record at its key. Returns the key.
    ///
    /// A keyed item that does not exist yet is inserted at that key.
    pub fn upsert_item(&self, item: &Item) -> Result<i64> {
        upsert_item_on(&self.conn, item)
    }

    /// Get every list in key order.
    pub fn all_lists(&self) -> Result<Vec<List>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, item_ids FROM lists ORDER BY id")?;
        let lists = stmt
            .query_map([], list_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(lists)
    }

    pub fn get_list(&self, id: i64) -> Result<Option<List>> {
        let list = self
            .conn
            .query_row(
                "SELECT id, name, item_ids FROM lists WHERE id = ?1",
                params![id],
                list_from_row,
            )
            .optional()?;
        Ok(list)
    }

    /// Insert a list (no key) or overwrite the record at its key. Returns the key.
    pub fn upsert_list(&self, list: &List) -> Result<i64> {
        upsert_list_on(&self.conn, list)
    }

    /// Delete one record by key. Returns whether a row was removed.
    pub fn remove(&self, collection: Collection, id: i64) -> Result<bool> {
        let changed = self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", collection.table()),
            params![id],
        )?;
        Ok(changed > 0)
    }

    pub fn count(&self, collection: Collection) -> Result<i64> {
        let n = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", collection.table()),
            [],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    /// Delete an item and prune its key from every list, in one transaction.
    pub fn delete_item_cascade(&self, id: i64) -> Result<CascadeResult> {
        let tx = self.conn.unchecked_transaction()?;

        let removed = tx.execute("DELETE FROM items WHERE id = ?1", params![id])? > 0;

        let lists = {
            let mut stmt = tx.prepare("SELECT id, name, item_ids FROM lists ORDER BY id")?;
            stmt.query_map([], list_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        };

        let mut pruned = 0;
        for mut list in lists {
            if !list.contains(id) {
                continue;
            }
            list.item_ids.retain(|&x| x != id);
            upsert_list_on(&tx, &list)?;
            pruned += 1;
        }

        tx.commit()?;
        log::debug!("Deleted item {id} (removed={removed}), pruned from {pruned} lists");
        Ok(CascadeResult {
            item_removed: removed,
            lists_pruned: pruned,
        })
    }
}

fn upsert_item_on(conn: &Connection, i: &Item) -> Result<i64> {
    let custom = serde_json::to_string(&i.custom)?;
    conn.execute(
        "INSERT INTO items (
            id, title, year, genre, type, format, region, runtime, audio, hdr,
            languages, subtitles, edition, discs, barcode, packaging, poster, notes, custom
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
            ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19
        )
        ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            year = excluded.year,
            genre = excluded.genre,
            type = excluded.type,
            format = excluded.format,
            region = excluded.region,
            runtime = excluded.runtime,
            audio = excluded.audio,
            hdr = excluded.hdr,
            languages = excluded.languages,
            subtitles = excluded.subtitles,
            edition = excluded.edition,
            discs = excluded.discs,
            barcode = excluded.barcode,
            packaging = excluded.packaging,
            poster = excluded.poster,
            notes = excluded.notes,
            custom = excluded.custom
        ",
        params![
            i.id, i.title, i.year, i.genre, i.media_type, i.format, i.region, i.runtime,
            i.audio, i.hdr, i.languages, i.subtitles, i.edition, i.discs, i.barcode,
            i.packaging, i.poster, i.notes, custom,
        ],
    )?;
    Ok(i.id.unwrap_or_else(|| conn.last_insert_rowid()))
}

fn upsert_list_on(conn: &Connection, l: &List) -> Result<i64> {
    let item_ids = serde_json::to_string(&l.item_ids)?;
    conn.execute(
        "INSERT INTO lists (id, name, item_ids) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            item_ids = excluded.item_ids",
        params![l.id, l.name, item_ids],
    )?;
    Ok(l.id.unwrap_or_else(|| conn.last_insert_rowid()))
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<Item> {
    let custom: String = row.get(18)?;
    Ok(Item {
        id: row.get(0)?,
        title: row.get(1)?,
        year: row.get(2)?,
        genre: row.get(3)?,
        media_type: row.get(4)?,
        format: row.get(5)?,
        region: row.get(6)?,
        runtime: row.get(7)?,
        audio: row.get(8)?,
        hdr: row.get(9)?,
        languages: row.get(10)?,
        subtitles: row.get(11)?,
        edition: row.get(12)?,
        discs: row.get(13)?,
        barcode: row.get(14)?,
        packaging: row.get(15)?,
        poster: row.get(16)?,
        notes: row.get(17)?,
        custom: json_column(18, &custom)?,
    })
}

fn list_from_row(row: &Row<'_>) -> rusqlite::Result<List> {
    let item_ids: String = row.get(2)?;
    Ok(List {
        id: row.get(0)?,
        name: row.get(1)?,
        item_ids: json_column(2, &item_ids)?,
    })
}

fn json_column<T: serde::de::DeserializeOwned>(idx: usize, raw: &str) -> rusqlite::Result<T> {
    serde_json::from_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
