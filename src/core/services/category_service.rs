use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

use crate::{
    core::clock::Clock,
    domain::{Category, CategoryKind, CategoryUpdate, NewCategory},
    errors::{Result, TrackerError},
    storage::Database,
};

const CATEGORY_COLUMNS: &str = "id, name, icon, color, type, is_default, created_at, updated_at";

pub struct CategoryService;

impl CategoryService {
    pub fn list(db: &Database) -> Result<Vec<Category>> {
        Self::query(db.conn(), "1 = 1", params![])
    }

    pub fn list_by_kind(db: &Database, kind: CategoryKind) -> Result<Vec<Category>> {
        Self::query(db.conn(), "type = ?1", params![kind])
    }

    pub fn list_defaults(db: &Database) -> Result<Vec<Category>> {
        Self::query(db.conn(), "is_default = 1", params![])
    }

    pub fn get(db: &Database, id: i64) -> Result<Category> {
        Self::find(db.conn(), id)?.ok_or_else(|| TrackerError::not_found("Category", id))
    }

    /// Case-insensitive lookup by name.
    pub fn find_by_name(db: &Database, name: &str) -> Result<Option<Category>> {
        Ok(db
            .conn()
            .query_row(
                &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE name = ?1 COLLATE NOCASE"),
                [name.trim()],
                Self::from_row,
            )
            .optional()?)
    }

    pub fn create(db: &Database, clock: &dyn Clock, category: NewCategory) -> Result<Category> {
        category.validate()?;
        Self::ensure_unique_name(db, None, &category.name)?;
        db.conn().execute(
            "INSERT INTO categories (name, icon, color, type, is_default, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                category.name.trim(),
                category.icon,
                category.color,
                category.kind,
                category.is_default,
                clock.now()
            ],
        )?;
        let id = db.conn().last_insert_rowid();
        info!(id, name = %category.name, "created category");
        Self::get(db, id)
    }

    pub fn update(
        db: &Database,
        clock: &dyn Clock,
        id: i64,
        changes: CategoryUpdate,
    ) -> Result<Category> {
        changes.validate()?;
        let mut category = Self::get(db, id)?;
        if let Some(name) = changes.name {
            Self::ensure_unique_name(db, Some(id), &name)?;
            category.name = name.trim().to_string();
        }
        if let Some(icon) = changes.icon {
            category.icon = icon;
        }
        if let Some(color) = changes.color {
            category.color = color;
        }
        if let Some(kind) = changes.kind {
            category.kind = kind;
        }
        db.conn().execute(
            "UPDATE categories SET name = ?2, icon = ?3, color = ?4, type = ?5, updated_at = ?6
             WHERE id = ?1",
            params![
                id,
                category.name,
                category.icon,
                category.color,
                category.kind,
                clock.now()
            ],
        )?;
        Self::get(db, id)
    }

    /// Removes a category no transaction or budget refers to.
    pub fn delete(db: &Database, id: i64) -> Result<bool> {
        let references: i64 = db.conn().query_row(
            "SELECT (SELECT COUNT(*) FROM transactions WHERE category_id = ?1)
                  + (SELECT COUNT(*) FROM budgets WHERE category_id = ?1)",
            [id],
            |row| row.get(0),
        )?;
        if references > 0 {
            return Err(TrackerError::Conflict(format!(
                "Category {id} is used by {references} transaction(s) or budget(s)"
            )));
        }
        let removed = db.conn().execute("DELETE FROM categories WHERE id = ?1", [id])? > 0;
        if removed {
            info!(id, "deleted category");
        }
        Ok(removed)
    }

    pub(crate) fn find(conn: &Connection, id: i64) -> Result<Option<Category>> {
        Ok(conn
            .query_row(
                &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1"),
                [id],
                Self::from_row,
            )
            .optional()?)
    }

    fn ensure_unique_name(db: &Database, exclude: Option<i64>, candidate: &str) -> Result<()> {
        match Self::find_by_name(db, candidate)? {
            Some(existing) if exclude != Some(existing.id) => Err(TrackerError::Conflict(
                format!("Category `{}` already exists", candidate.trim()),
            )),
            _ => Ok(()),
        }
    }

    fn query(
        conn: &Connection,
        predicate: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<Category>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE {predicate} ORDER BY id"
        ))?;
        let categories = stmt
            .query_map(params, Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(categories)
    }

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
            icon: row.get(2)?,
            color: row.get(3)?,
            kind: row.get(4)?,
            is_default: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}
