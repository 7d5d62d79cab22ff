mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::config::StoreLocation;
use crate::models::*;

const FOLDER_COLUMNS: &str = "id, name, is_open, created_at";
const NOTE_COLUMNS: &str = "id, folder_id, title, content, files, created_at, updated_at";

/// Handle to the notes store.
///
/// Cheap to clone; all clones share one connection. Opened once at startup
/// and handed to the router as state.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn connect(location: &StoreLocation) -> Result<Self> {
        match location {
            StoreLocation::Memory => Self::open_memory(),
            StoreLocation::File(path) => Self::open(path.clone()),
        }
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock();
        schema::run_migrations(&conn)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database lock poisoned")
    }

    // ============================================================
    // Bootstrap
    // ============================================================

    pub fn count_folders(&self) -> Result<usize> {
        let conn = self.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM folders", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Create the default folder if the store has none.
    ///
    /// Meant to run once per process after migrations. Two processes starting
    /// against the same empty store at the same time can both create one.
    pub fn ensure_default_folder(&self) -> Result<Option<Folder>> {
        if self.count_folders()? > 0 {
            return Ok(None);
        }

        let folder = self.create_folder(CreateFolderInput {
            name: DEFAULT_FOLDER_NAME.to_string(),
        })?;
        tracing::info!("Created default folder {} ({})", folder.name, folder.id);
        Ok(Some(folder))
    }

    // ============================================================
    // Folder operations
    // ============================================================

    pub fn get_all_folders(&self) -> Result<Vec<Folder>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders ORDER BY created_at, rowid"
        ))?;

        let folders = stmt
            .query_map([], folder_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(folders)
    }

    pub fn get_folder(&self, id: Uuid) -> Result<Option<Folder>> {
        let conn = self.lock();
        let folder = conn
            .query_row(
                &format!("SELECT {FOLDER_COLUMNS} FROM folders WHERE id = ?"),
                [id.to_string()],
                folder_from_row,
            )
            .optional()?;
        Ok(folder)
    }

    pub fn create_folder(&self, input: CreateFolderInput) -> Result<Folder> {
        let conn = self.lock();
        let folder = Folder {
            id: Uuid::new_v4(),
            name: input.name,
            is_open: true,
            created_at: now(),
        };

        conn.execute(
            "INSERT INTO folders (id, name, is_open, created_at) VALUES (?, ?, ?, ?)",
            (
                folder.id.to_string(),
                &folder.name,
                folder.is_open,
                format_datetime(folder.created_at),
            ),
        )?;

        Ok(folder)
    }

    /// Delete a folder and hand its notes to the oldest remaining folder.
    ///
    /// Deleting an unknown id is not an error; notes still pointing at that id
    /// are moved all the same. With no folder left, notes keep their stale
    /// `folder_id`.
    pub fn delete_folder(&self, id: Uuid) -> Result<FolderDeletion> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let deleted = tx.execute("DELETE FROM folders WHERE id = ?", [id.to_string()])? > 0;

        let oldest: Option<String> = tx
            .query_row(
                "SELECT id FROM folders ORDER BY created_at, rowid LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        let (reassigned_to, notes_moved) = match oldest {
            Some(target) => {
                let moved = tx.execute(
                    "UPDATE notes SET folder_id = ? WHERE folder_id = ?",
                    (&target, id.to_string()),
                )?;
                (Some(parse_uuid(target)), moved)
            }
            None => (None, 0),
        };

        tx.commit()?;

        Ok(FolderDeletion {
            deleted,
            reassigned_to,
            notes_moved,
        })
    }

    // ============================================================
    // Note operations
    // ============================================================

    pub fn get_all_notes(&self) -> Result<Vec<Note>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes ORDER BY updated_at DESC, rowid DESC"
        ))?;

        let notes = stmt
            .query_map([], note_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(notes)
    }

    pub fn get_notes_by_folder(&self, folder_id: Uuid) -> Result<Vec<Note>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE folder_id = ?
             ORDER BY updated_at DESC, rowid DESC"
        ))?;

        let notes = stmt
            .query_map([folder_id.to_string()], note_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(notes)
    }

    pub fn get_note(&self, id: Uuid) -> Result<Option<Note>> {
        let conn = self.lock();
        find_note(&conn, id)
    }

    pub fn create_note(&self, input: CreateNoteInput) -> Result<Note> {
        let conn = self.lock();
        let now = now();
        let note = Note {
            id: Uuid::new_v4(),
            folder_id: input.folder_id,
            title: non_empty_or(input.title, DEFAULT_NOTE_TITLE),
            content: non_empty_or(input.content, DEFAULT_NOTE_CONTENT),
            files: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        conn.execute(
            "INSERT INTO notes (id, folder_id, title, content, files, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            (
                note.id.to_string(),
                note.folder_id.to_string(),
                &note.title,
                &note.content,
                serde_json::to_string(&note.files)?,
                format_datetime(note.created_at),
                format_datetime(note.updated_at),
            ),
        )?;

        Ok(note)
    }

    /// Replace a note's title, content and files. `None` for an unknown id.
    pub fn update_note(&self, id: Uuid, input: UpdateNoteInput) -> Result<Option<Note>> {
        let conn = self.lock();
        let Some(mut note) = find_note(&conn, id)? else {
            return Ok(None);
        };

        note.title = input.title.unwrap_or_default();
        note.content = input.content.unwrap_or_default();
        note.files = assign_file_ids(input.files.unwrap_or_default());
        note.updated_at = touch(note.updated_at);

        save_note(&conn, &note)?;
        Ok(Some(note))
    }

    pub fn delete_note(&self, id: Uuid) -> Result<bool> {
        let conn = self.lock();
        let rows = conn.execute("DELETE FROM notes WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    /// Append a file to a note. `None` if the note does not exist.
    ///
    /// The file always gets a fresh id, whatever the caller sent.
    pub fn add_file(&self, note_id: Uuid, file: NoteFileInput) -> Result<Option<Note>> {
        let conn = self.lock();
        let Some(mut note) = find_note(&conn, note_id)? else {
            return Ok(None);
        };

        note.files.push(file.into_file(Uuid::new_v4()));
        note.updated_at = touch(note.updated_at);

        save_note(&conn, &note)?;
        Ok(Some(note))
    }

    /// Drop the file with `file_id` from a note. `None` if the note does not
    /// exist; an unknown file id leaves the list as is but still bumps
    /// `updated_at`.
    pub fn remove_file(&self, note_id: Uuid, file_id: Uuid) -> Result<Option<Note>> {
        let conn = self.lock();
        let Some(mut note) = find_note(&conn, note_id)? else {
            return Ok(None);
        };

        note.files.retain(|f| f.id != file_id);
        note.updated_at = touch(note.updated_at);

        save_note(&conn, &note)?;
        Ok(Some(note))
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

fn find_note(conn: &Connection, id: Uuid) -> Result<Option<Note>> {
    let note = conn
        .query_row(
            &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?"),
            [id.to_string()],
            note_from_row,
        )
        .optional()?;
    Ok(note)
}

fn save_note(conn: &Connection, note: &Note) -> Result<()> {
    conn.execute(
        "UPDATE notes SET title = ?, content = ?, files = ?, updated_at = ? WHERE id = ?",
        (
            &note.title,
            &note.content,
            serde_json::to_string(&note.files)?,
            format_datetime(note.updated_at),
            note.id.to_string(),
        ),
    )?;
    Ok(())
}

fn folder_from_row(row: &Row<'_>) -> rusqlite::Result<Folder> {
    Ok(Folder {
        id: parse_uuid(row.get::<_, String>(0)?),
        name: row.get(1)?,
        is_open: row.get::<_, i32>(2)? != 0,
        created_at: parse_datetime(row.get::<_, String>(3)?),
    })
}

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    let files_json: String = row.get(4)?;
    // Corrupt lists fail the read so no write can replace them.
    let files: Vec<NoteFile> = serde_json::from_str(&files_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Note {
        id: parse_uuid(row.get::<_, String>(0)?),
        folder_id: parse_uuid(row.get::<_, String>(1)?),
        title: row.get(2)?,
        content: row.get(3)?,
        files,
        created_at: parse_datetime(row.get::<_, String>(5)?),
        updated_at: parse_datetime(row.get::<_, String>(6)?),
    })
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Current time at the precision the store keeps.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// A timestamp strictly after `previous`, normally just the current time.
fn touch(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = now();
    if now > previous {
        now
    } else {
        previous + chrono::Duration::microseconds(1)
    }
}

/// Fixed-width RFC 3339 so that string order matches time order.
fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corrupt_note() -> (Database, Note) {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        let note = db
            .create_note(CreateNoteInput {
                folder_id: Uuid::new_v4(),
                title: None,
                content: None,
            })
            .unwrap();
        db.lock()
            .execute(
                "UPDATE notes SET files = 'not json' WHERE id = ?",
                [note.id.to_string()],
            )
            .unwrap();
        (db, note)
    }

    fn stored_files(db: &Database, id: Uuid) -> String {
        db.lock()
            .query_row("SELECT files FROM notes WHERE id = ?", [id.to_string()], |row| {
                row.get(0)
            })
            .unwrap()
    }

    #[test]
    fn corrupt_file_list_fails_reads() {
        let (db, note) = corrupt_note();

        assert!(db.get_note(note.id).is_err());
        assert!(db.get_all_notes().is_err());
    }

    #[test]
    fn corrupt_file_list_is_not_overwritten_by_mutations() {
        let (db, note) = corrupt_note();

        let input = NoteFileInput {
            name: "a.txt".to_string(),
            ..Default::default()
        };
        assert!(db.add_file(note.id, input).is_err());
        assert!(db.remove_file(note.id, Uuid::new_v4()).is_err());
        assert!(db.update_note(note.id, UpdateNoteInput::default()).is_err());

        assert_eq!(stored_files(&db, note.id), "not json");
    }

    #[test]
    fn touch_is_strictly_after_a_future_timestamp() {
        let future = now() + chrono::Duration::seconds(10);
        let bumped = touch(future);
        assert!(bumped > future);
        assert_eq!(bumped - future, chrono::Duration::microseconds(1));
    }

    #[test]
    fn touch_uses_the_clock_when_it_has_advanced() {
        let past = now() - chrono::Duration::seconds(10);
        let bumped = touch(past);
        assert!(bumped - past >= chrono::Duration::seconds(10));
    }

    #[test]
    fn formatted_timestamps_sort_chronologically() {
        let whole = "2024-01-01T00:00:05Z".parse::<DateTime<Utc>>().unwrap();
        let fractional = whole + chrono::Duration::milliseconds(100);

        let a = format_datetime(whole);
        let b = format_datetime(fractional);
        assert!(a < b);
        assert_eq!(a.len(), b.len());
    }

    #[test]
    fn formatted_timestamps_round_trip() {
        let ts = now();
        assert_eq!(parse_datetime(format_datetime(ts)), ts);
    }

    #[test]
    fn non_empty_or_treats_empty_as_missing() {
        assert_eq!(non_empty_or(None, "d"), "d");
        assert_eq!(non_empty_or(Some(String::new()), "d"), "d");
        assert_eq!(non_empty_or(Some("x".into()), "d"), "x");
    }
}
