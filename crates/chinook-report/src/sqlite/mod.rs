use std::path::Path;

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OpenFlags, Row};
use serde::Serialize;

use crate::models::{Customer, Employee, Genre, Invoice, InvoiceLine, Track, amount_to_cents};
use crate::store::DataSource;

pub const CUSTOMER_TABLE: &str = "customer";
pub const INVOICE_TABLE: &str = "invoice";
pub const INVOICE_LINE_TABLE: &str = "invoice_line";
pub const TRACK_TABLE: &str = "track";
pub const ALBUM_TABLE: &str = "album";
pub const GENRE_TABLE: &str = "genre";
pub const EMPLOYEE_TABLE: &str = "employee";

pub const REQUIRED_TABLES: &[&str] = &[
    CUSTOMER_TABLE,
    INVOICE_TABLE,
    INVOICE_LINE_TABLE,
    TRACK_TABLE,
    ALBUM_TABLE,
    GENRE_TABLE,
    EMPLOYEE_TABLE,
];

const SELECT_CUSTOMERS_SQL: &str = r#"
SELECT customer_id, country, support_rep_id
FROM customer
ORDER BY customer_id
"#;

const SELECT_INVOICES_SQL: &str = r#"
SELECT invoice_id, customer_id, invoice_date, total
FROM invoice
ORDER BY invoice_id
"#;

const SELECT_INVOICE_LINES_SQL: &str = r#"
SELECT invoice_line_id, invoice_id, track_id
FROM invoice_line
ORDER BY invoice_line_id
"#;

const SELECT_TRACKS_SQL: &str = r#"
SELECT track_id, album_id, genre_id
FROM track
ORDER BY track_id
"#;

const SELECT_GENRES_SQL: &str = r#"
SELECT genre_id, name
FROM genre
ORDER BY genre_id
"#;

const SELECT_EMPLOYEES_SQL: &str = r#"
SELECT employee_id, first_name, last_name, hire_date
FROM employee
ORDER BY employee_id
"#;

const SELECT_SCHEMA_OBJECTS_SQL: &str = r#"
SELECT name, type
FROM sqlite_master
WHERE type IN ('table', 'view')
ORDER BY type, name
"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaObject {
    pub name: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaOverview {
    pub objects: Vec<SchemaObject>,
    pub missing_tables: Vec<String>,
}

impl SchemaOverview {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_tables.is_empty()
    }
}

/// Opens an existing dataset file without write access. The file is never
/// created; a missing, non-regular or non-SQLite file is an error.
pub fn open_read_only_connection(path: &Path) -> Result<Connection> {
    if !path.exists() {
        bail!("dataset does not exist: {}", path.display());
    }
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("failed to stat dataset: {}", path.display()))?;
    if !metadata.is_file() {
        bail!("dataset must be a file: {}", path.display());
    }

    let connection = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("failed to open sqlite dataset: {}", path.display()))?;

    connection
        .query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| {
            row.get::<usize, i64>(0)
        })
        .with_context(|| format!("dataset is not a readable sqlite file: {}", path.display()))?;

    Ok(connection)
}

pub fn list_schema_objects(connection: &Connection) -> Result<SchemaOverview> {
    let objects = load_rows(connection, "sqlite_master", SELECT_SCHEMA_OBJECTS_SQL, |row| {
        Ok(SchemaObject {
            name: row.get("name")?,
            kind: row.get("type")?,
        })
    })?;

    let missing_tables = REQUIRED_TABLES
        .iter()
        .filter(|required| {
            !objects
                .iter()
                .any(|object| object.kind == "table" && object.name == **required)
        })
        .map(ToString::to_string)
        .collect();

    Ok(SchemaOverview {
        objects,
        missing_tables,
    })
}

/// [`DataSource`] backed by a read-only SQLite connection.
#[derive(Debug)]
pub struct SqliteSource {
    connection: Connection,
}

impl SqliteSource {
    pub fn open(path: &Path) -> Result<Self> {
        let connection = open_read_only_connection(path)?;
        Ok(Self { connection })
    }

    /// Wraps an already open connection, e.g. an in-memory fixture.
    #[must_use]
    pub fn from_connection(connection: Connection) -> Self {
        Self { connection }
    }

    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.connection
    }
}

impl DataSource for SqliteSource {
    fn customers(&self) -> Result<Vec<Customer>> {
        load_rows(&self.connection, CUSTOMER_TABLE, SELECT_CUSTOMERS_SQL, |row| {
            Ok(Customer {
                customer_id: row.get("customer_id")?,
                country: row.get("country")?,
                support_rep_id: row.get("support_rep_id")?,
            })
        })
    }

    fn invoices(&self) -> Result<Vec<Invoice>> {
        load_rows(&self.connection, INVOICE_TABLE, SELECT_INVOICES_SQL, |row| {
            Ok(Invoice {
                invoice_id: row.get("invoice_id")?,
                customer_id: row.get("customer_id")?,
                invoice_date: row
                    .get::<&str, Option<String>>("invoice_date")?
                    .unwrap_or_default(),
                total_cents: amount_to_cents(row.get::<&str, f64>("total")?),
            })
        })
    }

    fn invoice_lines(&self) -> Result<Vec<InvoiceLine>> {
        load_rows(
            &self.connection,
            INVOICE_LINE_TABLE,
            SELECT_INVOICE_LINES_SQL,
            |row| {
                Ok(InvoiceLine {
                    invoice_line_id: row.get("invoice_line_id")?,
                    invoice_id: row.get("invoice_id")?,
                    track_id: row.get("track_id")?,
                })
            },
        )
    }

    fn tracks(&self) -> Result<Vec<Track>> {
        load_rows(&self.connection, TRACK_TABLE, SELECT_TRACKS_SQL, |row| {
            Ok(Track {
                track_id: row.get("track_id")?,
                album_id: row.get("album_id")?,
                genre_id: row.get("genre_id")?,
            })
        })
    }

    fn genres(&self) -> Result<Vec<Genre>> {
        load_rows(&self.connection, GENRE_TABLE, SELECT_GENRES_SQL, |row| {
            Ok(Genre {
                genre_id: row.get("genre_id")?,
                name: row.get("name")?,
            })
        })
    }

    fn employees(&self) -> Result<Vec<Employee>> {
        load_rows(&self.connection, EMPLOYEE_TABLE, SELECT_EMPLOYEES_SQL, |row| {
            Ok(Employee {
                employee_id: row.get("employee_id")?,
                first_name: row.get("first_name")?,
                last_name: row.get("last_name")?,
                hire_date: row
                    .get::<&str, Option<String>>("hire_date")?
                    .unwrap_or_default(),
            })
        })
    }
}

fn load_rows<T>(
    connection: &Connection,
    table: &str,
    sql: &str,
    mut map_row: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>> {
    let mut statement = connection
        .prepare(sql)
        .with_context(|| format!("failed to prepare `{table}` query"))?;
    let mut rows = statement
        .query([])
        .with_context(|| format!("failed to query `{table}`"))?;

    let mut records = Vec::new();
    while let Some(row) = rows
        .next()
        .with_context(|| format!("failed to fetch `{table}` row"))?
    {
        let record = map_row(row).with_context(|| {
            format!(
                "failed to decode `{table}` row {}",
                records.len().saturating_add(1)
            )
        })?;
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::{REQUIRED_TABLES, SqliteSource, list_schema_objects};
    use crate::store::DataSource;

    const FIXTURE_SQL: &str = r#"
CREATE TABLE customer (customer_id INTEGER PRIMARY KEY, country TEXT NOT NULL, support_rep_id INTEGER);
CREATE TABLE invoice (invoice_id INTEGER PRIMARY KEY, customer_id INTEGER NOT NULL, invoice_date TEXT, total REAL NOT NULL);
CREATE TABLE invoice_line (invoice_line_id INTEGER PRIMARY KEY, invoice_id INTEGER NOT NULL, track_id INTEGER NOT NULL);
CREATE TABLE track (track_id INTEGER PRIMARY KEY, album_id INTEGER, genre_id INTEGER);
CREATE TABLE album (album_id INTEGER PRIMARY KEY, title TEXT);
CREATE TABLE genre (genre_id INTEGER PRIMARY KEY, name TEXT);
CREATE TABLE employee (employee_id INTEGER PRIMARY KEY, first_name TEXT NOT NULL, last_name TEXT NOT NULL, hire_date TEXT);
INSERT INTO customer VALUES (1, 'USA', 3), (2, 'Chile', NULL);
INSERT INTO invoice VALUES (10, 1, '2017-01-03 00:00:00', 15.84), (11, 2, NULL, 0.99);
INSERT INTO invoice_line VALUES (100, 10, 5), (101, 11, 6);
INSERT INTO track VALUES (5, 1, 1), (6, NULL, NULL);
INSERT INTO genre VALUES (1, 'Rock');
INSERT INTO employee VALUES (3, 'Jane', 'Peacock', '2017-04-01 00:00:00');
"#;

    fn fixture_source() -> SqliteSource {
        let connection = Connection::open_in_memory().expect("in-memory db should open");
        connection
            .execute_batch(FIXTURE_SQL)
            .expect("fixture schema should apply");
        SqliteSource::from_connection(connection)
    }

    #[test]
    fn loads_entities_with_optional_references() {
        let source = fixture_source();

        let customers = source.customers().expect("customers should load");
        assert_eq!(customers.len(), 2);
        assert_eq!(customers[0].support_rep_id, Some(3));
        assert_eq!(customers[1].support_rep_id, None);

        let invoices = source.invoices().expect("invoices should load");
        assert_eq!(invoices[0].total_cents, 1584);
        assert_eq!(invoices[1].total_cents, 99);
        assert_eq!(invoices[1].invoice_date, "");

        let tracks = source.tracks().expect("tracks should load");
        assert_eq!(tracks[1].album_id, None);
        assert_eq!(tracks[1].genre_id, None);
    }

    #[test]
    fn missing_table_error_names_the_table() {
        let source = fixture_source();
        source
            .connection()
            .execute_batch("DROP TABLE genre;")
            .expect("genre table should drop");

        let error = source.genres().expect_err("missing table must fail");
        assert!(
            format!("{error:#}").contains("`genre`"),
            "unexpected error: {error:#}"
        );
    }

    #[test]
    fn schema_overview_reports_missing_required_tables() {
        let source = fixture_source();
        let complete = list_schema_objects(source.connection()).expect("schema should list");
        assert!(complete.is_complete());
        assert_eq!(complete.objects.len(), REQUIRED_TABLES.len());

        source
            .connection()
            .execute_batch("DROP TABLE album;")
            .expect("album table should drop");
        let partial = list_schema_objects(source.connection()).expect("schema should list");
        assert_eq!(partial.missing_tables, vec!["album".to_string()]);
    }
}
