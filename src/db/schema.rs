use sqlx::SqlitePool;
use tracing::info;

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS trucks (
        truck_id INTEGER PRIMARY KEY AUTOINCREMENT,
        unit_number TEXT NOT NULL,
        year INTEGER NOT NULL,
        status TEXT NOT NULL DEFAULT 'available'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS driver_type (
        driver_type_id INTEGER PRIMARY KEY AUTOINCREMENT,
        driver_type TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS drivers (
        driver_id INTEGER PRIMARY KEY AUTOINCREMENT,
        driver_code TEXT NOT NULL,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        start_date TEXT,
        truck_id INTEGER,
        driver_type_id INTEGER,
        profile_pic TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS safety_categories (
        category_id INTEGER PRIMARY KEY AUTOINCREMENT,
        code TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        scoring_system INTEGER NOT NULL DEFAULT 0,
        p_i_score INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS scorecard_metrics (
        sc_category_id INTEGER PRIMARY KEY AUTOINCREMENT,
        sc_category TEXT NOT NULL,
        sc_description TEXT NOT NULL DEFAULT '',
        driver_type_id INTEGER
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS safety_events (
        safety_event_id INTEGER PRIMARY KEY AUTOINCREMENT,
        driver_id INTEGER NOT NULL,
        event_date TEXT NOT NULL,
        category_id INTEGER NOT NULL,
        notes TEXT,
        bonus_score INTEGER NOT NULL DEFAULT 0,
        p_i_score INTEGER NOT NULL DEFAULT 0,
        bonus_period INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS scorecard_events (
        scorecard_event_id INTEGER PRIMARY KEY AUTOINCREMENT,
        driver_id INTEGER NOT NULL,
        event_date TEXT NOT NULL,
        sc_category_id INTEGER NOT NULL,
        sc_score INTEGER NOT NULL DEFAULT 0,
        notes TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS truck_history (
        truck_history_id INTEGER PRIMARY KEY AUTOINCREMENT,
        truck_id INTEGER NOT NULL,
        driver_id INTEGER,
        date TEXT NOT NULL,
        type TEXT NOT NULL,
        notes TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_truck_history_truck_date ON truck_history (truck_id, date)",
    "CREATE INDEX IF NOT EXISTS idx_scorecard_events_driver_date ON scorecard_events (driver_id, event_date)",
    "CREATE INDEX IF NOT EXISTS idx_safety_events_driver ON safety_events (driver_id)",
];

/// Creates any missing tables and indexes. Safe to run on every start.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }

    info!(statements = STATEMENTS.len(), "database schema ready");
    Ok(())
}
