//! Schema and table DDL.
//!
//! Staging tables mirror the raw JSON records permissively: anything the
//! transforms do not depend on stays nullable free text. Identifying columns
//! are NOT NULL. Layout hints (sortkey/distkey/diststyle) are advisory to
//! the storage engine and carry no logical meaning; there are no foreign
//! keys, so the create order below is fixed for readability only.

use super::Statement;

/// Drop the namespace wholesale, then recreate it empty.
pub static RESET_SCHEMA: [Statement; 2] = [
    Statement::fixed("drop_schema", "DROP SCHEMA IF EXISTS dwh CASCADE"),
    Statement::fixed("create_schema", "CREATE SCHEMA dwh"),
];

/// Point the session at the pipeline namespace.
pub static SELECT_SCHEMA: Statement =
    Statement::fixed("select_schema", "SET search_path TO dwh");

/// One DROP per table. IF EXISTS makes these order-independent.
pub static DROP_TABLES: [Statement; 7] = [
    Statement::fixed("drop_staging_events", "DROP TABLE IF EXISTS staging_events"),
    Statement::fixed("drop_staging_songs", "DROP TABLE IF EXISTS staging_songs"),
    Statement::fixed("drop_users", "DROP TABLE IF EXISTS users"),
    Statement::fixed("drop_songs", "DROP TABLE IF EXISTS songs"),
    Statement::fixed("drop_artists", "DROP TABLE IF EXISTS artists"),
    Statement::fixed("drop_time", "DROP TABLE IF EXISTS time"),
    Statement::fixed("drop_songplays", "DROP TABLE IF EXISTS songplays"),
];

/// One CREATE per table: staging first, then dimensions, then the fact.
pub static CREATE_TABLES: [Statement; 7] = [
    Statement::fixed(
        "create_staging_events",
        r#"
        CREATE TABLE IF NOT EXISTS staging_events (
            id              INT IDENTITY(1,1) NOT NULL,
            artist          TEXT NULL,
            auth            TEXT NULL,
            firstName       TEXT NULL,
            gender          CHAR NULL,
            itemInSession   INT NULL,
            lastName        TEXT NULL,
            length          FLOAT NULL,
            level           TEXT NULL,
            location        TEXT NULL,
            method          TEXT NULL,
            page            TEXT NULL,
            registration    DOUBLE PRECISION NULL,
            sessionId       INT NULL,
            song            TEXT NULL,
            status          INT NULL,
            ts              BIGINT NOT NULL,
            userAgent       TEXT NULL,
            userId          INT NULL
        )
        "#,
    ),
    Statement::fixed(
        "create_staging_songs",
        r#"
        CREATE TABLE IF NOT EXISTS staging_songs (
            id               INT IDENTITY(1,1) NOT NULL,
            artist_id        TEXT NOT NULL,
            artist_latitude  FLOAT NULL,
            artist_location  TEXT NULL,
            artist_longitude FLOAT NULL,
            artist_name      TEXT NOT NULL,
            duration         FLOAT NOT NULL,
            num_songs        INT NOT NULL,
            song_id          TEXT NOT NULL,
            title            TEXT NOT NULL,
            year             INT NOT NULL
        )
        "#,
    ),
    Statement::fixed(
        "create_users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            user_id    TEXT NOT NULL sortkey,
            first_name TEXT,
            last_name  TEXT,
            gender     CHAR,
            level      TEXT NOT NULL
        )
        diststyle all
        "#,
    ),
    Statement::fixed(
        "create_songs",
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            song_id   TEXT NOT NULL sortkey,
            title     TEXT NOT NULL,
            artist_id TEXT NOT NULL,
            year      INT NOT NULL,
            duration  FLOAT NOT NULL
        )
        diststyle all
        "#,
    ),
    Statement::fixed(
        "create_artists",
        r#"
        CREATE TABLE IF NOT EXISTS artists (
            artist_id TEXT NOT NULL sortkey,
            name      TEXT NOT NULL,
            location  TEXT,
            latitude  FLOAT,
            longitude FLOAT
        )
        diststyle all
        "#,
    ),
    Statement::fixed(
        "create_time",
        r#"
        CREATE TABLE IF NOT EXISTS time (
            start_time TIMESTAMP NOT NULL sortkey distkey,
            hour       INT NOT NULL,
            day        INT NOT NULL,
            week       INT NOT NULL,
            month      INT NOT NULL,
            year       INT NOT NULL,
            weekday    INT NOT NULL
        )
        "#,
    ),
    Statement::fixed(
        "create_songplays",
        r#"
        CREATE TABLE IF NOT EXISTS songplays (
            songplay_id INT IDENTITY(1,1) NOT NULL,
            start_time  TIMESTAMP NOT NULL distkey,
            user_id     TEXT NOT NULL,
            level       TEXT NOT NULL,
            song_id     TEXT,
            artist_id   TEXT,
            session_id  INT NOT NULL,
            location    TEXT,
            user_agent  TEXT
        )
        "#,
    ),
];
