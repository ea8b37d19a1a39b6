//! Transform/insert statements: staging -> dimensions, then the fact table.
//!
//! Dimension inserts run before the fact insert. The fact SELECT reads only
//! from staging, so the ordering is a commit-ordering convention rather than
//! a data dependency.
//!
//! Timestamps arrive as integer epoch milliseconds; conversion is
//! `timestamp 'epoch' + ts / 1000 * interval '1 second'` with calendar
//! fields extracted in UTC.

use super::Statement;

// Ties on a user's maximum ts are broken by the lowest sessionId so the
// result is deterministic and at most one row per user survives.
static USER_INSERT: Statement = Statement::fixed(
    "insert_users",
    r#"
    INSERT INTO users (user_id, first_name, last_name, gender, level)
    SELECT userId, firstName, lastName, gender, level
    FROM (
        SELECT userId, firstName, lastName, gender, level,
               ROW_NUMBER() OVER (PARTITION BY userId ORDER BY ts DESC, sessionId ASC) AS rn
        FROM staging_events
        WHERE page = 'NextSong' AND userId IS NOT NULL
    ) ranked
    WHERE rn = 1
    "#,
);

static SONG_INSERT: Statement = Statement::fixed(
    "insert_songs",
    r#"
    INSERT INTO songs (song_id, title, artist_id, year, duration)
    SELECT DISTINCT song_id, title, artist_id, year, duration
    FROM staging_songs
    WHERE song_id IS NOT NULL
    "#,
);

// Some artist_ids carry several artist_name spellings in the source data
// ("Tricky" vs "Tricky / The Mad Dog Reflex"). MIN on every non-key column
// collapses them deterministically.
static ARTIST_INSERT: Statement = Statement::fixed(
    "insert_artists",
    r#"
    INSERT INTO artists (artist_id, name, location, latitude, longitude)
    SELECT artist_id, MIN(artist_name), MIN(artist_location), MIN(artist_latitude), MIN(artist_longitude)
    FROM staging_songs
    WHERE artist_id IS NOT NULL
    GROUP BY artist_id
    "#,
);

static TIME_INSERT: Statement = Statement::fixed(
    "insert_time",
    r#"
    INSERT INTO time (start_time, hour, day, week, month, year, weekday)
    WITH ts_converted AS (
        SELECT DISTINCT ts, timestamp 'epoch' + ts / 1000 * interval '1 second' AS start_time
        FROM staging_events
        WHERE page = 'NextSong' AND ts IS NOT NULL
    )
    SELECT start_time,
           EXTRACT(hour FROM start_time)  AS hour,
           EXTRACT(day FROM start_time)   AS day,
           EXTRACT(week FROM start_time)  AS week,
           EXTRACT(month FROM start_time) AS month,
           EXTRACT(year FROM start_time)  AS year,
           EXTRACT(dow FROM start_time)   AS weekday
    FROM ts_converted
    "#,
);

// LEFT JOIN by choice: events with no exact (title, artist) match in the
// song catalog still land in the fact table with NULL song_id/artist_id
// instead of being dropped.
static SONGPLAY_INSERT: Statement = Statement::fixed(
    "insert_songplays",
    r#"
    INSERT INTO songplays (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
    SELECT timestamp 'epoch' + ev.ts / 1000 * interval '1 second' AS start_time,
           ev.userId,
           ev.level,
           so.song_id,
           so.artist_id,
           ev.sessionId,
           ev.location,
           ev.userAgent
    FROM staging_events ev
         LEFT JOIN staging_songs so
                ON ev.song = so.title AND ev.artist = so.artist_name
    WHERE ev.page = 'NextSong'
    "#,
);

/// Dimension inserts then the fact insert, in commit order.
pub fn transform_statements() -> [&'static Statement; 5] {
    [
        &USER_INSERT,
        &SONG_INSERT,
        &ARTIST_INSERT,
        &TIME_INSERT,
        &SONGPLAY_INSERT,
    ]
}
