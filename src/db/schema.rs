use anyhow::Result;
use rusqlite::Connection;

/// Base tables created by `gridiron init`.
pub const BASE_TABLES: &[&str] = &[
    "conferences",
    "divisions",
    "venues",
    "teams",
    "players",
    "coaches",
    "seasons",
    "rankings",
    "game_scores",
    "player_statistics",
];

/// Aggregate views the analysis reports read but this tool never creates.
///
/// - `team_game_counts(team_id, team_name, is_home)`: one row per team per
///   game, `is_home` is 1 for home games and 0 for away games.
/// - `most_used_venues(venue_name, games_hosted, ...)`: one row per venue.
pub const EXTERNAL_VIEWS: &[&str] = &["team_game_counts", "most_used_venues"];

pub fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Version tracking
        CREATE TABLE IF NOT EXISTS gridiron_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        -- Lookups
        CREATE TABLE IF NOT EXISTS conferences (
            conference_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            alias TEXT
        );

        CREATE TABLE IF NOT EXISTS divisions (
            division_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            alias TEXT
        );

        CREATE TABLE IF NOT EXISTS venues (
            venue_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            city TEXT,
            state TEXT,
            country TEXT,
            zip TEXT,
            address TEXT,
            capacity INTEGER,
            surface TEXT,
            roof_type TEXT,
            sr_id TEXT,
            latitude REAL,
            longitude REAL
        );

        -- Core tables
        CREATE TABLE IF NOT EXISTS teams (
            team_id TEXT PRIMARY KEY,
            market TEXT,
            name TEXT NOT NULL,
            alias TEXT,
            founded INTEGER,
            mascot TEXT,
            fight_song TEXT,
            championships_won INTEGER,
            conference_titles INTEGER,
            playoff_appearances INTEGER,
            venue_id TEXT,
            division_id TEXT,
            conference_id TEXT,
            franchise_id TEXT
        );

        CREATE TABLE IF NOT EXISTS players (
            player_id TEXT PRIMARY KEY,
            first_name TEXT,
            last_name TEXT,
            abbr_name TEXT,
            jersey TEXT,
            position TEXT,
            status TEXT,
            eligibility TEXT,
            height INTEGER,
            weight INTEGER,
            birth_place TEXT,
            birth_date TEXT,
            team_id TEXT
        );

        CREATE TABLE IF NOT EXISTS coaches (
            coach_id TEXT PRIMARY KEY,
            full_name TEXT NOT NULL,
            first_name TEXT,
            last_name TEXT,
            position TEXT,
            team_id TEXT
        );

        CREATE TABLE IF NOT EXISTS seasons (
            season_id TEXT PRIMARY KEY,
            year INTEGER NOT NULL,
            status TEXT,
            type_code TEXT,
            start_date TEXT,
            end_date TEXT
        );

        CREATE TABLE IF NOT EXISTS rankings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            poll_id TEXT,
            season_id TEXT NOT NULL,
            week INTEGER NOT NULL,
            effective_time TEXT,
            team_id TEXT NOT NULL,
            rank INTEGER,
            points INTEGER NOT NULL DEFAULT 0,
            fp_votes INTEGER NOT NULL DEFAULT 0,
            wins INTEGER NOT NULL DEFAULT 0,
            losses INTEGER NOT NULL DEFAULT 0,
            ties INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS game_scores (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            season_id TEXT NOT NULL,
            week INTEGER NOT NULL,
            team_id TEXT NOT NULL,
            points_scored INTEGER
        );

        CREATE TABLE IF NOT EXISTS player_statistics (
            player_id TEXT NOT NULL,
            season_id TEXT NOT NULL,
            team_id TEXT,
            games_played INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (player_id, season_id)
        );

        -- Indexes for common filters
        CREATE INDEX IF NOT EXISTS idx_teams_conference ON teams(conference_id);
        CREATE INDEX IF NOT EXISTS idx_teams_division ON teams(division_id);
        CREATE INDEX IF NOT EXISTS idx_players_team ON players(team_id);
        CREATE INDEX IF NOT EXISTS idx_players_position ON players(position);
        CREATE INDEX IF NOT EXISTS idx_coaches_team ON coaches(team_id);
        CREATE INDEX IF NOT EXISTS idx_venues_state ON venues(state);
        CREATE INDEX IF NOT EXISTS idx_rankings_season_week ON rankings(season_id, week);
        CREATE INDEX IF NOT EXISTS idx_rankings_team ON rankings(team_id);
        CREATE INDEX IF NOT EXISTS idx_game_scores_team_week ON game_scores(team_id, season_id, week);
        ",
    )?;

    // Set schema version
    conn.execute(
        "INSERT OR REPLACE INTO gridiron_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
