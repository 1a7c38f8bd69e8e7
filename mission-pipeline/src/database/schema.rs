/*
 *  Copyright 2026 Mission Platform Team
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Unified Diesel schema shared by the Postgres and SQLite backends.
//!
//! A single `diesel::table!` definition per entity is queried against
//! whichever backend `Database::dispatch` picks at runtime; there is no
//! per-backend schema split. Column types use the universal wrapper types
//! in `super::universal_types` so the same row struct compiles against both
//! `diesel::pg::Pg` and `diesel::sqlite::Sqlite`.

diesel::table! {
    users (id) {
        id -> Text,
        external_ref -> Text,
        points -> BigInt,
        created_at -> Timestamp,
    }
}

diesel::table! {
    games (id) {
        id -> Text,
        external_ref -> Text,
        created_at -> Timestamp,
    }
}

diesel::table! {
    user_login_records (id) {
        id -> Text,
        user_id -> Text,
        login_date -> Date,
        created_at -> Timestamp,
    }
}

diesel::table! {
    user_game_launches (id) {
        id -> Text,
        user_id -> Text,
        game_id -> Text,
        launch_date -> Date,
        launched_at -> Timestamp,
        created_at -> Timestamp,
    }
}

diesel::table! {
    games_play_record (id) {
        id -> Text,
        user_id -> Text,
        game_id -> Text,
        session_id -> Text,
        score -> Integer,
        played_at -> Timestamp,
        created_at -> Timestamp,
    }
}

diesel::table! {
    missions (id) {
        id -> Text,
        user_id -> Text,
        mission_type -> Text,
        cycle_start -> Date,
        status -> Text,
        progress_json -> Text,
        completed_at -> Nullable<Timestamp>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    mission_rewards (id) {
        id -> Text,
        user_id -> Text,
        reward_type -> Text,
        period -> Text,
        points -> Integer,
        distributed_at -> Timestamp,
    }
}

diesel::table! {
    message_outbox (id) {
        id -> Text,
        topic -> Text,
        dedup_key -> Text,
        payload_json -> Text,
        status -> Text,
        retry_count -> Integer,
        next_retry_at -> Timestamp,
        last_error -> Nullable<Text>,
        created_at -> Timestamp,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    users,
    games,
    user_login_records,
    user_game_launches,
    games_play_record,
    missions,
    mission_rewards,
    message_outbox,
);
