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

//! Backend-agnostic domain types. These are what the rest of the crate
//! passes around; `crate::dal` converts to and from the Diesel row structs
//! in `crate::database::schema` at the storage boundary.

mod game;
mod game_launch;
mod login_day;
mod mission;
mod outbox_entry;
mod play_session;
mod reward;
mod user;

pub use game::Game;
pub use game_launch::GameLaunch;
pub use login_day::LoginDay;
pub use mission::{Mission, MissionStatus, MissionType};
pub use outbox_entry::{
    OutboxEntry, OutboxStatus, OUTBOX_MAX_RETRIES, OUTBOX_RETRY_BACKOFF_SECS,
    OUTBOX_SWEEP_INTERVAL_SECS,
};
pub use play_session::PlaySession;
pub use reward::{period_of, Reward, MISSION_COMPLETION_REWARD_TYPE, MISSION_CYCLE_REWARD_POINTS};
pub use user::User;
