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

pub mod completion;
pub mod evaluator;
pub mod initializer;

pub use completion::CompletionEngine;
pub use evaluator::MissionEvaluator;
pub use initializer::MissionInitializer;

use chrono::Duration;

/// Every mission cycle runs exactly 30 days from its `cycle_start`.
pub const CYCLE_LENGTH_DAYS: i64 = 30;

pub fn cycle_length() -> Duration {
    Duration::days(CYCLE_LENGTH_DAYS)
}
