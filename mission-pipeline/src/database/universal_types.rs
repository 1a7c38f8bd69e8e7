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

//! Universal type wrappers for cross-database compatibility.
//!
//! These newtypes let a single Diesel schema (see `database::schema`) be
//! queried against either a `PgConnection` or a `SqliteConnection` through
//! `diesel::MultiConnection`. `UniversalUuid` stores as `Text` on both
//! backends; `UniversalTimestamp` and `UniversalDate` ride Diesel's native
//! `Timestamp`/`Date` support, which both backends already implement for
//! `chrono` types.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::{Date, Text, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Universal UUID wrapper, stored as `TEXT` so it round-trips through both
/// Postgres and SQLite without backend-specific column types.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub struct UniversalUuid(pub Uuid);

impl UniversalUuid {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for UniversalUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for UniversalUuid {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<UniversalUuid> for Uuid {
    fn from(wrapper: UniversalUuid) -> Self {
        wrapper.0
    }
}

impl<DB> ToSql<Text, DB> for UniversalUuid
where
    DB: Backend,
    String: ToSql<Text, DB>,
{
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, DB>) -> serialize::Result {
        self.0.to_string().to_sql(out)
    }
}

impl<DB> FromSql<Text, DB> for UniversalUuid
where
    DB: Backend,
    String: FromSql<Text, DB>,
{
    fn from_sql(bytes: DB::RawValue<'_>) -> deserialize::Result<Self> {
        let s = String::from_sql(bytes)?;
        Ok(UniversalUuid(Uuid::parse_str(&s)?))
    }
}

/// Universal timestamp wrapper, stored as `TIMESTAMP` (naive UTC) on both
/// backends.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Timestamp)]
pub struct UniversalTimestamp(pub DateTime<Utc>);

impl UniversalTimestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn into_inner(self) -> DateTime<Utc> {
        self.0
    }
}

impl fmt::Display for UniversalTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for UniversalTimestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl From<UniversalTimestamp> for DateTime<Utc> {
    fn from(wrapper: UniversalTimestamp) -> Self {
        wrapper.0
    }
}

impl std::ops::Add<chrono::Duration> for UniversalTimestamp {
    type Output = UniversalTimestamp;
    fn add(self, rhs: chrono::Duration) -> Self::Output {
        UniversalTimestamp(self.0 + rhs)
    }
}

impl std::ops::Sub<chrono::Duration> for UniversalTimestamp {
    type Output = UniversalTimestamp;
    fn sub(self, rhs: chrono::Duration) -> Self::Output {
        UniversalTimestamp(self.0 - rhs)
    }
}

impl<DB> ToSql<Timestamp, DB> for UniversalTimestamp
where
    DB: Backend,
    NaiveDateTime: ToSql<Timestamp, DB>,
{
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, DB>) -> serialize::Result {
        self.0.naive_utc().to_sql(out)
    }
}

impl<DB> FromSql<Timestamp, DB> for UniversalTimestamp
where
    DB: Backend,
    NaiveDateTime: FromSql<Timestamp, DB>,
{
    fn from_sql(bytes: DB::RawValue<'_>) -> deserialize::Result<Self> {
        let naive = NaiveDateTime::from_sql(bytes)?;
        Ok(UniversalTimestamp(DateTime::from_naive_utc_and_offset(naive, Utc)))
    }
}

/// Universal calendar-date wrapper (no time component), stored as `DATE`.
///
/// Used for login days, launch days, and mission cycle-start dates, all of
/// which are normalized to midnight UTC per `spec.md` §4.5.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Date)]
pub struct UniversalDate(pub NaiveDate);

impl UniversalDate {
    pub fn today() -> Self {
        Self(Utc::now().date_naive())
    }

    pub fn from_timestamp(ts: UniversalTimestamp) -> Self {
        Self(ts.0.date_naive())
    }

    pub fn pred(&self) -> Self {
        Self(self.0.pred_opt().expect("date underflow"))
    }

    /// `self - n` calendar days. Used to compute the 30-day cycle-window
    /// lower bound from an evaluation instant.
    pub fn minus_days(&self, n: i64) -> Self {
        Self(self.0 - chrono::Duration::days(n))
    }
}

impl fmt::Display for UniversalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<NaiveDate> for UniversalDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl From<UniversalDate> for NaiveDate {
    fn from(wrapper: UniversalDate) -> Self {
        wrapper.0
    }
}

impl<DB> ToSql<Date, DB> for UniversalDate
where
    DB: Backend,
    NaiveDate: ToSql<Date, DB>,
{
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, DB>) -> serialize::Result {
        self.0.to_sql(out)
    }
}

impl<DB> FromSql<Date, DB> for UniversalDate
where
    DB: Backend,
    NaiveDate: FromSql<Date, DB>,
{
    fn from_sql(bytes: DB::RawValue<'_>) -> deserialize::Result<Self> {
        Ok(UniversalDate(NaiveDate::from_sql(bytes)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn universal_uuid_roundtrip() {
        let uuid = UniversalUuid::new_v4();
        let std_uuid: Uuid = uuid.into();
        assert_eq!(UniversalUuid::from(std_uuid), uuid);
    }

    #[test]
    fn universal_timestamp_roundtrip() {
        let ts = UniversalTimestamp::now();
        let dt: DateTime<Utc> = ts.into();
        assert_eq!(UniversalTimestamp::from(dt).0.timestamp(), ts.0.timestamp());
    }

    #[test]
    fn universal_date_pred_steps_back_one_day() {
        let d = UniversalDate(NaiveDate::from_ymd_opt(2026, 1, 2).unwrap());
        assert_eq!(d.pred().0, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    }
}
