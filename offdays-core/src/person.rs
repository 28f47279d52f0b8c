//! Ledger data model: tracked people and their vacation records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// Team bucket used for people without a team assignment.
pub const UNASSIGNED_TEAM: &str = "Unassigned";

/// Vacation allowance applied to imported rows without a usable number.
pub const DEFAULT_VACATION_DAYS: u32 = 20;

/// A tracked team member and their booked time off.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hiring_date: Option<NaiveDate>,
    #[serde(default)]
    pub total_vacation_days: u32,
    #[serde(default)]
    pub vacations: Vec<VacationRecord>,
}

impl Person {
    /// Team name with the unassigned default applied.
    pub fn team_or_default(&self) -> &str {
        match self.team.as_deref() {
            Some(team) if !team.is_empty() => team,
            _ => UNASSIGNED_TEAM,
        }
    }

    /// Allowance minus all booked days. May go negative; a negative balance
    /// is displayed, not rejected.
    pub fn remaining_balance(&self) -> i64 {
        let used: i64 = self.vacations.iter().map(|v| v.days_used as i64).sum();
        self.total_vacation_days as i64 - used
    }
}

/// One booked time-off interval, owned by its person.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VacationRecord {
    pub id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Supplied by the caller when booking; never recomputed by the ledger.
    pub days_used: u32,
    /// Id of the mirrored event in the external calendar. Absent means no
    /// remote object was created by us; presence is only advisory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_event_id: Option<String>,
}

/// Fields accepted when creating a person. Also produced by the bulk
/// roster importer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonDraft {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub birthday: Option<NaiveDate>,
    #[serde(default)]
    pub hiring_date: Option<NaiveDate>,
    #[serde(default)]
    pub total_vacation_days: Option<u32>,
}

/// Partial person update; only supplied fields are merged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub team: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub hiring_date: Option<NaiveDate>,
    pub total_vacation_days: Option<u32>,
}

impl PersonPatch {
    pub(crate) fn apply(self, person: &mut Person) {
        if let Some(name) = self.name {
            person.name = name;
        }
        if let Some(email) = self.email {
            person.email = email;
        }
        if let Some(team) = self.team {
            person.team = Some(team);
        }
        if let Some(birthday) = self.birthday {
            person.birthday = Some(birthday);
        }
        if let Some(hiring_date) = self.hiring_date {
            person.hiring_date = Some(hiring_date);
        }
        if let Some(total) = self.total_vacation_days {
            person.total_vacation_days = total;
        }
    }
}

/// Booking details for creating or updating a vacation record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VacationBooking {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub days_used: Option<u32>,
}

impl VacationBooking {
    /// Enforce the booking invariants: both dates present and ordered, and a
    /// positive day count. A zero day count is treated as missing.
    pub(crate) fn validated(&self) -> LedgerResult<(NaiveDate, NaiveDate, u32)> {
        let start = self
            .start_date
            .ok_or_else(|| LedgerError::Validation("startDate is required".into()))?;
        let end = self
            .end_date
            .ok_or_else(|| LedgerError::Validation("endDate is required".into()))?;

        if end < start {
            return Err(LedgerError::Validation(
                "endDate must not precede startDate".into(),
            ));
        }

        match self.days_used {
            Some(days) if days > 0 => Ok((start, end, days)),
            _ => Err(LedgerError::Validation(
                "daysUsed must be a positive integer".into(),
            )),
        }
    }
}
