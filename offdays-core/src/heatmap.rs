//! Read-only aggregation of ledger snapshots for the calendar view.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::person::Person;

/// Team filter for the overview endpoints. `All` disables filtering; people
/// without a team fall into the "Unassigned" bucket.
#[derive(Debug, Clone, PartialEq)]
pub enum TeamFilter {
    All,
    Team(String),
}

impl TeamFilter {
    pub fn from_query(team: Option<&str>) -> Self {
        match team {
            None | Some("") | Some("All") => TeamFilter::All,
            Some(team) => TeamFilter::Team(team.to_string()),
        }
    }

    pub fn matches(&self, person: &Person) -> bool {
        match self {
            TeamFilter::All => true,
            TeamFilter::Team(team) => person.team_or_default() == team,
        }
    }
}

/// Occupancy of a single date in the heatmap.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DayOccupancy {
    pub count: u32,
    pub names: Vec<String>,
}

/// Lazily expand every vacation of every matching person into
/// `(date, person name)` pairs.
///
/// Ordering is person insertion order, then record insertion order, then
/// ascending date within a record. The iterator is finite and restartable.
pub fn occupancy<'a>(
    persons: &'a [Person],
    filter: &'a TeamFilter,
) -> impl Iterator<Item = (NaiveDate, &'a str)> + 'a {
    persons
        .iter()
        .filter(move |person| filter.matches(person))
        .flat_map(|person| {
            person.vacations.iter().flat_map(move |vacation| {
                vacation
                    .start_date
                    .iter_days()
                    .take_while(move |day| *day <= vacation.end_date)
                    .map(move |day| (day, person.name.as_str()))
            })
        })
}

/// Fold the expansion into a date-keyed mapping. A pure read: repeated calls
/// over an unchanged snapshot return an identical mapping.
pub fn aggregate(persons: &[Person], filter: &TeamFilter) -> BTreeMap<NaiveDate, DayOccupancy> {
    let mut days: BTreeMap<NaiveDate, DayOccupancy> = BTreeMap::new();
    for (date, name) in occupancy(persons, filter) {
        let slot = days.entry(date).or_default();
        slot.count += 1;
        slot.names.push(name.to_string());
    }
    days
}

/// Names of matching people whose birthday falls on the given month and day,
/// ignoring year.
pub fn birthdays_on<'a>(
    persons: &'a [Person],
    month: u32,
    day: u32,
    filter: &TeamFilter,
) -> Vec<&'a str> {
    month_day_matches(persons, month, day, filter, |p| p.birthday)
}

/// Same as [`birthdays_on`], for hiring anniversaries.
pub fn anniversaries_on<'a>(
    persons: &'a [Person],
    month: u32,
    day: u32,
    filter: &TeamFilter,
) -> Vec<&'a str> {
    month_day_matches(persons, month, day, filter, |p| p.hiring_date)
}

fn month_day_matches<'a>(
    persons: &'a [Person],
    month: u32,
    day: u32,
    filter: &TeamFilter,
    date_of: impl Fn(&Person) -> Option<NaiveDate>,
) -> Vec<&'a str> {
    persons
        .iter()
        .filter(|person| filter.matches(person))
        .filter(|person| {
            date_of(person).is_some_and(|date| date.month() == month && date.day() == day)
        })
        .map(|person| person.name.as_str())
        .collect()
}

/// Calendar years and months of service, borrowing a year when the current
/// month precedes the hiring month. Not an elapsed-day division.
pub fn tenure(hiring_date: NaiveDate, today: NaiveDate) -> (i32, u32) {
    let mut years = today.year() - hiring_date.year();
    let mut months = today.month() as i32 - hiring_date.month() as i32;
    if months < 0 {
        years -= 1;
        months += 12;
    }
    (years, months as u32)
}
