use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use uuid::Uuid;

use crate::{consts::STANDARD_SHIFT_HOURS, payroll::calculator::round_money};

use super::facts::{Fact, Named};

/// Key of the row collecting facts without the dimension
pub const UNASSIGNED: &str = "unassigned";

/// Scale of rates in reports
const RATE_SCALE: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    Department,
    Shift,
    /// Daily, on the period start date
    DateTime,
    Route,
    VehicleCategory,
    Location,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KpiRow {
    pub key: String,
    pub name: String,
    pub total_cost: Decimal,
    pub employee_count: u64,
    pub vehicle_count: u64,
    pub total_hours: Decimal,
    pub overtime_hours: Decimal,
    pub total_trips: i64,
    pub total_kms: Decimal,
    pub utilization_rate: Decimal,
    pub cost_per_employee: Decimal,
}

#[derive(Default)]
struct Accumulator {
    name: String,
    total_cost: Decimal,
    payees: BTreeSet<Uuid>,
    vehicles: BTreeSet<Uuid>,
    total_hours: Decimal,
    overtime_hours: Decimal,
    driver_hours: Decimal,
    driver_days: i64,
    total_trips: i64,
    total_kms: Decimal,
}

impl Accumulator {
    fn add(&mut self, fact: &Fact) {
        self.total_cost += fact.cost;
        self.payees.insert(fact.payee_id);
        if let Some(vehicle_id) = fact.vehicle_id {
            self.vehicles.insert(vehicle_id);
        }
        self.total_hours += fact.hours;
        self.overtime_hours += fact.overtime_hours();
        if fact.is_driver() {
            self.driver_hours += fact.hours;
            self.driver_days += fact.days;
        }
        self.total_trips += fact.trips;
        self.total_kms += fact.kms;
    }

    fn into_row(self, key: String) -> KpiRow {
        let employee_count = self.payees.len() as u64;
        let capacity = Decimal::from(self.driver_days) * STANDARD_SHIFT_HOURS;

        KpiRow {
            key,
            name: self.name,
            total_cost: self.total_cost,
            employee_count,
            vehicle_count: self.vehicles.len() as u64,
            total_hours: self.total_hours,
            overtime_hours: self.overtime_hours,
            total_trips: self.total_trips,
            total_kms: self.total_kms,
            utilization_rate: round_rate(ratio(self.driver_hours, capacity)),
            cost_per_employee: round_money(ratio(self.total_cost, Decimal::from(employee_count))),
        }
    }
}

pub fn round_rate(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(RATE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Zero when the denominator is zero
pub fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

fn dimension_of(fact: &Fact, grouping: Grouping) -> Option<&Named> {
    match grouping {
        Grouping::Department => fact.department.as_ref(),
        Grouping::Shift => fact.shift.as_ref(),
        Grouping::Route => fact.route.as_ref(),
        Grouping::VehicleCategory => fact.vehicle_category.as_ref(),
        Grouping::Location => fact.location.as_ref(),
        Grouping::DateTime => None,
    }
}

fn key_of(fact: &Fact, grouping: Grouping) -> (String, String) {
    if grouping == Grouping::DateTime {
        let day = fact.period_start.format("%Y-%m-%d").to_string();
        return (day.clone(), day);
    }

    match dimension_of(fact, grouping) {
        Some(named) => (named.id.to_string(), named.name.clone()),
        None => (UNASSIGNED.to_string(), "Unassigned".to_string()),
    }
}

/// Rows by descending cost, or chronologically for [`Grouping::DateTime`]
pub fn group_by(facts: &[Fact], grouping: Grouping) -> Vec<KpiRow> {
    let mut groups = BTreeMap::<String, Accumulator>::new();

    for fact in facts {
        let (key, name) = key_of(fact, grouping);
        let acc = groups.entry(key).or_insert_with(|| Accumulator {
            name,
            ..Default::default()
        });
        acc.add(fact);
    }

    let mut rows = groups.into_iter()
        .map(|(key, acc)| acc.into_row(key))
        .collect::<Vec<_>>();

    if grouping != Grouping::DateTime {
        rows.sort_by(|a, b| b.total_cost.cmp(&a.total_cost).then_with(|| a.name.cmp(&b.name)));
    }

    rows
}

pub fn by_department(facts: &[Fact]) -> Vec<KpiRow> {
    group_by(facts, Grouping::Department)
}

pub fn by_shift(facts: &[Fact]) -> Vec<KpiRow> {
    group_by(facts, Grouping::Shift)
}

pub fn by_date_time_bucket(facts: &[Fact]) -> Vec<KpiRow> {
    group_by(facts, Grouping::DateTime)
}

pub fn by_route(facts: &[Fact]) -> Vec<KpiRow> {
    group_by(facts, Grouping::Route)
}

pub fn by_vehicle_category(facts: &[Fact]) -> Vec<KpiRow> {
    group_by(facts, Grouping::VehicleCategory)
}

pub fn by_location(facts: &[Fact]) -> Vec<KpiRow> {
    group_by(facts, Grouping::Location)
}
