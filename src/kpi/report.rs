use std::{collections::{BTreeMap, BTreeSet}, str::FromStr};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use uuid::Uuid;

use crate::{error::PayrollError, payroll::calculator::round_money, utils};

use super::{
    dimension::{self, ratio, round_rate, Grouping, KpiRow, UNASSIGNED},
    facts::{self, Fact, KpiFilter},
};

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub period: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub organization_id: Uuid,
    pub total_cost: Decimal,
    pub total_employees: u64,
    pub total_vehicles: u64,
    pub avg_cost_per_employee: Decimal,
    pub department_kpis: Vec<KpiRow>,
    pub shift_kpis: Vec<KpiRow>,
    pub date_time_kpis: Vec<KpiRow>,
    pub route_kpis: Vec<KpiRow>,
    pub vehicle_category_kpis: Vec<KpiRow>,
    pub location_kpis: Vec<KpiRow>,
    pub top_cost_department: Option<KpiRow>,
    pub highest_overtime_shift: Option<KpiRow>,
}

pub fn build_dashboard(filter: &KpiFilter, facts: &[Fact]) -> Dashboard {
    let total_cost = facts.iter().map(|fact| fact.cost).sum::<Decimal>();
    let total_employees = facts.iter().map(|fact| fact.payee_id).collect::<BTreeSet<_>>().len() as u64;
    let total_vehicles = facts.iter().filter_map(|fact| fact.vehicle_id).collect::<BTreeSet<_>>().len() as u64;

    let department_kpis = dimension::by_department(facts);
    let shift_kpis = dimension::by_shift(facts);

    // Rows are already sorted by descending cost
    let top_cost_department = department_kpis.iter()
        .find(|row| row.key != UNASSIGNED)
        .cloned();
    let highest_overtime_shift = shift_kpis.iter()
        .filter(|row| row.key != UNASSIGNED && !row.overtime_hours.is_zero())
        .max_by(|a, b| a.overtime_hours.cmp(&b.overtime_hours).then_with(|| b.name.cmp(&a.name)))
        .cloned();

    Dashboard {
        period: utils::range_label(filter.start_date, filter.end_date),
        start_date: filter.start_date,
        end_date: filter.end_date,
        organization_id: filter.organization_id,
        total_cost,
        total_employees,
        total_vehicles,
        avg_cost_per_employee: round_money(ratio(total_cost, Decimal::from(total_employees))),
        date_time_kpis: dimension::by_date_time_bucket(facts),
        route_kpis: dimension::by_route(facts),
        vehicle_category_kpis: dimension::by_vehicle_category(facts),
        location_kpis: dimension::by_location(facts),
        department_kpis,
        shift_kpis,
        top_cost_department,
        highest_overtime_shift,
    }
}

pub async fn generate_dashboard(db: &DatabaseConnection, filter: &KpiFilter) -> Result<Dashboard, PayrollError> {
    let facts = facts::load_facts(db, filter).await?;

    Ok(build_dashboard(filter, &facts))
}

/// Rows of a single dimension
pub async fn group(db: &DatabaseConnection, filter: &KpiFilter, grouping: Grouping) -> Result<Vec<KpiRow>, PayrollError> {
    let facts = facts::load_facts(db, filter).await?;

    Ok(dimension::group_by(&facts, grouping))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Daily,
    /// Weeks start on Sunday
    Weekly,
    Monthly,
}

impl Granularity {
    fn bucket(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Daily => date,
            Self::Weekly => utils::week_start(date),
            Self::Monthly => utils::month_start(date),
        }
    }
}

impl FromStr for Granularity {
    type Err = PayrollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(PayrollError::validation(format!("unknown granularity `{other}`, expected daily, weekly or monthly"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub bucket_start: NaiveDate,
    pub total_cost: Decimal,
    pub entry_count: u64,
    /// Against the previous bucket, zero for the first one
    pub change: Decimal,
}

pub fn trends(facts: &[Fact], granularity: Granularity) -> Vec<TrendPoint> {
    let mut buckets = BTreeMap::<NaiveDate, (Decimal, u64)>::new();

    for fact in facts {
        let bucket = buckets.entry(granularity.bucket(fact.period_start)).or_default();
        bucket.0 += fact.cost;
        bucket.1 += 1;
    }

    let mut previous = None;
    buckets.into_iter()
        .map(|(bucket_start, (total_cost, entry_count))| {
            let change = previous.map_or(Decimal::ZERO, |previous| total_cost - previous);
            previous = Some(total_cost);

            TrendPoint { bucket_start, total_cost, entry_count, change }
        })
        .collect()
}

pub async fn get_trends(db: &DatabaseConnection, filter: &KpiFilter, granularity: Granularity) -> Result<Vec<TrendPoint>, PayrollError> {
    let facts = facts::load_facts(db, filter).await?;

    Ok(trends(&facts, granularity))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub total_cost: Decimal,
    pub total_employees: u64,
    pub cost_per_employee: Decimal,
    pub avg_utilization_rate: Decimal,
}

impl From<&Dashboard> for Snapshot {
    fn from(dashboard: &Dashboard) -> Self {
        let departments = dashboard.department_kpis.iter()
            .filter(|row| row.key != UNASSIGNED)
            .collect::<Vec<_>>();
        let utilization = departments.iter().map(|row| row.utilization_rate).sum::<Decimal>();

        Self {
            total_cost: dashboard.total_cost,
            total_employees: dashboard.total_employees,
            cost_per_employee: dashboard.avg_cost_per_employee,
            avg_utilization_rate: round_rate(ratio(utilization, Decimal::from(departments.len() as u64))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delta {
    pub current: Decimal,
    pub previous: Decimal,
    pub change: Decimal,
    /// Zero when there is nothing to compare against
    pub change_percentage: Decimal,
    pub trend: Trend,
}

impl Delta {
    pub fn new(current: Decimal, previous: Decimal) -> Self {
        let change = current - previous;

        Self {
            current,
            previous,
            change,
            change_percentage: round_money(ratio(change, previous) * dec!(100)),
            trend: match change {
                change if change > Decimal::ZERO => Trend::Up,
                change if change < Decimal::ZERO => Trend::Down,
                _ => Trend::Stable,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comparison {
    pub current: Snapshot,
    pub previous: Snapshot,
    pub total_cost: Delta,
    pub cost_per_employee: Delta,
    pub total_employees: Delta,
    pub avg_utilization_rate: Delta,
}

pub fn compare(current: Snapshot, previous: Snapshot) -> Comparison {
    Comparison {
        total_cost: Delta::new(current.total_cost, previous.total_cost),
        cost_per_employee: Delta::new(current.cost_per_employee, previous.cost_per_employee),
        total_employees: Delta::new(Decimal::from(current.total_employees), Decimal::from(previous.total_employees)),
        avg_utilization_rate: Delta::new(current.avg_utilization_rate, previous.avg_utilization_rate),
        current,
        previous,
    }
}

/// Both windows are evaluated inside `organization_id` whatever the filters carry
pub async fn compare_periods(
    db: &DatabaseConnection,
    organization_id: Uuid,
    mut current: KpiFilter,
    mut previous: KpiFilter,
) -> Result<Comparison, PayrollError> {
    current.organization_id = organization_id;
    previous.organization_id = organization_id;

    let current = generate_dashboard(db, &current).await?;
    let previous = generate_dashboard(db, &previous).await?;

    Ok(compare(Snapshot::from(&current), Snapshot::from(&previous)))
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase};

    use crate::{
        entity::{payroll_period, sea_orm_active_enums::PayrollType},
        kpi::facts::tests::{fact, named},
        payroll::period::tests::date,
    };

    use super::*;

    #[test]
    fn test_dashboard() {
        let org = Uuid::new_v4();
        let filter = KpiFilter::new(org, date(2024, 1, 1), date(2024, 1, 31));

        let (operations, night, morning) = (named("Operations"), named("Night"), named("Morning"));

        let mut a = fact(date(2024, 1, 1), dec!(3000), dec!(200), 22);
        a.department = Some(operations.clone());
        a.shift = Some(night.clone());
        let mut b = fact(date(2024, 1, 1), dec!(1000), dec!(170), 20);
        b.shift = Some(morning.clone());
        let mut c = fact(date(2024, 1, 1), dec!(6000), dec!(160), 20);
        c.shift = Some(morning.clone());

        let dashboard = build_dashboard(&filter, &[a, b, c]);

        assert_eq!(dashboard.period, "2024-01-01 to 2024-01-31");
        assert_eq!(dashboard.organization_id, org);
        assert_eq!(dashboard.total_cost, dec!(10000));
        assert_eq!(dashboard.total_employees, 3);
        assert_eq!(dashboard.total_vehicles, 3);
        assert_eq!(dashboard.avg_cost_per_employee, dec!(3333.33));
        assert_eq!(dashboard.department_kpis.len(), 2);
        assert_eq!(dashboard.date_time_kpis.len(), 1);

        // Unassigned costs more but is not a department
        assert_eq!(dashboard.top_cost_department.unwrap().name, "Operations");
        // Night has 24 overtime hours, Morning has 10
        assert_eq!(dashboard.highest_overtime_shift.unwrap().name, "Night");
    }

    #[test]
    fn test_empty_dashboard() {
        let dashboard = build_dashboard(&KpiFilter::new(Uuid::new_v4(), date(2024, 1, 1), date(2024, 1, 31)), &[]);

        assert_eq!(dashboard.total_cost, Decimal::ZERO);
        assert_eq!(dashboard.avg_cost_per_employee, Decimal::ZERO);
        assert!(dashboard.department_kpis.is_empty());
        assert!(dashboard.location_kpis.is_empty());
        assert!(dashboard.top_cost_department.is_none());
        assert!(dashboard.highest_overtime_shift.is_none());
    }

    #[test]
    fn test_granularity_parse() {
        assert_eq!("weekly".parse::<Granularity>().unwrap(), Granularity::Weekly);
        assert!(matches!("hourly".parse::<Granularity>(), Err(PayrollError::Validation(_))));
    }

    #[test]
    fn test_weekly_trends() {
        let facts = [
            // Wednesday and Saturday of the same week
            fact(date(2024, 1, 10), dec!(100), dec!(8), 1),
            fact(date(2024, 1, 13), dec!(200), dec!(8), 1),
            // Sunday opens the next week
            fact(date(2024, 1, 14), dec!(250), dec!(8), 1),
        ];

        let points = trends(&facts, Granularity::Weekly);
        assert_eq!(points, vec![
            TrendPoint { bucket_start: date(2024, 1, 7), total_cost: dec!(300), entry_count: 2, change: Decimal::ZERO },
            TrendPoint { bucket_start: date(2024, 1, 14), total_cost: dec!(250), entry_count: 1, change: dec!(-50) },
        ]);
    }

    #[test]
    fn test_monthly_and_daily_trends() {
        let facts = [
            fact(date(2024, 1, 1), dec!(100), dec!(8), 1),
            fact(date(2024, 1, 16), dec!(100), dec!(8), 1),
            fact(date(2024, 2, 1), dec!(500), dec!(8), 1),
        ];

        let monthly = trends(&facts, Granularity::Monthly);
        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[1].change, dec!(300));

        assert_eq!(trends(&facts, Granularity::Daily).len(), 3);
        assert!(trends(&[], Granularity::Daily).is_empty());
    }

    #[test]
    fn test_delta() {
        let up = Delta::new(dec!(120), dec!(100));
        assert_eq!(up.change, dec!(20));
        assert_eq!(up.change_percentage, dec!(20));
        assert_eq!(up.trend, Trend::Up);

        let down = Delta::new(dec!(50), dec!(150));
        assert_eq!(down.change_percentage, dec!(-66.67));
        assert_eq!(down.trend, Trend::Down);

        let from_nothing = Delta::new(dec!(10), Decimal::ZERO);
        assert_eq!(from_nothing.change_percentage, Decimal::ZERO);
        assert_eq!(from_nothing.trend, Trend::Up);

        assert_eq!(Delta::new(dec!(1), dec!(1)).trend, Trend::Stable);
    }

    #[test]
    fn test_compare() {
        let filter = KpiFilter::new(Uuid::new_v4(), date(2024, 2, 1), date(2024, 2, 29));
        let mut a = fact(date(2024, 2, 1), dec!(2000), dec!(160), 20);
        a.department = Some(named("Operations"));
        let current = build_dashboard(&filter, &[a]);
        let previous = build_dashboard(&filter, &[]);

        let comparison = compare(Snapshot::from(&current), Snapshot::from(&previous));
        assert_eq!(comparison.current.avg_utilization_rate, dec!(1));
        assert_eq!(comparison.previous.total_cost, Decimal::ZERO);
        assert_eq!(comparison.total_cost.change, dec!(2000));
        assert_eq!(comparison.total_employees.trend, Trend::Up);
        assert_eq!(comparison.avg_utilization_rate.change, dec!(1));
    }

    #[test]
    fn test_snapshot_utilization_skips_unassigned() {
        let filter = KpiFilter::new(Uuid::new_v4(), date(2024, 2, 1), date(2024, 2, 29));

        let mut salary = fact(date(2024, 2, 1), dec!(2000), dec!(160), 20);
        salary.department = Some(named("Operations"));
        let mut fee = fact(date(2024, 2, 1), dec!(19845), Decimal::ZERO, 20);
        fee.payroll_type = PayrollType::ServiceFee;

        let dashboard = build_dashboard(&filter, &[salary, fee]);
        assert_eq!(dashboard.department_kpis.len(), 2);

        let snapshot = Snapshot::from(&dashboard);
        assert_eq!(snapshot.avg_utilization_rate, dec!(1));
        assert_eq!(snapshot.total_cost, dec!(21845));
    }

    #[actix_web::test]
    async fn test_compare_periods_over_empty_windows() {
        let org = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<payroll_period::Model>::new()])
            .append_query_results([Vec::<payroll_period::Model>::new()])
            .into_connection();

        let comparison = compare_periods(
            &db,
            org,
            KpiFilter::new(Uuid::new_v4(), date(2024, 2, 1), date(2024, 2, 29)),
            KpiFilter::new(Uuid::new_v4(), date(2024, 1, 1), date(2024, 1, 31)),
        ).await.unwrap();
        assert_eq!(comparison.total_cost.trend, Trend::Stable);

        let log = format!("{:?}", db.into_transaction_log());
        assert_eq!(log.matches(&org.to_string()).count(), 2);
    }
}
