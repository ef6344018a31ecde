use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::{
    consts::STANDARD_SHIFT_HOURS,
    entity::{
        department, driver, location, payroll_entry, payroll_period, prelude::*, route, shift, vehicle, vehicle_category,
        sea_orm_active_enums::PayrollType,
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KpiFilter {
    pub organization_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub department_ids: Vec<Uuid>,
    pub shift_ids: Vec<Uuid>,
    pub route_ids: Vec<Uuid>,
    pub vehicle_category_ids: Vec<Uuid>,
    pub location_ids: Vec<Uuid>,
    pub vehicle_ids: Vec<Uuid>,
    pub driver_ids: Vec<Uuid>,
}

impl KpiFilter {
    pub fn new(organization_id: Uuid, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            organization_id,
            start_date,
            end_date,
            department_ids: Vec::new(),
            shift_ids: Vec::new(),
            route_ids: Vec::new(),
            vehicle_category_ids: Vec::new(),
            location_ids: Vec::new(),
            vehicle_ids: Vec::new(),
            driver_ids: Vec::new(),
        }
    }

    /// An empty id list does not narrow anything
    pub fn admits(&self, fact: &Fact) -> bool {
        fn matches(ids: &[Uuid], id: Option<Uuid>) -> bool {
            ids.is_empty() || id.is_some_and(|id| ids.contains(&id))
        }

        let driver_id = fact.is_driver().then_some(fact.payee_id);

        matches(&self.department_ids, fact.department.as_ref().map(|named| named.id))
            && matches(&self.shift_ids, fact.shift.as_ref().map(|named| named.id))
            && matches(&self.route_ids, fact.route.as_ref().map(|named| named.id))
            && matches(&self.vehicle_category_ids, fact.vehicle_category.as_ref().map(|named| named.id))
            && matches(&self.location_ids, fact.location.as_ref().map(|named| named.id))
            && matches(&self.vehicle_ids, fact.vehicle_id)
            && matches(&self.driver_ids, driver_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Named {
    pub id: Uuid,
    pub name: String,
}

/// A payroll entry joined with the dimensions it can be reported by
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fact {
    pub period_start: NaiveDate,
    pub payroll_type: PayrollType,
    pub payee_id: Uuid,
    pub vehicle_id: Option<Uuid>,
    pub cost: Decimal,
    pub hours: Decimal,
    pub days: i64,
    pub trips: i64,
    pub kms: Decimal,
    pub department: Option<Named>,
    pub shift: Option<Named>,
    pub route: Option<Named>,
    pub location: Option<Named>,
    pub vehicle_category: Option<Named>,
}

impl Fact {
    pub fn is_driver(&self) -> bool {
        self.payroll_type == PayrollType::Salary
    }

    pub fn overtime_hours(&self) -> Decimal {
        (self.hours - STANDARD_SHIFT_HOURS * Decimal::from(self.days)).max(Decimal::ZERO)
    }
}

/// Reference data needed to place entries on each dimension
#[derive(Debug, Default)]
pub struct Lookups {
    pub drivers: HashMap<Uuid, driver::Model>,
    pub vehicles: HashMap<Uuid, vehicle::Model>,
    /// First route by name per vehicle
    pub routes: HashMap<Uuid, route::Model>,
    pub departments: HashMap<Uuid, Named>,
    pub shifts: HashMap<Uuid, Named>,
    pub locations: HashMap<Uuid, Named>,
    pub vehicle_categories: HashMap<Uuid, Named>,
}

pub fn join(entries: &[payroll_entry::Model], period_starts: &HashMap<Uuid, NaiveDate>, lookups: &Lookups) -> Vec<Fact> {
    entries.iter()
        .filter_map(|entry| {
            let period_start = *period_starts.get(&entry.payroll_period_id)?;

            let driver = entry.driver_id.and_then(|id| lookups.drivers.get(&id));
            let vehicle = entry.vehicle_id.and_then(|id| lookups.vehicles.get(&id));
            let route = entry.vehicle_id.and_then(|id| lookups.routes.get(&id));

            Some(Fact {
                period_start,
                payroll_type: entry.payroll_type,
                payee_id: entry.driver_id.or(entry.service_provider_id).unwrap_or(entry.id),
                vehicle_id: entry.vehicle_id,
                cost: entry.net_pay,
                hours: entry.hours_worked.unwrap_or_default(),
                days: i64::from(entry.days_worked),
                trips: i64::from(entry.trips_completed),
                kms: entry.kms_covered,
                department: driver
                    .and_then(|driver| driver.department_id)
                    .and_then(|id| lookups.departments.get(&id))
                    .cloned(),
                shift: route
                    .and_then(|route| route.shift_id)
                    .and_then(|id| lookups.shifts.get(&id))
                    .cloned(),
                route: route.map(|route| Named { id: route.id, name: route.name.clone() }),
                location: route
                    .and_then(|route| route.location_id)
                    .and_then(|id| lookups.locations.get(&id))
                    .cloned(),
                vehicle_category: vehicle
                    .and_then(|vehicle| vehicle.category_id)
                    .and_then(|id| lookups.vehicle_categories.get(&id))
                    .cloned(),
            })
        })
        .collect()
}

async fn load_named<E>(
    db: &DatabaseConnection,
    column: E::Column,
    ids: BTreeSet<Uuid>,
    label: impl Fn(E::Model) -> Named,
) -> Result<HashMap<Uuid, Named>, DbErr>
where
    E: EntityTrait,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    Ok(E::find()
        .filter(column.is_in(ids))
        .all(db).await?
        .into_iter()
        .map(|model| {
            let named = label(model);
            (named.id, named)
        })
        .collect())
}

/// Entries of the periods starting inside the window, joined and narrowed by the filter
pub async fn load_facts(db: &DatabaseConnection, filter: &KpiFilter) -> Result<Vec<Fact>, DbErr> {
    let periods = PayrollPeriod::find()
        .filter(payroll_period::Column::OrganizationId.eq(filter.organization_id))
        .filter(payroll_period::Column::StartDate.between(filter.start_date, filter.end_date))
        .all(db).await?;

    if periods.is_empty() {
        return Ok(Vec::new());
    }

    let period_starts = periods.iter()
        .map(|period| (period.id, period.start_date))
        .collect::<HashMap<_, _>>();

    let entries = PayrollEntry::find()
        .filter(payroll_entry::Column::PayrollPeriodId.is_in(period_starts.keys().copied()))
        .order_by_asc(payroll_entry::Column::CreatedAt)
        .all(db).await?;

    if entries.is_empty() {
        return Ok(Vec::new());
    }

    let mut lookups = Lookups::default();

    let driver_ids = entries.iter().filter_map(|entry| entry.driver_id).collect::<BTreeSet<_>>();
    if !driver_ids.is_empty() {
        lookups.drivers = Driver::find()
            .filter(driver::Column::Id.is_in(driver_ids))
            .all(db).await?
            .into_iter()
            .map(|driver| (driver.id, driver))
            .collect();
    }

    let vehicle_ids = entries.iter().filter_map(|entry| entry.vehicle_id).collect::<BTreeSet<_>>();
    if !vehicle_ids.is_empty() {
        lookups.vehicles = Vehicle::find()
            .filter(vehicle::Column::Id.is_in(vehicle_ids.iter().copied()))
            .all(db).await?
            .into_iter()
            .map(|vehicle| (vehicle.id, vehicle))
            .collect();

        let routes = Route::find()
            .filter(route::Column::OrganizationId.eq(filter.organization_id))
            .filter(route::Column::VehicleId.is_in(vehicle_ids))
            .order_by_asc(route::Column::Name)
            .all(db).await?;

        for route in routes {
            if let Some(vehicle_id) = route.vehicle_id {
                lookups.routes.entry(vehicle_id).or_insert(route);
            }
        }
    }

    lookups.departments = load_named::<Department>(
        db,
        department::Column::Id,
        lookups.drivers.values().filter_map(|driver| driver.department_id).collect(),
        |department| Named { id: department.id, name: department.name },
    ).await?;

    lookups.shifts = load_named::<Shift>(
        db,
        shift::Column::Id,
        lookups.routes.values().filter_map(|route| route.shift_id).collect(),
        |shift| Named { id: shift.id, name: shift.name },
    ).await?;

    lookups.locations = load_named::<Location>(
        db,
        location::Column::Id,
        lookups.routes.values().filter_map(|route| route.location_id).collect(),
        |location| Named { id: location.id, name: location.name },
    ).await?;

    lookups.vehicle_categories = load_named::<VehicleCategory>(
        db,
        vehicle_category::Column::Id,
        lookups.vehicles.values().filter_map(|vehicle| vehicle.category_id).collect(),
        |category| Named { id: category.id, name: category.name },
    ).await?;

    Ok(join(&entries, &period_starts, &lookups)
        .into_iter()
        .filter(|fact| filter.admits(fact))
        .collect())
}
