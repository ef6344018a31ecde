use std::collections::{BTreeSet, HashMap};

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{ActiveValue::{Set, Unchanged}, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QueryTrait, TransactionTrait};
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    config::PayrollPolicy,
    consts::MAX_PAGE_LIMIT,
    entity::{
        attendance_record, driver, payroll_entry, payroll_period, prelude::*, route, service_provider, vehicle,
        sea_orm_active_enums::{PayrollStatus, PayrollType, VehicleType},
    },
    error::PayrollError,
    utils,
};

use super::{
    aggregator::{self, DriverSummary, PayeeSummary, ServiceProviderSummary},
    calculator::{self, round_money, Compensation, Payee},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPeriod {
    pub name: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryAdjustment {
    pub bonuses: Option<Decimal>,
    pub deductions: Option<Decimal>,
}

/// Narrows the attendance a period is generated from, empty lists do not narrow
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationFilter {
    pub vehicle_type: Option<VehicleType>,
    pub vehicle_ids: Vec<Uuid>,
    pub shift_ids: Vec<Uuid>,
    pub location_ids: Vec<Uuid>,
    pub department_ids: Vec<Uuid>,
}

impl GenerationFilter {
    fn narrows_by_route(&self) -> bool {
        !self.shift_ids.is_empty() || !self.location_ids.is_empty()
    }

    fn narrows_by_dimension(&self) -> bool {
        self.narrows_by_route() || !self.department_ids.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodListing {
    pub status: Option<PayrollStatus>,
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsRange {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        Self {
            page,
            limit,
            total,
            total_pages: total.div_ceil(limit.max(1)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PeriodPage {
    pub periods: Vec<payroll_period::Model>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct PeriodDetail {
    #[serde(flatten)]
    pub period: payroll_period::Model,
    pub entries: Vec<payroll_entry::Model>,
}

#[derive(Debug, Serialize)]
pub struct GeneratedEntries {
    pub period: payroll_period::Model,
    pub entries: Vec<payroll_entry::Model>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodStats {
    pub total_periods: u64,
    pub total_amount: Decimal,
    pub pending_periods: u64,
    pub processed_periods: u64,
    pub paid_periods: u64,
    pub total_entries: u64,
    pub driver_entries: u64,
    pub service_provider_entries: u64,
}

/// A rounded entry that is ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    pub payroll_type: PayrollType,
    pub driver_id: Option<Uuid>,
    pub service_provider_id: Option<Uuid>,
    pub vehicle_id: Uuid,
    pub description: String,
    pub amount: Decimal,
    pub bonuses: Decimal,
    pub deductions: Decimal,
    pub net_pay: Decimal,
    pub days_worked: i32,
    pub hours_worked: Option<Decimal>,
    pub trips_completed: i32,
    pub kms_covered: Decimal,
}

fn to_i32(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn describe(head: String, compensation: &Compensation) -> String {
    let mut items = Vec::new();

    if !compensation.overtime_pay.is_zero() {
        items.push(format!("overtime {} h: {}", compensation.overtime_hours.normalize(), round_money(compensation.overtime_pay)));
    }
    for item in compensation.bonuses.iter().chain(compensation.deductions.iter()) {
        items.push(format!("{}: {}", item.kind.label(), round_money(item.amount)));
    }

    if items.is_empty() {
        head
    } else {
        format!("{head} | {}", items.join(", "))
    }
}

impl EntryDraft {
    fn settle(compensation: &Compensation) -> (Decimal, Decimal, Decimal, Decimal) {
        let amount = round_money(compensation.amount);
        let bonuses = round_money(compensation.total_bonuses());
        let deductions = round_money(compensation.total_deductions());

        (amount, bonuses, deductions, amount + bonuses - deductions)
    }

    pub fn for_driver(summary: &DriverSummary, driver: &driver::Model, compensation: &Compensation) -> Self {
        let (amount, bonuses, deductions, net_pay) = Self::settle(compensation);

        Self {
            payroll_type: PayrollType::Salary,
            driver_id: Some(summary.driver_id),
            service_provider_id: None,
            vehicle_id: summary.vehicle_id,
            description: describe(
                format!(
                    "Salary for {}: {} days, {} h, {} trips, {} km",
                    driver.name, summary.total_days, summary.total_hours.normalize(), summary.total_trips, summary.total_kms.normalize(),
                ),
                compensation,
            ),
            amount,
            bonuses,
            deductions,
            net_pay,
            days_worked: to_i32(summary.total_days),
            hours_worked: Some(summary.total_hours),
            trips_completed: to_i32(summary.total_trips),
            kms_covered: summary.total_kms,
        }
    }

    pub fn for_service_provider(summary: &ServiceProviderSummary, provider: &service_provider::Model, compensation: &Compensation) -> Self {
        let (amount, bonuses, deductions, net_pay) = Self::settle(compensation);

        Self {
            payroll_type: PayrollType::ServiceFee,
            driver_id: None,
            service_provider_id: Some(summary.service_provider_id),
            vehicle_id: summary.vehicle_id,
            description: describe(
                format!(
                    "Service fee for {}: {} vehicles, {} days, {} trips, {} km",
                    provider.company_name, summary.vehicle_count, summary.total_days, summary.total_trips, summary.total_kms.normalize(),
                ),
                compensation,
            ),
            amount,
            bonuses,
            deductions,
            net_pay,
            days_worked: to_i32(summary.total_days),
            hours_worked: None,
            trips_completed: to_i32(summary.total_trips),
            kms_covered: summary.total_kms,
        }
    }

    fn into_active_model(self, organization_id: Uuid, payroll_period_id: Uuid) -> payroll_entry::ActiveModel {
        let now = Local::now().fixed_offset();

        payroll_entry::ActiveModel {
            id: Set(Uuid::new_v4()),
            created_at: Set(now),
            updated_at: Set(now),
            organization_id: Set(organization_id),
            payroll_period_id: Set(payroll_period_id),
            payroll_type: Set(self.payroll_type),
            driver_id: Set(self.driver_id),
            service_provider_id: Set(self.service_provider_id),
            vehicle_id: Set(Some(self.vehicle_id)),
            description: Set(self.description),
            amount: Set(self.amount),
            bonuses: Set(self.bonuses),
            deductions: Set(self.deductions),
            net_pay: Set(self.net_pay),
            days_worked: Set(self.days_worked),
            hours_worked: Set(self.hours_worked),
            trips_completed: Set(self.trips_completed),
            kms_covered: Set(self.kms_covered),
        }
    }
}

/// Calculates one draft per payee, payees without a configuration row are skipped
pub fn plan_entries(
    summary: aggregator::AttendanceSummary,
    drivers: &HashMap<Uuid, driver::Model>,
    providers: &HashMap<Uuid, service_provider::Model>,
    policy: &PayrollPolicy,
) -> Vec<EntryDraft> {
    let mut drafts = Vec::new();

    for payee in summary.into_payees() {
        match payee {
            PayeeSummary::Driver(summary) => {
                let Some(driver) = drivers.get(&summary.driver_id) else {
                    warn!(driver_id = %summary.driver_id, "skipping attendance of unknown driver");
                    continue;
                };

                let compensation = calculator::calculate(&Payee::Driver(&summary, driver.into()), policy);
                drafts.push(EntryDraft::for_driver(&summary, driver, &compensation));
            },
            PayeeSummary::ServiceProvider(summary) => {
                let Some(provider) = providers.get(&summary.service_provider_id) else {
                    warn!(service_provider_id = %summary.service_provider_id, "skipping attendance of unknown service provider");
                    continue;
                };

                let compensation = calculator::calculate(&Payee::ServiceProvider(&summary, provider.into()), policy);
                drafts.push(EntryDraft::for_service_provider(&summary, provider, &compensation));
            },
        }
    }

    drafts
}

/// Half-open style overlap test on two inclusive date ranges
pub fn overlaps(existing: &payroll_period::Model, start_date: NaiveDate, end_date: NaiveDate) -> bool {
    existing.start_date < end_date && existing.end_date > start_date
}

/// Keeps the records `filter` admits
///
/// Shift, location and department ids widen each other: a record passes when its vehicle runs one
/// of `route_vehicles` or its driver is one of `department_drivers`.
pub fn narrow_records(
    records: Vec<attendance_record::Model>,
    vehicles: &HashMap<Uuid, vehicle::Model>,
    filter: &GenerationFilter,
    route_vehicles: &BTreeSet<Uuid>,
    department_drivers: &BTreeSet<Uuid>,
) -> Vec<attendance_record::Model> {
    records.into_iter()
        .filter(|record| match filter.vehicle_type {
            Some(vehicle_type) => vehicles.get(&record.vehicle_id).is_some_and(|vehicle| vehicle.vehicle_type == vehicle_type),
            None => true,
        })
        .filter(|record| filter.vehicle_ids.is_empty() || filter.vehicle_ids.contains(&record.vehicle_id))
        .filter(|record| {
            !filter.narrows_by_dimension()
                || route_vehicles.contains(&record.vehicle_id)
                || record.driver_id.is_some_and(|driver_id| department_drivers.contains(&driver_id))
        })
        .collect()
}

pub fn summarize(periods: &[payroll_period::Model], entries: &[payroll_entry::Model]) -> PeriodStats {
    let mut stats = PeriodStats {
        total_periods: periods.len() as u64,
        total_amount: periods.iter().map(|period| period.total_amount).sum(),
        total_entries: entries.len() as u64,
        ..Default::default()
    };

    for period in periods {
        match period.status {
            PayrollStatus::Pending => stats.pending_periods += 1,
            PayrollStatus::Processed => stats.processed_periods += 1,
            PayrollStatus::Paid => stats.paid_periods += 1,
        }
    }

    for entry in entries {
        match entry.payroll_type {
            PayrollType::Salary => stats.driver_entries += 1,
            PayrollType::ServiceFee => stats.service_provider_entries += 1,
        }
    }

    stats
}

pub async fn find_period<C: ConnectionTrait>(conn: &C, organization_id: Uuid, period_id: Uuid) -> Result<payroll_period::Model, PayrollError> {
    PayrollPeriod::find_by_id(period_id)
        .filter(payroll_period::Column::OrganizationId.eq(organization_id))
        .one(conn).await?
        .ok_or(PayrollError::NotFound("Payroll period not found"))
}

async fn update_total<C: ConnectionTrait>(conn: &C, period_id: Uuid, total_amount: Decimal) -> Result<payroll_period::Model, PayrollError> {
    let period = PayrollPeriod::update(payroll_period::ActiveModel {
        id: Unchanged(period_id),
        total_amount: Set(round_money(total_amount)),
        updated_at: Set(Local::now().fixed_offset()),
        ..Default::default()
    }).exec(conn).await?;

    Ok(period)
}

async fn ensure_no_overlap<C: ConnectionTrait>(conn: &C, organization_id: Uuid, start_date: NaiveDate, end_date: NaiveDate) -> Result<(), PayrollError> {
    let overlapping = PayrollPeriod::find()
        .filter(payroll_period::Column::OrganizationId.eq(organization_id))
        .filter(payroll_period::Column::StartDate.lt(end_date))
        .filter(payroll_period::Column::EndDate.gt(start_date))
        .one(conn).await?;

    if let Some(existing) = overlapping.filter(|existing| overlaps(existing, start_date, end_date)) {
        return Err(PayrollError::conflict(format!(
            "Payroll period overlaps with `{}` ({})",
            existing.name,
            utils::range_label(existing.start_date, existing.end_date),
        )));
    }

    Ok(())
}

async fn insert_period<C: ConnectionTrait>(conn: &C, organization_id: Uuid, new_period: NewPeriod) -> Result<payroll_period::Model, PayrollError> {
    let NewPeriod { name, start_date, end_date } = new_period;

    let name = name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| format!("Payroll {}", utils::range_label(start_date, end_date)));

    let now = Local::now().fixed_offset();
    let period = PayrollPeriod::insert(payroll_period::ActiveModel {
        id: Set(Uuid::new_v4()),
        created_at: Set(now),
        updated_at: Set(now),
        organization_id: Set(organization_id),
        name: Set(name),
        start_date: Set(start_date),
        end_date: Set(end_date),
        status: Set(PayrollStatus::Pending),
        total_amount: Set(Decimal::ZERO),
    }).exec_with_returning(conn).await?;

    Ok(period)
}

fn check_range(new_period: &NewPeriod) -> Result<(), PayrollError> {
    if new_period.start_date >= new_period.end_date {
        return Err(PayrollError::validation("start_date must be before end_date"));
    }

    Ok(())
}

async fn load_attendance<C: ConnectionTrait>(
    conn: &C,
    organization_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
    vehicle_ids: &[Uuid],
) -> Result<Vec<attendance_record::Model>, PayrollError> {
    let records = AttendanceRecord::find()
        .filter(attendance_record::Column::OrganizationId.eq(organization_id))
        .filter(attendance_record::Column::Date.between(start_date, end_date))
        .apply_if((!vehicle_ids.is_empty()).then_some(vehicle_ids), |query, vehicle_ids| {
            query.filter(attendance_record::Column::VehicleId.is_in(vehicle_ids.iter().copied()))
        })
        .order_by_asc(attendance_record::Column::Date)
        .all(conn).await?;

    Ok(records)
}

async fn load_vehicles<C: ConnectionTrait>(conn: &C, records: &[attendance_record::Model]) -> Result<HashMap<Uuid, vehicle::Model>, PayrollError> {
    let vehicle_ids = records.iter().map(|record| record.vehicle_id).collect::<BTreeSet<_>>();
    if vehicle_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let vehicles = Vehicle::find()
        .filter(vehicle::Column::Id.is_in(vehicle_ids))
        .all(conn).await?
        .into_iter()
        .map(|vehicle| (vehicle.id, vehicle))
        .collect();

    Ok(vehicles)
}

/// Prices `records` into entries of `period` and rolls the period total up
async fn write_entries<C: ConnectionTrait>(
    conn: &C,
    organization_id: Uuid,
    period: payroll_period::Model,
    records: &[attendance_record::Model],
    vehicles: &HashMap<Uuid, vehicle::Model>,
    policy: &PayrollPolicy,
) -> Result<GeneratedEntries, PayrollError> {
    let summary = aggregator::aggregate(records, vehicles);

    let driver_ids = summary.drivers.iter().map(|driver| driver.driver_id).collect::<Vec<_>>();
    let drivers = if driver_ids.is_empty() {
        HashMap::new()
    } else {
        Driver::find()
            .filter(driver::Column::OrganizationId.eq(organization_id))
            .filter(driver::Column::Id.is_in(driver_ids))
            .all(conn).await?
            .into_iter()
            .map(|driver| (driver.id, driver))
            .collect()
    };

    let provider_ids = summary.service_providers.iter().map(|provider| provider.service_provider_id).collect::<Vec<_>>();
    let providers = if provider_ids.is_empty() {
        HashMap::new()
    } else {
        ServiceProvider::find()
            .filter(service_provider::Column::OrganizationId.eq(organization_id))
            .filter(service_provider::Column::Id.is_in(provider_ids))
            .all(conn).await?
            .into_iter()
            .map(|provider| (provider.id, provider))
            .collect()
    };

    let drafts = plan_entries(summary, &drivers, &providers, policy);

    let mut entries = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let entry = PayrollEntry::insert(draft.into_active_model(organization_id, period.id))
            .exec_with_returning(conn).await?;
        entries.push(entry);
    }

    let total_amount = entries.iter().map(|entry| entry.net_pay).sum::<Decimal>();
    let period = update_total(conn, period.id, total_amount).await?;

    Ok(GeneratedEntries { period, entries })
}

#[instrument(skip(db))]
pub async fn create_period(db: &DatabaseConnection, organization_id: Uuid, new_period: NewPeriod) -> Result<payroll_period::Model, PayrollError> {
    check_range(&new_period)?;

    let txn = db.begin().await?;

    ensure_no_overlap(&txn, organization_id, new_period.start_date, new_period.end_date).await?;
    let period = insert_period(&txn, organization_id, new_period).await?;

    txn.commit().await?;

    info!(period_id = %period.id, "payroll period created");

    Ok(period)
}

#[instrument(skip(db, policy))]
pub async fn generate_entries(db: &DatabaseConnection, organization_id: Uuid, period_id: Uuid, policy: &PayrollPolicy) -> Result<GeneratedEntries, PayrollError> {
    let txn = db.begin().await?;

    let period = find_period(&txn, organization_id, period_id).await?;

    if period.status != PayrollStatus::Pending {
        return Err(PayrollError::conflict("Can only generate entries for pending payroll periods"));
    }

    let existing = PayrollEntry::find()
        .filter(payroll_entry::Column::PayrollPeriodId.eq(period.id))
        .one(&txn).await?;

    if existing.is_some() {
        return Err(PayrollError::conflict("Payroll entries have already been generated for this period"));
    }

    let records = load_attendance(&txn, organization_id, period.start_date, period.end_date, &[]).await?;

    if records.is_empty() {
        return Err(PayrollError::validation("No attendance records found for this period"));
    }

    let vehicles = load_vehicles(&txn, &records).await?;
    let generated = write_entries(&txn, organization_id, period, &records, &vehicles, policy).await?;

    txn.commit().await?;

    info!(period_id = %generated.period.id, entries = generated.entries.len(), total_amount = %generated.period.total_amount, "payroll entries generated");

    Ok(generated)
}

/// Creates a period and generates it from the attendance `filter` admits, in one transaction
#[instrument(skip(db, policy))]
pub async fn generate_filtered(
    db: &DatabaseConnection,
    organization_id: Uuid,
    new_period: NewPeriod,
    filter: GenerationFilter,
    policy: &PayrollPolicy,
) -> Result<GeneratedEntries, PayrollError> {
    check_range(&new_period)?;

    let txn = db.begin().await?;

    ensure_no_overlap(&txn, organization_id, new_period.start_date, new_period.end_date).await?;

    let records = load_attendance(&txn, organization_id, new_period.start_date, new_period.end_date, &filter.vehicle_ids).await?;
    let vehicles = load_vehicles(&txn, &records).await?;

    let mut route_vehicles = BTreeSet::new();
    if !records.is_empty() && filter.narrows_by_route() {
        route_vehicles = Route::find()
            .filter(route::Column::OrganizationId.eq(organization_id))
            .apply_if((!filter.shift_ids.is_empty()).then_some(&filter.shift_ids), |query, ids| {
                query.filter(route::Column::ShiftId.is_in(ids.iter().copied()))
            })
            .apply_if((!filter.location_ids.is_empty()).then_some(&filter.location_ids), |query, ids| {
                query.filter(route::Column::LocationId.is_in(ids.iter().copied()))
            })
            .all(&txn).await?
            .into_iter()
            .filter_map(|route| route.vehicle_id)
            .collect();
    }

    let mut department_drivers = BTreeSet::new();
    if !records.is_empty() && !filter.department_ids.is_empty() {
        department_drivers = Driver::find()
            .filter(driver::Column::OrganizationId.eq(organization_id))
            .filter(driver::Column::DepartmentId.is_in(filter.department_ids.iter().copied()))
            .all(&txn).await?
            .into_iter()
            .map(|driver| driver.id)
            .collect();
    }

    let records = narrow_records(records, &vehicles, &filter, &route_vehicles, &department_drivers);

    if records.is_empty() {
        return Err(PayrollError::validation("No attendance records found matching the specified filters"));
    }

    let period = insert_period(&txn, organization_id, new_period).await?;
    let generated = write_entries(&txn, organization_id, period, &records, &vehicles, policy).await?;

    txn.commit().await?;

    info!(period_id = %generated.period.id, entries = generated.entries.len(), total_amount = %generated.period.total_amount, "filtered payroll generated");

    Ok(generated)
}

#[instrument(skip(db))]
pub async fn adjust_entry(
    db: &DatabaseConnection,
    organization_id: Uuid,
    period_id: Uuid,
    entry_id: Uuid,
    adjustment: EntryAdjustment,
) -> Result<payroll_entry::Model, PayrollError> {
    for (field, value) in [("bonuses", adjustment.bonuses), ("deductions", adjustment.deductions)] {
        if value.is_some_and(|value| value < Decimal::ZERO) {
            return Err(PayrollError::validation(format!("{field} must not be negative")));
        }
    }

    let txn = db.begin().await?;

    let period = find_period(&txn, organization_id, period_id).await?;

    let Some(entry) = PayrollEntry::find_by_id(entry_id)
        .filter(payroll_entry::Column::PayrollPeriodId.eq(period.id))
        .one(&txn).await?
    else {
        return Err(PayrollError::NotFound("Payroll entry not found"));
    };

    let bonuses = round_money(adjustment.bonuses.unwrap_or(entry.bonuses));
    let deductions = round_money(adjustment.deductions.unwrap_or(entry.deductions));

    let entry = PayrollEntry::update(payroll_entry::ActiveModel {
        id: Unchanged(entry.id),
        bonuses: Set(bonuses),
        deductions: Set(deductions),
        net_pay: Set(entry.amount + bonuses - deductions),
        updated_at: Set(Local::now().fixed_offset()),
        ..Default::default()
    }).exec(&txn).await?;

    let siblings = PayrollEntry::find()
        .filter(payroll_entry::Column::PayrollPeriodId.eq(period.id))
        .all(&txn).await?;
    update_total(&txn, period.id, siblings.iter().map(|sibling| sibling.net_pay).sum()).await?;

    txn.commit().await?;

    info!(entry_id = %entry.id, net_pay = %entry.net_pay, "payroll entry adjusted");

    Ok(entry)
}

#[instrument(skip(db))]
pub async fn set_status(db: &DatabaseConnection, organization_id: Uuid, period_id: Uuid, status: &str) -> Result<payroll_period::Model, PayrollError> {
    let status = status.parse::<PayrollStatus>().map_err(PayrollError::Validation)?;

    let period = find_period(db, organization_id, period_id).await?;

    let period = PayrollPeriod::update(payroll_period::ActiveModel {
        id: Unchanged(period.id),
        status: Set(status),
        updated_at: Set(Local::now().fixed_offset()),
        ..Default::default()
    }).exec(db).await?;

    info!(period_id = %period.id, status = %period.status, "payroll period status updated");

    Ok(period)
}

#[instrument(skip(db))]
pub async fn delete_period(db: &DatabaseConnection, organization_id: Uuid, period_id: Uuid) -> Result<(), PayrollError> {
    let txn = db.begin().await?;

    let period = find_period(&txn, organization_id, period_id).await?;

    if period.status == PayrollStatus::Paid {
        return Err(PayrollError::PaidPeriod);
    }

    PayrollEntry::delete_many()
        .filter(payroll_entry::Column::PayrollPeriodId.eq(period.id))
        .exec(&txn).await?;
    PayrollPeriod::delete_by_id(period.id)
        .exec(&txn).await?;

    txn.commit().await?;

    info!(period_id = %period.id, "payroll period deleted");

    Ok(())
}

pub async fn list_periods(db: &DatabaseConnection, organization_id: Uuid, listing: PeriodListing) -> Result<PeriodPage, PayrollError> {
    let page = listing.page.max(1);
    let limit = listing.limit.clamp(1, MAX_PAGE_LIMIT);

    let paginator = PayrollPeriod::find()
        .filter(payroll_period::Column::OrganizationId.eq(organization_id))
        .apply_if(listing.status, |query, status| query.filter(payroll_period::Column::Status.eq(status)))
        .order_by_desc(payroll_period::Column::StartDate)
        .paginate(db, limit);

    let total = paginator.num_items().await?;
    let periods = paginator.fetch_page(page - 1).await?;

    Ok(PeriodPage {
        periods,
        pagination: Pagination::new(page, limit, total),
    })
}

pub async fn list_entries(db: &DatabaseConnection, period: &payroll_period::Model) -> Result<Vec<payroll_entry::Model>, PayrollError> {
    let entries = PayrollEntry::find()
        .filter(payroll_entry::Column::PayrollPeriodId.eq(period.id))
        .order_by_asc(payroll_entry::Column::CreatedAt)
        .all(db).await?;

    Ok(entries)
}

pub async fn get_period(db: &DatabaseConnection, period: payroll_period::Model) -> Result<PeriodDetail, PayrollError> {
    let entries = list_entries(db, &period).await?;

    Ok(PeriodDetail { period, entries })
}

pub async fn period_stats(db: &DatabaseConnection, organization_id: Uuid, range: StatsRange) -> Result<PeriodStats, PayrollError> {
    let periods = PayrollPeriod::find()
        .filter(payroll_period::Column::OrganizationId.eq(organization_id))
        .apply_if(range.start_date, |query, start_date| query.filter(payroll_period::Column::StartDate.gte(start_date)))
        .apply_if(range.end_date, |query, end_date| query.filter(payroll_period::Column::EndDate.lte(end_date)))
        .all(db).await?;

    if periods.is_empty() {
        return Ok(PeriodStats::default());
    }

    let entries = PayrollEntry::find()
        .filter(payroll_entry::Column::PayrollPeriodId.is_in(periods.iter().map(|period| period.id)))
        .all(db).await?;

    Ok(summarize(&periods, &entries))
}
