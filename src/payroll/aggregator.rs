use std::collections::{BTreeMap, BTreeSet, HashMap};

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{consts::STANDARD_SHIFT_HOURS, entity::{attendance_record, sea_orm_active_enums::VehicleType, vehicle}};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverSummary {
    pub driver_id: Uuid,
    /// First vehicle seen for the driver in the range
    pub vehicle_id: Uuid,
    pub total_days: i64,
    pub total_hours: Decimal,
    pub total_trips: i64,
    pub total_kms: Decimal,
    /// Days with fewer than a standard shift of hours
    pub late_days: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceProviderSummary {
    pub service_provider_id: Uuid,
    pub vehicle_id: Uuid,
    pub total_days: i64,
    pub total_trips: i64,
    pub total_kms: Decimal,
    pub total_fuel_cost: Decimal,
    pub total_toll_cost: Decimal,
    /// Distinct outsourced vehicles with at least one record
    pub vehicle_count: i64,
}

impl ServiceProviderSummary {
    pub fn per_vehicle_avg_trips(&self) -> Decimal {
        if self.vehicle_count == 0 {
            return Decimal::ZERO;
        }

        Decimal::from(self.total_trips) / Decimal::from(self.vehicle_count)
    }
}

/// One compensable unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayeeSummary {
    Driver(DriverSummary),
    ServiceProvider(ServiceProviderSummary),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AttendanceSummary {
    pub drivers: Vec<DriverSummary>,
    pub service_providers: Vec<ServiceProviderSummary>,
}

impl AttendanceSummary {
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty() && self.service_providers.is_empty()
    }

    pub fn into_payees(self) -> impl Iterator<Item = PayeeSummary> {
        self.drivers.into_iter().map(PayeeSummary::Driver)
            .chain(self.service_providers.into_iter().map(PayeeSummary::ServiceProvider))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Driver(Uuid),
    ServiceProvider(Uuid),
}

fn route_record(record: &attendance_record::Model, vehicle: Option<&vehicle::Model>) -> Option<Route> {
    match (record.driver_id, vehicle) {
        (None, Some(vehicle)) if vehicle.vehicle_type == VehicleType::Outsourced => {
            vehicle.service_provider_id.map(Route::ServiceProvider)
        },
        (Some(driver_id), _) => Some(Route::Driver(driver_id)),
        _ => None,
    }
}

struct ProviderAccumulator {
    summary: ServiceProviderSummary,
    vehicles: BTreeSet<Uuid>,
}

/// Folds the attendance of a period into one summary per payee
///
/// Records that belong to neither a driver nor a provider-owned outsourced vehicle are skipped.
/// Output is ordered by payee id.
pub fn aggregate(records: &[attendance_record::Model], vehicles: &HashMap<Uuid, vehicle::Model>) -> AttendanceSummary {
    let mut drivers = BTreeMap::<Uuid, DriverSummary>::new();
    let mut providers = BTreeMap::<Uuid, ProviderAccumulator>::new();

    for record in records {
        match route_record(record, vehicles.get(&record.vehicle_id)) {
            Some(Route::Driver(driver_id)) => {
                let summary = drivers.entry(driver_id).or_insert_with(|| DriverSummary {
                    driver_id,
                    vehicle_id: record.vehicle_id,
                    total_days: 0,
                    total_hours: Decimal::ZERO,
                    total_trips: 0,
                    total_kms: Decimal::ZERO,
                    late_days: 0,
                });

                summary.total_days += 1;
                summary.total_hours += record.hours_worked;
                summary.total_trips += i64::from(record.trips_completed);
                summary.total_kms += record.kms_covered;
                if record.hours_worked < STANDARD_SHIFT_HOURS {
                    summary.late_days += 1;
                }
            },
            Some(Route::ServiceProvider(service_provider_id)) => {
                let acc = providers.entry(service_provider_id).or_insert_with(|| ProviderAccumulator {
                    summary: ServiceProviderSummary {
                        service_provider_id,
                        vehicle_id: record.vehicle_id,
                        total_days: 0,
                        total_trips: 0,
                        total_kms: Decimal::ZERO,
                        total_fuel_cost: Decimal::ZERO,
                        total_toll_cost: Decimal::ZERO,
                        vehicle_count: 0,
                    },
                    vehicles: BTreeSet::new(),
                });

                acc.summary.total_days += 1;
                acc.summary.total_trips += i64::from(record.trips_completed);
                acc.summary.total_kms += record.kms_covered;
                acc.summary.total_fuel_cost += record.fuel_cost;
                acc.summary.total_toll_cost += record.toll_cost;
                acc.vehicles.insert(record.vehicle_id);
            },
            None => {},
        }
    }

    AttendanceSummary {
        drivers: drivers.into_values().collect(),
        service_providers: providers.into_values()
            .map(|acc| ServiceProviderSummary {
                vehicle_count: acc.vehicles.len() as i64,
                ..acc.summary
            })
            .collect(),
    }
}
