use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::{
    config::PayrollPolicy,
    consts::*,
    entity::{driver, service_provider},
};

use super::aggregator::{DriverSummary, ServiceProviderSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineItemKind {
    PerformanceBonus,
    PunctualityBonus,
    EfficiencyBonus,
    QualityBonus,
    LatePenalty,
    Tds,
    GstTds,
    PerformancePenalty,
}

impl LineItemKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::PerformanceBonus => "performance bonus",
            Self::PunctualityBonus => "punctuality bonus",
            Self::EfficiencyBonus => "efficiency bonus",
            Self::QualityBonus => "quality bonus",
            Self::LatePenalty => "late penalty",
            Self::Tds => "TDS",
            Self::GstTds => "GST TDS",
            Self::PerformancePenalty => "performance penalty",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    pub kind: LineItemKind,
    pub amount: Decimal,
}

/// Rates of a driver, unset values are resolved by the calculator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverRates {
    pub base_salary: Option<Decimal>,
    pub hourly_rate: Option<Decimal>,
    pub overtime_rate: Option<Decimal>,
}

impl From<&driver::Model> for DriverRates {
    fn from(driver: &driver::Model) -> Self {
        Self {
            base_salary: driver.base_salary,
            hourly_rate: driver.hourly_rate,
            overtime_rate: driver.overtime_rate,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderRates {
    pub monthly_rate: Option<Decimal>,
    pub per_trip_rate: Option<Decimal>,
    pub per_km_rate: Option<Decimal>,
}

impl From<&service_provider::Model> for ProviderRates {
    fn from(provider: &service_provider::Model) -> Self {
        Self {
            monthly_rate: provider.monthly_rate,
            per_trip_rate: provider.per_trip_rate,
            per_km_rate: provider.per_km_rate,
        }
    }
}

pub enum Payee<'a> {
    Driver(&'a DriverSummary, DriverRates),
    ServiceProvider(&'a ServiceProviderSummary, ProviderRates),
}

/// Exact, unrounded result of a calculation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compensation {
    pub amount: Decimal,
    pub overtime_hours: Decimal,
    pub overtime_pay: Decimal,
    pub bonuses: Vec<LineItem>,
    pub deductions: Vec<LineItem>,
}

impl Compensation {
    pub fn total_bonuses(&self) -> Decimal {
        self.bonuses.iter().map(|item| item.amount).sum()
    }

    pub fn total_deductions(&self) -> Decimal {
        self.deductions.iter().map(|item| item.amount).sum()
    }

    /// May be negative when deductions exceed gross
    pub fn net_pay(&self) -> Decimal {
        self.amount + self.total_bonuses() - self.total_deductions()
    }
}

/// Two decimal places, half away from zero
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

fn push_item(items: &mut Vec<LineItem>, kind: LineItemKind, amount: Decimal) {
    let amount = amount.max(Decimal::ZERO);
    if !amount.is_zero() {
        items.push(LineItem { kind, amount });
    }
}

pub fn calculate(payee: &Payee<'_>, policy: &PayrollPolicy) -> Compensation {
    match payee {
        Payee::Driver(summary, rates) => calculate_driver(summary, rates, policy),
        Payee::ServiceProvider(summary, rates) => calculate_service_provider(summary, rates),
    }
}

fn calculate_driver(summary: &DriverSummary, rates: &DriverRates, policy: &PayrollPolicy) -> Compensation {
    let hourly_rate = rates.hourly_rate.unwrap_or_default();
    let overtime_rate = rates.overtime_rate.unwrap_or(DEFAULT_OVERTIME_RATE);

    let (base, overtime_hours) = match rates.base_salary {
        Some(base_salary) => (base_salary, (summary.total_hours - REGULAR_HOURS_PER_MONTH).max(Decimal::ZERO)),
        None => (hourly_rate * summary.total_hours, Decimal::ZERO),
    };
    let overtime_pay = overtime_hours * hourly_rate * overtime_rate;
    let amount = (base + overtime_pay).max(Decimal::ZERO);

    let mut bonuses = Vec::new();

    let extra_trips = (summary.total_trips - PERFORMANCE_TRIP_THRESHOLD).max(0);
    push_item(&mut bonuses, LineItemKind::PerformanceBonus, Decimal::from(extra_trips) * PERFORMANCE_BONUS_PER_TRIP);

    let expected_days = Decimal::from(policy.expected_working_days.max(1));
    if Decimal::from(summary.total_days) / expected_days >= PUNCTUALITY_ATTENDANCE_RATIO {
        push_item(&mut bonuses, LineItemKind::PunctualityBonus, PUNCTUALITY_BONUS);
    }

    if summary.total_hours > Decimal::ZERO && summary.total_kms / summary.total_hours > EFFICIENCY_KM_PER_HOUR {
        push_item(&mut bonuses, LineItemKind::EfficiencyBonus, EFFICIENCY_BONUS);
    }

    let gross = amount + bonuses.iter().map(|item| item.amount).sum::<Decimal>();

    let mut deductions = Vec::new();
    push_item(&mut deductions, LineItemKind::LatePenalty, Decimal::from(summary.late_days) * LATE_PENALTY_PER_DAY);
    push_item(&mut deductions, LineItemKind::Tds, gross * DRIVER_TDS_RATE);

    Compensation {
        amount,
        overtime_hours,
        overtime_pay,
        bonuses,
        deductions,
    }
}

fn calculate_service_provider(summary: &ServiceProviderSummary, rates: &ProviderRates) -> Compensation {
    let amount = (
        rates.monthly_rate.unwrap_or_default()
        + Decimal::from(summary.total_trips) * rates.per_trip_rate.unwrap_or_default()
        + summary.total_kms * rates.per_km_rate.unwrap_or_default()
        + summary.total_fuel_cost
        + summary.total_toll_cost
    ).max(Decimal::ZERO);

    let mut bonuses = Vec::new();
    if summary.total_trips > QUALITY_TRIP_THRESHOLD {
        push_item(&mut bonuses, LineItemKind::QualityBonus, QUALITY_BONUS);
    }

    let gross = amount + bonuses.iter().map(|item| item.amount).sum::<Decimal>();

    let mut deductions = Vec::new();
    if summary.per_vehicle_avg_trips() < MIN_AVG_TRIPS_PER_VEHICLE {
        push_item(&mut deductions, LineItemKind::PerformancePenalty, PERFORMANCE_PENALTY);
    }
    push_item(&mut deductions, LineItemKind::GstTds, gross * PROVIDER_GST_TDS_RATE);

    Compensation {
        amount,
        overtime_hours: Decimal::ZERO,
        overtime_pay: Decimal::ZERO,
        bonuses,
        deductions,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use super::*;

    fn driver_summary(total_days: i64, total_hours: Decimal, total_trips: i64, total_kms: Decimal, late_days: i64) -> DriverSummary {
        DriverSummary {
            driver_id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            total_days,
            total_hours,
            total_trips,
            total_kms,
            late_days,
        }
    }

    fn provider_summary(total_trips: i64, total_kms: Decimal, vehicle_count: i64) -> ServiceProviderSummary {
        ServiceProviderSummary {
            service_provider_id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            total_days: 22,
            total_trips,
            total_kms,
            total_fuel_cost: dec!(1200),
            total_toll_cost: dec!(300),
            vehicle_count,
        }
    }

    fn item(compensation: &Compensation, kind: LineItemKind) -> Option<Decimal> {
        compensation.bonuses.iter()
            .chain(compensation.deductions.iter())
            .find(|item| item.kind == kind)
            .map(|item| item.amount)
    }

    #[test]
    fn test_salaried_driver_with_overtime() {
        let summary = driver_summary(22, dec!(188), 302, dec!(3835), 0);
        let rates = DriverRates {
            base_salary: Some(dec!(5000)),
            hourly_rate: Some(dec!(30)),
            overtime_rate: Some(dec!(1.5)),
        };

        let compensation = calculate(&Payee::Driver(&summary, rates), &PayrollPolicy::default());

        assert_eq!(compensation.overtime_hours, dec!(28));
        assert_eq!(compensation.overtime_pay, dec!(1260));
        assert_eq!(compensation.amount, dec!(6260));
        assert_eq!(item(&compensation, LineItemKind::PerformanceBonus), Some(dec!(1260)));
        assert_eq!(item(&compensation, LineItemKind::PunctualityBonus), Some(dec!(100)));
        assert_eq!(item(&compensation, LineItemKind::EfficiencyBonus), Some(dec!(50)));
        assert_eq!(compensation.total_bonuses(), dec!(1410));
        assert_eq!(item(&compensation, LineItemKind::Tds), Some(dec!(767)));
        assert_eq!(item(&compensation, LineItemKind::LatePenalty), None);
        assert_eq!(compensation.net_pay(), dec!(6903));
    }

    #[test]
    fn test_late_penalty() {
        let summary = driver_summary(5, dec!(38), 55, dec!(300), 3);
        let rates = DriverRates {
            base_salary: Some(dec!(5000)),
            hourly_rate: Some(dec!(30)),
            overtime_rate: None,
        };

        let compensation = calculate(&Payee::Driver(&summary, rates), &PayrollPolicy::default());
        assert_eq!(item(&compensation, LineItemKind::LatePenalty), Some(dec!(60)));
    }

    #[test]
    fn test_hourly_driver_has_no_overtime() {
        let summary = driver_summary(20, dec!(200), 10, dec!(500), 0);
        let rates = DriverRates {
            base_salary: None,
            hourly_rate: Some(dec!(25)),
            overtime_rate: Some(dec!(2)),
        };

        let compensation = calculate(&Payee::Driver(&summary, rates), &PayrollPolicy::default());
        assert_eq!(compensation.amount, dec!(5000));
        assert_eq!(compensation.overtime_hours, Decimal::ZERO);
        assert_eq!(item(&compensation, LineItemKind::PerformanceBonus), None);
        // 20 of 22 days is below the punctuality ratio
        assert_eq!(item(&compensation, LineItemKind::PunctualityBonus), None);
        // 2.5 km per hour
        assert_eq!(item(&compensation, LineItemKind::EfficiencyBonus), None);
    }

    #[test]
    fn test_punctuality_follows_policy() {
        let summary = driver_summary(19, dec!(152), 0, Decimal::ZERO, 0);
        let rates = DriverRates { base_salary: Some(dec!(3000)), ..Default::default() };

        let strict = calculate(&Payee::Driver(&summary, rates.clone()), &PayrollPolicy::default());
        assert_eq!(item(&strict, LineItemKind::PunctualityBonus), None);

        let relaxed = calculate(&Payee::Driver(&summary, rates), &PayrollPolicy { expected_working_days: 20 });
        assert_eq!(item(&relaxed, LineItemKind::PunctualityBonus), Some(dec!(100)));
    }

    #[test]
    fn test_driver_without_hours_gets_no_efficiency_bonus() {
        let summary = driver_summary(1, Decimal::ZERO, 0, dec!(100), 1);
        let rates = DriverRates { base_salary: Some(dec!(100)), ..Default::default() };

        let compensation = calculate(&Payee::Driver(&summary, rates), &PayrollPolicy::default());
        assert_eq!(item(&compensation, LineItemKind::EfficiencyBonus), None);
    }

    #[test]
    fn test_service_provider() {
        let summary = provider_summary(250, dec!(3500), 5);
        let rates = ProviderRates {
            monthly_rate: Some(dec!(10000)),
            per_trip_rate: Some(dec!(5)),
            per_km_rate: Some(dec!(2)),
        };

        let compensation = calculate(&Payee::ServiceProvider(&summary, rates), &PayrollPolicy::default());

        assert_eq!(compensation.amount, dec!(19750));
        assert_eq!(compensation.total_bonuses(), dec!(500));
        assert_eq!(item(&compensation, LineItemKind::GstTds), Some(dec!(405)));
        assert_eq!(item(&compensation, LineItemKind::PerformancePenalty), None);
        assert_eq!(compensation.net_pay(), dec!(19845));
    }

    #[test]
    fn test_service_provider_performance_penalty() {
        // 15 + 18 + 22 trips over 3 vehicles
        let summary = provider_summary(55, dec!(700), 3);
        let rates = ProviderRates {
            monthly_rate: Some(dec!(1000)),
            ..Default::default()
        };

        let compensation = calculate(&Payee::ServiceProvider(&summary, rates), &PayrollPolicy::default());

        assert_eq!(item(&compensation, LineItemKind::QualityBonus), None);
        assert_eq!(item(&compensation, LineItemKind::PerformancePenalty), Some(dec!(500)));
        // (1000 + 1200 + 300) * 0.02
        assert_eq!(item(&compensation, LineItemKind::GstTds), Some(dec!(50)));
        assert_eq!(compensation.net_pay(), dec!(1950));
    }

    #[test]
    fn test_net_pay_is_not_clamped() {
        let mut summary = provider_summary(10, Decimal::ZERO, 1);
        summary.total_fuel_cost = Decimal::ZERO;
        summary.total_toll_cost = Decimal::ZERO;

        let compensation = calculate(&Payee::ServiceProvider(&summary, ProviderRates::default()), &PayrollPolicy::default());
        assert_eq!(compensation.amount, Decimal::ZERO);
        assert_eq!(compensation.net_pay(), dec!(-500));
    }

    #[test]
    fn test_round_money() {
        assert_eq!(round_money(dec!(10.005)), dec!(10.01));
        assert_eq!(round_money(dec!(10.004)), dec!(10.00));
        assert_eq!(round_money(dec!(-10.005)), dec!(-10.01));
        assert_eq!(round_money(dec!(18.333333)), dec!(18.33));
    }
}
