use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Hours in a regular working month, anything above is overtime
pub const REGULAR_HOURS_PER_MONTH: Decimal = dec!(160);

/// A day with fewer hours than this counts as a late day
pub const STANDARD_SHIFT_HOURS: Decimal = dec!(8);

pub const DEFAULT_OVERTIME_RATE: Decimal = dec!(1.5);

pub const DEFAULT_EXPECTED_WORKING_DAYS: u32 = 22;

// Driver rules
pub const PERFORMANCE_TRIP_THRESHOLD: i64 = 50;
pub const PERFORMANCE_BONUS_PER_TRIP: Decimal = dec!(5);
pub const PUNCTUALITY_ATTENDANCE_RATIO: Decimal = dec!(0.95);
pub const PUNCTUALITY_BONUS: Decimal = dec!(100);
pub const EFFICIENCY_KM_PER_HOUR: Decimal = dec!(10);
pub const EFFICIENCY_BONUS: Decimal = dec!(50);
pub const LATE_PENALTY_PER_DAY: Decimal = dec!(20);
pub const DRIVER_TDS_RATE: Decimal = dec!(0.10);

// Service provider rules
pub const QUALITY_TRIP_THRESHOLD: i64 = 200;
pub const QUALITY_BONUS: Decimal = dec!(500);
pub const MIN_AVG_TRIPS_PER_VEHICLE: Decimal = dec!(20);
pub const PERFORMANCE_PENALTY: Decimal = dec!(500);
pub const PROVIDER_GST_TDS_RATE: Decimal = dec!(0.02);

/// Scale used when an amount is written to the database
pub const MONEY_SCALE: u32 = 2;

pub const DEFAULT_PAGE_LIMIT: u64 = 10;
pub const MAX_PAGE_LIMIT: u64 = 100;
