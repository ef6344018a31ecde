use sea_orm_migration::{prelude::{extension::postgres::TypeDropStatement, *}, sea_orm::{ActiveEnum, DbBackend, DeriveActiveEnum, EnumIter, Schema}};

use crate::util::{create_organization_index, create_reference, default_organization_table_statement};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(DbBackend::Postgres);

        manager.create_type(schema.create_enum_from_active_enum::<PayrollStatus>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<PayrollType>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<VehicleType>()).await?;

        for (table, name) in [
            (Department::Table.into_iden(), Department::Name.into_iden()),
            (Shift::Table.into_iden(), Shift::Name.into_iden()),
            (Location::Table.into_iden(), Location::Name.into_iden()),
            (VehicleCategory::Table.into_iden(), VehicleCategory::Name.into_iden()),
        ] {
            manager
                .create_table(default_organization_table_statement()
                    .table(table)
                    .col(ColumnDef::new(name)
                        .text()
                        .not_null())
                    .take()
                ).await?;
        }
        create_organization_index(manager, Department::Table).await?;
        create_organization_index(manager, Shift::Table).await?;
        create_organization_index(manager, Location::Table).await?;
        create_organization_index(manager, VehicleCategory::Table).await?;

        manager
            .create_table(default_organization_table_statement()
                .table(ServiceProvider::Table)
                .col(ColumnDef::new(ServiceProvider::CompanyName)
                    .text()
                    .not_null())
                .col(ColumnDef::new(ServiceProvider::MonthlyRate)
                    .decimal_len(12, 2))
                .col(ColumnDef::new(ServiceProvider::PerTripRate)
                    .decimal_len(12, 2))
                .col(ColumnDef::new(ServiceProvider::PerKmRate)
                    .decimal_len(12, 2))
                .col(ColumnDef::new(ServiceProvider::GstNumber)
                    .text())
                .take()
            ).await?;
        create_organization_index(manager, ServiceProvider::Table).await?;

        manager
            .create_table(default_organization_table_statement()
                .table(Driver::Table)
                .col(ColumnDef::new(Driver::Name)
                    .text()
                    .not_null())
                .col(ColumnDef::new(Driver::BaseSalary)
                    .decimal_len(12, 2))
                .col(ColumnDef::new(Driver::HourlyRate)
                    .decimal_len(12, 2))
                .col(ColumnDef::new(Driver::OvertimeRate)
                    .decimal_len(4, 2))
                .col(ColumnDef::new(Driver::DepartmentId)
                    .uuid())
                .take()
            ).await?;
        create_organization_index(manager, Driver::Table).await?;
        create_reference(manager, Driver::Table, Driver::DepartmentId, Department::Table, ForeignKeyAction::SetNull).await?;

        manager
            .create_table(default_organization_table_statement()
                .table(Vehicle::Table)
                .col(ColumnDef::new(Vehicle::PlateNumber)
                    .text()
                    .not_null())
                .col(ColumnDef::new(Vehicle::VehicleType)
                    .custom(VehicleType::name())
                    .not_null())
                .col(ColumnDef::new(Vehicle::Capacity)
                    .integer()
                    .not_null())
                .col(ColumnDef::new(Vehicle::CategoryId)
                    .uuid())
                .col(ColumnDef::new(Vehicle::ServiceProviderId)
                    .uuid())
                .take()
            ).await?;
        create_organization_index(manager, Vehicle::Table).await?;
        create_reference(manager, Vehicle::Table, Vehicle::CategoryId, VehicleCategory::Table, ForeignKeyAction::SetNull).await?;
        create_reference(manager, Vehicle::Table, Vehicle::ServiceProviderId, ServiceProvider::Table, ForeignKeyAction::SetNull).await?;

        manager
            .create_table(default_organization_table_statement()
                .table(Route::Table)
                .col(ColumnDef::new(Route::Name)
                    .text()
                    .not_null())
                .col(ColumnDef::new(Route::VehicleId)
                    .uuid())
                .col(ColumnDef::new(Route::ShiftId)
                    .uuid())
                .col(ColumnDef::new(Route::LocationId)
                    .uuid())
                .col(ColumnDef::new(Route::TotalDistance)
                    .decimal_len(10, 2)
                    .not_null()
                    .default(0))
                .take()
            ).await?;
        create_organization_index(manager, Route::Table).await?;
        create_reference(manager, Route::Table, Route::VehicleId, Vehicle::Table, ForeignKeyAction::SetNull).await?;
        create_reference(manager, Route::Table, Route::ShiftId, Shift::Table, ForeignKeyAction::SetNull).await?;
        create_reference(manager, Route::Table, Route::LocationId, Location::Table, ForeignKeyAction::SetNull).await?;

        manager
            .create_table(default_organization_table_statement()
                .table(AttendanceRecord::Table)
                .col(ColumnDef::new(AttendanceRecord::Date)
                    .date()
                    .not_null())
                .col(ColumnDef::new(AttendanceRecord::HoursWorked)
                    .decimal_len(6, 2)
                    .not_null()
                    .default(0))
                .col(ColumnDef::new(AttendanceRecord::TripsCompleted)
                    .integer()
                    .not_null()
                    .default(0))
                .col(ColumnDef::new(AttendanceRecord::KmsCovered)
                    .decimal_len(10, 2)
                    .not_null()
                    .default(0))
                .col(ColumnDef::new(AttendanceRecord::FuelCost)
                    .decimal_len(12, 2)
                    .not_null()
                    .default(0))
                .col(ColumnDef::new(AttendanceRecord::TollCost)
                    .decimal_len(12, 2)
                    .not_null()
                    .default(0))
                .col(ColumnDef::new(AttendanceRecord::DriverId)
                    .uuid())
                .col(ColumnDef::new(AttendanceRecord::VehicleId)
                    .uuid()
                    .not_null())
                .take()
            ).await?;
        create_organization_index(manager, AttendanceRecord::Table).await?;
        create_reference(manager, AttendanceRecord::Table, AttendanceRecord::DriverId, Driver::Table, ForeignKeyAction::SetNull).await?;
        create_reference(manager, AttendanceRecord::Table, AttendanceRecord::VehicleId, Vehicle::Table, ForeignKeyAction::Cascade).await?;

        // One record per vehicle per day
        manager
            .create_index(IndexCreateStatement::new()
                .if_not_exists()
                .name("idx_attendance_record_vehicle_id_date")
                .table(AttendanceRecord::Table)
                .col(AttendanceRecord::VehicleId)
                .col(AttendanceRecord::Date)
                .unique()
                .take()
            ).await?;

        manager
            .create_table(default_organization_table_statement()
                .table(PayrollPeriod::Table)
                .col(ColumnDef::new(PayrollPeriod::Name)
                    .text()
                    .not_null())
                .col(ColumnDef::new(PayrollPeriod::StartDate)
                    .date()
                    .not_null())
                .col(ColumnDef::new(PayrollPeriod::EndDate)
                    .date()
                    .not_null())
                .col(ColumnDef::new(PayrollPeriod::Status)
                    .custom(PayrollStatus::name())
                    .not_null())
                .col(ColumnDef::new(PayrollPeriod::TotalAmount)
                    .decimal_len(14, 2)
                    .not_null()
                    .default(0))
                .check(Expr::col(PayrollPeriod::StartDate).lte(Expr::col(PayrollPeriod::EndDate)))
                .take()
            ).await?;
        create_organization_index(manager, PayrollPeriod::Table).await?;

        manager
            .create_table(default_organization_table_statement()
                .table(PayrollEntry::Table)
                .col(ColumnDef::new(PayrollEntry::PayrollPeriodId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(PayrollEntry::PayrollType)
                    .custom(PayrollType::name())
                    .not_null())
                .col(ColumnDef::new(PayrollEntry::DriverId)
                    .uuid())
                .col(ColumnDef::new(PayrollEntry::ServiceProviderId)
                    .uuid())
                .col(ColumnDef::new(PayrollEntry::VehicleId)
                    .uuid())
                .col(ColumnDef::new(PayrollEntry::Description)
                    .text()
                    .not_null())
                .col(ColumnDef::new(PayrollEntry::Amount)
                    .decimal_len(12, 2)
                    .not_null())
                .col(ColumnDef::new(PayrollEntry::Bonuses)
                    .decimal_len(12, 2)
                    .not_null()
                    .default(0))
                .col(ColumnDef::new(PayrollEntry::Deductions)
                    .decimal_len(12, 2)
                    .not_null()
                    .default(0))
                .col(ColumnDef::new(PayrollEntry::NetPay)
                    .decimal_len(12, 2)
                    .not_null())
                .col(ColumnDef::new(PayrollEntry::DaysWorked)
                    .integer()
                    .not_null()
                    .default(0))
                .col(ColumnDef::new(PayrollEntry::HoursWorked)
                    .decimal_len(8, 2))
                .col(ColumnDef::new(PayrollEntry::TripsCompleted)
                    .integer()
                    .not_null()
                    .default(0))
                .col(ColumnDef::new(PayrollEntry::KmsCovered)
                    .decimal_len(10, 2)
                    .not_null()
                    .default(0))
                .take()
            ).await?;
        create_organization_index(manager, PayrollEntry::Table).await?;
        create_reference(manager, PayrollEntry::Table, PayrollEntry::PayrollPeriodId, PayrollPeriod::Table, ForeignKeyAction::Cascade).await?;
        create_reference(manager, PayrollEntry::Table, PayrollEntry::DriverId, Driver::Table, ForeignKeyAction::SetNull).await?;
        create_reference(manager, PayrollEntry::Table, PayrollEntry::ServiceProviderId, ServiceProvider::Table, ForeignKeyAction::SetNull).await?;
        create_reference(manager, PayrollEntry::Table, PayrollEntry::VehicleId, Vehicle::Table, ForeignKeyAction::SetNull).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            PayrollEntry::Table.into_iden(),
            PayrollPeriod::Table.into_iden(),
            AttendanceRecord::Table.into_iden(),
            Route::Table.into_iden(),
            Vehicle::Table.into_iden(),
            Driver::Table.into_iden(),
            ServiceProvider::Table.into_iden(),
            VehicleCategory::Table.into_iden(),
            Location::Table.into_iden(),
            Shift::Table.into_iden(),
            Department::Table.into_iden(),
        ] {
            manager
                .drop_table(
                    TableDropStatement::new()
                        .table(table)
                        .if_exists()
                        .take()
                ).await?;
        }

        for name in [PayrollStatus::name(), PayrollType::name(), VehicleType::name()] {
            manager
                .drop_type(
                    TypeDropStatement::new()
                        .name(name)
                        .if_exists()
                        .to_owned()
                ).await?;
        }

        Ok(())
    }
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payroll_status")]
enum PayrollStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "PROCESSED")]
    Processed,
    #[sea_orm(string_value = "PAID")]
    Paid,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payroll_type")]
enum PayrollType {
    #[sea_orm(string_value = "SALARY")]
    Salary,
    #[sea_orm(string_value = "SERVICE_FEE")]
    ServiceFee,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "vehicle_type")]
enum VehicleType {
    #[sea_orm(string_value = "IN_HOUSE")]
    InHouse,
    #[sea_orm(string_value = "OUTSOURCED")]
    Outsourced,
}

#[derive(DeriveIden)]
enum Department {
    Table,
    Name,
}

#[derive(DeriveIden)]
enum Shift {
    Table,
    Name,
}

#[derive(DeriveIden)]
enum Location {
    Table,
    Name,
}

#[derive(DeriveIden)]
enum VehicleCategory {
    Table,
    Name,
}

#[derive(DeriveIden)]
enum ServiceProvider {
    Table,
    CompanyName,
    MonthlyRate,
    PerTripRate,
    PerKmRate,
    GstNumber,
}

#[derive(DeriveIden)]
enum Driver {
    Table,
    Name,
    BaseSalary,
    HourlyRate,
    OvertimeRate,
    DepartmentId,
}

#[derive(DeriveIden)]
enum Vehicle {
    Table,
    PlateNumber,
    VehicleType,
    Capacity,
    CategoryId,
    ServiceProviderId,
}

#[derive(DeriveIden)]
enum Route {
    Table,
    Name,
    VehicleId,
    ShiftId,
    LocationId,
    TotalDistance,
}

#[derive(DeriveIden)]
enum AttendanceRecord {
    Table,
    Date,
    HoursWorked,
    TripsCompleted,
    KmsCovered,
    FuelCost,
    TollCost,
    DriverId,
    VehicleId,
}

#[derive(DeriveIden)]
enum PayrollPeriod {
    Table,
    Name,
    StartDate,
    EndDate,
    Status,
    TotalAmount,
}

#[derive(DeriveIden)]
enum PayrollEntry {
    Table,
    PayrollPeriodId,
    PayrollType,
    DriverId,
    ServiceProviderId,
    VehicleId,
    Description,
    Amount,
    Bonuses,
    Deductions,
    NetPay,
    DaysWorked,
    HoursWorked,
    TripsCompleted,
    KmsCovered,
}
