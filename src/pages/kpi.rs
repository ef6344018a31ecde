use std::str::FromStr;

use actix_web::{get, web, Responder};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::Manager,
    error::PayrollError,
    kpi::{dimension::{Grouping, KpiRow}, facts::KpiFilter, report::{self, Granularity}},
};

use model::*;

mod model;

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(dashboard)
        .service(department)
        .service(shift)
        .service(date_time)
        .service(route)
        .service(vehicle_category)
        .service(location)
        .service(trends)
        .service(compare);
}

async fn grouped(db: &DatabaseConnection, manager: &Manager, query: KpiQuery, grouping: Grouping) -> Result<web::Json<Vec<KpiRow>>, PayrollError> {
    let filter = query.into_filter(manager.organization_id)?;
    let rows = report::group(db, &filter, grouping).await?;

    Ok(web::Json(rows))
}

#[get("/dashboard")]
async fn dashboard(db: web::Data<DatabaseConnection>, manager: Manager, query: web::Query<KpiQuery>) -> Result<impl Responder, PayrollError> {
    let filter = query.into_inner().into_filter(manager.organization_id)?;
    let dashboard = report::generate_dashboard(&db, &filter).await?;

    Ok(web::Json(dashboard))
}

#[get("/department")]
async fn department(db: web::Data<DatabaseConnection>, manager: Manager, query: web::Query<KpiQuery>) -> impl Responder {
    grouped(&db, &manager, query.into_inner(), Grouping::Department).await
}

#[get("/shift")]
async fn shift(db: web::Data<DatabaseConnection>, manager: Manager, query: web::Query<KpiQuery>) -> impl Responder {
    grouped(&db, &manager, query.into_inner(), Grouping::Shift).await
}

#[get("/datetime")]
async fn date_time(db: web::Data<DatabaseConnection>, manager: Manager, query: web::Query<KpiQuery>) -> impl Responder {
    grouped(&db, &manager, query.into_inner(), Grouping::DateTime).await
}

#[get("/route")]
async fn route(db: web::Data<DatabaseConnection>, manager: Manager, query: web::Query<KpiQuery>) -> impl Responder {
    grouped(&db, &manager, query.into_inner(), Grouping::Route).await
}

#[get("/vehicle-category")]
async fn vehicle_category(db: web::Data<DatabaseConnection>, manager: Manager, query: web::Query<KpiQuery>) -> impl Responder {
    grouped(&db, &manager, query.into_inner(), Grouping::VehicleCategory).await
}

#[get("/location")]
async fn location(db: web::Data<DatabaseConnection>, manager: Manager, query: web::Query<KpiQuery>) -> impl Responder {
    grouped(&db, &manager, query.into_inner(), Grouping::Location).await
}

#[get("/trends")]
async fn trends(db: web::Data<DatabaseConnection>, manager: Manager, query: web::Query<TrendsQuery>) -> Result<impl Responder, PayrollError> {
    let TrendsQuery { filter, granularity } = query.into_inner();

    let granularity = Granularity::from_str(granularity.as_deref().unwrap_or("weekly"))?;
    let filter = filter.into_filter(manager.organization_id)?;

    let points = report::get_trends(&db, &filter, granularity).await?;

    Ok(web::Json(points))
}

#[get("/compare")]
async fn compare(db: web::Data<DatabaseConnection>, manager: Manager, query: web::Query<CompareQuery>) -> Result<impl Responder, PayrollError> {
    let (current, previous) = query.into_inner().into_filters(manager.organization_id)?;

    let comparison = report::compare_periods(&db, manager.organization_id, current, previous).await?;

    Ok(web::Json(comparison))
}
