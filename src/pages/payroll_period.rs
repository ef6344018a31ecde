use std::str::FromStr;

use actix_web::{delete, dev, get, patch, post, web, FromRequest, HttpRequest, HttpResponse, Responder};
use chrono::NaiveDate;
use futures_util::future::LocalBoxFuture;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::Session,
    config::PayrollPolicy,
    consts::DEFAULT_PAGE_LIMIT,
    entity::{payroll_entry, payroll_period, sea_orm_active_enums::{PayrollStatus, VehicleType}},
    error::PayrollError,
    payroll::period::{self, EntryAdjustment, GenerationFilter, NewPeriod, PeriodListing, StatsRange},
};

use model::*;

mod extractor;
mod model;

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(create_period)
        .service(list_periods)
        .service(period_stats)
        .service(generate_filtered)
        .service(get_period)
        .service(list_entries)
        .service(delete_period)
        .service(generate_entries)
        .service(adjust_entry)
        .service(set_status);
}

#[post("")]
async fn create_period(db: web::Data<DatabaseConnection>, session: Session, payload: web::Json<CreatePeriod>) -> Result<HttpResponse, PayrollError> {
    let period = period::create_period(&db, session.organization_id, payload.into_inner().into()).await?;

    Ok(HttpResponse::Created().json(web::Json(period)))
}

#[get("")]
async fn list_periods(db: web::Data<DatabaseConnection>, session: Session, query: web::Query<ListPeriods>) -> Result<impl Responder, PayrollError> {
    let listing = PeriodListing::try_from(query.into_inner())?;
    let page = period::list_periods(&db, session.organization_id, listing).await?;

    Ok(web::Json(page))
}

#[get("/stats")]
async fn period_stats(db: web::Data<DatabaseConnection>, session: Session, query: web::Query<StatsQuery>) -> Result<impl Responder, PayrollError> {
    let StatsQuery { start_date, end_date } = query.into_inner();
    let stats = period::period_stats(&db, session.organization_id, StatsRange { start_date, end_date }).await?;

    Ok(web::Json(stats))
}

#[post("/generate-filtered")]
async fn generate_filtered(
    db: web::Data<DatabaseConnection>,
    policy: web::Data<PayrollPolicy>,
    session: Session,
    payload: web::Json<GenerateFiltered>,
) -> Result<HttpResponse, PayrollError> {
    let (new_period, filter) = payload.into_inner().into_parts();
    let generated = period::generate_filtered(&db, session.organization_id, new_period, filter, &policy).await?;

    Ok(HttpResponse::Created().json(web::Json(GeneratedResponse {
        message: format!("Created payroll period with {} filtered entries", generated.entries.len()),
        period: generated.period,
        entries: generated.entries,
    })))
}

#[get("/{period_id}")]
async fn get_period(db: web::Data<DatabaseConnection>, period: payroll_period::Model) -> Result<impl Responder, PayrollError> {
    let detail = period::get_period(&db, period).await?;

    Ok(web::Json(detail))
}

#[get("/{period_id}/entries")]
async fn list_entries(db: web::Data<DatabaseConnection>, period: payroll_period::Model) -> Result<impl Responder, PayrollError> {
    let entries = period::list_entries(&db, &period).await?;

    Ok(web::Json(entries))
}

#[delete("/{period_id}")]
async fn delete_period(db: web::Data<DatabaseConnection>, session: Session, period_id: web::Path<Uuid>) -> Result<impl Responder, PayrollError> {
    period::delete_period(&db, session.organization_id, period_id.into_inner()).await?;

    Ok(web::Json(MessageResponse {
        message: "Payroll period deleted".to_string(),
    }))
}

#[post("/{period_id}/generate-entries")]
async fn generate_entries(
    db: web::Data<DatabaseConnection>,
    policy: web::Data<PayrollPolicy>,
    session: Session,
    period_id: web::Path<Uuid>,
) -> Result<HttpResponse, PayrollError> {
    let generated = period::generate_entries(&db, session.organization_id, period_id.into_inner(), &policy).await?;

    Ok(HttpResponse::Created().json(web::Json(GeneratedResponse {
        message: format!("Generated {} payroll entries", generated.entries.len()),
        period: generated.period,
        entries: generated.entries,
    })))
}

#[patch("/{period_id}/entries/{entry_id}")]
async fn adjust_entry(
    db: web::Data<DatabaseConnection>,
    session: Session,
    path: web::Path<(Uuid, Uuid)>,
    payload: web::Json<AdjustEntry>,
) -> Result<impl Responder, PayrollError> {
    let (period_id, entry_id) = path.into_inner();
    let AdjustEntry { bonuses, deductions } = payload.into_inner();

    let entry = period::adjust_entry(&db, session.organization_id, period_id, entry_id, EntryAdjustment { bonuses, deductions }).await?;

    Ok(web::Json(entry))
}

#[patch("/{period_id}/status")]
async fn set_status(
    db: web::Data<DatabaseConnection>,
    session: Session,
    period_id: web::Path<Uuid>,
    payload: web::Json<UpdateStatus>,
) -> Result<impl Responder, PayrollError> {
    let period = period::set_status(&db, session.organization_id, period_id.into_inner(), &payload.status).await?;

    Ok(web::Json(period))
}

#[cfg(test)]
mod tests {
    use actix_web::{body::MessageBody as _, http::StatusCode, test, App};
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;

    use crate::{
        auth::{tests::{bearer, session, SECRET}, Authority, Role},
        entity::sea_orm_active_enums::PayrollType,
        payroll::{aggregator::tests::{record, vehicle}, period::tests::{date, entry, period}},
    };

    use super::*;

    macro_rules! app {
        ($db:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(Authority::new(SECRET)))
                    .app_data(web::Data::new($db.into_connection()))
                    .app_data(web::Data::new(PayrollPolicy::default()))
                    .service(web::scope("/payroll-periods").configure(config))
            ).await
        };
    }

    #[actix_web::test]
    async fn test_requires_session() {
        let app = app!(MockDatabase::new(DatabaseBackend::Postgres));

        let req = test::TestRequest::get()
            .uri("/payroll-periods")
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_create_period() {
        let org = Uuid::new_v4();
        let created = period(org, date(2024, 3, 1), date(2024, 3, 31), PayrollStatus::Pending);

        let app = app!(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<payroll_period::Model>::new()])
                .append_query_results([vec![created.clone()]])
        );

        let req = test::TestRequest::post()
            .uri("/payroll-periods")
            .insert_header(bearer(&session(org, Role::Admin)))
            .set_json(json!({ "start_date": "2024-03-01", "end_date": "2024-03-31" }))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let returned: payroll_period::Model = test::read_body_json(response).await;
        assert_eq!(returned, created);
    }

    #[actix_web::test]
    async fn test_create_overlapping_period() {
        let org = Uuid::new_v4();
        let existing = period(org, date(2024, 1, 15), date(2024, 2, 15), PayrollStatus::Pending);

        let app = app!(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![existing]])
        );

        let req = test::TestRequest::post()
            .uri("/payroll-periods")
            .insert_header(bearer(&session(org, Role::Admin)))
            .set_json(json!({ "start_date": "2024-01-20", "end_date": "2024-02-20" }))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_list_periods_rejects_unknown_status() {
        let org = Uuid::new_v4();
        let app = app!(MockDatabase::new(DatabaseBackend::Postgres));

        let req = test::TestRequest::get()
            .uri("/payroll-periods?status=ARCHIVED")
            .insert_header(bearer(&session(org, Role::Admin)))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_get_period_with_entries() {
        let org = Uuid::new_v4();
        let processed = period(org, date(2024, 1, 1), date(2024, 1, 31), PayrollStatus::Processed);
        let salary = entry(&processed, PayrollType::Salary, dec!(6260), dec!(1410), dec!(767));

        let app = app!(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![processed.clone()]])
                .append_query_results([vec![salary.clone()]])
        );

        let req = test::TestRequest::get()
            .uri(&format!("/payroll-periods/{}", processed.id))
            .insert_header(bearer(&session(org, Role::Member)))
            .to_request();

        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["id"], json!(processed.id));
        assert_eq!(body["status"], json!("PROCESSED"));
        let returned_entry: payroll_entry::Model = serde_json::from_value(body["entries"][0].clone()).unwrap();
        assert_eq!(returned_entry, salary);
        assert_eq!(returned_entry.net_pay, dec!(6903));
    }

    #[actix_web::test]
    async fn test_list_entries() {
        let org = Uuid::new_v4();
        let pending = period(org, date(2024, 1, 1), date(2024, 1, 31), PayrollStatus::Pending);
        let entries = vec![
            entry(&pending, PayrollType::Salary, dec!(5000), Decimal::ZERO, dec!(500)),
            entry(&pending, PayrollType::ServiceFee, dec!(19750), dec!(500), dec!(405)),
        ];

        let app = app!(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![pending.clone()]])
                .append_query_results([entries.clone()])
        );

        let req = test::TestRequest::get()
            .uri(&format!("/payroll-periods/{}/entries", pending.id))
            .insert_header(bearer(&session(org, Role::Member)))
            .to_request();

        let returned: Vec<payroll_entry::Model> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(returned, entries);
        assert_eq!(returned[1].net_pay, dec!(19845));
    }

    #[actix_web::test]
    async fn test_generate_entries_for_paid_period() {
        let org = Uuid::new_v4();
        let paid = period(org, date(2024, 1, 1), date(2024, 1, 31), PayrollStatus::Paid);

        let app = app!(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![paid.clone()]])
        );

        let req = test::TestRequest::post()
            .uri(&format!("/payroll-periods/{}/generate-entries", paid.id))
            .insert_header(bearer(&session(org, Role::Admin)))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = response.into_body().try_into_bytes().unwrap();
        assert!(String::from_utf8_lossy(&body).contains("Can only generate entries for pending payroll periods"));
    }

    #[actix_web::test]
    async fn test_generate_filtered() {
        let org = Uuid::new_v4();
        let vehicle_id = Uuid::new_v4();

        let app = app!(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<payroll_period::Model>::new()])
                .append_query_results([vec![record(2, Some(Uuid::new_v4()), vehicle_id, dec!(8), 10, dec!(100))]])
                .append_query_results([vec![vehicle(vehicle_id, VehicleType::InHouse, None)]])
        );

        let req = test::TestRequest::post()
            .uri("/payroll-periods/generate-filtered")
            .insert_header(bearer(&session(org, Role::Admin)))
            .set_json(json!({ "start_date": "2024-01-01", "end_date": "2024-01-31", "vehicle_type": "OUTSOURCED" }))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = response.into_body().try_into_bytes().unwrap();
        assert!(String::from_utf8_lossy(&body).contains("No attendance records found matching the specified filters"));

        let req = test::TestRequest::post()
            .uri("/payroll-periods/generate-filtered")
            .insert_header(bearer(&session(org, Role::Admin)))
            .set_json(json!({ "start_date": "2024-01-01", "end_date": "2024-01-31", "vehicle_ids": ["van-7"] }))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_adjust_entry_rejects_negative_bonus() {
        let org = Uuid::new_v4();
        let app = app!(MockDatabase::new(DatabaseBackend::Postgres));

        let req = test::TestRequest::patch()
            .uri(&format!("/payroll-periods/{}/entries/{}", Uuid::new_v4(), Uuid::new_v4()))
            .insert_header(bearer(&session(org, Role::Admin)))
            .set_json(json!({ "bonuses": "-10" }))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_set_status() {
        let org = Uuid::new_v4();
        let pending = period(org, date(2024, 1, 1), date(2024, 1, 31), PayrollStatus::Pending);
        let mut paid = pending.clone();
        paid.status = PayrollStatus::Paid;

        let app = app!(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![pending.clone()], vec![paid.clone()]])
        );

        let req = test::TestRequest::patch()
            .uri(&format!("/payroll-periods/{}/status", pending.id))
            .insert_header(bearer(&session(org, Role::Admin)))
            .set_json(json!({ "status": "PAID" }))
            .to_request();

        let returned: payroll_period::Model = test::call_and_read_body_json(&app, req).await;
        assert_eq!(returned.status, PayrollStatus::Paid);

        let req = test::TestRequest::patch()
            .uri(&format!("/payroll-periods/{}/status", pending.id))
            .insert_header(bearer(&session(org, Role::Admin)))
            .set_json(json!({ "status": "ARCHIVED" }))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_delete_period() {
        let org = Uuid::new_v4();
        let paid = period(org, date(2024, 1, 1), date(2024, 1, 31), PayrollStatus::Paid);
        let processed = period(org, date(2024, 2, 1), date(2024, 2, 29), PayrollStatus::Processed);

        let app = app!(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![paid.clone()], vec![processed.clone()]])
                .append_exec_results([
                    MockExecResult { last_insert_id: 0, rows_affected: 2 },
                    MockExecResult { last_insert_id: 0, rows_affected: 1 },
                ])
        );

        let req = test::TestRequest::delete()
            .uri(&format!("/payroll-periods/{}", paid.id))
            .insert_header(bearer(&session(org, Role::Admin)))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = response.into_body().try_into_bytes().unwrap();
        assert!(String::from_utf8_lossy(&body).contains("Cannot delete a PAID period"));

        let req = test::TestRequest::delete()
            .uri(&format!("/payroll-periods/{}", processed.id))
            .insert_header(bearer(&session(org, Role::Admin)))
            .to_request();

        let body: MessageResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.message, "Payroll period deleted");
    }
}
