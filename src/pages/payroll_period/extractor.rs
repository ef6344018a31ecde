use super::*;

/// Resolves `period_id` inside the caller's organization
impl FromRequest for payroll_period::Model {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let session = Session::from_request(&req, &mut dev::Payload::None).await?;

            let Some(period_id) = req.match_info().get("period_id") else {
                return Err(actix_web::error::ErrorInternalServerError("extractor used outside of a `period_id` path"))
            };
            let Ok(period_id) = Uuid::from_str(period_id) else {
                return Err(actix_web::error::ErrorBadRequest("invalid `period_id`"))
            };

            let Some(db) = req.app_data::<web::Data<DatabaseConnection>>() else {
                return Err(actix_web::error::ErrorInternalServerError("database is not configured"))
            };

            let period = period::find_period(db.as_ref(), session.organization_id, period_id).await?;

            Ok(period)
        })
    }
}
