use actix_web::web;

mod kpi;
mod payroll_period;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(web::scope("/payroll-periods")
            .configure(payroll_period::config))
        .service(web::scope("/kpi")
            .configure(kpi::config));
}
