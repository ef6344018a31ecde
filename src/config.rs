use std::{env, net::{SocketAddr, ToSocketAddrs as _}};

use sea_orm::ConnectOptions;
use tracing::info;

use crate::consts::DEFAULT_EXPECTED_WORKING_DAYS;

pub struct Config {
    pub host_address: SocketAddr,

    pub database_opt: ConnectOptions,

    pub jwt_key: String,

    pub policy: PayrollPolicy,
}

/// Tunables of the compensation rules that are not fixed by contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayrollPolicy {
    /// Denominator of the attendance ratio used for the punctuality bonus
    pub expected_working_days: u32,
}

impl Default for PayrollPolicy {
    fn default() -> Self {
        Self {
            expected_working_days: DEFAULT_EXPECTED_WORKING_DAYS,
        }
    }
}

pub fn load() -> Config {
    Config {
        host_address: load_host_address(),
        database_opt: load_database_opt().into(),
        jwt_key: load_jwt_key(),
        policy: PayrollPolicy {
            expected_working_days: load_expected_working_days(),
        },
    }
}

fn load_host_address() -> SocketAddr {
    info!("Loading environment `HOST_ADDRESS`");

    let var = env::var("HOST_ADDRESS").unwrap_or_else(|_| "127.0.0.1:0".to_string());

    var.to_socket_addrs()
        .expect("`HOST_ADDRESS` is not in a valid format").nth(0)
        .expect("unable to resolve host from `HOST_ADDRESS`")
}

fn load_database_opt() -> impl Into<ConnectOptions> {
    info!("Loading environment `DATABASE_URL`");

    env::var("DATABASE_URL").expect("Environment `DATABASE_URL` is required to be set")
}

fn load_jwt_key() -> String {
    info!("Loading environment `JWT_SECRET`");

    env::var("JWT_SECRET").expect("Environment `JWT_SECRET` is required to be set")
}

/// Read before the subscriber is installed, so it is not logged
pub fn load_log_file() -> String {
    env::var("LOG_FILE").unwrap_or_else(|_| "trace.log".to_string())
}

fn load_expected_working_days() -> u32 {
    info!("Loading environment `EXPECTED_WORKING_DAYS`");

    match env::var("EXPECTED_WORKING_DAYS") {
        Ok(var) => parse_expected_working_days(&var)
            .expect("`EXPECTED_WORKING_DAYS` must be a positive integer"),
        Err(_) => DEFAULT_EXPECTED_WORKING_DAYS,
    }
}

fn parse_expected_working_days(var: &str) -> Option<u32> {
    var.trim().parse::<u32>().ok().filter(|days| *days > 0)
}
