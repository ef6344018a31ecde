use super::*;

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct CreatePeriod {
    pub(super) name: Option<String>,
    pub(super) start_date: NaiveDate,
    pub(super) end_date: NaiveDate,
}

impl From<CreatePeriod> for NewPeriod {
    fn from(payload: CreatePeriod) -> Self {
        Self {
            name: payload.name,
            start_date: payload.start_date,
            end_date: payload.end_date,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct GenerateFiltered {
    pub(super) name: Option<String>,
    pub(super) start_date: NaiveDate,
    pub(super) end_date: NaiveDate,
    pub(super) vehicle_type: Option<VehicleType>,
    #[serde(default)]
    pub(super) vehicle_ids: Vec<Uuid>,
    #[serde(default)]
    pub(super) shift_ids: Vec<Uuid>,
    #[serde(default)]
    pub(super) location_ids: Vec<Uuid>,
    #[serde(default)]
    pub(super) department_ids: Vec<Uuid>,
}

impl GenerateFiltered {
    pub(super) fn into_parts(self) -> (NewPeriod, GenerationFilter) {
        let new_period = NewPeriod {
            name: self.name,
            start_date: self.start_date,
            end_date: self.end_date,
        };
        let filter = GenerationFilter {
            vehicle_type: self.vehicle_type,
            vehicle_ids: self.vehicle_ids,
            shift_ids: self.shift_ids,
            location_ids: self.location_ids,
            department_ids: self.department_ids,
        };

        (new_period, filter)
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ListPeriods {
    pub(super) status: Option<String>,
    pub(super) page: Option<u64>,
    pub(super) limit: Option<u64>,
}

impl TryFrom<ListPeriods> for PeriodListing {
    type Error = PayrollError;

    fn try_from(query: ListPeriods) -> Result<Self, Self::Error> {
        let status = match query.status.as_deref() {
            None | Some("") => None,
            Some(status) => Some(status.parse::<PayrollStatus>().map_err(PayrollError::Validation)?),
        };

        Ok(Self {
            status,
            page: query.page.unwrap_or(1),
            limit: query.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct StatsQuery {
    pub(super) start_date: Option<NaiveDate>,
    pub(super) end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct AdjustEntry {
    pub(super) bonuses: Option<Decimal>,
    pub(super) deductions: Option<Decimal>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct UpdateStatus {
    pub(super) status: String,
}

#[derive(Debug, Serialize)]
pub(super) struct GeneratedResponse {
    pub(super) message: String,
    pub(super) period: payroll_period::Model,
    pub(super) entries: Vec<payroll_entry::Model>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct MessageResponse {
    pub(super) message: String,
}
