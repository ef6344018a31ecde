use super::*;

/// Comma separated ids, empty means no narrowing
fn parse_ids(field: &str, ids: Option<&str>) -> Result<Vec<Uuid>, PayrollError> {
    let Some(ids) = ids else {
        return Ok(Vec::new());
    };

    ids.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| Uuid::from_str(id).map_err(|_| PayrollError::validation(format!("invalid id `{id}` in `{field}`"))))
        .collect()
}

fn check_range(start_date: NaiveDate, end_date: NaiveDate) -> Result<(), PayrollError> {
    if start_date > end_date {
        return Err(PayrollError::validation("start_date must not be after end_date"));
    }

    Ok(())
}

/// Optional narrowing shared by every KPI query
#[derive(Debug, Default, Deserialize)]
pub(super) struct DimensionIds {
    pub(super) department_ids: Option<String>,
    pub(super) shift_ids: Option<String>,
    pub(super) route_ids: Option<String>,
    pub(super) vehicle_category_ids: Option<String>,
    pub(super) location_ids: Option<String>,
    pub(super) vehicle_ids: Option<String>,
    pub(super) driver_ids: Option<String>,
}

impl DimensionIds {
    pub(super) fn into_filter(self, organization_id: Uuid, start_date: NaiveDate, end_date: NaiveDate) -> Result<KpiFilter, PayrollError> {
        check_range(start_date, end_date)?;

        Ok(KpiFilter {
            department_ids: parse_ids("department_ids", self.department_ids.as_deref())?,
            shift_ids: parse_ids("shift_ids", self.shift_ids.as_deref())?,
            route_ids: parse_ids("route_ids", self.route_ids.as_deref())?,
            vehicle_category_ids: parse_ids("vehicle_category_ids", self.vehicle_category_ids.as_deref())?,
            location_ids: parse_ids("location_ids", self.location_ids.as_deref())?,
            vehicle_ids: parse_ids("vehicle_ids", self.vehicle_ids.as_deref())?,
            driver_ids: parse_ids("driver_ids", self.driver_ids.as_deref())?,
            ..KpiFilter::new(organization_id, start_date, end_date)
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct KpiQuery {
    pub(super) start_date: NaiveDate,
    pub(super) end_date: NaiveDate,
    #[serde(flatten)]
    pub(super) ids: DimensionIds,
}

impl KpiQuery {
    pub(super) fn into_filter(self, organization_id: Uuid) -> Result<KpiFilter, PayrollError> {
        self.ids.into_filter(organization_id, self.start_date, self.end_date)
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct TrendsQuery {
    #[serde(flatten)]
    pub(super) filter: KpiQuery,
    pub(super) granularity: Option<String>,
}

/// Both windows are narrowed by the same dimension ids
#[derive(Debug, Deserialize)]
pub(super) struct CompareQuery {
    pub(super) current_start_date: NaiveDate,
    pub(super) current_end_date: NaiveDate,
    pub(super) previous_start_date: NaiveDate,
    pub(super) previous_end_date: NaiveDate,
    #[serde(flatten)]
    pub(super) ids: DimensionIds,
}

impl CompareQuery {
    pub(super) fn into_filters(self, organization_id: Uuid) -> Result<(KpiFilter, KpiFilter), PayrollError> {
        let current = self.ids.into_filter(organization_id, self.current_start_date, self.current_end_date)?;
        check_range(self.previous_start_date, self.previous_end_date)?;

        let previous = KpiFilter {
            start_date: self.previous_start_date,
            end_date: self.previous_end_date,
            ..current.clone()
        };

        Ok((current, previous))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ids() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        assert_eq!(parse_ids("shift_ids", None).unwrap(), Vec::<Uuid>::new());
        assert_eq!(parse_ids("shift_ids", Some("")).unwrap(), Vec::<Uuid>::new());
        assert_eq!(parse_ids("shift_ids", Some(&format!("{a}, {b},"))).unwrap(), vec![a, b]);
        assert!(matches!(parse_ids("shift_ids", Some("night")), Err(PayrollError::Validation(_))));
    }

    #[test]
    fn test_compare_query_shares_dimension_ids() {
        let (organization_id, vehicle_id, driver_id) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        let query = CompareQuery {
            current_start_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            current_end_date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            previous_start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            previous_end_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            ids: DimensionIds {
                vehicle_ids: Some(vehicle_id.to_string()),
                driver_ids: Some(driver_id.to_string()),
                ..Default::default()
            },
        };

        let (current, previous) = query.into_filters(organization_id).unwrap();
        assert_eq!(current.start_date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(previous.end_date, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());

        for filter in [current, previous] {
            assert_eq!(filter.organization_id, organization_id);
            assert_eq!(filter.vehicle_ids, vec![vehicle_id]);
            assert_eq!(filter.driver_ids, vec![driver_id]);
        }
    }
}
