//! Report generation and export.
//!
//! Reports are computed from stored readings. All reports require a closed
//! date range; the daily-average report is further limited to one year.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde_json::json;

use crate::application::export::{self, Cell, ReportTable};
use crate::application::services::activity_service::{attributed, log_activity};
use crate::domain::entities::{
    ActivityType, CriticalEvent, DailyAverage, ExportFormat, Measurement, MeasurementFilter,
    NewActivityLog, ReportFile, ReportFilter, ReportType, StationComparison, User, WATER_LEVEL,
};
use crate::domain::repositories::{
    ActivityLogRepository, MeasurementRepository, StationRepository,
};
use crate::error::AppError;

/// Longest span accepted by the daily-average report.
const MAX_DAILY_SPAN_DAYS: i64 = 365;

/// Resolved report window.
#[derive(Debug, Clone, Copy)]
struct Window {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

fn validate_window(filter: &ReportFilter) -> Result<Window, AppError> {
    let (Some(start), Some(end)) = (filter.start_date, filter.end_date) else {
        return Err(AppError::bad_request(
            "Las fechas de inicio y fin son requeridas",
            json!({}),
        ));
    };
    if start > end {
        return Err(AppError::bad_request(
            "La fecha de inicio debe ser anterior a la fecha de fin",
            json!({ "start_date": start, "end_date": end }),
        ));
    }
    Ok(Window { start, end })
}

/// Running min/max/sum accumulator.
#[derive(Debug, Clone, Copy)]
struct Summary {
    sum: f64,
    min: f64,
    max: f64,
    count: usize,
    critical: usize,
}

impl Summary {
    fn new() -> Self {
        Self {
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            count: 0,
            critical: 0,
        }
    }

    fn push(&mut self, m: &Measurement) {
        self.sum += m.value;
        self.min = self.min.min(m.value);
        self.max = self.max.max(m.value);
        self.count += 1;
        if m.is_critical {
            self.critical += 1;
        }
    }

    fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

pub struct ReportService<M, S, A>
where
    M: MeasurementRepository + ?Sized,
    S: StationRepository + ?Sized,
    A: ActivityLogRepository + ?Sized,
{
    measurements: Arc<M>,
    stations: Arc<S>,
    activity: Arc<A>,
}

impl<M, S, A> ReportService<M, S, A>
where
    M: MeasurementRepository + ?Sized,
    S: StationRepository + ?Sized,
    A: ActivityLogRepository + ?Sized,
{
    pub fn new(measurements: Arc<M>, stations: Arc<S>, activity: Arc<A>) -> Self {
        Self {
            measurements,
            stations,
            activity,
        }
    }

    async fn readings(
        &self,
        window: Window,
        filter: &ReportFilter,
        default_variable: Option<&str>,
    ) -> Result<Vec<Measurement>, AppError> {
        self.measurements
            .find_historical(MeasurementFilter {
                station_id: filter.station_id,
                start_date: Some(window.start),
                end_date: Some(window.end),
                variable_type: filter
                    .variable_type
                    .clone()
                    .or_else(|| default_variable.map(str::to_string)),
            })
            .await
    }

    async fn station_names(&self) -> Result<HashMap<i64, (String, f64)>, AppError> {
        Ok(self
            .stations
            .find_all()
            .await?
            .into_iter()
            .map(|s| (s.id, (s.name, s.threshold)))
            .collect())
    }

    /// Daily average, min and max per station, oldest day first.
    pub async fn daily_average(&self, filter: ReportFilter) -> Result<Vec<DailyAverage>, AppError> {
        let window = validate_window(&filter)?;
        if window.end - window.start > Duration::days(MAX_DAILY_SPAN_DAYS) {
            return Err(AppError::bad_request(
                "El rango de fechas no puede exceder 1 año",
                json!({ "max_days": MAX_DAILY_SPAN_DAYS }),
            ));
        }

        let readings = self.readings(window, &filter, Some(WATER_LEVEL)).await?;
        let names = self.station_names().await?;

        let mut groups: BTreeMap<(NaiveDate, i64), (Summary, Option<String>)> = BTreeMap::new();
        for m in &readings {
            let (summary, name) = groups
                .entry((m.timestamp.date_naive(), m.station_id))
                .or_insert_with(|| (Summary::new(), m.station_name.clone()));
            summary.push(m);
            if name.is_none() {
                *name = m.station_name.clone();
            }
        }

        let mut rows: Vec<DailyAverage> = groups
            .into_iter()
            .map(|((date, station_id), (summary, name))| DailyAverage {
                date,
                station_id,
                station_name: names
                    .get(&station_id)
                    .map(|(n, _)| n.clone())
                    .or(name)
                    .unwrap_or_else(|| format!("Estación {station_id}")),
                average_value: summary.average(),
                min_value: summary.min,
                max_value: summary.max,
                measurement_count: summary.count,
            })
            .collect();
        rows.sort_by(|a, b| a.date.cmp(&b.date).then(a.station_name.cmp(&b.station_name)));

        Ok(rows)
    }

    /// Runs of consecutive critical water-level readings, newest first.
    pub async fn critical_events(
        &self,
        filter: ReportFilter,
    ) -> Result<Vec<CriticalEvent>, AppError> {
        let window = validate_window(&filter)?;

        let filter = ReportFilter {
            variable_type: Some(WATER_LEVEL.to_string()),
            ..filter
        };
        let readings = self.readings(window, &filter, None).await?;
        let names = self.station_names().await?;

        let mut by_station: BTreeMap<i64, Vec<&Measurement>> = BTreeMap::new();
        for m in &readings {
            by_station.entry(m.station_id).or_default().push(m);
        }

        let mut events = Vec::new();
        for (station_id, mut series) in by_station {
            series.sort_by_key(|m| m.timestamp);
            let (station_name, threshold) = names.get(&station_id).cloned().unwrap_or_else(|| {
                (
                    series[0]
                        .station_name
                        .clone()
                        .unwrap_or_else(|| format!("Estación {station_id}")),
                    0.0,
                )
            });

            let mut run: Vec<&Measurement> = Vec::new();
            let mut close_run = |run: &mut Vec<&Measurement>| {
                if let (Some(first), Some(last)) = (run.first(), run.last()) {
                    let peak = run.iter().map(|m| m.value).fold(f64::NEG_INFINITY, f64::max);
                    events.push(CriticalEvent {
                        id: first.id,
                        station_id,
                        station_name: station_name.clone(),
                        water_level: peak,
                        threshold,
                        timestamp: first.timestamp,
                        duration_minutes: (last.timestamp - first.timestamp).num_minutes(),
                    });
                }
                run.clear();
            };

            for m in series {
                if m.is_critical {
                    run.push(m);
                } else {
                    close_run(&mut run);
                }
            }
            close_run(&mut run);
        }

        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(events)
    }

    /// Per-station summary across the window, ordered by station name.
    pub async fn comparative(
        &self,
        filter: ReportFilter,
    ) -> Result<Vec<StationComparison>, AppError> {
        let window = validate_window(&filter)?;
        let readings = self.readings(window, &filter, Some(WATER_LEVEL)).await?;
        let names = self.station_names().await?;

        let mut groups: BTreeMap<i64, Summary> = BTreeMap::new();
        for m in &readings {
            groups.entry(m.station_id).or_insert_with(Summary::new).push(m);
        }

        let mut rows: Vec<StationComparison> = groups
            .into_iter()
            .map(|(station_id, summary)| StationComparison {
                station_id,
                station_name: names
                    .get(&station_id)
                    .map(|(n, _)| n.clone())
                    .unwrap_or_else(|| format!("Estación {station_id}")),
                average_value: summary.average(),
                min_value: summary.min,
                max_value: summary.max,
                measurement_count: summary.count,
                critical_count: summary.critical,
            })
            .collect();
        rows.sort_by(|a, b| a.station_name.cmp(&b.station_name));

        Ok(rows)
    }

    /// Renders a report as a downloadable file.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for unknown report types or formats and bad windows
    /// - [`AppError::Internal`] when the file cannot be rendered
    pub async fn export(
        &self,
        report_type: &str,
        filter: ReportFilter,
        format: &str,
        actor: Option<&User>,
    ) -> Result<ReportFile, AppError> {
        let report_type = ReportType::parse(report_type).ok_or_else(|| {
            AppError::bad_request(
                "Tipo de reporte inválido",
                json!({ "type": report_type, "allowed": ["daily-average", "critical-events", "comparative"] }),
            )
        })?;
        let format = ExportFormat::parse(format).ok_or_else(|| {
            AppError::bad_request(
                "Formato de exportación inválido",
                json!({ "format": format, "allowed": ["csv", "pdf", "excel"] }),
            )
        })?;
        let window = validate_window(&filter)?;

        let table = match report_type {
            ReportType::DailyAverage => ReportTable {
                title: "Promedio diario de nivel".to_string(),
                headers: vec![
                    "Fecha",
                    "Estación",
                    "Promedio (m)",
                    "Mínimo (m)",
                    "Máximo (m)",
                    "Mediciones",
                ],
                rows: self
                    .daily_average(filter)
                    .await?
                    .into_iter()
                    .map(|r| {
                        vec![
                            Cell::from(r.date.to_string()),
                            Cell::from(r.station_name),
                            Cell::from(r.average_value),
                            Cell::from(r.min_value),
                            Cell::from(r.max_value),
                            Cell::from(r.measurement_count),
                        ]
                    })
                    .collect(),
            },
            ReportType::CriticalEvents => ReportTable {
                title: "Eventos críticos".to_string(),
                headers: vec!["Fecha", "Estación", "Nivel (m)", "Umbral (m)", "Duración (min)"],
                rows: self
                    .critical_events(filter)
                    .await?
                    .into_iter()
                    .map(|e| {
                        vec![
                            Cell::from(e.timestamp.format("%Y-%m-%d %H:%M").to_string()),
                            Cell::from(e.station_name),
                            Cell::from(e.water_level),
                            Cell::from(e.threshold),
                            Cell::from(e.duration_minutes),
                        ]
                    })
                    .collect(),
            },
            ReportType::Comparative => ReportTable {
                title: "Comparativo de estaciones".to_string(),
                headers: vec![
                    "Estación",
                    "Promedio (m)",
                    "Mínimo (m)",
                    "Máximo (m)",
                    "Mediciones",
                    "Lecturas críticas",
                ],
                rows: self
                    .comparative(filter)
                    .await?
                    .into_iter()
                    .map(|c| {
                        vec![
                            Cell::from(c.station_name),
                            Cell::from(c.average_value),
                            Cell::from(c.min_value),
                            Cell::from(c.max_value),
                            Cell::from(c.measurement_count),
                            Cell::from(c.critical_count),
                        ]
                    })
                    .collect(),
            },
        };
        let body = export::render(&table, format)?;

        let filename = format!(
            "reporte_{}_{}_{}.{}",
            report_type.as_str(),
            window.start.date_naive(),
            window.end.date_naive(),
            format.extension()
        );

        let entry = NewActivityLog::new(
            ActivityType::ReportDownloaded,
            "Reporte exportado",
            format!("Se exportó {filename}"),
        )
        .with_metadata(json!({ "type": report_type, "format": format, "bytes": body.len() }));
        log_activity(self.activity.as_ref(), attributed(entry, actor)).await;

        Ok(ReportFile {
            filename,
            content_type: format.content_type(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{ActivityLog, Station, StationStatus};
    use crate::domain::repositories::{
        MockActivityLogRepository, MockMeasurementRepository, MockStationRepository,
    };
    use chrono::TimeZone;

    type Service =
        ReportService<MockMeasurementRepository, MockStationRepository, MockActivityLogRepository>;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, minute, 0).unwrap()
    }

    fn reading(id: i64, station_id: i64, ts: DateTime<Utc>, value: f64) -> Measurement {
        Measurement {
            id,
            station_id,
            station_name: None,
            variable_type: WATER_LEVEL.to_string(),
            value,
            unit: "m".to_string(),
            timestamp: ts,
            is_critical: value >= 3.0,
            quality: None,
        }
    }

    fn station(id: i64, name: &str) -> Station {
        Station {
            id,
            name: name.to_string(),
            code: format!("ST-{id}"),
            location: "Pucón".to_string(),
            status: StationStatus::Active,
            latitude: 0.0,
            longitude: 0.0,
            current_level: 0.0,
            threshold: 3.0,
            last_measurement: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service(readings: Vec<Measurement>) -> Service {
        let mut measurements = MockMeasurementRepository::new();
        measurements
            .expect_find_historical()
            .returning(move |f| Ok(readings.iter().filter(|m| f.matches(m)).cloned().collect()));

        let mut stations = MockStationRepository::new();
        stations
            .expect_find_all()
            .returning(|| Ok(vec![station(1, "Río Claro Norte"), station(2, "Río Claro Sur")]));

        let mut activity = MockActivityLogRepository::new();
        activity.expect_create().returning(|e| {
            Ok(ActivityLog {
                id: 1,
                timestamp: e.timestamp,
                user_id: None,
                user_name: None,
                activity_type: e.activity_type,
                title: e.title,
                description: e.description,
                status: e.status,
                station_id: None,
                station_name: None,
                ip_address: None,
                user_agent: None,
                metadata: None,
                created_at: Utc::now(),
            })
        });

        ReportService::new(Arc::new(measurements), Arc::new(stations), Arc::new(activity))
    }

    fn window(start: DateTime<Utc>, end: DateTime<Utc>) -> ReportFilter {
        ReportFilter {
            start_date: Some(start),
            end_date: Some(end),
            station_id: None,
            variable_type: None,
        }
    }

    #[tokio::test]
    async fn test_filters_require_both_dates() {
        let svc = service(vec![]);
        let filter = ReportFilter {
            start_date: Some(at(1, 0, 0)),
            end_date: None,
            station_id: None,
            variable_type: None,
        };
        let err = svc.daily_average(filter).await.unwrap_err();
        assert_eq!(err.to_string(), "Las fechas de inicio y fin son requeridas");
    }

    #[tokio::test]
    async fn test_daily_average_span_limit() {
        let svc = service(vec![]);
        let start = at(1, 0, 0);
        let err = svc
            .daily_average(window(start, start + Duration::days(366)))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "El rango de fechas no puede exceder 1 año");

        // Critical events have no span limit.
        assert!(
            svc.critical_events(window(start, start + Duration::days(400)))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_daily_average_groups_by_day_and_station() {
        let svc = service(vec![
            reading(1, 1, at(1, 8, 0), 1.0),
            reading(2, 1, at(1, 12, 0), 2.0),
            reading(3, 2, at(1, 9, 0), 4.0),
            reading(4, 1, at(2, 9, 0), 3.0),
        ]);

        let rows = svc
            .daily_average(window(at(1, 0, 0), at(3, 0, 0)))
            .await
            .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].station_name, "Río Claro Norte");
        assert_eq!(rows[0].average_value, 1.5);
        assert_eq!(rows[0].min_value, 1.0);
        assert_eq!(rows[0].max_value, 2.0);
        assert_eq!(rows[0].measurement_count, 2);
        assert_eq!(rows[1].station_name, "Río Claro Sur");
        assert_eq!(rows[2].date, NaiveDate::from_ymd_opt(2025, 3, 2).unwrap());
    }

    #[tokio::test]
    async fn test_critical_events_merge_consecutive_readings() {
        let svc = service(vec![
            reading(1, 1, at(1, 8, 0), 3.1),
            reading(2, 1, at(1, 8, 30), 3.6),
            reading(3, 1, at(1, 9, 0), 3.2),
            reading(4, 1, at(1, 9, 30), 2.0),
            reading(5, 1, at(1, 10, 0), 3.3),
            reading(6, 2, at(1, 7, 0), 1.0),
        ]);

        let events = svc
            .critical_events(window(at(1, 0, 0), at(2, 0, 0)))
            .await
            .unwrap();

        assert_eq!(events.len(), 2);
        // Newest first.
        assert_eq!(events[0].id, 5);
        assert_eq!(events[0].duration_minutes, 0);
        assert_eq!(events[1].id, 1);
        assert_eq!(events[1].water_level, 3.6);
        assert_eq!(events[1].duration_minutes, 60);
        assert_eq!(events[1].threshold, 3.0);
    }

    #[tokio::test]
    async fn test_export_csv_file() {
        let svc = service(vec![reading(1, 1, at(1, 8, 0), 1.25)]);

        let file = svc
            .export("daily-average", window(at(1, 0, 0), at(7, 0, 0)), "csv", None)
            .await
            .unwrap();

        assert_eq!(file.filename, "reporte_daily-average_2025-03-01_2025-03-07.csv");
        assert!(file.content_type.starts_with("text/csv"));
        let text = String::from_utf8(file.body).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Fecha,Estación,Promedio (m),Mínimo (m),Máximo (m),Mediciones")
        );
        assert_eq!(
            lines.next(),
            Some("2025-03-01,Río Claro Norte,1.25,1.25,1.25,1")
        );
    }

    #[tokio::test]
    async fn test_export_excel_workbook() {
        let svc = service(vec![reading(1, 1, at(1, 8, 0), 3.5)]);

        let file = svc
            .export("comparative", window(at(1, 0, 0), at(2, 0, 0)), "excel", None)
            .await
            .unwrap();

        assert_eq!(file.filename, "reporte_comparative_2025-03-01_2025-03-02.xlsx");
        assert_eq!(
            file.content_type,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert!(file.body.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn test_export_pdf_document() {
        let svc = service(vec![
            reading(1, 1, at(1, 8, 0), 3.1),
            reading(2, 1, at(1, 8, 30), 3.4),
        ]);

        let file = svc
            .export("critical-events", window(at(1, 0, 0), at(2, 0, 0)), "pdf", None)
            .await
            .unwrap();

        assert_eq!(file.filename, "reporte_critical-events_2025-03-01_2025-03-02.pdf");
        assert_eq!(file.content_type, "application/pdf");
        assert!(file.body.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_export_rejects_unknown_type_and_format() {
        let svc = service(vec![]);
        let w = window(at(1, 0, 0), at(2, 0, 0));

        let err = svc.export("weekly", w.clone(), "csv", None).await.unwrap_err();
        assert_eq!(err.to_string(), "Tipo de reporte inválido");

        let err = svc.export("comparative", w, "docx", None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
        assert_eq!(err.to_string(), "Formato de exportación inválido");
    }
}
