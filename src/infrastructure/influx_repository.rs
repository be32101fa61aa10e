// InfluxDB v2 repository implementation
use crate::application::vital_repository::{ReadQuery, VitalRepository, VitalRow};
use crate::domain::vitals::{Bed, MetricType, VitalSample};
use crate::error::{Result, VitalError};
use crate::infrastructure::config::InfluxSettings;
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};

const MEASUREMENT: &str = "vital_signs";
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct InfluxRepository {
    client: reqwest::Client,
    url: String,
    token: String,
    org: String,
    bucket: String,
}

impl InfluxRepository {
    pub fn new(settings: InfluxSettings) -> anyhow::Result<Self> {
        settings.check()?;
        // A hung sink call should fail the await, not hang it forever.
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: settings.url.trim_end_matches('/').to_string(),
            token: settings.token,
            org: settings.org,
            bucket: settings.bucket,
        })
    }

    fn write_url(&self) -> String {
        format!(
            "{}/api/v2/write?org={}&bucket={}&precision=ms",
            self.url,
            urlencoding::encode(&self.org),
            urlencoding::encode(&self.bucket)
        )
    }

    fn query_url(&self) -> String {
        format!(
            "{}/api/v2/query?org={}",
            self.url,
            urlencoding::encode(&self.org)
        )
    }

    fn delete_url(&self) -> String {
        format!(
            "{}/api/v2/delete?org={}&bucket={}",
            self.url,
            urlencoding::encode(&self.org),
            urlencoding::encode(&self.bucket)
        )
    }

    fn auth_header(&self) -> String {
        format!("Token {}", self.token)
    }
}

/// Escape a tag value per the line protocol rules.
fn escape_tag(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(',', "\\,")
        .replace(' ', "\\ ")
        .replace('=', "\\=")
}

fn to_line(sample: &VitalSample) -> String {
    format!(
        "{},bed={},type={},unit={} value={} {}",
        MEASUREMENT,
        escape_tag(&sample.bed.label()),
        escape_tag(sample.metric.as_str()),
        escape_tag(sample.unit),
        sample.value,
        sample.time.timestamp_millis()
    )
}

fn rfc3339(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn build_flux(bucket: &str, query: &ReadQuery) -> String {
    // Pagination is cursor based: pages after the first start one millisecond
    // past the previous page's last row.
    let start = match query.cursor {
        Some(cursor) => cursor + Duration::milliseconds(1),
        None => query.start,
    };
    format!(
        "from(bucket: \"{}\")\n\
         |> range(start: {}, stop: {})\n\
         |> filter(fn: (r) => r._measurement == \"{}\")\n\
         |> filter(fn: (r) => r.type == \"{}\")\n\
         |> filter(fn: (r) => r.bed == \"{}\")\n\
         |> filter(fn: (r) => r._field == \"value\")\n\
         |> sort(columns: [\"_time\"])\n\
         |> limit(n: {})",
        bucket,
        rfc3339(start),
        rfc3339(query.end),
        MEASUREMENT,
        query.metric.as_str(),
        query.bed.label(),
        query.limit
    )
}

/// Parse annotated CSV from the query API. Each table starts with annotation
/// lines, then a header row naming the columns; rows are matched to columns
/// by name so column order does not matter.
fn parse_csv(body: &str) -> Vec<VitalRow> {
    let mut rows = Vec::new();
    let mut columns: Option<Vec<String>> = None;

    for line in body.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            // Blank line separates tables; the next table has its own header.
            columns = None;
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        if columns.is_none() {
            columns = Some(line.split(',').map(str::to_string).collect());
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        let Some(cols) = columns.as_ref() else {
            continue;
        };

        let field_at = |name: &str| {
            cols.iter()
                .position(|c| c == name)
                .and_then(|idx| fields.get(idx))
                .copied()
        };

        let time = field_at("_time").and_then(|s| DateTime::parse_from_rfc3339(s).ok());
        let value = field_at("_value").and_then(|s| s.parse::<f64>().ok());
        if let (Some(time), Some(value)) = (time, value) {
            rows.push(VitalRow {
                time: time.with_timezone(&Utc),
                value,
                metric: field_at("type").unwrap_or_default().to_string(),
                bed: field_at("bed").unwrap_or_default().to_string(),
                unit: field_at("unit").unwrap_or_default().to_string(),
            });
        }
    }
    rows
}

fn build_delete_predicate(metric: Option<MetricType>, bed: Option<Bed>) -> String {
    let mut predicate = format!("_measurement=\"{}\"", MEASUREMENT);
    if let Some(metric) = metric {
        predicate.push_str(&format!(" AND type=\"{}\"", metric.as_str()));
    }
    if let Some(bed) = bed {
        predicate.push_str(&format!(" AND bed=\"{}\"", bed.label()));
    }
    predicate
}

#[async_trait]
impl VitalRepository for InfluxRepository {
    async fn write_points(&self, samples: &[VitalSample]) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let body = samples.iter().map(to_line).collect::<Vec<_>>().join("\n");
        let response = self
            .client
            .post(self.write_url())
            .header("Authorization", self.auth_header())
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(body)
            .send()
            .await
            .map_err(|e| VitalError::SinkWrite(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VitalError::SinkWrite(format!("status {}: {}", status, body)));
        }
        Ok(())
    }

    async fn query_rows(&self, query: &ReadQuery) -> Result<Vec<VitalRow>> {
        let flux = build_flux(&self.bucket, query);
        tracing::debug!(%flux, "executing flux query");

        let response = self
            .client
            .post(self.query_url())
            .header("Authorization", self.auth_header())
            .header("Content-Type", "application/vnd.flux")
            .header("Accept", "application/csv")
            .body(flux)
            .send()
            .await
            .map_err(|e| VitalError::SinkRead(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VitalError::SinkRead(format!("status {}: {}", status, body)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| VitalError::SinkRead(e.to_string()))?;
        Ok(parse_csv(&body))
    }

    async fn delete_range(
        &self,
        metric: Option<MetricType>,
        bed: Option<Bed>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<()> {
        let body = serde_json::json!({
            "start": rfc3339(start),
            "stop": rfc3339(end),
            "predicate": build_delete_predicate(metric, bed),
        });

        let response = self
            .client
            .post(self.delete_url())
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await
            .map_err(|e| VitalError::SinkDelete(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VitalError::SinkDelete(format!("status {}: {}", status, body)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_line_protocol_format() {
        let time = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();
        let sample = VitalSample::new(MetricType::HeartRate, Bed(1), time, 72.35);
        assert_eq!(
            to_line(&sample),
            "vital_signs,bed=bed-1,type=heartRate,unit=BPM value=72.35 1705305600000"
        );
    }

    #[test]
    fn test_tag_escaping() {
        assert_eq!(escape_tag("breaths/min"), "breaths/min");
        assert_eq!(escape_tag("a b,c=d"), "a\\ b\\,c\\=d");
    }

    #[test]
    fn test_flux_uses_cursor_as_range_start() {
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();
        let query = ReadQuery {
            metric: MetricType::HeartRate,
            bed: Bed(1),
            start,
            end: start + Duration::hours(1),
            limit: 101,
            cursor: Some(start + Duration::minutes(30)),
        };
        let flux = build_flux("vitals", &query);
        assert!(flux.contains("range(start: 2024-01-15T08:30:00.001Z"));
        assert!(flux.contains("limit(n: 101)"));
        assert!(flux.contains("r.type == \"heartRate\""));
        assert!(flux.contains("r.bed == \"bed-1\""));
    }

    #[test]
    fn test_parse_annotated_csv() {
        let body = "\
#datatype,string,long,dateTime:RFC3339,double,string,string,string\n\
#group,false,false,false,false,true,true,true\n\
#default,_result,,,,,,\n\
,result,table,_time,_value,bed,type,unit\n\
,_result,0,2024-01-15T08:00:00Z,72.35,bed-1,heartRate,BPM\n\
,_result,0,2024-01-15T08:05:00Z,88.1,bed-1,heartRate,BPM\n";

        let rows = parse_csv(body);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].value, 72.35);
        assert_eq!(rows[0].metric, "heartRate");
        assert_eq!(rows[0].bed, "bed-1");
        assert_eq!(rows[1].unit, "BPM");
        assert!(rows[0].time < rows[1].time);
    }

    #[test]
    fn test_parse_csv_ignores_malformed_rows() {
        let body = ",result,table,_time,_value,bed,type,unit\n\
,_result,0,not-a-time,72.35,bed-1,heartRate,BPM\n\
,_result,0,2024-01-15T08:00:00Z,nope,bed-1,heartRate,BPM\n";
        assert!(parse_csv(body).is_empty());
    }

    #[test]
    fn test_delete_predicate() {
        assert_eq!(
            build_delete_predicate(None, None),
            "_measurement=\"vital_signs\""
        );
        assert_eq!(
            build_delete_predicate(Some(MetricType::Temperature), Some(Bed(4))),
            "_measurement=\"vital_signs\" AND type=\"temperature\" AND bed=\"bed-4\""
        );
    }
}
