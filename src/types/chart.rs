//! Chart-ready aggregate structures

use serde::ser::{SerializeMap, SerializeTuple};
use serde::{Serialize, Serializer};

use super::record::Severity;

/// One stacked-bar series of the severity time series
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeverityDataset {
    pub label: Severity,
    /// Counts aligned to [`SeverityChart::labels`]
    pub data: Vec<usize>,
    pub background_color: &'static str,
}

/// Hour-bucketed counts per severity
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SeverityChart {
    pub labels: Vec<String>,
    pub datasets: Vec<SeverityDataset>,
}

impl SeverityChart {
    /// Counts for one severity, in bucket order
    pub fn series(&self, severity: Severity) -> Option<&[usize]> {
        self.datasets
            .iter()
            .find(|d| d.label == severity)
            .map(|d| d.data.as_slice())
    }
}

/// Parallel label/count arrays
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LabeledCounts {
    pub labels: Vec<String>,
    pub data: Vec<usize>,
}

impl LabeledCounts {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn total(&self) -> usize {
        self.data.iter().sum()
    }
}

/// Heatmap cell, serialized as `[hour, day, count]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatmapCell {
    pub hour: u8,
    /// Monday = 0 ... Sunday = 6
    pub day: u8,
    pub count: usize,
}

impl Serialize for HeatmapCell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(3)?;
        tuple.serialize_element(&self.hour)?;
        tuple.serialize_element(&self.day)?;
        tuple.serialize_element(&self.count)?;
        tuple.end()
    }
}

/// The four aggregates computed from one batch
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub severity_chart: SeverityChart,
    pub category_chart: LabeledCounts,
    pub heatmap_data: Vec<HeatmapCell>,
    pub top_users_chart: LabeledCounts,
}

/// Response of the aggregation engine
///
/// An empty batch yields `Empty`, serialized as `{}`, meaning "no data".
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationReply {
    Empty,
    Charts(Box<ChartData>),
}

impl AggregationReply {
    pub fn charts(&self) -> Option<&ChartData> {
        match self {
            AggregationReply::Empty => None,
            AggregationReply::Charts(charts) => Some(charts),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, AggregationReply::Empty)
    }
}

impl Serialize for AggregationReply {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AggregationReply::Empty => serializer.serialize_map(Some(0))?.end(),
            AggregationReply::Charts(charts) => charts.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_reply_is_empty_object() {
        let json = serde_json::to_value(AggregationReply::Empty).unwrap();
        assert_eq!(json, json!({}));
    }

    #[test]
    fn test_chart_data_field_names() {
        let charts = ChartData {
            severity_chart: SeverityChart {
                labels: vec!["Mar 1, 10:00 AM".to_string()],
                datasets: vec![SeverityDataset {
                    label: Severity::High,
                    data: vec![2],
                    background_color: Severity::High.color(),
                }],
            },
            category_chart: LabeledCounts {
                labels: vec!["A".to_string()],
                data: vec![2],
            },
            heatmap_data: vec![HeatmapCell {
                hour: 10,
                day: 4,
                count: 2,
            }],
            top_users_chart: LabeledCounts::default(),
        };

        let json = serde_json::to_value(AggregationReply::Charts(Box::new(charts))).unwrap();
        assert_eq!(json["severityChart"]["datasets"][0]["label"], "High");
        assert_eq!(json["severityChart"]["datasets"][0]["backgroundColor"], "#ff9f40");
        assert_eq!(json["categoryChart"]["data"], json!([2]));
        assert_eq!(json["heatmapData"], json!([[10, 4, 2]]));
        assert_eq!(json["topUsersChart"], json!({"labels": [], "data": []}));
    }
}
