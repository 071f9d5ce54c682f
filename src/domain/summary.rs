//! Views over the structured summary produced by the language model.
//!
//! The summary is free-form JSON; these helpers never fail on a missing or
//! mistyped field, they fall back to empty collections or `null`.

use serde::Serialize;
use serde_json::{json, Map, Value};
use utoipa::ToSchema;

fn array<'a>(value: Option<&'a Value>) -> &'a [Value] {
    value
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn text(value: &Value, field: &str) -> Option<String> {
    value.get(field).and_then(Value::as_str).map(str::to_owned)
}

/// The `visualizations` array of a summary.
pub fn visualizations(summary: &Value) -> &[Value] {
    array(summary.get("visualizations"))
}

/// One chart trimmed to the fields the dashboard renders.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Visualization {
    pub title: Value,
    #[serde(rename = "type")]
    pub kind: Value,
    pub data: Value,
    pub source: Value,
    pub clinical_significance: Value,
}

impl From<&Value> for Visualization {
    fn from(viz: &Value) -> Self {
        let field = |name: &str| viz.get(name).cloned().unwrap_or(Value::Null);
        Self {
            title: field("title"),
            kind: field("type"),
            data: field("data"),
            source: field("source"),
            clinical_significance: field("clinical_significance"),
        }
    }
}

pub fn processed_visualizations(summary: &Value) -> Vec<Visualization> {
    visualizations(summary).iter().map(Visualization::from).collect()
}

/// Case-insensitive lookup by title.
pub fn visualization_by_title<'a>(summary: &'a Value, title: &str) -> Option<&'a Value> {
    let wanted = title.to_lowercase();
    visualizations(summary).iter().find(|viz| {
        viz.get("title")
            .and_then(Value::as_str)
            .is_some_and(|t| t.to_lowercase() == wanted)
    })
}

/// The `medical_entities` object, or an empty object.
pub fn medical_entities(summary: &Value) -> Value {
    summary
        .get("medical_entities")
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()))
}

/// Risk factors and future risks per condition
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RiskAssessment {
    pub condition: Value,
    pub risk_factors: Value,
    pub future_risks: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EntityAnalysis {
    pub entities: Value,
    pub correlations: Value,
    pub risk_assessments: Vec<RiskAssessment>,
}

pub fn entity_analysis(summary: &Value) -> EntityAnalysis {
    let entities = medical_entities(summary);
    let conditions = array(entities.get("conditions"));

    let risk_assessments = conditions
        .iter()
        .map(|condition| RiskAssessment {
            condition: condition.get("name").cloned().unwrap_or(Value::Null),
            risk_factors: condition.get("risk_factors").cloned().unwrap_or_else(|| json!([])),
            future_risks: condition.get("future_risks").cloned().unwrap_or_else(|| json!([])),
        })
        .collect();

    EntityAnalysis {
        correlations: Value::Array(conditions.to_vec()),
        entities,
        risk_assessments,
    }
}

/// `lab_results.tests`.
pub fn lab_results(summary: &Value) -> &[Value] {
    array(summary.get("lab_results").and_then(|lab| lab.get("tests")))
}

/// Unique test names in first-seen order.
pub fn test_names(summary: &Value) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in lab_results(summary).iter().filter_map(|t| text(t, "name")) {
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Every result for one test, matched case-insensitively.
pub fn tests_by_name(summary: &Value, name: &str) -> Vec<Value> {
    let wanted = name.to_lowercase();
    lab_results(summary)
        .iter()
        .filter(|t| text(t, "name").is_some_and(|n| n.to_lowercase() == wanted))
        .cloned()
        .collect()
}

/// Rebuild `lab_results.test_trends` from `lab_results.tests`.
///
/// Results are grouped by test name and ordered by their timestamp string.
/// Tests with more than one result also get a line-chart visualization.
/// Summaries without `lab_results` are left untouched.
pub fn organize_test_trends(summary: &mut Value) {
    let Some(lab) = summary.get("lab_results").filter(|lab| lab.is_object()) else {
        return;
    };

    let mut grouped: Vec<(String, Vec<Value>)> = Vec::new();
    for test in array(lab.get("tests")) {
        let Some(name) = text(test, "name").filter(|n| !n.is_empty()) else {
            continue;
        };
        let point = json!({
            "value": test.get("value").cloned().unwrap_or(Value::Null),
            "timestamp": test.get("timestamp").cloned().unwrap_or(Value::Null),
            "trend_direction": test.get("trend").cloned().unwrap_or(Value::Null),
            "clinical_impact": test.get("clinical_significance").cloned().unwrap_or(Value::Null),
        });
        match grouped.iter_mut().find(|(n, _)| *n == name) {
            Some((_, points)) => points.push(point),
            None => grouped.push((name, vec![point])),
        }
    }

    for (_, points) in grouped.iter_mut() {
        points.sort_by(|a, b| timestamp_key(a).cmp(timestamp_key(b)));
    }

    let trends: Vec<Value> = grouped
        .iter()
        .map(|(name, points)| json!({ "test_name": name, "values_over_time": points }))
        .collect();

    let charts: Vec<Value> = grouped
        .iter()
        .filter(|(_, points)| points.len() > 1)
        .map(|(name, points)| trend_chart(name, points))
        .collect();

    if let Some(lab) = summary.get_mut("lab_results").and_then(Value::as_object_mut) {
        lab.insert("test_trends".to_string(), Value::Array(trends));
    }

    if charts.is_empty() {
        return;
    }
    if let Some(root) = summary.as_object_mut() {
        let entry = root
            .entry("visualizations")
            .or_insert_with(|| Value::Array(Vec::new()));
        if !entry.is_array() {
            *entry = Value::Array(Vec::new());
        }
        if let Some(existing) = entry.as_array_mut() {
            existing.extend(charts);
        }
    }
}

fn timestamp_key(point: &Value) -> &str {
    point.get("timestamp").and_then(Value::as_str).unwrap_or("")
}

fn trend_chart(name: &str, points: &[Value]) -> Value {
    let field = |key: &str| -> Vec<Value> {
        points
            .iter()
            .map(|p| p.get(key).cloned().unwrap_or(Value::Null))
            .collect()
    };

    json!({
        "title": format!("{} Trend Analysis", name),
        "type": "line_chart",
        "data": {
            "x_axis": { "label": "Time", "values": field("timestamp") },
            "y_axis": { "label": format!("{} Values", name), "values": field("value") },
        },
        "source": "Lab Results",
        "clinical_significance": format!("Trend analysis of {} over time", name),
        "annotations": [format!("Multiple {} measurements found", name)],
        "recommendations": ["Monitor trend for clinical decision making"],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> Value {
        json!({
            "lab_results": {
                "tests": [
                    { "name": "Hemoglobin", "value": "12.1", "timestamp": "2024-03-02", "trend": "down" },
                    { "name": "Glucose", "value": "98", "timestamp": "2024-03-01" },
                    { "name": "hemoglobin", "value": "13.0", "timestamp": "2024-03-01" },
                    { "name": "Hemoglobin", "value": "11.8", "timestamp": "2024-02-27" },
                    { "value": "orphan" }
                ]
            },
            "visualizations": [
                { "title": "Blood Pressure", "type": "line", "data": {}, "source": "vitals", "extra": 1 }
            ],
            "medical_entities": {
                "conditions": [
                    { "name": "Anemia", "risk_factors": [{ "factor": "diet" }] },
                    { "name": "Hypertension", "future_risks": [{ "potential_condition": "stroke" }] }
                ]
            }
        })
    }

    #[test]
    fn test_visualization_lookup_is_case_insensitive() {
        let summary = summary();
        assert!(visualization_by_title(&summary, "blood pressure").is_some());
        assert!(visualization_by_title(&summary, "Heart Rate").is_none());
    }

    #[test]
    fn test_processed_visualizations_fill_missing_with_null() {
        let charts = processed_visualizations(&summary());
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].clinical_significance, Value::Null);

        let json = serde_json::to_value(&charts[0]).unwrap();
        assert_eq!(json["type"], "line");
        assert!(json.get("extra").is_none());
    }

    #[test]
    fn test_lab_result_helpers() {
        let summary = summary();
        assert_eq!(lab_results(&summary).len(), 5);
        assert_eq!(test_names(&summary), vec!["Hemoglobin", "Glucose", "hemoglobin"]);
        assert_eq!(tests_by_name(&summary, "HEMOGLOBIN").len(), 3);
        assert!(tests_by_name(&summary, "Sodium").is_empty());
    }

    #[test]
    fn test_helpers_tolerate_empty_summary() {
        let empty = json!({});
        assert!(visualizations(&empty).is_empty());
        assert!(lab_results(&empty).is_empty());
        assert!(test_names(&empty).is_empty());
        assert_eq!(medical_entities(&empty), json!({}));
        assert!(entity_analysis(&empty).risk_assessments.is_empty());
    }

    #[test]
    fn test_entity_analysis() {
        let analysis = entity_analysis(&summary());
        assert_eq!(analysis.risk_assessments.len(), 2);
        assert_eq!(analysis.risk_assessments[0].condition, "Anemia");
        assert_eq!(analysis.risk_assessments[0].future_risks, json!([]));
        assert_eq!(analysis.risk_assessments[1].risk_factors, json!([]));
        assert_eq!(analysis.correlations.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_organize_test_trends_groups_and_sorts() {
        let mut summary = summary();
        organize_test_trends(&mut summary);

        let trends = summary["lab_results"]["test_trends"].as_array().unwrap();
        assert_eq!(trends.len(), 3);
        assert_eq!(trends[0]["test_name"], "Hemoglobin");

        let points = trends[0]["values_over_time"].as_array().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0]["timestamp"], "2024-02-27");
        assert_eq!(points[1]["trend_direction"], "down");

        let charts = visualizations(&summary);
        assert_eq!(charts.len(), 2);
        assert_eq!(charts[1]["title"], "Hemoglobin Trend Analysis");
        assert_eq!(charts[1]["data"]["y_axis"]["values"], json!(["11.8", "12.1"]));
    }

    #[test]
    fn test_organize_test_trends_without_lab_results() {
        let mut summary = json!({ "diagnosis": {} });
        organize_test_trends(&mut summary);
        assert_eq!(summary, json!({ "diagnosis": {} }));
    }
}
