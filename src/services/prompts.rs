//! Prompt text sent to the language model.

pub const SUMMARY_SYSTEM_PROMPT: &str = "You are a medical AI assistant that extracts structured information from medical records. Your responses should be in valid JSON format only.";

pub const CHAT_SYSTEM_PROMPT: &str = "You are an AI medical assistant helping a doctor interpret medical records. Provide detailed, accurate information based on the medical record provided.";

const RECORD_PLACEHOLDER: &str = "{medical_text}";
const QUESTION_PLACEHOLDER: &str = "{question}";

const SUMMARY_TEMPLATE: &str = r#"Here is a medical record. Create a detailed JSON summary with comprehensive analysis:

Medical Record:
{medical_text}

Required JSON Format:
{
    "patient_demographics": {
        "age": "exact age",
        "gender": "exact gender",
        "ethnicity": "if available",
        "occupation": "if available",
        "risk_factors": ["list of risk factors"]
    },
    "vital_signs": {
        "measurements": [
            {
                "name": "exact name",
                "value": "exact value",
                "unit": "exact unit",
                "timestamp": "exact time",
                "trend": "trend analysis if multiple readings",
                "clinical_significance": "interpretation of the value"
            }
        ],
        "overall_stability": "Assessment of vital signs stability"
    },
    "chief_complaints": {
        "primary": "main complaint",
        "secondary": ["other complaints"],
        "onset": "when symptoms started",
        "severity": "severity assessment",
        "progression": "how symptoms have changed"
    },
    "medical_history": {
        "past_conditions": ["list of past medical conditions"],
        "surgeries": ["list of past surgeries with dates"],
        "allergies": ["list of allergies and reactions"],
        "family_history": ["relevant family medical history"],
        "social_history": {
            "lifestyle": ["relevant lifestyle factors"],
            "habits": ["relevant habits"],
            "environmental_factors": ["relevant environmental exposures"]
        }
    },
    "symptoms_timeline": [
        {
            "symptom": "exact symptom",
            "onset": "start date/time",
            "duration": "duration of symptom",
            "severity": "severity level",
            "triggers": ["factors that worsen/improve"],
            "progression": "how symptom has changed"
        }
    ],
    "lab_results": {
        "tests": [
            {
                "name": "exact test name",
                "value": "exact value",
                "unit": "exact unit",
                "timestamp": "exact time",
                "reference_range": "if available",
                "trend": "trend analysis if sequential",
                "clinical_significance": "result interpretation",
                "action_needed": "required medical actions based on result"
            }
        ],
        "critical_values": ["Any critical lab values requiring immediate attention"],
        "test_trends": [
            {
                "test_name": "name of test",
                "values_over_time": [
                    {
                        "value": "exact value",
                        "timestamp": "exact time",
                        "trend_direction": "increasing/decreasing/stable",
                        "clinical_impact": "significance of trend"
                    }
                ]
            }
        ]
    },
    "diagnosis": {
        "primary": {
            "condition": "primary diagnosis",
            "certainty": "diagnostic certainty",
            "basis": ["clinical findings supporting diagnosis"],
            "stage": "stage or severity if applicable"
        },
        "secondary": [
            {
                "condition": "secondary diagnosis",
                "relationship": "relationship to primary diagnosis",
                "impact": "impact on treatment plan"
            }
        ],
        "differential_diagnoses": ["potential alternative diagnoses to consider"],
        "ruled_out": ["diagnoses that were considered and ruled out"]
    },
    "medications": {
        "current": [
            {
                "name": "medication name",
                "dosage": "exact dosage",
                "frequency": "administration frequency",
                "route": "administration route",
                "purpose": "therapeutic purpose",
                "start_date": "when started",
                "duration": "planned duration",
                "side_effects": ["observed side effects"],
                "interactions": ["potential drug interactions"],
                "monitoring_needs": ["parameters to monitor"]
            }
        ],
        "discontinued": [
            {
                "name": "medication name",
                "reason": "reason for discontinuation",
                "date_stopped": "when stopped"
            }
        ],
        "allergies": ["medication allergies and reactions"]
    },
    "treatment_plan": {
        "immediate_actions": ["urgent medical steps"],
        "short_term_goals": ["treatment objectives for next 24-48 hours"],
        "long_term_goals": ["treatment objectives for discharge"],
        "interventions": [
            {
                "type": "intervention type",
                "details": "specific details",
                "frequency": "how often",
                "duration": "how long",
                "expected_outcome": "anticipated results"
            }
        ],
        "monitoring_requirements": ["specific parameters to track"],
        "lifestyle_modifications": ["recommended lifestyle changes"]
    },
    "follow_up_plan": {
        "appointments": [
            {
                "specialist": "type of provider",
                "timeframe": "when to follow up",
                "purpose": "reason for follow up",
                "preparation": ["any required preparation"]
            }
        ],
        "monitoring": ["parameters to monitor at home"],
        "warning_signs": ["symptoms requiring immediate attention"],
        "care_coordination": ["coordination between providers"]
    },
    "medical_entities": {
        "conditions": [
            {
                "name": "exact condition name",
                "status": "current status",
                "severity": "severity level",
                "first_noted": "onset date",
                "risk_factors": [
                    {
                        "factor": "specific risk factor",
                        "impact_percentage": "quantified risk impact",
                        "evidence": "clinical evidence",
                        "mitigation_strategy": "risk reduction approach"
                    }
                ],
                "correlations": [
                    {
                        "related_finding": "correlated condition/finding",
                        "correlation_strength": "statistical correlation",
                        "clinical_significance": "medical importance",
                        "evidence_base": "research/clinical evidence supporting correlation"
                    }
                ],
                "future_risks": [
                    {
                        "potential_condition": "possible future condition",
                        "risk_percentage": "probability estimation",
                        "time_frame": "expected time of manifestation",
                        "preventive_measures": ["specific preventive actions"],
                        "supporting_evidence": "clinical basis for prediction",
                        "monitoring_plan": "recommended follow-up plan"
                    }
                ],
                "treatment_implications": {
                    "recommended_interventions": ["specific treatments"],
                    "contraindications": ["treatments to avoid"],
                    "expected_outcomes": ["projected treatment results"]
                }
            }
        ],
        "vital_signs": [
            {
                "name": "measurement name",
                "value": "exact value",
                "unit": "measurement unit",
                "timestamp": "exact time",
                "status": "current status",
                "clinical_impact": "medical significance",
                "trend_analysis": {
                    "pattern": "trend pattern",
                    "significance": "clinical importance",
                    "recommendations": ["clinical actions based on trend"]
                }
            }
        ],
        "procedures": [
            {
                "name": "procedure name",
                "type": "procedure type",
                "date": "procedure date",
                "outcome": "procedure outcome",
                "complications": ["any complications"],
                "follow_up_needed": "follow-up requirements"
            }
        ],
        "medications": [
            {
                "name": "medication name",
                "class": "medication class",
                "indications": ["medical conditions"],
                "contraindications": ["conditions where medication should not be used"],
                "interactions": ["known drug interactions"],
                "monitoring_parameters": ["what to monitor"]
            }
        ]
    },
    "visualizations": [
        {
            "title": "visualization title",
            "type": "chart type",
            "data": {
                "x_axis": {
                    "label": "time unit",
                    "values": ["timestamps"]
                },
                "y_axis": {
                    "label": "measurement with unit",
                    "values": ["exact values"],
                    "reference_ranges": ["normal ranges"]
                }
            },
            "source": "data source",
            "clinical_significance": "medical importance",
            "annotations": ["important points to note"],
            "recommendations": ["clinical decisions based on visualization"]
        }
    ]
}

Rules:
1. ONLY include information explicitly stated in the record
2. Use exact values and dates from the record
3. For any missing fields, use "Not Available"
4. Do not generate or assume any information
5. For risk percentages and correlations, only use explicitly stated numerical values
6. Include all relevant timestamps exactly as they appear
7. Provide detailed clinical interpretations where data supports it
8. Highlight critical values and urgent concerns
9. Return ONLY valid JSON, no additional text
10. IMPORTANT: Include ALL test results with their exact timestamps - do not skip any results
11. For each type of test (e.g., blood tests), create a separate visualization showing trends over time
12. If multiple results exist for the same test on different dates, include ALL of them
13. Generate visualizations for ALL numeric measurements that have multiple values over time

Format your response like this:
```json
{
    "your": "json here"
}
```"#;

const CHAT_TEMPLATE: &str = r#"Medical Record:
{medical_text}

Question from doctor: {question}

Please provide a thorough, evidence-based response relevant to the medical record and question.
Include specific information from the record where appropriate. If you're unsure about something,
indicate the limitations clearly instead of making assumptions."#;

pub fn summary_prompt(medical_text: &str) -> String {
    SUMMARY_TEMPLATE.replacen(RECORD_PLACEHOLDER, medical_text, 1)
}

pub fn chat_prompt(medical_text: &str, question: &str) -> String {
    // Question first so a record containing "{question}" is left alone
    CHAT_TEMPLATE
        .replacen(QUESTION_PLACEHOLDER, question, 1)
        .replacen(RECORD_PLACEHOLDER, medical_text, 1)
}

/// Prompt for the web search model, with optional context prepended.
pub fn search_prompt(query: &str, context: Option<&str>) -> String {
    match context.filter(|c| !c.trim().is_empty()) {
        Some(context) => format!("Context: {}\nQuery: {}", context, query),
        None => query.to_string(),
    }
}
