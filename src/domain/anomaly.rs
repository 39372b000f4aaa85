// Anomaly detector - threshold checks over normalized readings
use super::normalizer::{NormalizedReactorMetrics, NormalizedTurbineMetrics};
use serde::Deserialize;

/// Operating limits. The defaults are the plant's fixed safety table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub max_plasma_temp_k: f64,
    pub max_case_temp_k: f64,
    pub max_rpm: f64,
    pub min_fuel_percentage: f64,
    pub max_temp_gradient_k: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_plasma_temp_k: 2e8,
            max_case_temp_k: 1500.0,
            max_rpm: 3600.0,
            min_fuel_percentage: 5.0,
            max_temp_gradient_k: 1e8,
        }
    }
}

/// Evaluate every check, in a fixed order: plasma temperature, case
/// temperature, RPM, fuel, plasma/case gradient. Checks whose readings were
/// never reported cannot fire. An empty result means nominal.
pub fn detect_anomalies(
    reactor: Option<&NormalizedReactorMetrics>,
    turbine: Option<&NormalizedTurbineMetrics>,
    limits: &Thresholds,
) -> Vec<String> {
    let mut anomalies = Vec::new();

    let plasma_k = reactor.map(|r| r.plasma_temperature.kelvin);
    let case_k = reactor.map(|r| r.case_temperature.kelvin);

    if let Some(plasma) = plasma_k.filter(|t| *t > limits.max_plasma_temp_k) {
        anomalies.push(format!("Temperatura do plasma crítica: {plasma:.2e} K"));
    }

    if let Some(case) = case_k.filter(|t| *t > limits.max_case_temp_k) {
        anomalies.push(format!("Temperatura do casco alta: {case:.0} K"));
    }

    if let Some(rpm) = turbine
        .map(|t| t.rotation.rpm)
        .filter(|rpm| *rpm > limits.max_rpm)
    {
        anomalies.push(format!("Rotação excessiva: {rpm:.0} RPM"));
    }

    if let Some(fuel) = reactor
        .and_then(|r| r.deuterium.as_ref())
        .map(|d| d.percentage)
        .filter(|pct| *pct < limits.min_fuel_percentage)
    {
        anomalies.push(format!("Combustível crítico: {fuel:.1}%"));
    }

    if let (Some(plasma), Some(case)) = (plasma_k, case_k) {
        let gradient = plasma - case;
        if gradient > limits.max_temp_gradient_k {
            anomalies.push(format!("Gradiente térmico excessivo: {gradient:.2e} K"));
        }
    }

    anomalies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::normalizer::{normalize_reactor, normalize_turbine};
    use crate::domain::raw::RawSample;
    use chrono::Utc;
    use serde_json::{json, Value};

    fn sample(value: Value) -> RawSample {
        RawSample::new(value.as_object().cloned().unwrap_or_default(), Utc::now())
    }

    fn nominal_reactor() -> NormalizedReactorMetrics {
        normalize_reactor(&sample(json!({
            "plasma_temperature": 50_000_000,
            "case_temperature": 800,
            "deuterium": {"amount": 100_000},
            "deuterium_capacity": 1_000_000,
            "injection_rate": 50
        })))
    }

    #[test]
    fn nominal_reading_has_no_anomalies() {
        let reactor = nominal_reactor();
        let turbine = normalize_turbine(&sample(json!({"flow_rate": 500, "max_flow_rate": 1000})));
        let anomalies = detect_anomalies(Some(&reactor), Some(&turbine), &Thresholds::default());
        assert!(anomalies.is_empty(), "unexpected: {anomalies:?}");
    }

    #[test]
    fn hot_plasma_is_flagged() {
        let reactor = normalize_reactor(&sample(json!({
            "plasma_temperature": 2.1e8,
            "case_temperature": 800,
            "deuterium": {"amount": 100_000},
            "deuterium_capacity": 1_000_000
        })));
        let anomalies = detect_anomalies(Some(&reactor), None, &Thresholds::default());
        assert!(anomalies[0].starts_with("Temperatura do plasma crítica"));
    }

    #[test]
    fn all_checks_run_in_fixed_order() {
        let reactor = normalize_reactor(&sample(json!({
            "plasma_temperature": 3e8,
            "case_temperature": 2000,
            "deuterium": {"amount": 10},
            "deuterium_capacity": 1_000_000
        })));
        let turbine = normalize_turbine(&sample(json!({"flow_rate": 2000, "max_flow_rate": 1000})));

        let anomalies = detect_anomalies(Some(&reactor), Some(&turbine), &Thresholds::default());
        let prefixes = [
            "Temperatura do plasma crítica",
            "Temperatura do casco alta",
            "Rotação excessiva",
            "Combustível crítico",
            "Gradiente térmico excessivo",
        ];
        assert_eq!(anomalies.len(), prefixes.len());
        for (anomaly, prefix) in anomalies.iter().zip(prefixes) {
            assert!(anomaly.starts_with(prefix), "{anomaly} should start with {prefix}");
        }
        assert_eq!(anomalies[2], "Rotação excessiva: 7200 RPM");
        assert_eq!(anomalies[3], "Combustível crítico: 0.0%");
    }

    #[test]
    fn empty_tank_is_critical_in_either_shape() {
        for tank in [json!(0), json!({"amount": 0})] {
            let reactor = normalize_reactor(&sample(json!({
                "case_temperature": 800,
                "deuterium": tank,
                "deuterium_capacity": 1_000_000
            })));
            let anomalies = detect_anomalies(Some(&reactor), None, &Thresholds::default());
            assert_eq!(anomalies, vec!["Combustível crítico: 0.0%".to_string()]);
        }
    }

    #[test]
    fn unreported_readings_cannot_fire() {
        let reactor = normalize_reactor(&sample(json!({"plasma_temperature": 1000})));
        assert!(detect_anomalies(Some(&reactor), None, &Thresholds::default()).is_empty());
        assert!(detect_anomalies(None, None, &Thresholds::default()).is_empty());
    }

    #[test]
    fn custom_limits_apply() {
        let limits = Thresholds {
            max_case_temp_k: 1000.0,
            ..Thresholds::default()
        };
        let anomalies = detect_anomalies(Some(&nominal_reactor()), None, &limits);
        assert_eq!(anomalies, vec!["Temperatura do casco alta: 1073 K".to_string()]);
    }
}
