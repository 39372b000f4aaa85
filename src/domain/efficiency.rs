// Efficiency calculator - derived plant efficiencies
use super::constants::{DEUTERIUM_ENERGY_PER_LITER, STEAM_ENTHALPY_KJ_PER_KG};
use super::normalizer::{NormalizedReactorMetrics, NormalizedTurbineMetrics};
use serde::Serialize;

/// Plant efficiencies in percent. An absent field means "unknown", which is
/// distinct from a measured 0%.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EfficiencyMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thermal_efficiency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steam_cycle_efficiency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_efficiency: Option<f64>,
}

/// Turbine electrical output against the energy release implied by the
/// deuterium currently held by the reactor.
pub fn thermal_efficiency(
    reactor: &NormalizedReactorMetrics,
    turbine: &NormalizedTurbineMetrics,
) -> Option<f64> {
    let fuel = reactor.deuterium.as_ref()?;
    let theoretical_energy = fuel.amount_liters * DEUTERIUM_ENERGY_PER_LITER;
    if theoretical_energy > 0.0 {
        Some(turbine.power.watts / theoretical_energy * 100.0)
    } else {
        None
    }
}

/// Turbine electrical output against the thermal power carried by the
/// reactor's steam production.
pub fn steam_cycle_efficiency(
    reactor: &NormalizedReactorMetrics,
    turbine: &NormalizedTurbineMetrics,
) -> Option<f64> {
    let thermal_power_kw = reactor.steam_production.kg_per_second * STEAM_ENTHALPY_KJ_PER_KG;
    if thermal_power_kw > 0.0 {
        Some(turbine.power.watts / 1000.0 / thermal_power_kw * 100.0)
    } else {
        None
    }
}

pub fn calculate_efficiency(
    reactor: &NormalizedReactorMetrics,
    turbine: &NormalizedTurbineMetrics,
) -> EfficiencyMetrics {
    let thermal = thermal_efficiency(reactor, turbine);
    let steam_cycle = steam_cycle_efficiency(reactor, turbine);

    // Presence, not magnitude, gates the product: a measured 0% still yields 0.
    let overall = match (thermal, steam_cycle) {
        (Some(t), Some(s)) => Some(t * s / 100.0),
        _ => None,
    };

    EfficiencyMetrics {
        thermal_efficiency: thermal,
        steam_cycle_efficiency: steam_cycle,
        overall_efficiency: overall,
    }
}
