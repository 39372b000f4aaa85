// Unit normalizer - converts raw game units into physical quantities
use super::constants::*;
use super::raw::RawSample;
use serde::Serialize;
use std::f64::consts::PI;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuelTank {
    pub amount_mb: f64,
    pub capacity_mb: f64,
    pub amount_liters: f64,
    pub capacity_liters: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FluidTank {
    pub amount_liters: f64,
    pub capacity_liters: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SteamStorage {
    pub amount_liters: f64,
    pub capacity_liters: f64,
    pub percentage: f64,
    pub pressure_bar: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowRate {
    pub mb_per_tick: f64,
    pub liters_per_second: f64,
    pub kg_per_second: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlasmaTemperature {
    pub celsius: f64,
    pub kelvin: f64,
    pub megakelvin: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseTemperature {
    pub celsius: f64,
    pub kelvin: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredEnergy {
    pub stored_fe: f64,
    pub capacity_fe: f64,
    pub stored_joules: f64,
    pub capacity_joules: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedReactorMetrics {
    pub plasma_temperature: PlasmaTemperature,
    pub case_temperature: CaseTemperature,
    pub deuterium: Option<FuelTank>,
    pub injection: FlowRate,
    pub water: Option<FluidTank>,
    pub steam_production: FlowRate,
    pub steam_storage: Option<SteamStorage>,
    pub energy: StoredEnergy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rotation {
    pub flow_rate_mb: f64,
    pub max_flow_rate_mb: f64,
    /// Steam flow over maximum flow. Not clamped: overspeed shows up as > 1.
    pub efficiency: f64,
    pub rpm: f64,
    pub angular_velocity_rad_s: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerOutput {
    pub fe_per_tick: f64,
    pub max_fe_per_tick: f64,
    pub watts: f64,
    pub max_watts: f64,
    pub efficiency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyStorage {
    pub stored_joules: f64,
    pub capacity_joules: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SteamConsumption {
    pub amount_kg: f64,
    pub capacity_kg: f64,
    /// Electrical watts per kilogram of stored steam.
    pub specific_consumption: f64,
    pub rankine_efficiency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedTurbineMetrics {
    pub rotation: Rotation,
    pub power: PowerOutput,
    pub energy_storage: EnergyStorage,
    pub steam_consumption: Option<SteamConsumption>,
}

/// `part / whole`, or 0 when the denominator is missing, zero or negative.
pub fn ratio(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        let value = part / whole;
        if value.is_finite() { value } else { 0.0 }
    } else {
        0.0
    }
}

/// Guarded percentage, always within [0, 100].
pub fn percentage(part: f64, whole: f64) -> f64 {
    (ratio(part, whole) * 100.0).clamp(0.0, 100.0)
}

fn mb_to_liters(mb: f64) -> f64 {
    mb / MB_PER_BUCKET * BUCKET_TO_LITERS
}

fn flow(mb_per_tick: f64, density: f64) -> FlowRate {
    FlowRate {
        mb_per_tick,
        liters_per_second: mb_to_liters(mb_per_tick) / TICK_TO_SECONDS,
        kg_per_second: mb_per_tick / MB_PER_BUCKET * density / TICK_TO_SECONDS,
    }
}

fn celsius_to_kelvin(celsius: f64) -> f64 {
    celsius + CELSIUS_TO_KELVIN
}

pub fn normalize_reactor(raw: &RawSample) -> NormalizedReactorMetrics {
    let plasma_celsius = raw.number("plasma_temperature");
    let plasma_kelvin = celsius_to_kelvin(plasma_celsius);
    let case_celsius = raw.number("case_temperature");

    let deuterium = raw.tank_amount("deuterium").map(|amount| {
        let capacity = raw.number("deuterium_capacity");
        FuelTank {
            amount_mb: amount,
            capacity_mb: capacity,
            amount_liters: mb_to_liters(amount),
            capacity_liters: mb_to_liters(capacity),
            percentage: percentage(amount, capacity),
        }
    });

    let water = raw.tank_amount("water").map(|amount| {
        let capacity = raw.number("water_capacity");
        FluidTank {
            amount_liters: mb_to_liters(amount),
            capacity_liters: mb_to_liters(capacity),
            percentage: percentage(amount, capacity),
        }
    });

    let steam_storage = raw.tank_amount("steam").map(|amount| {
        let capacity = raw.number("steam_capacity");
        SteamStorage {
            amount_liters: mb_to_liters(amount),
            capacity_liters: mb_to_liters(capacity),
            percentage: percentage(amount, capacity),
            pressure_bar: ratio(amount, capacity) * MAX_STEAM_PRESSURE_BAR,
        }
    });

    let energy = raw.number("energy");
    let max_energy = raw.number("max_energy");

    NormalizedReactorMetrics {
        plasma_temperature: PlasmaTemperature {
            celsius: plasma_celsius,
            kelvin: plasma_kelvin,
            megakelvin: plasma_kelvin / 1e6,
            percentage: percentage(plasma_celsius, raw.number("max_plasma_temperature")),
        },
        case_temperature: CaseTemperature {
            celsius: case_celsius,
            kelvin: celsius_to_kelvin(case_celsius),
        },
        deuterium,
        injection: flow(raw.number("injection_rate"), WATER_DENSITY),
        water,
        steam_production: flow(raw.number("production_rate"), STEAM_DENSITY),
        steam_storage,
        energy: StoredEnergy {
            stored_fe: energy,
            capacity_fe: max_energy,
            stored_joules: energy * FE_TO_JOULES,
            capacity_joules: max_energy * FE_TO_JOULES,
            percentage: percentage(energy, max_energy),
        },
    }
}

pub fn normalize_turbine(raw: &RawSample) -> NormalizedTurbineMetrics {
    let flow_rate = raw.number("flow_rate");
    let max_flow_rate = raw.number("max_flow_rate");
    let flow_ratio = ratio(flow_rate, max_flow_rate);
    let rpm = flow_ratio * RPM_BASE * 2.0;

    let production = raw.number("production_rate");
    let max_production = raw.number("max_production");
    let watts = production * FE_TO_JOULES / TICK_TO_SECONDS;

    let energy = raw.number("energy");
    let max_energy = raw.number("max_energy");

    let steam_consumption = raw.tank_amount("steam").map(|amount| {
        let amount_kg = amount / MB_PER_BUCKET * STEAM_DENSITY;
        let capacity_kg = raw.number("steam_capacity") / MB_PER_BUCKET * STEAM_DENSITY;
        SteamConsumption {
            amount_kg,
            capacity_kg,
            specific_consumption: ratio(watts, amount_kg),
            rankine_efficiency: (ratio(watts, amount_kg * RANKINE_REFERENCE_J_PER_KG) * 100.0)
                .min(100.0),
        }
    });

    NormalizedTurbineMetrics {
        rotation: Rotation {
            flow_rate_mb: flow_rate,
            max_flow_rate_mb: max_flow_rate,
            efficiency: flow_ratio,
            rpm,
            angular_velocity_rad_s: rpm * 2.0 * PI / 60.0,
        },
        power: PowerOutput {
            fe_per_tick: production,
            max_fe_per_tick: max_production,
            watts,
            max_watts: max_production * FE_TO_JOULES / TICK_TO_SECONDS,
            efficiency: ratio(production, max_production),
        },
        energy_storage: EnergyStorage {
            stored_joules: energy * FE_TO_JOULES,
            capacity_joules: max_energy * FE_TO_JOULES,
            percentage: percentage(energy, max_energy),
        },
        steam_consumption,
    }
}
