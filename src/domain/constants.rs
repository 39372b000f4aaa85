// Conversion constants between game-internal and physical units

/// One bucket of fluid, in liters. Raw fluid quantities are milli-buckets.
pub const BUCKET_TO_LITERS: f64 = 1000.0;

/// Milli-buckets per bucket.
pub const MB_PER_BUCKET: f64 = 1000.0;

/// One game tick, in seconds (20 ticks per second).
pub const TICK_TO_SECONDS: f64 = 1.0 / 20.0;

/// One unit of native energy (FE), in joules.
pub const FE_TO_JOULES: f64 = 2.5;

/// Saturated steam density (kg/L).
pub const STEAM_DENSITY: f64 = 0.6;

/// Water density (kg/L).
pub const WATER_DENSITY: f64 = 1.0;

/// Turbine RPM at half of the maximum steam flow.
pub const RPM_BASE: f64 = 1800.0;

pub const CELSIUS_TO_KELVIN: f64 = 273.15;

/// Full steam tank pressure proxy (bar).
pub const MAX_STEAM_PRESSURE_BAR: f64 = 50.0;

/// Theoretical energy release per liter of deuterium (J/L).
pub const DEUTERIUM_ENERGY_PER_LITER: f64 = 8.6e10;

/// Thermal energy carried per kilogram of steam (kJ/kg).
pub const STEAM_ENTHALPY_KJ_PER_KG: f64 = 2800.0;

/// Reference enthalpy drop used for the Rankine estimate (J/kg).
pub const RANKINE_REFERENCE_J_PER_KG: f64 = 2500.0;
