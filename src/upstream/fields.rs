//! Field names used by the upstream JSON payload
//!
//! Upstream renames are rare but do happen; they only require edits here
//! (and in [`FuelType::upstream_field`](crate::fuel::FuelType::upstream_field)
//! for price columns).

/// Top-level array enumerating the stations of the municipality
pub const STATION_LIST: &str = "ListaEESSPrecio";

/// Station brand/sign, used as the station name
pub const STATION_NAME: &str = "Rótulo";

pub const STATION_LATITUDE: &str = "Latitud";

pub const STATION_LONGITUDE: &str = "Longitud (WGS84)";

pub const STATION_ADDRESS: &str = "Dirección";

pub const STATION_OPENING_HOURS: &str = "Horario";

/// Upstream status message; informative only
pub const QUERY_RESULT: &str = "ResultadoConsulta";
