//! Built-in ordering maps, one pattern per line in the `maps/` directory.

use std::sync::LazyLock;

use crate::core::SchemaOrderingMap;

const ORDINARY: &str = include_str!("maps/fpr12.txt");
const SIMPLIFIED: &str = include_str!("maps/fsm10.txt");
const NOTIFICATION: &str = include_str!("maps/notifica.txt");
const SETTLEMENT: &str = include_str!("maps/ivp.txt");

static ORDINARY_MAP: LazyLock<SchemaOrderingMap> =
    LazyLock::new(|| SchemaOrderingMap::parse_lenient(ORDINARY));
static SIMPLIFIED_MAP: LazyLock<SchemaOrderingMap> =
    LazyLock::new(|| SchemaOrderingMap::parse_lenient(SIMPLIFIED));
static NOTIFICATION_MAP: LazyLock<SchemaOrderingMap> =
    LazyLock::new(|| SchemaOrderingMap::parse_lenient(NOTIFICATION));
static SETTLEMENT_MAP: LazyLock<SchemaOrderingMap> =
    LazyLock::new(|| SchemaOrderingMap::parse_lenient(SETTLEMENT));

/// FatturaPA 1.2 (FPA12 and FPR12).
pub fn ordinary() -> &'static SchemaOrderingMap {
    &ORDINARY_MAP
}

/// Simplified invoice 1.0 (FSM10).
pub fn simplified() -> &'static SchemaOrderingMap {
    &SIMPLIFIED_MAP
}

/// `NotificaEsitoCommittente`.
pub fn notification() -> &'static SchemaOrderingMap {
    &NOTIFICATION_MAP
}

/// Periodic VAT settlement (`Fornitura`, IVP18).
pub fn settlement() -> &'static SchemaOrderingMap {
    &SETTLEMENT_MAP
}
