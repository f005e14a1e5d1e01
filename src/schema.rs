/// Column-name constants for the market dataset.
/// Single source of truth - shared by loading, filtering and charting.

// ── Raw observation columns ─────────────────────────────────────────────────
pub mod observation {
    pub const LOCATION: &str = "location";
    pub const SYMBOL: &str = "symbol";
    pub const QUANTITY_AVAILABLE: &str = "quantityavailable";
    pub const PRICE_PER_UNIT: &str = "priceperunit";
    pub const TIMESTAMP: &str = "timestamp";

    pub const REQUIRED: [&str; 5] = [
        LOCATION,
        SYMBOL,
        QUANTITY_AVAILABLE,
        PRICE_PER_UNIT,
        TIMESTAMP,
    ];
}

// ── Derived columns ─────────────────────────────────────────────────────────
pub mod derived {
    pub const GOODS: &str = "goods";
    pub const EPOCH_SECONDS: &str = "time";
    pub const TIME_DIFF: &str = "time_diff";
    pub const QUANTITY_DIFF: &str = "q_diff";
    pub const PRICE_DIFF: &str = "price_diff";

    pub const GOODS_SEPARATOR: &str = "-";
}

// ── Enriched table layout ───────────────────────────────────────────────────
pub mod enriched {
    use super::{derived, observation};

    pub const COLUMNS: [&str; 10] = [
        observation::LOCATION,
        observation::SYMBOL,
        observation::QUANTITY_AVAILABLE,
        observation::PRICE_PER_UNIT,
        observation::TIMESTAMP,
        derived::GOODS,
        derived::EPOCH_SECONDS,
        derived::TIME_DIFF,
        derived::QUANTITY_DIFF,
        derived::PRICE_DIFF,
    ];
}

// ── Selection fallbacks ─────────────────────────────────────────────────────
pub mod selection {
    pub const DEFAULT_LOCATION: &str = "OE-PM-TR";
    pub const DEFAULT_SYMBOL: &str = "FUEL";
}
