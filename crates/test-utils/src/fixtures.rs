//! Common values shared by the lidar tests.

/// Vendor channel tokens as they appear in binary headers.
pub mod vendor_names {
    pub const PARALLEL_532: &str = "532 paral";
    pub const CROSSPOL_532: &str = "532 perp";
    pub const IR_1064: &str = "1,064";
    /// Matches no naming pattern; decoders drop it.
    pub const UNKNOWN: &str = "355 raman";
}

/// Expanded channel names produced for the narrow field of view.
pub mod nfov {
    pub const PARALLEL_532: &str = "p01 - Pr2 532nm NFOV";
    pub const IR_1064: &str = "p02 - Pr2 1064nm NFOV";
    pub const CROSSPOL_532: &str = "p03 - Pr2 532nm crosspol NFOV";
    pub const DEPOLARIZATION: &str = "p07 - Depolarization Ratio 532nm NFOV";
    pub const COLOR: &str = "p09 - Color Ratio 1064nm/532nm NFOV";
}

/// Expanded channel names produced for the wide field of view.
pub mod wfov {
    pub const PARALLEL_532: &str = "p04 - Pr2 532nm WFOV";
    pub const IR_1064: &str = "p05 - Pr2 1064nm WFOV";
    pub const CROSSPOL_532: &str = "p06 - Pr2 532nm crosspol WFOV";
    pub const DEPOLARIZATION: &str = "p08 - Depolarization Ratio 532nm WFOV";
    pub const COLOR: &str = "p10 - Color Ratio 1064nm/532nm WFOV";
}

/// Campaign day used by generated data (2004-03-19).
pub const CAMPAIGN_DATE: (i32, u32, u32) = (2004, 3, 19);

/// Hour of the first generated profile.
pub const CAMPAIGN_START_HOUR: u32 = 8;
