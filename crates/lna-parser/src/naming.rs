//! Display names of binary channels.
//!
//! Vendor tokens such as `532 paral` or `1,064` are expanded to
//! `pNN - <description> <FOV>`, where the positional index starts at 1 for
//! the narrow field of view and at 4 for the wide one. Ratio channels use
//! the fixed indices 07 to 10.

use lidar_common::Fov;

/// Physical channel recognised from a vendor token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRole {
    Parallel532,
    Crosspol532,
    Infrared1064,
}

impl ChannelRole {
    /// Recognise a vendor token. `None` for channels the decoder drops.
    pub fn from_vendor(token: &str) -> Option<Self> {
        let token = token.to_ascii_lowercase();
        if token.contains("532") {
            if token.contains("perp") {
                Some(ChannelRole::Crosspol532)
            } else {
                Some(ChannelRole::Parallel532)
            }
        } else if token.contains("1,06") || token.contains("1.06") || token.contains("1064") {
            Some(ChannelRole::Infrared1064)
        } else {
            None
        }
    }

    fn offset(&self) -> u32 {
        match self {
            ChannelRole::Parallel532 => 0,
            ChannelRole::Infrared1064 => 1,
            ChannelRole::Crosspol532 => 2,
        }
    }

    fn description(&self) -> &'static str {
        match self {
            ChannelRole::Parallel532 => "Pr2 532nm",
            ChannelRole::Infrared1064 => "Pr2 1064nm",
            ChannelRole::Crosspol532 => "Pr2 532nm crosspol",
        }
    }

    /// Display name of this channel for a telescope.
    pub fn display_name(&self, fov: Fov) -> String {
        format!(
            "p{:02} - {} {}",
            fov.start_index() + self.offset(),
            self.description(),
            fov.label()
        )
    }
}

/// Expand a vendor token to its display name.
pub fn expand_channel_name(vendor: &str, fov: Fov) -> Option<String> {
    ChannelRole::from_vendor(vendor).map(|role| role.display_name(fov))
}

/// Display name of the 532 nm depolarization ratio.
pub fn depolarization_name(fov: Fov) -> String {
    let index = match fov {
        Fov::Narrow => 7,
        Fov::Wide => 8,
    };
    format!("p{:02} - Depolarization Ratio 532nm {}", index, fov.label())
}

/// Display name of the 1064/532 nm colour ratio.
pub fn color_ratio_name(fov: Fov) -> String {
    let index = match fov {
        Fov::Narrow => 9,
        Fov::Wide => 10,
    };
    format!("p{:02} - Color Ratio 1064nm/532nm {}", index, fov.label())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{nfov, vendor_names, wfov};

    #[test]
    fn test_expand_narrow() {
        assert_eq!(
            expand_channel_name(vendor_names::PARALLEL_532, Fov::Narrow).as_deref(),
            Some(nfov::PARALLEL_532)
        );
        assert_eq!(
            expand_channel_name(vendor_names::CROSSPOL_532, Fov::Narrow).as_deref(),
            Some(nfov::CROSSPOL_532)
        );
        assert_eq!(
            expand_channel_name(vendor_names::IR_1064, Fov::Narrow).as_deref(),
            Some(nfov::IR_1064)
        );
    }

    #[test]
    fn test_expand_wide() {
        assert_eq!(
            expand_channel_name("532 paral", Fov::Wide).as_deref(),
            Some(wfov::PARALLEL_532)
        );
        assert_eq!(
            expand_channel_name("532perp", Fov::Wide).as_deref(),
            Some(wfov::CROSSPOL_532)
        );
        assert_eq!(
            expand_channel_name("1.064", Fov::Wide).as_deref(),
            Some(wfov::IR_1064)
        );
    }

    #[test]
    fn test_plain_532_is_parallel() {
        assert_eq!(
            ChannelRole::from_vendor("532"),
            Some(ChannelRole::Parallel532)
        );
    }

    #[test]
    fn test_unknown_token() {
        assert_eq!(expand_channel_name(vendor_names::UNKNOWN, Fov::Narrow), None);
        assert_eq!(expand_channel_name("", Fov::Wide), None);
    }

    #[test]
    fn test_ratio_names() {
        assert_eq!(depolarization_name(Fov::Narrow), nfov::DEPOLARIZATION);
        assert_eq!(depolarization_name(Fov::Wide), wfov::DEPOLARIZATION);
        assert_eq!(color_ratio_name(Fov::Narrow), nfov::COLOR);
        assert_eq!(color_ratio_name(Fov::Wide), wfov::COLOR);
    }
}
