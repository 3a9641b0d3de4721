// Region Markers
//
// *La Région* (The Region) - Which part of the print the slicer is extruding

use serde::{Deserialize, Serialize};

/// Comment prefix slicers use to label the feature type of the moves that follow.
pub const TYPE_MARKER: &str = ";TYPE:";

/// Feature-type name that opens a support region.
pub const SUPPORT_TYPE: &str = "Support material";

/// Material region an extrusion move is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Region {
    /// Support structures (including support interfaces).
    Support,
    /// Everything else: perimeters, infill, skirt, ...
    #[default]
    NonSupport,
}

impl Region {
    /// Region opened by a `;TYPE:` marker line, or `None` if the line is not a marker.
    ///
    /// `Support material` and `Support material interface` enter the support
    /// region; any other type name leaves it.
    pub fn from_marker(line: &str) -> Option<Self> {
        let start = line.find(TYPE_MARKER)? + TYPE_MARKER.len();
        let name = line[start..].trim();

        if name.starts_with(SUPPORT_TYPE) {
            Some(Self::Support)
        } else {
            Some(Self::NonSupport)
        }
    }
}
