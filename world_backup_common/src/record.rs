use serde::{Deserialize, Deserializer, Serialize};

/// A point in world units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Coordinates {
    pub const ORIGIN: Coordinates = Coordinates { x: 0, y: 0, z: 0 };

    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// One placed world object, as captured by a scan and written to a backup.
///
/// Position and orientation are mandatory when decoding. The text attributes
/// accept a missing key or `null` and come back as an empty string, so a
/// record read from an older or hand-edited backup is always complete.
/// `owner` and `timestamp` are build metadata some servers report; they are
/// left out of the encoded line when unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub number: u32,
    #[serde(rename = "type")]
    pub object_type: i32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub yaw: i32,
    pub tilt: i32,
    pub roll: i32,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub model: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub action: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ObjectRecord {
    pub fn position(&self) -> Coordinates {
        Coordinates::new(self.x, self.y, self.z)
    }

    /// Short human-readable label used in console progress lines
    pub fn label(&self) -> String {
        format!("{} at {}, {}, {}", self.model, self.x, self.y, self.z)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
