/**
 * Offline World
 *
 * An `ObjectStore` backed by a JSON snapshot of one world's placed objects.
 * It answers the same calls a live server would, so a backup and restore
 * can be rehearsed against a local copy before touching the real world.
 * Changes are written back to the snapshot file when the session exits.
 */
use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use world_backup_common::{Coordinates, ObjectRecord, Sector, SectorGrid};

use crate::client::{Credentials, ObjectStore};
use crate::error::WorldError;

/// Object as the world server stores it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellObject {
    pub number: u32,
    pub owner: u32,
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub object_type: i32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub yaw: i32,
    pub tilt: i32,
    pub roll: i32,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub data: String,
}

impl From<CellObject> for ObjectRecord {
    fn from(obj: CellObject) -> Self {
        ObjectRecord {
            number: obj.number,
            object_type: obj.object_type,
            x: obj.x,
            y: obj.y,
            z: obj.z,
            yaw: obj.yaw,
            tilt: obj.tilt,
            roll: obj.roll,
            model: obj.model,
            description: obj.description,
            action: obj.action,
            data: obj.data,
            owner: Some(obj.owner),
            timestamp: Some(obj.timestamp),
        }
    }
}

/// On-disk world snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub name: String,
    pub size: u32,
    #[serde(default)]
    pub objects: Vec<CellObject>,
}

pub struct OfflineWorld {
    path: Option<PathBuf>,
    snapshot: RefCell<WorldSnapshot>,
    citizen: Cell<Option<u32>>,
    entered: Cell<bool>,
    position: Cell<Coordinates>,
    dirty: Cell<bool>,
}

impl OfflineWorld {
    /// In-memory world that is never saved
    pub fn new(snapshot: WorldSnapshot) -> Self {
        Self {
            path: None,
            snapshot: RefCell::new(snapshot),
            citizen: Cell::new(None),
            entered: Cell::new(false),
            position: Cell::new(Coordinates::ORIGIN),
            dirty: Cell::new(false),
        }
    }

    /// Load a snapshot; it is saved back to the same path on exit
    pub fn load(path: &Path) -> Result<Self, WorldError> {
        let text = fs::read_to_string(path)
            .map_err(|e| WorldError::NotFound(format!("world file {}: {}", path.display(), e)))?;
        let snapshot: WorldSnapshot = serde_json::from_str(&text)
            .map_err(|e| WorldError::Sdk(format!("world file {}: {}", path.display(), e)))?;
        log::info!(
            "Loaded offline world {} ({} objects) from {}",
            snapshot.name,
            snapshot.objects.len(),
            path.display()
        );
        let mut world = Self::new(snapshot);
        world.path = Some(path.to_path_buf());
        Ok(world)
    }

    /// Copy of the current world state
    #[cfg(test)]
    pub fn snapshot(&self) -> WorldSnapshot {
        self.snapshot.borrow().clone()
    }

    #[cfg(test)]
    pub fn position(&self) -> Coordinates {
        self.position.get()
    }

    fn require_entered(&self) -> Result<(), WorldError> {
        if self.entered.get() {
            Ok(())
        } else {
            Err(WorldError::InvalidOperation("not in a world".to_string()))
        }
    }

    fn save(&self, path: &Path) -> Result<(), WorldError> {
        let text = serde_json::to_string_pretty(&*self.snapshot.borrow())
            .map_err(|e| WorldError::Sdk(e.to_string()))?;
        // Write beside the target first so a failed save keeps the old file
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, text)
            .and_then(|_| fs::rename(&tmp, path))
            .map_err(|e| WorldError::Sdk(format!("saving world file {}: {}", path.display(), e)))?;
        log::info!("Saved offline world to {}", path.display());
        Ok(())
    }
}

impl ObjectStore for OfflineWorld {
    type Object = CellObject;

    fn login(&self, credentials: &Credentials) -> Result<(), WorldError> {
        if credentials.citizen == 0 {
            return Err(WorldError::InvalidOperation("citizen number must be positive".to_string()));
        }
        if credentials.password.is_empty() {
            return Err(WorldError::InvalidOperation("password required".to_string()));
        }
        self.citizen.set(Some(credentials.citizen));
        Ok(())
    }

    fn enter_world(&self, name: &str) -> Result<(), WorldError> {
        if self.citizen.get().is_none() {
            return Err(WorldError::InvalidOperation("login required".to_string()));
        }
        let snapshot = self.snapshot.borrow();
        if !snapshot.name.eq_ignore_ascii_case(name) {
            return Err(WorldError::NotFound(format!("world {} not found", name)));
        }
        self.entered.set(true);
        Ok(())
    }

    fn move_to(&self, position: Coordinates) -> Result<(), WorldError> {
        self.require_entered()?;
        self.position.set(position);
        Ok(())
    }

    fn world_size(&self) -> Result<u32, WorldError> {
        self.require_entered()?;
        Ok(self.snapshot.borrow().size)
    }

    fn query_sector(&self, sector: Sector) -> Result<Vec<CellObject>, WorldError> {
        self.require_entered()?;
        Ok(self.snapshot.borrow().objects.iter()
            .filter(|o| sector.contains(o.x, o.z))
            .cloned()
            .collect())
    }

    fn add_object(&self, record: &ObjectRecord) -> Result<u32, WorldError> {
        self.require_entered()?;
        let mut snapshot = self.snapshot.borrow_mut();
        let sector = Sector::containing(record.x, record.z);
        let grid = SectorGrid::covering(snapshot.size).map_err(|e| WorldError::InvalidOperation(e.to_string()))?;
        if !grid.includes(sector) {
            return Err(WorldError::InvalidOperation(format!(
                "position ({}, {}) is outside the world", record.x, record.z
            )));
        }
        let number = snapshot.objects.iter().map(|o| o.number).max().unwrap_or(0)
            .checked_add(1)
            .ok_or_else(|| WorldError::InvalidOperation("no free object number".to_string()))?;
        snapshot.objects.push(CellObject {
            number,
            owner: self.citizen.get().unwrap_or_default(),
            timestamp: chrono::Utc::now().timestamp(),
            object_type: record.object_type,
            x: record.x,
            y: record.y,
            z: record.z,
            yaw: record.yaw,
            tilt: record.tilt,
            roll: record.roll,
            model: record.model.clone(),
            description: record.description.clone(),
            action: record.action.clone(),
            data: record.data.clone(),
        });
        self.dirty.set(true);
        Ok(number)
    }

    fn delete_object(&self, number: u32, x: i32, z: i32) -> Result<(), WorldError> {
        self.require_entered()?;
        let sector = Sector::containing(x, z);
        let mut snapshot = self.snapshot.borrow_mut();
        let index = snapshot.objects.iter()
            .position(|o| o.number == number && sector.contains(o.x, o.z))
            .ok_or_else(|| WorldError::NotFound(format!("object {} not found near ({}, {})", number, x, z)))?;
        snapshot.objects.remove(index);
        self.dirty.set(true);
        Ok(())
    }

    fn exit(&self) -> Result<(), WorldError> {
        self.entered.set(false);
        self.citizen.set(None);
        if let Some(path) = &self.path {
            if self.dirty.replace(false) {
                self.save(path)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn cell(number: u32, x: i32, z: i32, model: &str) -> CellObject {
        CellObject {
            number,
            owner: 318,
            timestamp: 1_633_046_400,
            object_type: 1,
            x,
            y: 0,
            z,
            yaw: 0,
            tilt: 0,
            roll: 0,
            model: model.to_string(),
            description: String::new(),
            action: String::new(),
            data: String::new(),
        }
    }

    /// Size-10 world with objects spread over several sectors, already entered
    pub(crate) fn entered_world(objects: Vec<CellObject>) -> OfflineWorld {
        let world = OfflineWorld::new(WorldSnapshot { name: "Mars".to_string(), size: 10, objects });
        world.login(&Credentials { citizen: 318, password: "pw".to_string(), name: "Archivist".to_string() }).unwrap();
        world.enter_world("Mars").unwrap();
        world
    }

    #[test]
    fn calls_require_login_and_world() {
        let world = OfflineWorld::new(WorldSnapshot { name: "Mars".to_string(), size: 10, objects: vec![] });
        assert!(world.enter_world("Mars").is_err());
        assert!(world.world_size().is_err());
        assert!(world.login(&Credentials { citizen: 0, password: "pw".to_string(), name: "Archivist".to_string() }).is_err());
        world.login(&Credentials { citizen: 5, password: "pw".to_string(), name: "Archivist".to_string() }).unwrap();
        assert!(matches!(world.enter_world("Venus"), Err(WorldError::NotFound(_))));
        world.enter_world("mars").unwrap();
        assert_eq!(world.world_size().unwrap(), 10);
    }

    #[test]
    fn query_returns_objects_in_sector() {
        let world = entered_world(vec![cell(1, 0, 0, "a"), cell(2, 7, 7, "b"), cell(3, -1, 0, "c")]);
        let found = world.query_sector(Sector { x: 0, z: 0 }).unwrap();
        assert_eq!(found.iter().map(|o| o.number).collect::<Vec<_>>(), vec![1, 2]);
        let found = world.query_sector(Sector { x: -8, z: 0 }).unwrap();
        assert_eq!(found[0].number, 3);
    }

    #[test]
    fn delete_needs_matching_sector() {
        let world = entered_world(vec![cell(1, 3, 3, "a")]);
        assert!(matches!(world.delete_object(1, 12, 3), Err(WorldError::NotFound(_))));
        world.delete_object(1, 3, 3).unwrap();
        assert!(world.snapshot().objects.is_empty());
    }

    #[test]
    fn add_assigns_fresh_numbers_and_rejects_outside() {
        let world = entered_world(vec![cell(9, 0, 0, "a")]);
        let mut record: ObjectRecord = cell(9, 1, 1, "b").into();
        assert_eq!(world.add_object(&record).unwrap(), 10);

        record.x = 500;
        assert!(matches!(world.add_object(&record), Err(WorldError::InvalidOperation(_))));
        assert_eq!(world.snapshot().objects.len(), 2);
    }

    #[test]
    fn add_refuses_when_numbers_run_out() {
        let world = entered_world(vec![cell(u32::MAX, 0, 0, "a")]);
        let err = world.add_object(&cell(1, 1, 1, "b").into()).unwrap_err();
        assert_eq!(err, WorldError::InvalidOperation("no free object number".to_string()));
        assert_eq!(world.snapshot().objects.len(), 1);
    }

    #[test]
    fn add_in_oversized_world_is_an_error() {
        let world = OfflineWorld::new(WorldSnapshot { name: "Mars".to_string(), size: u32::MAX, objects: vec![] });
        world.login(&Credentials { citizen: 318, password: "pw".to_string(), name: "Archivist".to_string() }).unwrap();
        world.enter_world("Mars").unwrap();
        assert!(matches!(world.add_object(&cell(1, 1, 1, "b").into()), Err(WorldError::InvalidOperation(_))));
    }

    #[test]
    fn exit_saves_changes_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.json");
        let snapshot = WorldSnapshot { name: "Mars".to_string(), size: 10, objects: vec![cell(1, 0, 0, "a")] };
        fs::write(&path, serde_json::to_string(&snapshot).unwrap()).unwrap();

        let world = OfflineWorld::load(&path).unwrap();
        world.login(&Credentials { citizen: 318, password: "pw".to_string(), name: "Archivist".to_string() }).unwrap();
        world.enter_world("Mars").unwrap();
        world.delete_object(1, 0, 0).unwrap();
        world.exit().unwrap();

        let saved: WorldSnapshot = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(saved.objects.is_empty());
        assert!(!path.with_extension("tmp").exists());
    }
}
