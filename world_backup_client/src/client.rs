/**
 * World Server Connectivity
 *
 * The world SDK is reached only through the `ObjectStore` trait, so the
 * scanner and pipelines can run against a real server binding, the offline
 * snapshot world, or a test fake. `Session` owns the adapter for the length
 * of a run and always leaves the world when it is dropped.
 */
use world_backup_common::{Coordinates, ObjectRecord, Sector};

use crate::error::WorldError;

/// Account used to authenticate against the world server
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub citizen: u32,
    pub password: String,
    /// Name the session appears under in the world
    pub name: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("citizen", &self.citizen)
            .field("password", &"<hidden>")
            .field("name", &self.name)
            .finish()
    }
}

/// Primitive calls offered by the world SDK
///
/// Every call may fail remotely. Methods take `&self` so a scan can keep
/// querying while objects from earlier sectors are being deleted.
pub trait ObjectStore {
    /// Raw object shape returned by sector queries
    type Object: Into<ObjectRecord>;

    fn login(&self, credentials: &Credentials) -> Result<(), WorldError>;
    fn enter_world(&self, name: &str) -> Result<(), WorldError>;
    fn move_to(&self, position: Coordinates) -> Result<(), WorldError>;
    /// Configured size attribute of the entered world
    fn world_size(&self) -> Result<u32, WorldError>;
    fn query_sector(&self, sector: Sector) -> Result<Vec<Self::Object>, WorldError>;
    /// Build an object from a record, returning the number the server assigned
    fn add_object(&self, record: &ObjectRecord) -> Result<u32, WorldError>;
    fn delete_object(&self, number: u32, x: i32, z: i32) -> Result<(), WorldError>;
    /// Leave the world and release the connection
    fn exit(&self) -> Result<(), WorldError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connected,
    LoggedIn,
    InWorld,
}

/// A single world session with guaranteed teardown
pub struct Session<S: ObjectStore> {
    store: S,
    state: SessionState,
    world: Option<String>,
}

impl<S: ObjectStore> Session<S> {
    pub fn new(store: S) -> Self {
        Self { store, state: SessionState::Connected, world: None }
    }

    #[cfg(test)]
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn world(&self) -> Option<&str> {
        self.world.as_deref()
    }

    pub fn login(&mut self, credentials: &Credentials) -> Result<(), WorldError> {
        if self.state != SessionState::Connected {
            return Err(WorldError::InvalidOperation("already logged in".to_string()));
        }
        self.store.login(credentials)?;
        self.state = SessionState::LoggedIn;
        log::info!("Logged in as {} (citizen {})", credentials.name, credentials.citizen);
        Ok(())
    }

    pub fn enter_world(&mut self, name: &str) -> Result<(), WorldError> {
        if self.state != SessionState::LoggedIn {
            return Err(WorldError::InvalidOperation(format!("cannot enter {} before login", name)));
        }
        self.store.enter_world(name)?;
        self.state = SessionState::InWorld;
        self.world = Some(name.to_string());
        log::info!("Entered world {}", name);
        Ok(())
    }

    pub fn move_to(&self, position: Coordinates) -> Result<(), WorldError> {
        self.require_world()?;
        self.store.move_to(position)?;
        log::info!("Moved to ({}, {}, {})", position.x, position.y, position.z);
        Ok(())
    }

    /// Adapter handle for stages that need an entered world
    pub fn require_world(&self) -> Result<&S, WorldError> {
        match self.state {
            SessionState::InWorld => Ok(&self.store),
            _ => Err(WorldError::InvalidOperation("not in a world".to_string())),
        }
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: ObjectStore> Drop for Session<S> {
    fn drop(&mut self) {
        match self.store.exit() {
            Ok(()) => log::info!("Session closed"),
            Err(e) => log::warn!("Failed to close world session: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Records calls; optionally refuses login
    struct FakeStore {
        exits: Rc<Cell<u32>>,
        reject_login: bool,
    }

    impl ObjectStore for FakeStore {
        type Object = ObjectRecord;

        fn login(&self, _credentials: &Credentials) -> Result<(), WorldError> {
            if self.reject_login {
                return Err("invalid password".into());
            }
            Ok(())
        }
        fn enter_world(&self, _name: &str) -> Result<(), WorldError> {
            Ok(())
        }
        fn move_to(&self, _position: Coordinates) -> Result<(), WorldError> {
            Ok(())
        }
        fn world_size(&self) -> Result<u32, WorldError> {
            Ok(0)
        }
        fn query_sector(&self, _sector: Sector) -> Result<Vec<ObjectRecord>, WorldError> {
            Ok(Vec::new())
        }
        fn add_object(&self, _record: &ObjectRecord) -> Result<u32, WorldError> {
            Ok(1)
        }
        fn delete_object(&self, _number: u32, _x: i32, _z: i32) -> Result<(), WorldError> {
            Ok(())
        }
        fn exit(&self) -> Result<(), WorldError> {
            self.exits.set(self.exits.get() + 1);
            Ok(())
        }
    }

    fn credentials() -> Credentials {
        Credentials { citizen: 318, password: "hunter2".to_string(), name: "Portal Mage".to_string() }
    }

    #[test]
    fn session_walks_login_then_world() {
        let exits = Rc::new(Cell::new(0));
        let mut session = Session::new(FakeStore { exits: exits.clone(), reject_login: false });
        assert!(session.require_world().is_err());
        assert!(session.enter_world("Mars").is_err(), "world before login");

        session.login(&credentials()).unwrap();
        session.enter_world("Mars").unwrap();
        session.move_to(Coordinates::ORIGIN).unwrap();
        assert_eq!(session.state(), SessionState::InWorld);
        assert_eq!(session.world(), Some("Mars"));

        drop(session);
        assert_eq!(exits.get(), 1);
    }

    #[test]
    fn failed_login_still_releases_connection() {
        let exits = Rc::new(Cell::new(0));
        {
            let mut session = Session::new(FakeStore { exits: exits.clone(), reject_login: true });
            assert!(session.login(&credentials()).is_err());
        }
        assert_eq!(exits.get(), 1);
    }

    #[test]
    fn credentials_debug_hides_password() {
        let shown = format!("{:?}", credentials());
        assert!(!shown.contains("hunter2"));
    }
}
