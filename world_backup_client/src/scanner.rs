use std::collections::VecDeque;

use world_backup_common::{ObjectRecord, SectorGrid};

use crate::client::ObjectStore;
use crate::error::WorldError;

/// Lazily walks every sector of a world and yields the objects found
///
/// A failed sector query is yielded once and ends the scan.
pub struct SectorScanner<'a, S: ObjectStore> {
    store: &'a S,
    sectors: SectorGrid,
    pending: VecDeque<ObjectRecord>,
    sectors_visited: usize,
    failed: bool,
}

/// Start a scan of the world the store is currently in
pub fn scan<S: ObjectStore>(store: &S) -> Result<SectorScanner<'_, S>, WorldError> {
    let world_size = store.world_size()?;
    let sectors = SectorGrid::covering(world_size).map_err(|e| WorldError::InvalidOperation(e.to_string()))?;
    log::info!(
        "Scanning world of size {}: range {}, {} sectors",
        world_size,
        sectors.range(),
        sectors.sector_count()
    );
    Ok(SectorScanner {
        store,
        sectors,
        pending: VecDeque::new(),
        sectors_visited: 0,
        failed: false,
    })
}

#[cfg(test)]
impl<S: ObjectStore> SectorScanner<'_, S> {
    pub fn sectors_visited(&self) -> usize {
        self.sectors_visited
    }
}

impl<S: ObjectStore> Iterator for SectorScanner<'_, S> {
    type Item = Result<ObjectRecord, WorldError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Some(Ok(record));
            }
            if self.failed {
                return None;
            }
            let sector = self.sectors.next()?;
            self.sectors_visited += 1;
            log::info!("Scanning sector ({}, {})", sector.x, sector.z);
            match self.store.query_sector(sector) {
                Ok(objects) => self.pending.extend(objects.into_iter().map(Into::into)),
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
