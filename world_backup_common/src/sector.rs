use thiserror::Error;

/// Edge length of a sector in world units
pub const SECTOR_SIZE: i32 = 8;

/// Largest world size whose outermost sector still fits in `i32` coordinates
pub const MAX_WORLD_SIZE: u32 = ((i32::MAX / SECTOR_SIZE - 1) * SECTOR_SIZE) as u32;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("world size {0} exceeds the largest scannable size {max}", max = MAX_WORLD_SIZE)]
pub struct WorldTooLarge(pub u32);

/// An 8x8 query cell, identified by its minimum corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sector {
    pub x: i32,
    pub z: i32,
}

impl Sector {
    /// Sector holding the given world position
    pub fn containing(x: i32, z: i32) -> Self {
        Self {
            x: x.div_euclid(SECTOR_SIZE) * SECTOR_SIZE,
            z: z.div_euclid(SECTOR_SIZE) * SECTOR_SIZE,
        }
    }

    pub fn contains(&self, x: i32, z: i32) -> bool {
        Self::containing(x, z) == *self
    }
}

/// Number of sectors needed on each side of the origin to cover a world
pub fn scan_range(world_size: u32) -> i32 {
    world_size.div_ceil(SECTOR_SIZE as u32) as i32
}

/// Square grid of sectors covering a world, walked x-major then z
#[derive(Debug, Clone)]
pub struct SectorGrid {
    range: i32,
    next: Option<(i32, i32)>,
}

impl SectorGrid {
    pub fn covering(world_size: u32) -> Result<Self, WorldTooLarge> {
        if world_size > MAX_WORLD_SIZE {
            return Err(WorldTooLarge(world_size));
        }
        let range = scan_range(world_size);
        Ok(Self { range, next: Some((-range, -range)) })
    }

    pub fn range(&self) -> i32 {
        self.range
    }

    /// Total sectors in the grid, `(2R+1)^2`
    pub fn sector_count(&self) -> u64 {
        let side = 2 * self.range as u64 + 1;
        side * side
    }

    /// Whether a sector lies inside the grid
    pub fn includes(&self, sector: Sector) -> bool {
        let bound = self.range * SECTOR_SIZE;
        (-bound..=bound).contains(&sector.x) && (-bound..=bound).contains(&sector.z)
    }
}

impl Iterator for SectorGrid {
    type Item = Sector;

    fn next(&mut self) -> Option<Sector> {
        let (kx, kz) = self.next?;
        self.next = if kz < self.range {
            Some((kx, kz + 1))
        } else if kx < self.range {
            Some((kx + 1, -self.range))
        } else {
            None
        };
        Some(Sector { x: kx * SECTOR_SIZE, z: kz * SECTOR_SIZE })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_of_size_ten_spans_five_by_five() {
        let grid = SectorGrid::covering(10).unwrap();
        assert_eq!(grid.range(), 2);
        assert_eq!(grid.sector_count(), 25);

        let sectors: Vec<Sector> = grid.collect();
        assert_eq!(sectors.len(), 25);
        let axis = [-16, -8, 0, 8, 16];
        for (i, sector) in sectors.iter().enumerate() {
            assert_eq!(sector.x, axis[i / 5], "x is the outer loop");
            assert_eq!(sector.z, axis[i % 5]);
        }
    }

    #[test]
    fn sector_count_matches_formula() {
        for size in [0u32, 1, 7, 8, 9, 16, 17, 100, 1000] {
            let range = (size as f64 / 8.0).ceil() as usize;
            let grid = SectorGrid::covering(size).unwrap();
            assert_eq!(grid.sector_count(), (2 * range as u64 + 1).pow(2));
            assert_eq!(grid.count(), (2 * range + 1).pow(2), "size {}", size);
        }
    }

    #[test]
    fn zero_size_world_is_a_single_sector() {
        let sectors: Vec<Sector> = SectorGrid::covering(0).unwrap().collect();
        assert_eq!(sectors, vec![Sector { x: 0, z: 0 }]);
    }

    #[test]
    fn sector_bounds_are_half_open() {
        let sector = Sector { x: -8, z: 8 };
        assert!(sector.contains(-8, 8));
        assert!(sector.contains(-1, 15));
        assert!(!sector.contains(0, 8));
        assert!(!sector.contains(-8, 16));
    }

    #[test]
    fn containing_floors_negative_positions() {
        assert_eq!(Sector::containing(-1, -9), Sector { x: -8, z: -16 });
        assert_eq!(Sector::containing(0, 7), Sector { x: 0, z: 0 });
        assert_eq!(Sector::containing(8, 15), Sector { x: 8, z: 8 });
    }

    #[test]
    fn grid_includes_only_its_own_sectors() {
        let grid = SectorGrid::covering(10).unwrap();
        assert!(grid.includes(Sector { x: 16, z: -16 }));
        assert!(!grid.includes(Sector { x: 24, z: 0 }));
    }

    #[test]
    fn oversized_world_is_refused() {
        assert_eq!(SectorGrid::covering(u32::MAX).unwrap_err(), WorldTooLarge(u32::MAX));
        assert!(SectorGrid::covering(MAX_WORLD_SIZE + 1).is_err());

        let mut grid = SectorGrid::covering(MAX_WORLD_SIZE).unwrap();
        let first = grid.next().unwrap();
        assert_eq!(first, Sector { x: -(MAX_WORLD_SIZE as i32), z: -(MAX_WORLD_SIZE as i32) });
        assert!(!grid.includes(Sector::containing(i32::MAX, i32::MIN)));
        assert!(grid.includes(Sector { x: MAX_WORLD_SIZE as i32, z: 0 }));
    }

    #[test]
    fn extreme_positions_stay_in_their_sector() {
        let edge = Sector::containing(i32::MAX, i32::MIN);
        assert_eq!(edge, Sector { x: i32::MAX - 7, z: i32::MIN });
        assert!(edge.contains(i32::MAX, i32::MIN));
        assert!(!edge.contains(i32::MAX - 8, i32::MIN));
    }
}
