//! Display-facing description of the world
//!
//! Renderers receive a flat list of tagged entities; nothing here feeds back
//! into the simulation.

use crate::agent::Mobility;
use crate::core_types::{Coord, HumanId};
use crate::grid::Terrain;
use crate::perception::visible_cells;
use crate::simulation::World;
use serde::{Deserialize, Serialize};

/// Visual category of an active human
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HumanVisual {
    Normal,
    Panic,
    Incapacitated,
    Carrying,
}

impl HumanVisual {
    /// Incapacitated beats Panic beats Carrying beats Normal
    #[must_use]
    pub fn classify(mobility: Mobility, carrying: bool) -> Self {
        match mobility {
            Mobility::Incapacitated => Self::Incapacitated,
            Mobility::Panic => Self::Panic,
            Mobility::Normal if carrying => Self::Carrying,
            Mobility::Normal => Self::Normal,
        }
    }
}

/// Every kind of drawable entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Human { id: HumanId, visual: HumanVisual },
    Wall,
    Furniture,
    Door,
    EmergencyExit,
    Hazard,
    DeadHuman { id: HumanId },
    /// Cell inside some human's field of view
    Sight,
}

impl EntityKind {
    /// Draw order, higher on top
    #[must_use]
    pub fn layer(self) -> u8 {
        match self {
            Self::Wall | Self::Furniture | Self::Door | Self::EmergencyExit => 1,
            Self::Hazard => 3,
            Self::DeadHuman { .. } => 4,
            Self::Human {
                visual: HumanVisual::Incapacitated,
                ..
            } => 6,
            Self::Human { .. } => 5,
            Self::Sight => 7,
        }
    }

    fn from_terrain(terrain: Terrain) -> Option<Self> {
        match terrain {
            Terrain::Empty => None,
            Terrain::Wall => Some(Self::Wall),
            Terrain::Furniture => Some(Self::Furniture),
            Terrain::Door => Some(Self::Door),
            Terrain::EmergencyExit => Some(Self::EmergencyExit),
        }
    }
}

/// One entity to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portrayal {
    pub coord: Coord,
    pub kind: EntityKind,
    pub layer: u8,
}

impl Portrayal {
    fn new(coord: Coord, kind: EntityKind) -> Self {
        Self {
            coord,
            kind,
            layer: kind.layer(),
        }
    }
}

/// Everything drawable in `world`, terrain first
///
/// Sight markers (one per distinct visible cell) are included only when
/// `visualise_vision` is set.
#[must_use]
pub fn portray(
    world: &World,
    visualise_vision: bool,
    furniture_blocks_sight: bool,
) -> Vec<Portrayal> {
    let grid = world.grid();
    let mut out: Vec<Portrayal> = grid
        .coords()
        .filter_map(|c| EntityKind::from_terrain(grid.terrain(c)).map(|k| Portrayal::new(c, k)))
        .collect();

    out.extend(
        world
            .hazard()
            .cells()
            .iter()
            .map(|&c| Portrayal::new(c, EntityKind::Hazard)),
    );
    out.extend(
        world
            .dead()
            .iter()
            .map(|d| Portrayal::new(d.position, EntityKind::DeadHuman { id: d.id })),
    );
    out.extend(world.active_humans().map(|h| {
        let carrying = world.carries().carried_by(h.id()).is_some();
        let visual = HumanVisual::classify(h.mobility(), carrying);
        Portrayal::new(h.position(), EntityKind::Human { id: h.id(), visual })
    }));

    if visualise_vision {
        let mut seen: Vec<Coord> = world
            .active_humans()
            .flat_map(|h| {
                visible_cells(grid, h.position(), h.sight_radius(), furniture_blocks_sight)
            })
            .collect();
        seen.sort_unstable();
        seen.dedup();
        out.extend(seen.into_iter().map(|c| Portrayal::new(c, EntityKind::Sight)));
    }
    out
}

impl World {
    /// Display list for this world; see [`portray`]
    #[must_use]
    pub fn portray(&self, visualise_vision: bool, furniture_blocks_sight: bool) -> Vec<Portrayal> {
        portray(self, visualise_vision, furniture_blocks_sight)
    }
}

/// Render a portrayal as ASCII, topmost layer per cell
///
/// `@` normal, `!` panic, `x` incapacitated, `&` carrying, `+` body, `~` water,
/// `*` sight, terrain by its floorplan symbol, `.` empty.
#[must_use]
pub fn render_ascii(rows: usize, cols: usize, items: &[Portrayal]) -> String {
    let mut cells = vec![('.', 0u8); rows * cols];
    for item in items {
        if item.coord.row >= rows || item.coord.col >= cols || item.kind == EntityKind::Sight {
            continue;
        }
        let symbol = match item.kind {
            EntityKind::Human { visual, .. } => match visual {
                HumanVisual::Normal => '@',
                HumanVisual::Panic => '!',
                HumanVisual::Incapacitated => 'x',
                HumanVisual::Carrying => '&',
            },
            EntityKind::DeadHuman { .. } => '+',
            EntityKind::Hazard => '~',
            EntityKind::Wall => Terrain::Wall.symbol(),
            EntityKind::Furniture => Terrain::Furniture.symbol(),
            EntityKind::Door => Terrain::Door.symbol(),
            EntityKind::EmergencyExit => Terrain::EmergencyExit.symbol(),
            EntityKind::Sight => '*',
        };
        let slot = &mut cells[item.coord.row * cols + item.coord.col];
        if item.layer >= slot.1 {
            *slot = (symbol, item.layer);
        }
    }
    let mut out = String::with_capacity(rows * (cols + 1));
    for row in cells.chunks(cols.max(1)).take(rows) {
        out.extend(row.iter().map(|(c, _)| *c));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::SpawnSpec;
    use crate::grid::Grid;

    #[test]
    fn test_visual_precedence() {
        assert_eq!(
            HumanVisual::classify(Mobility::Incapacitated, true),
            HumanVisual::Incapacitated
        );
        assert_eq!(HumanVisual::classify(Mobility::Panic, true), HumanVisual::Panic);
        assert_eq!(HumanVisual::classify(Mobility::Normal, true), HumanVisual::Carrying);
        assert_eq!(HumanVisual::classify(Mobility::Normal, false), HumanVisual::Normal);
    }

    #[test]
    fn test_portray_layers_every_entity() {
        let grid = Grid::new(3, 3)
            .with_terrain(Coord::new(0, 0), Terrain::Wall)
            .unwrap()
            .with_terrain(Coord::new(2, 2), Terrain::EmergencyExit)
            .unwrap();
        let mut world = World::new(grid);
        let walker = world.spawn(SpawnSpec::at(Coord::new(1, 1))).unwrap();
        let victim = world.spawn(SpawnSpec::at(Coord::new(0, 2))).unwrap();
        world.flood(Coord::new(0, 2)).unwrap();

        let items = world.portray(false, true);
        assert!(items.contains(&Portrayal::new(Coord::new(0, 0), EntityKind::Wall)));
        assert!(items.contains(&Portrayal::new(Coord::new(2, 2), EntityKind::EmergencyExit)));
        assert!(items.contains(&Portrayal {
            coord: Coord::new(0, 2),
            kind: EntityKind::Hazard,
            layer: 3
        }));
        assert!(items.contains(&Portrayal {
            coord: Coord::new(0, 2),
            kind: EntityKind::DeadHuman { id: victim },
            layer: 4
        }));
        assert!(items.contains(&Portrayal {
            coord: Coord::new(1, 1),
            kind: EntityKind::Human {
                id: walker,
                visual: HumanVisual::Normal
            },
            layer: 5
        }));
        assert!(!items.iter().any(|p| p.kind == EntityKind::Sight));
    }

    #[test]
    fn test_vision_markers_on_request() {
        let mut world = World::new(Grid::new(5, 5));
        world.spawn(SpawnSpec::at(Coord::new(2, 2)).sight(1)).unwrap();
        let sight = world
            .portray(true, true)
            .into_iter()
            .filter(|p| p.kind == EntityKind::Sight)
            .count();
        assert_eq!(sight, 9);
    }

    #[test]
    fn test_ascii_shows_top_layer() {
        let mut world = World::new(Grid::new(2, 3));
        world.spawn(SpawnSpec::at(Coord::new(0, 0))).unwrap();
        world.flood(Coord::new(1, 2)).unwrap();
        let ascii = render_ascii(2, 3, &world.portray(false, true));
        assert_eq!(ascii, "@..\n..~\n");
    }
}
