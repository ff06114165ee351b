#[cfg(test)]
mod tests {
    use gol_core::{Algorithm, Grid, Topology, CHANGE_MASK, NEIGHBOURS_MASK};

    const SEED: u64 = 42;
    const ALGORITHMS: [Algorithm; 3] =
        [Algorithm::Basic, Algorithm::BasicDiff, Algorithm::Neighbours];

    fn randomly_filled(width: usize, height: usize, topology: Topology, seed: u64) -> Vec<Grid> {
        let grids: Vec<Grid> = ALGORITHMS
            .iter()
            .map(|&algorithm| {
                let grid = Grid::new(width, height, topology, algorithm).unwrap();
                grid.randomize(Some(seed), None);
                grid
            })
            .collect();
        assert_fields_equal(&grids);
        grids
    }

    fn alive_bitmap(grid: &Grid) -> Vec<u8> {
        grid.read().cells().iter().map(|&c| c >> 7).collect()
    }

    fn assert_fields_equal(grids: &[Grid]) {
        let example = &grids[0];
        let reference = alive_bitmap(example);
        for grid in grids.iter().skip(1) {
            let bitmap = alive_bitmap(grid);
            if bitmap == reference {
                continue;
            }
            let w = grid.width();
            let mut picture = String::new();
            for y in 0..grid.height() {
                picture.push('|');
                picture.extend(
                    bitmap[y * w..(y + 1) * w]
                        .iter()
                        .map(|&c| if c == 0 { ' ' } else { '#' }),
                );
                picture.push('|');
                picture.extend(
                    reference[y * w..(y + 1) * w]
                        .iter()
                        .map(|&c| if c == 0 { ' ' } else { '#' }),
                );
                picture.push_str("|\n");
            }
            panic!(
                "{:?} diverged from {:?}:\n{}",
                grid.algorithm(),
                example.algorithm(),
                picture
            );
        }
    }

    #[test]
    fn differential_equivalence_torus() {
        let grids = randomly_filled(16, 16, Topology::Torus, SEED);
        for _ in 0..32 {
            for grid in &grids {
                grid.step();
            }
            assert_fields_equal(&grids);
        }
    }

    #[test]
    fn differential_equivalence_bounded() {
        let grids = randomly_filled(24, 17, Topology::Bounded, SEED);
        for _ in 0..32 {
            for grid in &grids {
                grid.step();
            }
            assert_fields_equal(&grids);
        }
    }

    #[test]
    fn differential_equivalence_many_seeds() {
        for seed in [1, 7, 1234] {
            for topology in [Topology::Torus, Topology::Bounded] {
                let grids = randomly_filled(12, 12, topology, seed);
                for _ in 0..16 {
                    for grid in &grids {
                        grid.step();
                    }
                    assert_fields_equal(&grids);
                }
            }
        }
    }

    #[test]
    fn blinker_oscillates_on_bounded_field() {
        let grid = Grid::new(3, 3, Topology::Bounded, Algorithm::Basic).unwrap();
        for x in 0..3 {
            grid.set_cell(x, 1, true);
        }

        grid.step();
        let vertical: Vec<(usize, usize)> = (0..3)
            .flat_map(|y| (0..3).map(move |x| (x, y)))
            .filter(|&(x, y)| grid.get_cell(x, y))
            .collect();
        assert_eq!(vertical, vec![(1, 0), (1, 1), (1, 2)]);

        grid.step();
        let horizontal: Vec<(usize, usize)> = (0..3)
            .flat_map(|y| (0..3).map(move |x| (x, y)))
            .filter(|&(x, y)| grid.get_cell(x, y))
            .collect();
        assert_eq!(horizontal, vec![(0, 1), (1, 1), (2, 1)]);
    }

    #[test]
    fn glider_translates_by_one_per_period_on_torus() {
        const GLIDER: [(usize, usize); 5] = [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)];
        const N: usize = 16;

        for algorithm in ALGORITHMS {
            let grid = Grid::new(N, N, Topology::Torus, algorithm).unwrap();
            for (x, y) in GLIDER {
                grid.set_cell(x + 5, y + 5, true);
            }
            let before = alive_bitmap(&grid);

            for _ in 0..4 {
                grid.step();
            }

            // The glider moves one cell down-right per 4 generations,
            // wrapping at the edges.
            let mut expected = vec![0u8; N * N];
            for y in 0..N {
                for x in 0..N {
                    expected[(x + 1) % N + ((y + 1) % N) * N] = before[x + y * N];
                }
            }
            assert_eq!(
                alive_bitmap(&grid),
                expected,
                "glider failed under {algorithm:?}"
            );
        }
    }

    #[test]
    fn glider_wraps_all_the_way_around() {
        const GLIDER: [(usize, usize); 5] = [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)];
        const N: usize = 8;

        let grid = Grid::new(N, N, Topology::Torus, Algorithm::Basic).unwrap();
        for (x, y) in GLIDER {
            grid.set_cell(x, y, true);
        }
        let before = alive_bitmap(&grid);
        for _ in 0..4 * N {
            grid.step();
        }
        assert_eq!(alive_bitmap(&grid), before);
    }

    #[test]
    fn blinker_across_torus_seam() {
        let grid = Grid::new(5, 5, Topology::Torus, Algorithm::Basic).unwrap();
        for x in [4, 0, 1] {
            grid.set_cell(x, 2, true);
        }

        grid.step();
        assert!(grid.get_cell(0, 1));
        assert!(grid.get_cell(0, 2));
        assert!(grid.get_cell(0, 3));
        assert_eq!(grid.population(), 3);
    }

    #[test]
    fn bounded_edge_counts_outside_as_dead() {
        // A row of three on the top edge: the two ends die (one live
        // neighbour each), the middle survives and births one cell below.
        let grid = Grid::new(3, 3, Topology::Bounded, Algorithm::Basic).unwrap();
        for x in 0..3 {
            grid.set_cell(x, 0, true);
        }

        grid.step();
        assert!(!grid.get_cell(0, 0));
        assert!(grid.get_cell(1, 0));
        assert!(grid.get_cell(1, 1));
        assert!(!grid.get_cell(2, 0));
        assert_eq!(grid.population(), 2);
    }

    #[test]
    fn clear_then_step_stays_dead() {
        for algorithm in ALGORITHMS {
            let grid = Grid::new(10, 10, Topology::Torus, algorithm).unwrap();
            grid.randomize(Some(SEED), None);
            grid.clear();
            grid.step();
            assert_eq!(grid.population(), 0);
            assert!(grid.read().cells().iter().all(|&c| c == 0));
        }
    }

    #[test]
    fn changed_flags_mark_flipped_cells() {
        let grid = Grid::new(5, 5, Topology::Bounded, Algorithm::Basic).unwrap();
        for x in 1..4 {
            grid.set_cell(x, 2, true);
        }
        grid.step();

        let read = grid.read();
        for y in 0..5 {
            for x in 0..5 {
                let flipped = read.cells()[x + y * 5] & CHANGE_MASK != 0;
                // Blinker: ends die, cells above/below the centre are born.
                let expected = matches!((x, y), (1, 2) | (3, 2) | (2, 1) | (2, 3));
                assert_eq!(flipped, expected, "changed flag wrong at ({x}, {y})");
            }
        }
    }

    #[test]
    fn neighbours_payload_tracks_live_counts() {
        let grid = Grid::new(12, 12, Topology::Torus, Algorithm::Neighbours).unwrap();
        grid.randomize(Some(SEED), None);

        for _ in 0..8 {
            let cells = grid.read().cells().to_vec();
            let alive: Vec<u8> = cells.iter().map(|&c| c >> 7).collect();
            for y in 0..12usize {
                for x in 0..12usize {
                    let mut count = 0;
                    for dy in [11, 0, 1] {
                        for dx in [11, 0, 1] {
                            if dx == 0 && dy == 0 {
                                continue;
                            }
                            count += alive[(x + dx) % 12 + (y + dy) % 12 * 12];
                        }
                    }
                    assert_eq!(
                        cells[x + y * 12] & NEIGHBOURS_MASK,
                        count,
                        "stored count wrong at ({x}, {y})"
                    );
                }
            }
            grid.step();
        }
    }

    #[test]
    fn set_cell_is_idempotent_and_population_tracks() {
        let grid = Grid::new(4, 4, Topology::Bounded, Algorithm::Neighbours).unwrap();
        grid.set_cell(1, 1, true);
        grid.set_cell(1, 1, true);
        assert_eq!(grid.population(), 1);
        grid.set_cell(1, 1, false);
        assert_eq!(grid.population(), 0);
        // Counts must return to zero once the cell is dead again.
        assert!(grid
            .read()
            .cells()
            .iter()
            .all(|&c| c & NEIGHBOURS_MASK == 0));
    }

    #[test]
    fn zero_sized_grid_is_rejected() {
        assert!(Grid::new(0, 4, Topology::Torus, Algorithm::Basic).is_err());
        assert!(Grid::new(4, 0, Topology::Torus, Algorithm::Basic).is_err());
    }

    #[test]
    fn concurrent_stepping_and_reading() {
        const GENERATIONS: usize = 200;

        let reference = Grid::new(16, 16, Topology::Torus, Algorithm::Basic).unwrap();
        reference.randomize(Some(SEED), None);
        for _ in 0..GENERATIONS {
            reference.step();
        }

        let grid = Grid::new(16, 16, Topology::Torus, Algorithm::Basic).unwrap();
        grid.randomize(Some(SEED), None);
        std::thread::scope(|s| {
            let stepper = std::sync::Arc::new(s.spawn(|| {
                for _ in 0..GENERATIONS {
                    grid.step();
                }
            }));
            let grid = &grid;
            for _ in 0..3 {
                let stepper = stepper.clone();
                s.spawn(move || {
                    while !stepper.is_finished() {
                        // Readers must always observe a complete generation:
                        // the packed bytes never hold a count above 8.
                        let read = grid.read();
                        for &c in read.cells() {
                            assert!(c & NEIGHBOURS_MASK <= 8);
                        }
                    }
                });
            }
        });
        assert_eq!(alive_bitmap(&grid), alive_bitmap(&reference));
    }
}
