use arrowflow::{BoundaryPolicy, FluidGrid};

fn seeded_grid(n: usize) -> FluidGrid {
    let mut grid = FluidGrid::new(n, 1.0, 1.0);
    for row in 0..n {
        for col in 0..n {
            let fx = ((row * 7 + col * 3) % 5) as f32 - 2.0;
            let fy = ((row * 2 + col * 5) % 7) as f32 - 3.0;
            grid.add_force(row, col, fx * 0.25, fy * 0.25);
        }
    }
    grid
}

#[test]
fn test_advecting_zero_field_stays_zero() {
    let mut grid = FluidGrid::new(8, 1.0, 1.0).with_dt(5.0);
    for _ in 0..10 {
        grid.swap();
        grid.advect_u();
        grid.advect_v();
        grid.boundary();
    }
    assert!(grid.current().u.iter().all(|&u| u == 0.0));
    assert!(grid.current().v.iter().all(|&v| v == 0.0));
}

#[test]
fn test_advection_spreads_a_spike() {
    let mut grid = FluidGrid::new(4, 1.0, 1.0);
    grid.add_force(1, 1, 2.0, 0.0);
    assert_eq!(grid.get_u(1, 1), 2.0);

    grid.swap();
    grid.advect_u();

    // Back-trace from (1,1) lands at x = 1 - 0.1 * 2 = 0.8 between two cells
    let u = grid.get_u(1, 1);
    assert_ne!(u, 2.0);
    assert!((u - 1.6).abs() < 1e-6, "got {u}");
}

#[test]
fn test_advection_with_zero_dt_is_identity_on_interior() {
    let mut grid = FluidGrid::new(4, 1.0, 1.0).with_dt(0.0);
    grid.add_force(1, 1, 2.0, 0.5);
    grid.add_force(2, 1, -1.0, 0.25);

    grid.swap();
    grid.advect_u();
    grid.advect_v();

    assert_eq!(grid.get_u(1, 1), 2.0);
    assert_eq!(grid.get_v(1, 1), 0.5);
    assert_eq!(grid.get_u(2, 1), -1.0);
    assert_eq!(grid.get_v(2, 1), 0.25);
}

#[test]
fn test_advection_handles_huge_velocities() {
    let mut grid = FluidGrid::new(6, 1.0, 1.0).with_dt(1.0);
    grid.add_force(0, 0, 1e6, -1e6);
    grid.add_force(5, 5, -1e6, 1e6);
    grid.swap();
    grid.advect_u();
    grid.advect_v();
    assert!(grid.current().u.iter().all(|u| u.is_finite()));
    assert!(grid.current().v.iter().all(|v| v.is_finite()));
}

#[test]
fn test_mirror_boundary_negates_wall_normal_velocity() {
    let n = 7;
    let mut grid = seeded_grid(n);
    grid.boundary();

    for k in 1..n - 1 {
        assert_eq!(grid.get_v(0, k), -grid.get_v(1, k));
        assert_eq!(grid.get_v(n - 1, k), -grid.get_v(n - 2, k));
        assert_eq!(grid.get_u(k, 0), -grid.get_u(k, 1));
        assert_eq!(grid.get_u(k, n - 1), -grid.get_u(k, n - 2));

        // Tangential components copy the interior
        assert_eq!(grid.get_u(0, k), grid.get_u(1, k));
        assert_eq!(grid.get_v(k, n - 1), grid.get_v(k, n - 2));
    }
}

#[test]
fn test_zero_boundary_clears_wall_normal_velocity() {
    let n = 7;
    let mut grid = seeded_grid(n).with_boundary_policy(BoundaryPolicy::Zero);
    grid.boundary();

    for k in 1..n - 1 {
        assert_eq!(grid.get_v(0, k), 0.0);
        assert_eq!(grid.get_v(n - 1, k), 0.0);
        assert_eq!(grid.get_u(k, 0), 0.0);
        assert_eq!(grid.get_u(k, n - 1), 0.0);
    }
}

#[test]
fn test_corners_average_their_edge_neighbours() {
    let n = 5;
    let mut grid = seeded_grid(n);
    grid.boundary();

    let u = |r, c| grid.get_u(r, c);
    assert_eq!(u(0, 0), 0.5 * (u(0, 1) + u(1, 0)));
    assert_eq!(u(0, n - 1), 0.5 * (u(0, n - 2) + u(1, n - 1)));
    assert_eq!(u(n - 1, 0), 0.5 * (u(n - 2, 0) + u(n - 1, 1)));
    assert_eq!(u(n - 1, n - 1), 0.5 * (u(n - 2, n - 1) + u(n - 1, n - 2)));
}

#[test]
fn test_zero_policy_clears_corners() {
    let n = 5;
    let mut grid = seeded_grid(n).with_boundary_policy(BoundaryPolicy::Zero);
    grid.add_force(1, 1, -1.0, -1.0);
    grid.add_force(n - 2, n - 2, 1.0, 1.0);
    grid.boundary();

    for (row, col) in [(0, 0), (0, n - 1), (n - 1, 0), (n - 1, n - 1)] {
        assert_eq!(grid.get_u(row, col), 0.0, "u at ({row}, {col})");
        assert_eq!(grid.get_v(row, col), 0.0, "v at ({row}, {col})");
    }
}

#[test]
fn test_mirror_corners_cancel_to_zero() {
    let n = 5;
    let mut grid = seeded_grid(n);
    grid.boundary();

    for (row, col) in [(0, 0), (0, n - 1), (n - 1, 0), (n - 1, n - 1)] {
        assert_eq!(grid.get_u(row, col), 0.0, "u at ({row}, {col})");
        assert_eq!(grid.get_v(row, col), 0.0, "v at ({row}, {col})");
    }
}

#[test]
fn test_boundary_is_idempotent() {
    let mut grid = seeded_grid(6);
    grid.boundary();
    let once = grid.current().clone();
    grid.boundary();
    assert_eq!(grid.current(), &once);
}

#[test]
fn test_projection_reduces_divergence() {
    let n = 16;
    let mut grid = FluidGrid::new(n, 1.0, 1.0);
    grid.add_force(8, 8, 1.0, 0.0);

    let before_max = grid.max_abs_divergence();
    let before_left = grid.divergence_at(8, 7);
    let before_right = grid.divergence_at(8, 9);
    assert_eq!(before_max, 0.5);

    grid.project();

    assert!(grid.max_abs_divergence() < before_max);
    assert!(grid.divergence_at(8, 7).abs() < before_left.abs());
    assert!(grid.divergence_at(8, 9).abs() < before_right.abs());
}

#[test]
fn test_projection_on_center_of_smallest_grid() {
    let mut grid = FluidGrid::new(3, 1.0, 1.0);
    grid.add_force(1, 1, 1.0, 1.0);

    let before = grid.divergence_at(1, 1);
    grid.project();
    let after = grid.divergence_at(1, 1);

    assert!(after.abs() <= before.abs());
    assert!(grid.current().u.iter().all(|u| u.is_finite()));
}

#[test]
fn test_projection_reapplies_boundary() {
    let n = 8;
    let mut grid = seeded_grid(n);
    grid.project();

    for k in 1..n - 1 {
        assert_eq!(grid.get_v(0, k), -grid.get_v(1, k));
        assert_eq!(grid.get_u(k, n - 1), -grid.get_u(k, n - 2));
    }
}

#[test]
fn test_projection_leaves_zero_field_alone() {
    let mut grid = FluidGrid::new(10, 1.0, 1.0);
    grid.project();
    assert_eq!(grid.kinetic_energy(), 0.0);
}

#[test]
fn test_damping_scales_energy_by_factor_squared() {
    let mut grid = seeded_grid(9);
    let before = grid.kinetic_energy();
    assert!(before > 0.0);

    for factor in [0.5_f32, 0.9, 0.99] {
        let mut damped = grid.clone();
        damped.dampen(factor);
        let expected = before * factor * factor;
        let after = damped.kinetic_energy();
        assert!(
            (after - expected).abs() <= expected * 1e-5,
            "factor {factor}: expected {expected}, got {after}"
        );
    }

    grid.dampen(1.0);
    assert_eq!(grid.kinetic_energy(), before);
}

#[test]
fn test_dump_log_writes_current_field() {
    let mut grid = FluidGrid::new(3, 1.0, 1.0);
    grid.add_force(2, 1, 0.5, -0.25);

    let mut out = Vec::new();
    grid.dump_log(&mut out).unwrap();
    let snapshot: arrowflow::FieldSnapshot = serde_json::from_slice(&out).unwrap();

    assert_eq!(snapshot.grid_size, 3);
    assert_eq!(snapshot.u[2][1], 0.5);
    assert_eq!(snapshot.v[2][1], -0.25);
    assert_eq!(snapshot, grid.snapshot());
}
