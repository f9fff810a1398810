//! Core BDD tests: construction scenarios, operator algebra, counting, and
//! enumeration.

use dd_rs::bdd::BddManager;
use dd_rs::error::ErrorKind;

fn mgr3() -> BddManager {
    BddManager::new(&[0, 1, 2], 256).unwrap()
}

// ─── Construction scenarios ────────────────────────────────────────────────────

#[test]
fn v0_and_not_v1_has_two_solutions() {
    // N=3, ordering [0,1,2], f = v0 AND NOT v1.
    let mgr = mgr3();
    let v0 = mgr.hi_var(0).unwrap();
    let not_v1 = mgr.lo_var(1).unwrap();
    let f = mgr.and(v0, not_v1).unwrap();

    assert_eq!(mgr.sat_count(f).unwrap(), 2);

    let sats: Vec<Vec<bool>> = mgr.sat_assignments(f).unwrap().collect();
    assert_eq!(
        sats,
        vec![vec![true, false, false], vec![true, false, true]]
    );
}

#[test]
fn ordering_with_out_of_range_variable_is_rejected() {
    // A 3-variable factory only knows variables 0..=2.
    let err = BddManager::new(&[2, 1, 3], 16).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn ordering_with_duplicate_variable_is_rejected() {
    let err = BddManager::new(&[0, 0, 1], 16).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

// ─── Operator algebra (verified by handle identity) ────────────────────────────

#[test]
fn double_negation_is_identity() {
    let mgr = mgr3();
    let x = mgr.hi_var(0).unwrap();
    let y = mgr.hi_var(1).unwrap();
    let f = mgr.or(x, y).unwrap();
    let nnf = mgr.not(mgr.not(f).unwrap()).unwrap();
    assert_eq!(nnf, f);
}

#[test]
fn idempotence_and_annihilation() {
    let mgr = mgr3();
    let x = mgr.hi_var(0).unwrap();
    let y = mgr.hi_var(2).unwrap();
    let f = mgr.xor(x, y).unwrap();

    assert_eq!(mgr.and(f, f).unwrap(), f);
    assert_eq!(mgr.or(f, f).unwrap(), f);
    assert_eq!(mgr.xor(f, f).unwrap(), mgr.lo());
    assert_eq!(mgr.xor(f, mgr.hi()).unwrap(), mgr.not(f).unwrap());
}

#[test]
fn de_morgan() {
    let mgr = mgr3();
    let x = mgr.hi_var(0).unwrap();
    let y = mgr.hi_var(1).unwrap();

    let lhs = mgr.not(mgr.and(x, y).unwrap()).unwrap();
    let rhs = mgr
        .or(mgr.not(x).unwrap(), mgr.not(y).unwrap())
        .unwrap();
    assert_eq!(lhs, rhs);
}

#[test]
fn commutativity_associativity_distributivity() {
    let mgr = mgr3();
    let x = mgr.hi_var(0).unwrap();
    let y = mgr.hi_var(1).unwrap();
    let z = mgr.hi_var(2).unwrap();

    assert_eq!(mgr.and(x, y).unwrap(), mgr.and(y, x).unwrap());
    assert_eq!(mgr.or(x, y).unwrap(), mgr.or(y, x).unwrap());
    assert_eq!(mgr.xor(x, y).unwrap(), mgr.xor(y, x).unwrap());

    let a1 = mgr.and(mgr.and(x, y).unwrap(), z).unwrap();
    let a2 = mgr.and(x, mgr.and(y, z).unwrap()).unwrap();
    assert_eq!(a1, a2);

    let d1 = mgr.and(x, mgr.or(y, z).unwrap()).unwrap();
    let d2 = mgr
        .or(mgr.and(x, y).unwrap(), mgr.and(x, z).unwrap())
        .unwrap();
    assert_eq!(d1, d2);
}

// ─── Counting ──────────────────────────────────────────────────────────────────

#[test]
fn count_and_complement_cover_the_cube() {
    let mgr = mgr3();
    let x = mgr.hi_var(0).unwrap();
    let y = mgr.hi_var(1).unwrap();
    let z = mgr.hi_var(2).unwrap();
    let f = mgr.or(mgr.and(x, y).unwrap(), z).unwrap();
    let nf = mgr.not(f).unwrap();

    assert_eq!(mgr.sat_count(f).unwrap() + mgr.sat_count(nf).unwrap(), 8);
}

#[test]
fn count_under_permuted_ordering() {
    // The same function must have the same count regardless of ordering.
    for ordering in [[0u32, 1, 2], [2, 1, 0], [1, 2, 0]] {
        let mgr = BddManager::new(&ordering, 64).unwrap();
        let x = mgr.hi_var(0).unwrap();
        let y = mgr.hi_var(1).unwrap();
        let f = mgr.or(x, y).unwrap();
        assert_eq!(mgr.sat_count(f).unwrap(), 6, "ordering {:?}", ordering);
    }
}

// ─── Enumeration ───────────────────────────────────────────────────────────────

#[test]
fn iterator_agrees_with_count_and_is_duplicate_free() {
    let mgr = mgr3();
    let x = mgr.hi_var(0).unwrap();
    let y = mgr.hi_var(1).unwrap();
    let z = mgr.hi_var(2).unwrap();
    let f = mgr.xor(mgr.or(x, y).unwrap(), z).unwrap();

    let sats: Vec<Vec<bool>> = mgr.sat_assignments(f).unwrap().collect();
    assert_eq!(sats.len() as u64, mgr.sat_count(f).unwrap());

    let mut dedup = sats.clone();
    dedup.sort();
    dedup.dedup();
    assert_eq!(dedup.len(), sats.len());
}

#[test]
fn assignment_round_trips_through_the_iterator() {
    let mgr = mgr3();
    for bits in 0..8u32 {
        let input: Vec<bool> = (0..3).map(|i| bits & (1 << i) != 0).collect();
        let f = mgr.assignment(&input).unwrap();
        let sats: Vec<Vec<bool>> = mgr.sat_assignments(f).unwrap().collect();
        assert_eq!(sats, vec![input]);
    }
}

#[test]
fn walker_buffer_must_be_copied_to_retain() {
    let mgr = mgr3();
    let f = mgr.hi_var(1).unwrap();
    let mut walker = mgr.sat_walker(f).unwrap();

    let mut collected = Vec::new();
    while let Some(sat) = walker.advance() {
        collected.push(sat.to_vec());
    }
    assert_eq!(collected.len() as u64, mgr.sat_count(f).unwrap());
}

// ─── Canonicity ────────────────────────────────────────────────────────────────

#[test]
fn equal_functions_are_equal_handles() {
    let mgr = mgr3();
    let x = mgr.hi_var(0).unwrap();
    let y = mgr.hi_var(1).unwrap();

    // x XOR y built two different ways.
    let direct = mgr.xor(x, y).unwrap();
    let nx = mgr.not(x).unwrap();
    let ny = mgr.not(y).unwrap();
    let expanded = mgr
        .or(mgr.and(x, ny).unwrap(), mgr.and(nx, y).unwrap())
        .unwrap();
    assert_eq!(direct, expanded);

    // And the graph is shared: rebuilding allocates nothing new.
    let before = mgr.size();
    let again = mgr.xor(y, x).unwrap();
    assert_eq!(again, direct);
    assert_eq!(mgr.size(), before);
}
