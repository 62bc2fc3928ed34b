//! Validation tests for the plant model and meal disturbance.
//!
//! Checks the RK4 step against the closed-form solution of the insulin-free
//! glucose equation and the shape of the meal appearance curve.

use virtual_patient::{
    config::PatientParameters,
    meal_appearance_rate, PatientState, PlantModel,
};

/// Exact glucose after `t` minutes with no insulin and no meals:
/// G(t) = G_eq + (G0 - G_eq)·exp(-GEZI·t), G_eq = EGP/GEZI
fn insulin_free_glucose(params: &PatientParameters, g0: f64, t: f64) -> f64 {
    let g_eq = params.zero_insulin_equilibrium_mg_per_dL();
    g_eq + (g0 - g_eq) * (-params.gezi_per_min * t).exp()
}

// ============================================================================
// RK4 Accuracy Tests
// ============================================================================

#[test]
fn test_baseline_step_matches_closed_form() {
    let params = PatientParameters::default();

    for h in [1e-3, 1e-1, 1.0] {
        let mut plant = PlantModel::new(params.clone(), h);
        let mut state = PatientState::default();
        plant.step(&mut state, 0.0, 0.0).unwrap();

        let expected = insulin_free_glucose(&params, 100.0, h);
        let error = (state.blood_glucose_mg_per_dL - expected).abs();
        assert!(
            error < 1e-10,
            "h={}: RK4 {} vs exact {} (error {:e})",
            h,
            state.blood_glucose_mg_per_dL,
            expected,
            error
        );

        // No infusion: insulin compartments stay exactly empty
        assert_eq!(state.subcutaneous_insulin_uU_per_mL, 0.0);
        assert_eq!(state.plasma_insulin_uU_per_mL, 0.0);
        assert_eq!(state.insulin_effect_per_min, 0.0);
    }
}

#[test]
fn test_local_error_is_fifth_order() {
    // Local truncation error ~ (G0 - G_eq)·(GEZI·h)^5 / 120
    let params = PatientParameters::default();
    let g_eq = params.zero_insulin_equilibrium_mg_per_dL();

    for h in [10.0, 20.0] {
        let mut plant = PlantModel::new(params.clone(), h);
        let mut state = PatientState::default();
        plant.step(&mut state, 0.0, 0.0).unwrap();

        let error = (state.blood_glucose_mg_per_dL - insulin_free_glucose(&params, 100.0, h)).abs();
        let bound = (g_eq - 100.0).abs() * (params.gezi_per_min * h).powi(5) / 120.0;
        assert!(
            error <= 2.0 * bound + 1e-12,
            "h={}: local error {:e} exceeds O(h^5) bound {:e}",
            h,
            error,
            bound
        );
    }
}

#[test]
fn test_glucose_rises_monotonically_without_insulin() {
    let mut plant = PlantModel::new(PatientParameters::default(), 1e-3);
    let mut state = PatientState::default();
    let mut previous = state.blood_glucose_mg_per_dL;

    for step in 0..10_000 {
        plant.step(&mut state, 0.0, 0.0).unwrap();
        assert!(
            state.blood_glucose_mg_per_dL > previous,
            "glucose did not increase at step {}",
            step
        );
        previous = state.blood_glucose_mg_per_dL;
    }

    // Still far from the ~604.5 mg/dL asymptote after 10 min
    assert!(previous < 120.0, "glucose after 10 min: {}", previous);
}

#[test]
fn test_infusion_lowers_glucose_over_time() {
    let params = PatientParameters::default();
    let mut untreated = PlantModel::new(params.clone(), 0.1);
    let mut treated = PlantModel::new(params, 0.1);
    let mut a = PatientState::default();
    let mut b = PatientState::default();

    for _ in 0..6000 {
        untreated.step(&mut a, 0.0, 0.0).unwrap();
        treated.step(&mut b, 20_000.0, 0.0).unwrap();
    }

    assert!(b.plasma_insulin_uU_per_mL > 0.0);
    assert!(b.insulin_effect_per_min > 0.0);
    assert!(b.blood_glucose_mg_per_dL < a.blood_glucose_mg_per_dL);
}

// ============================================================================
// Meal Appearance Tests
// ============================================================================

#[test]
fn test_appearance_zero_at_onset() {
    let params = PatientParameters::default();
    for ch in [0.0, 1.0, 42_000.0, 66_000.0] {
        assert_eq!(meal_appearance_rate(&params, ch, 0.0), 0.0);
    }
}

#[test]
fn test_appearance_positive_after_onset() {
    let params = PatientParameters::default();
    let mut t = 0.01;
    while t < 2000.0 {
        assert!(meal_appearance_rate(&params, 42_000.0, t) > 0.0, "RA at t={}", t);
        t *= 1.5;
    }
}

#[test]
fn test_appearance_peaks_near_tau_m() {
    let params = PatientParameters::default();
    let (peak_t, _) = (0..=20_000)
        .map(|i| i as f64 * 0.01)
        .map(|t| (t, meal_appearance_rate(&params, 42_000.0, t)))
        .fold((0.0, f64::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

    assert!(
        (peak_t - params.meal_peak_time_min).abs() < 0.02,
        "peak at {} min (expected {})",
        peak_t,
        params.meal_peak_time_min
    );
}

#[test]
fn test_appearance_integrates_to_carbohydrate_over_volume() {
    // ∫ RA dt = CH / VG
    let params = PatientParameters::default();
    let dt = 0.01;
    let total: f64 = (0..200_000)
        .map(|i| meal_appearance_rate(&params, 42_000.0, i as f64 * dt) * dt)
        .sum();
    let expected = 42_000.0 / params.glucose_volume_dL;
    assert!((total - expected).abs() / expected < 1e-3, "{} vs {}", total, expected);
}
