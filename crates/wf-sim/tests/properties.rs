use proptest::prelude::*;
use wf_geometry::{HoleSection, PipeSection, Survey, SurveyStation, WellGeometry};
use wf_layers::{Fluid, FluidLayer, LayerStack, Region, WellboreState};
use wf_sim::*;

fn deviated_well() -> WellGeometry {
    let survey = Survey::new(vec![
        SurveyStation {
            md: 500.0,
            tvd: 500.0,
        },
        SurveyStation {
            md: 2500.0,
            tvd: 1800.0,
        },
    ])
    .unwrap();
    WellGeometry::new(
        vec![
            HoleSection {
                name: "casing".into(),
                top_md: 0.0,
                bottom_md: 1400.0,
                diameter_m: 0.2245,
                cased: true,
            },
            HoleSection {
                name: "open hole".into(),
                top_md: 1400.0,
                bottom_md: 2500.0,
                diameter_m: 0.2159,
                cased: false,
            },
        ],
        vec![PipeSection {
            name: "DP".into(),
            top_md: 0.0,
            bottom_md: 2500.0,
            od_m: 0.127,
            id_m: 0.1086,
        }],
        survey,
    )
    .unwrap()
}

fn layered_state(g: &WellGeometry, bit: f64, densities: &[f64]) -> WellboreState {
    let n = densities.len() as f64;
    let layers: Vec<FluidLayer> = densities
        .iter()
        .enumerate()
        .map(|(i, &d)| {
            FluidLayer::new(bit * i as f64 / n, bit * (i + 1) as f64 / n, Fluid::new(d))
        })
        .collect();
    let mut s = WellboreState::uniform(g, bit, Fluid::new(densities[0]));
    s.annulus = LayerStack::from_layers(Region::Annulus, layers).unwrap();
    s
}

proptest! {
    #[test]
    fn back_pressure_round_trip(
        densities in prop::collection::vec(1000.0_f64..1800.0, 1..5),
        target in 1000.0_f64..1900.0,
        control in 200.0_f64..2000.0,
    ) {
        let g = deviated_well();
        let s = layered_state(&g, 2000.0, &densities);
        let bp = solve_back_pressure(&s, control, target, &g).unwrap();
        prop_assert!(bp.sabp_pa >= 0.0);
        if bp.sabp_pa > 0.0 {
            prop_assert!((bp.effective_esd_kg_m3 - target).abs() < 1e-9 * target);
        } else {
            prop_assert!(bp.static_esd_kg_m3 >= target - 1e-9 * target);
        }
    }

    #[test]
    fn heavier_layer_never_lowers_esd_below_it(
        densities in prop::collection::vec(1000.0_f64..1800.0, 2..5),
        bump in 0.0_f64..400.0,
        pick in 0usize..4,
    ) {
        let g = deviated_well();
        let idx = pick % densities.len();
        let before = layered_state(&g, 2000.0, &densities);
        let mut heavier = densities.clone();
        heavier[idx] += bump;
        let after = layered_state(&g, 2000.0, &heavier);
        let below = 2000.0 * (idx + 1) as f64 / densities.len() as f64;
        for md in [below, 0.5 * (below + 2000.0), 2000.0] {
            prop_assert!(after.static_esd_at(md, &g) >= before.static_esd_at(md, &g) - 1e-9);
        }
    }

    #[test]
    fn engine_steps_keep_layers_contiguous(
        step in 20.0_f64..150.0,
        distance in 100.0_f64..600.0,
        backfill in 1000.0_f64..1700.0,
        slug in 1200.0_f64..1700.0,
    ) {
        let g = deviated_well();
        let mud = Fluid::new(1200.0);
        let mut input = WellboreState::uniform(&g, 2400.0, mud.clone());
        input.string = LayerStack::from_layers(
            Region::String,
            vec![
                FluidLayer::new(0.0, 120.0, Fluid::new(slug)),
                FluidLayer::new(120.0, 2400.0, mud.clone()),
            ],
        )
        .unwrap();

        let mut plan = OperationPlan::new(OperationKind::TripOut, 2400.0 - distance, step, mud.clone());
        plan.muds.backfill = Some(Fluid::new(backfill));
        let models = ModelSet::default();
        let ctx = SimContext { geometry: &g, models: &models };
        let pulled = run_operation(&plan, &input, ctx, None, None).unwrap();
        let volume = input.total_fluid_volume(&g);
        for r in &pulled.records {
            r.state().check_invariants().unwrap();
            prop_assert!(r.state().string.bottom_md() <= r.bit_md() + 1e-6);
        }

        let mut back = OperationPlan::new(OperationKind::TripIn, 2400.0, step, mud);
        back.start_md = Some(2400.0 - distance);
        let ran = run_operation(&back, &pulled.output, ctx, None, None).unwrap();
        for r in &ran.records {
            r.state().check_invariants().unwrap();
        }
        // Back at the same depth, the regions tile the same wellbore volume.
        let restored = ran.output.total_fluid_volume(&g);
        prop_assert!((restored - volume).abs() < 1e-6 * volume);
    }
}
