use proptest::prelude::*;
use wf_geometry::*;

fn j_well() -> WellGeometry {
    let survey = Survey::new(vec![
        SurveyStation { md: 0.0, tvd: 0.0 },
        SurveyStation {
            md: 800.0,
            tvd: 800.0,
        },
        SurveyStation {
            md: 3000.0,
            tvd: 2100.0,
        },
    ])
    .unwrap();
    WellGeometry::new(
        vec![HoleSection {
            name: "8.5in".into(),
            top_md: 0.0,
            bottom_md: 3000.0,
            diameter_m: 0.2159,
            cased: false,
        }],
        vec![PipeSection {
            name: "DP".into(),
            top_md: 0.0,
            bottom_md: 3000.0,
            od_m: 0.127,
            id_m: 0.1086,
        }],
        survey,
    )
    .unwrap()
}

#[test]
fn survey_must_reach_total_depth() {
    let survey = Survey::new(vec![SurveyStation {
        md: 1000.0,
        tvd: 950.0,
    }])
    .unwrap();
    let err = WellGeometry::new(
        vec![HoleSection {
            name: "h".into(),
            top_md: 0.0,
            bottom_md: 2000.0,
            diameter_m: 0.2,
            cased: false,
        }],
        vec![PipeSection {
            name: "p".into(),
            top_md: 0.0,
            bottom_md: 2000.0,
            od_m: 0.1,
            id_m: 0.08,
        }],
        survey,
    )
    .unwrap_err();
    assert!(matches!(err, GeometryError::OutOfRange { .. }));
}

#[test]
fn deviated_tvd_lags_md() {
    let g = j_well();
    assert!((g.tvd(800.0) - 800.0).abs() < 1e-9);
    assert!(g.tvd(2000.0) < 2000.0);
    assert!((g.tvd(3000.0) - 2100.0).abs() < 1e-9);
}

proptest! {
    #[test]
    fn volumes_and_tvd_are_monotonic(a in 0.0_f64..3000.0, b in 0.0_f64..3000.0) {
        let g = j_well();
        let (lo, hi) = (a.min(b), a.max(b));
        prop_assert!(g.tvd(hi) >= g.tvd(lo));
        prop_assert!(g.volume_of_hole(0.0, hi) >= g.volume_of_hole(0.0, lo));
        prop_assert!(g.volume_in_string(0.0, hi) >= g.volume_in_string(0.0, lo));
        prop_assert!(g.annular_volume(lo, hi) >= 0.0);
    }
}
