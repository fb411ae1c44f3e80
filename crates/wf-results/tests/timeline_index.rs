use wf_geometry::WellGeometry;
use wf_layers::{Fluid, WellboreState};
use wf_results::*;
use wf_sim::{ModelSet, OperationKind, OperationPlan, SimContext, run_operation};

/// Trip out 2000 -> 1800 in 100 m steps, then back in.
fn two_operation_timeline() -> Timeline {
    let g = WellGeometry::uniform_vertical(2000.0, 0.2159, 0.127, 0.1086).unwrap();
    let mud = Fluid::new(1200.0);
    let models = ModelSet::default();
    let ctx = SimContext {
        geometry: &g,
        models: &models,
    };
    let input = WellboreState::uniform(&g, 2000.0, mud.clone());

    let out = OperationPlan::new(OperationKind::TripOut, 1800.0, 100.0, mud.clone());
    let pulled = run_operation(&out, &input, ctx, None, None).unwrap();
    let back = OperationPlan::new(OperationKind::TripIn, 2000.0, 100.0, mud);
    let ran = run_operation(&back, &pulled.output, ctx, None, None).unwrap();

    Timeline::from_segments([
        TimelineSegment {
            operation_id: "out".to_string(),
            label: "out".to_string(),
            kind: OperationKind::TripOut,
            records: pulled.records,
            error: None,
        },
        TimelineSegment {
            operation_id: "empty".to_string(),
            label: "never ran".to_string(),
            kind: OperationKind::Circulate,
            records: vec![],
            error: Some("blocked".to_string()),
        },
        TimelineSegment {
            operation_id: "in".to_string(),
            label: "in".to_string(),
            kind: OperationKind::TripIn,
            records: ran.records,
            error: None,
        },
    ])
}

#[test]
fn global_indices_span_operations() {
    let timeline = two_operation_timeline();
    // Step 0 plus two increments per operation.
    assert_eq!(timeline.len(), 6);
    assert_eq!(timeline.operation_range(0), Some(0..3));
    assert_eq!(timeline.operation_range(1), Some(3..3));
    assert_eq!(timeline.operation_range(2), Some(3..6));

    assert_eq!(
        timeline.locate(2),
        Some(TimelineIndex {
            operation: 0,
            local: 2
        })
    );
    assert_eq!(
        timeline.locate(3),
        Some(TimelineIndex {
            operation: 2,
            local: 0
        })
    );
    assert_eq!(timeline.locate(6), None);
    assert_eq!(timeline.global_index(2, 1), Some(4));
    assert_eq!(timeline.global_index(1, 0), None);

    for (i, point) in timeline.points().enumerate() {
        assert_eq!(point.index, i);
        assert_eq!(timeline.locate(i).map(|at| at.operation), Some(point.operation));
    }
}

#[test]
fn bit_depth_series_follows_trip() {
    let timeline = two_operation_timeline();
    let bit: Vec<f64> = timeline
        .series(Series::BitMd)
        .into_iter()
        .map(|(_, v)| v)
        .collect();
    let expected = [2000.0, 1900.0, 1800.0, 1800.0, 1900.0, 2000.0];
    for (got, want) in bit.iter().zip(expected) {
        assert!((got - want).abs() < 1e-9, "{got} vs {want}");
    }
    let point = timeline.get(4).unwrap();
    assert_eq!(point.segment.operation_id, "in");
    assert_eq!(point.record.step(), 1);
}

#[test]
fn csv_has_header_and_one_row_per_record() {
    let timeline = two_operation_timeline();
    let csv = series_csv(&timeline, &[Series::BitMd, Series::Sabp]);
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "index,operation,step,bit_md_m,sabp_pa");
    assert_eq!(lines.len(), 7);
    assert!(lines[4].starts_with("3,2,0,"));
}

#[test]
fn oilfield_csv_converts_pressures_and_volumes() {
    let timeline = two_operation_timeline();
    let columns = [Series::BitMd, Series::Sabp, Series::PitGain, Series::EsdAtControl];
    let si = series_csv(&timeline, &columns);
    let oil = series_csv_in(&timeline, &columns, UnitSystem::Oilfield);
    let header = oil.lines().next().unwrap();
    assert_eq!(header, "index,operation,step,bit_md_m,sabp_psi,pit_gain_bbl,esd_ppg");

    let fields = |line: &str| -> Vec<f64> {
        line.split(',').skip(3).map(|v| v.parse().unwrap()).collect()
    };
    for (a, b) in si.lines().skip(1).zip(oil.lines().skip(1)) {
        let (a, b) = (fields(a), fields(b));
        assert_eq!(a[0], b[0]);
        assert!((a[1] / 6_894.757 - b[1]).abs() < 1e-3 * a[1].abs().max(1.0));
        assert!((a[2] / 0.158_987_3 - b[2]).abs() < 1e-6);
        assert!((a[3] / 119.826 - b[3]).abs() < 1e-3);
    }
}
